use yew::prelude::*;
use yew_icons::{Icon, IconId};

use crate::types::DownloadStatus;

#[derive(Properties, PartialEq)]
pub struct StatusMessageProps {
    pub status: DownloadStatus,
    pub message: AttrValue,
}

#[function_component(StatusMessage)]
pub fn status_message(props: &StatusMessageProps) -> Html {
    if props.status == DownloadStatus::Idle || props.message.is_empty() {
        return html! {};
    }

    let (icon, icon_class) = match props.status {
        DownloadStatus::Loading => (IconId::LucideLoader2, "status-icon spin"),
        DownloadStatus::Success => (IconId::LucideCheckCircle, "status-icon"),
        DownloadStatus::Error | DownloadStatus::Idle => (IconId::LucideAlertTriangle, "status-icon"),
    };

    html! {
        <div class={classes!("status", format!("status-{}", props.status.as_str()))} role="status">
            <Icon icon_id={icon} width={"20"} height={"20"} class={icon_class} />
            <span>{ props.message.clone() }</span>
        </div>
    }
}
