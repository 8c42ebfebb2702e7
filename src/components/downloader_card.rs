use serde_json::json;
use wasm_bindgen_futures::spawn_local;
use web_sys::{HtmlInputElement, HtmlSelectElement};
use yew::prelude::*;
use yew_icons::{Icon, IconId};

use crate::app::Services;
use crate::components::status_message::StatusMessage;
use crate::download::coordinator;
use crate::download::session::{DownloadSession, SessionAction};
use crate::error::SubmitError;
use crate::log;
use crate::push::socket::PushChannel;
use crate::types::Quality;

const TROUBLESHOOTING_HINT: &str = "Make sure the backend server is running and properly configured.";

#[derive(Properties, PartialEq, Clone)]
pub struct Props {
    pub services: Services,
}

#[function_component(DownloaderCard)]
pub fn downloader_card(props: &Props) -> Html {
    let url = use_state(String::new);
    let quality = use_state(Quality::default);
    let show_video = use_state(|| false);
    let session = use_reducer(DownloadSession::default);

    // One listener per channel; re-subscribing replaces it.
    {
        let dispatcher = session.dispatcher();
        use_effect_with(props.services.push.clone(), move |push| {
            if let Some(push) = push {
                push.subscribe(Callback::from(move |n| {
                    dispatcher.dispatch(SessionAction::Notify(n))
                }));
            }
            let push = push.clone();
            move || {
                if let Some(push) = push {
                    push.unsubscribe();
                }
            }
        });
    }

    let on_url_input = {
        let url = url.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            url.set(input.value());
        })
    };

    let on_quality_change = {
        let quality = quality.clone();
        Callback::from(move |e: Event| {
            let value = e.target_unchecked_into::<HtmlSelectElement>().value();
            match Quality::from_value(&value) {
                Some(q) => quality.set(q),
                None => log::warn("unknown_quality_option", json!({ "value": value })),
            }
        })
    };

    let on_download = {
        let url = url.clone();
        let quality = quality.clone();
        let show_video = show_video.clone();
        let dispatcher = session.dispatcher();
        let services = props.services.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            show_video.set(false);

            let target = (*url).clone();
            let quality = *quality;
            let socket_id = services.push.as_ref().and_then(PushChannel::socket_id);
            log::info(
                "download_clicked",
                json!({ "url": target, "quality": quality.as_str(), "socket_id": socket_id }),
            );
            if socket_id.is_none() {
                log::warn("download_without_push_channel", json!({ "url": target }));
            }

            let api = services.api.clone();
            let dispatcher = dispatcher.clone();
            spawn_local(async move {
                let result = coordinator::submit(&*api, &target, quality, socket_id, |action| {
                    dispatcher.dispatch(action)
                })
                .await;
                match result {
                    Ok(resp) => log::info(
                        "download_acknowledged",
                        json!({ "url": target, "message": resp.message }),
                    ),
                    Err(SubmitError::InvalidUrl) => {
                        log::warn("download_rejected", json!({ "url": target }))
                    }
                    Err(SubmitError::Api(err)) => log::error(
                        "download_request_failed",
                        json!({ "url": target, "error": err.to_string(), "detail": err.describe() }),
                    ),
                }
            });
        })
    };

    let on_play = {
        let show_video = show_video.clone();
        Callback::from(move |_: MouseEvent| show_video.set(true))
    };

    let on_reset = {
        let url = url.clone();
        let quality = quality.clone();
        let show_video = show_video.clone();
        let dispatcher = session.dispatcher();
        Callback::from(move |_: MouseEvent| {
            log::info("download_reset", json!({}));
            url.set(String::new());
            quality.set(Quality::default());
            show_video.set(false);
            dispatcher.dispatch(SessionAction::Reset);
        })
    };

    let loading = session.is_loading();
    let submit_disabled = loading || url.trim().is_empty();

    let progress_bar = if loading {
        html! {
            <div class="progress-track">
                <div class="progress-fill" style={format!("width: {}%", session.progress)}></div>
            </div>
        }
    } else {
        html! {}
    };

    let error_panel = match session.troubleshooting() {
        Some(detail) => html! {
            <div class="error-panel">
                <Icon icon_id={IconId::LucideAlertTriangle} width={"20"} height={"20"} class="error-icon" />
                <div>
                    <p class="error-title">{"Troubleshooting:"}</p>
                    <p>{ detail.to_string() }</p>
                    <p class="error-hint">{ TROUBLESHOOTING_HINT }</p>
                </div>
            </div>
        },
        None => html! {},
    };

    let actions = if session.playable_file().is_some() {
        html! {
            <>
                <button type="button" class="btn btn-play" onclick={on_play}>
                    <Icon icon_id={IconId::LucidePlay} width={"20"} height={"20"} />
                    {"Play Video"}
                </button>
                <button type="button" class="btn btn-secondary" onclick={on_reset}>
                    <Icon icon_id={IconId::LucideRotateCcw} width={"20"} height={"20"} />
                    {"Download Another"}
                </button>
            </>
        }
    } else {
        html! {
            <button type="submit" class="btn btn-primary" disabled={submit_disabled}>
                { if loading {
                    html! { {"Processing..."} }
                } else {
                    html! {
                        <>
                            <Icon icon_id={IconId::LucideDownload} width={"20"} height={"20"} />
                            {"Download Video"}
                        </>
                    }
                }}
            </button>
        }
    };

    let video = match (*show_video, session.playable_file()) {
        (true, Some(file)) => html! {
            <div class="video-wrap">
                <video
                    class="video"
                    src={props.services.config.video_url(file)}
                    controls={true}
                    controlslist="nodownload nofullscreen noremoteplayback"
                    disablepictureinpicture="true"
                />
            </div>
        },
        _ => html! {},
    };

    html! {
        <div class="card">
            <div class="card-header">
                <h2 class="card-title">{"Download YouTube Videos"}</h2>
            </div>

            <form class="card-body" onsubmit={on_download}>
                <div class="field">
                    <label for="youtube-url">{"YouTube URL"}</label>
                    <input
                        id="youtube-url"
                        placeholder="https://www.youtube.com/watch?v=..."
                        value={(*url).clone()}
                        oninput={on_url_input}
                        disabled={loading}
                    />
                </div>

                <div class="field">
                    <label for="quality">{"Video Quality"}</label>
                    <select id="quality" onchange={on_quality_change} disabled={loading}>
                        { for Quality::ALL.iter().map(|q| html! {
                            <option value={q.as_str()} selected={*q == *quality}>{ q.label() }</option>
                        }) }
                    </select>
                </div>

                { progress_bar }

                <StatusMessage status={session.status} message={session.message.clone()} />

                { error_panel }

                <div class="actions">
                    { actions }
                </div>
            </form>

            { video }
        </div>
    }
}
