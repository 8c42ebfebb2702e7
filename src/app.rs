use std::rc::Rc;

use serde_json::json;
use yew::prelude::*;
use yew_hooks::prelude::*;

use crate::api::HttpApi;
use crate::config::Config;
use crate::log;
use crate::pages;
use crate::push::socket::PushChannel;

/// Everything the page talks to, built once at mount.
#[derive(Clone, PartialEq)]
pub struct Services {
    pub config: Rc<Config>,
    pub api: Rc<HttpApi>,
    /// `None` if the push endpoint could not be derived from the config.
    pub push: Option<PushChannel>,
}

impl Services {
    fn start(config: Config) -> Self {
        let push = match PushChannel::connect(&config.backend_url) {
            Ok(channel) => Some(channel),
            Err(err) => {
                log::error(
                    "push_unavailable",
                    json!({ "backend": config.backend_url, "error": err.to_string() }),
                );
                None
            }
        };
        Self {
            api: Rc::new(HttpApi::new(&config)),
            config: Rc::new(config),
            push,
        }
    }

    fn shutdown(&self) {
        if let Some(push) = &self.push {
            push.close();
        }
    }
}

#[function_component(App)]
pub fn app() -> Html {
    let services = use_memo((), |_| Services::start(Config::from_build_env()));

    {
        let services = services.clone();
        use_effect_once(move || {
            log::info(
                "app_mounted",
                json!({
                    "backend": services.config.backend_url,
                    "api": services.config.api_base,
                }),
            );
            move || services.shutdown()
        });
    }

    html! {
        <pages::home::HomePage services={(*services).clone()} />
    }
}
