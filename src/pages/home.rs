use yew::prelude::*;

use crate::app::Services;
use crate::components::downloader_card::DownloaderCard;

#[derive(Properties, PartialEq, Clone)]
pub struct Props {
    pub services: Services,
}

fn build_label() -> String {
    match option_env!("VERGEN_BUILD_DATE") {
        Some(date) => format!("v{} · built {}", env!("CARGO_PKG_VERSION"), date),
        None => format!("v{}", env!("CARGO_PKG_VERSION")),
    }
}

#[function_component(HomePage)]
pub fn home_page(props: &Props) -> Html {
    html! {
        <main class="container">
            <div class="column">
                <h1 class="title">
                    {"YouTube "}<span class="title-accent">{"4K Downloader"}</span>
                </h1>
                <h2 class="subtitle">{"Download YouTube videos in up to 4K"}</h2>

                <DownloaderCard services={props.services.clone()} />

                <footer class="footer">
                    <p>{"Videos are fetched and stored by your download server."}</p>
                    <p class="footer-build">{ build_label() }</p>
                </footer>
            </div>
        </main>
    }
}
