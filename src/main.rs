mod api;
mod config;
mod download;
mod error;
mod push;
mod types;
mod utils;

#[cfg(target_arch = "wasm32")]
mod app;
#[cfg(target_arch = "wasm32")]
mod components;
#[cfg(target_arch = "wasm32")]
mod log;
#[cfg(target_arch = "wasm32")]
mod pages;

#[cfg(target_arch = "wasm32")]
use app::App;

#[cfg(target_arch = "wasm32")]
fn main() {
    console_error_panic_hook::set_once();
    yew::Renderer::<App>::new().render();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    eprintln!(
        "This crate targets WebAssembly. Use `trunk serve` to run the page (set BACKEND_URL to point at the download server). Do not `cargo run` this crate natively."
    );
    std::process::exit(1);
}
