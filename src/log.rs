use serde::Serialize;
use serde_json::Value;
use wasm_bindgen::JsValue;

#[derive(Clone, Copy)]
enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

// Context goes out as a plain JS object so devtools can expand it.
fn send(level: Level, message: &str, context: Value) {
    let line = JsValue::from_str(&format!("[tube-downloader] {message}"));
    let ctx = context
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .unwrap_or(JsValue::NULL);

    match level {
        Level::Debug => web_sys::console::debug_2(&line, &ctx),
        Level::Info => web_sys::console::info_2(&line, &ctx),
        Level::Warn => web_sys::console::warn_2(&line, &ctx),
        Level::Error => web_sys::console::error_2(&line, &ctx),
    }
}

pub fn info(message: &str, context: Value)  { send(Level::Info,  message, context); }
pub fn warn(message: &str, context: Value)  { send(Level::Warn,  message, context); }
pub fn error(message: &str, context: Value) { send(Level::Error, message, context); }
pub fn debug(message: &str, context: Value) {
    if cfg!(debug_assertions) {
        send(Level::Debug, message, context);
    }
}
