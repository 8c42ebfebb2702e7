use std::cell::{Cell, RefCell};
use std::rc::Rc;

use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use futures::StreamExt;
use gloo_timers::callback::Timeout;
use gloo_timers::future::TimeoutFuture;
use serde_json::json;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{BinaryType, CloseEvent, MessageEvent, WebSocket};
use yew::Callback;

use crate::log;
use crate::push::channel::{Channel, Effect};
use crate::push::packet::SocketPacket;
use crate::push::{reconnect_delay_ms, Endpoint, Notification, PushError};

enum TransportEvent {
    Opened,
    Frame(String),
    Binary,
    Errored,
    Closed { code: u16, reason: String },
    HeartbeatMissed,
}

/// Events are tagged with the socket generation that produced them, so a
/// late callback from a replaced socket cannot trigger another reconnect.
type Tagged = (u32, TransportEvent);

struct Handlers {
    _on_open: Closure<dyn FnMut(web_sys::Event)>,
    _on_message: Closure<dyn FnMut(MessageEvent)>,
    _on_error: Closure<dyn FnMut(web_sys::Event)>,
    _on_close: Closure<dyn FnMut(CloseEvent)>,
}

impl Handlers {
    fn attach(ws: &WebSocket, generation: u32, tx: &UnboundedSender<Tagged>) -> Self {
        let open_tx = tx.clone();
        let on_open = Closure::<dyn FnMut(web_sys::Event)>::new(move |_| {
            let _ = open_tx.unbounded_send((generation, TransportEvent::Opened));
        });

        let message_tx = tx.clone();
        let on_message = Closure::<dyn FnMut(MessageEvent)>::new(move |e: MessageEvent| {
            let event = match e.data().as_string() {
                Some(text) => TransportEvent::Frame(text),
                None => TransportEvent::Binary,
            };
            let _ = message_tx.unbounded_send((generation, event));
        });

        let error_tx = tx.clone();
        let on_error = Closure::<dyn FnMut(web_sys::Event)>::new(move |_| {
            let _ = error_tx.unbounded_send((generation, TransportEvent::Errored));
        });

        let close_tx = tx.clone();
        let on_close = Closure::<dyn FnMut(CloseEvent)>::new(move |e: CloseEvent| {
            let _ = close_tx.unbounded_send((
                generation,
                TransportEvent::Closed {
                    code: e.code(),
                    reason: e.reason(),
                },
            ));
        });

        ws.set_onopen(Some(on_open.as_ref().unchecked_ref()));
        ws.set_onmessage(Some(on_message.as_ref().unchecked_ref()));
        ws.set_onerror(Some(on_error.as_ref().unchecked_ref()));
        ws.set_onclose(Some(on_close.as_ref().unchecked_ref()));

        Self {
            _on_open: on_open,
            _on_message: on_message,
            _on_error: on_error,
            _on_close: on_close,
        }
    }

    fn detach(ws: &WebSocket) {
        ws.set_onopen(None);
        ws.set_onmessage(None);
        ws.set_onerror(None);
        ws.set_onclose(None);
    }
}

struct Inner {
    endpoint: Endpoint,
    channel: RefCell<Channel>,
    socket: RefCell<Option<WebSocket>>,
    handlers: RefCell<Option<Handlers>>,
    listener: RefCell<Option<Callback<Notification>>>,
    watchdog: RefCell<Option<Timeout>>,
    events: RefCell<Option<UnboundedSender<Tagged>>>,
    generation: Cell<u32>,
    failures: Cell<u32>,
    disposed: Cell<bool>,
}

/// Long-lived Socket.IO connection to the backend.
///
/// Opened once by the app root and handed down as a prop; `close` must be
/// called when the root unmounts. Clones share one connection.
#[derive(Clone)]
pub struct PushChannel {
    inner: Rc<Inner>,
}

impl PartialEq for PushChannel {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl PushChannel {
    pub fn connect(backend_url: &str) -> Result<Self, PushError> {
        let endpoint = Endpoint::from_backend_url(backend_url)?;
        let (tx, rx) = mpsc::unbounded();
        let inner = Rc::new(Inner {
            channel: RefCell::new(Channel::new(endpoint.namespace.clone())),
            endpoint,
            socket: RefCell::new(None),
            handlers: RefCell::new(None),
            listener: RefCell::new(None),
            watchdog: RefCell::new(None),
            events: RefCell::new(Some(tx)),
            generation: Cell::new(0),
            failures: Cell::new(0),
            disposed: Cell::new(false),
        });

        log::info(
            "push_connect",
            json!({ "url": inner.endpoint.url.as_str(), "namespace": inner.endpoint.namespace }),
        );
        inner.open_or_retry();
        spawn_local(drive(inner.clone(), rx));
        Ok(Self { inner })
    }

    /// Installs the notification handler, replacing any previous one.
    pub fn subscribe(&self, listener: Callback<Notification>) {
        *self.inner.listener.borrow_mut() = Some(listener);
    }

    pub fn unsubscribe(&self) {
        self.inner.listener.borrow_mut().take();
    }

    /// Id the backend uses to address this client; `None` while disconnected.
    pub fn socket_id(&self) -> Option<String> {
        self.inner.channel.borrow().socket_id().map(str::to_string)
    }

    pub fn close(&self) {
        self.inner.dispose();
    }
}

impl Inner {
    fn open(&self) -> Result<(), PushError> {
        let Some(tx) = self.events.borrow().clone() else {
            return Ok(());
        };
        let ws = WebSocket::new(self.endpoint.url.as_str())
            .map_err(|e| PushError::Socket(js_error_text(&e)))?;
        ws.set_binary_type(BinaryType::Arraybuffer);

        let generation = self.generation.get().wrapping_add(1);
        self.generation.set(generation);
        let handlers = Handlers::attach(&ws, generation, &tx);
        *self.socket.borrow_mut() = Some(ws);
        *self.handlers.borrow_mut() = Some(handlers);
        Ok(())
    }

    fn open_or_retry(&self) {
        if let Err(err) = self.open() {
            log::warn("push_open_failed", json!({ "error": err.to_string() }));
            // Feed a synthetic close so the driver schedules the next attempt.
            if let Some(tx) = self.events.borrow().as_ref() {
                let _ = tx.unbounded_send((
                    self.generation.get(),
                    TransportEvent::Closed {
                        code: 0,
                        reason: err.to_string(),
                    },
                ));
            }
        }
    }

    fn send(&self, frame: &str) {
        let socket = self.socket.borrow();
        let Some(ws) = socket.as_ref() else {
            return;
        };
        if ws.ready_state() != WebSocket::OPEN {
            return;
        }
        if let Err(e) = ws.send_with_str(frame) {
            log::warn("push_send_failed", json!({ "error": js_error_text(&e) }));
        }
    }

    fn arm_watchdog(&self, ms: u32) {
        let generation = self.generation.get();
        let timeout = self.events.borrow().clone().map(|tx| {
            Timeout::new(ms, move || {
                let _ = tx.unbounded_send((generation, TransportEvent::HeartbeatMissed));
            })
        });
        // Dropping the previous Timeout cancels it.
        *self.watchdog.borrow_mut() = timeout;
    }

    fn handle_frame(&self, frame: &str) {
        let effects = match self.channel.borrow_mut().handle_frame(frame) {
            Ok(effects) => effects,
            Err(err) => {
                log::warn(
                    "push_bad_frame",
                    json!({ "error": err.to_string(), "frame": frame.chars().take(200).collect::<String>() }),
                );
                return;
            }
        };

        for effect in effects {
            match effect {
                Effect::Send(out) => self.send(&out),
                Effect::Heartbeat(ms) => self.arm_watchdog(ms),
                Effect::Connected { socket_id } => {
                    self.failures.set(0);
                    log::info("push_connected", json!({ "socket_id": socket_id }));
                }
                Effect::Disconnected { reason } => {
                    log::warn("push_disconnected", json!({ "reason": reason }));
                }
                Effect::Skipped { event, error } => {
                    log::warn("push_bad_payload", json!({ "event": event, "error": error }));
                }
                Effect::Notify(notification) => {
                    log::debug("push_notification", json!({ "notification": format!("{notification:?}") }));
                    let listener = self.listener.borrow().clone();
                    if let Some(listener) = listener {
                        listener.emit(notification);
                    }
                }
            }
        }
    }

    fn teardown_socket(&self) {
        self.watchdog.borrow_mut().take();
        if let Some(ws) = self.socket.borrow_mut().take() {
            Handlers::detach(&ws);
            let _ = ws.close();
        }
        self.handlers.borrow_mut().take();
        self.channel.borrow_mut().reset();
    }

    async fn reconnect(&self) {
        self.teardown_socket();
        let attempt = self.failures.get();
        self.failures.set(attempt.saturating_add(1));
        let delay = reconnect_delay_ms(attempt);
        log::info("push_reconnect_scheduled", json!({ "attempt": attempt.saturating_add(1), "delay_ms": delay }));

        TimeoutFuture::new(delay).await;
        if !self.disposed.get() {
            self.open_or_retry();
        }
    }

    fn dispose(&self) {
        if self.disposed.replace(true) {
            return;
        }
        let namespace = self.endpoint.namespace.clone();
        self.send(&SocketPacket::Disconnect { namespace }.to_frame());
        self.teardown_socket();
        self.listener.borrow_mut().take();
        // Last sender gone: the driver's stream ends and it exits.
        self.events.borrow_mut().take();
        log::info("push_closed", json!({}));
    }
}

async fn drive(inner: Rc<Inner>, mut rx: UnboundedReceiver<Tagged>) {
    while let Some((generation, event)) = rx.next().await {
        if inner.disposed.get() {
            break;
        }
        if generation != inner.generation.get() {
            continue;
        }
        match event {
            TransportEvent::Opened => {
                log::debug("push_transport_open", json!({ "generation": generation }));
            }
            TransportEvent::Frame(frame) => inner.handle_frame(&frame),
            TransportEvent::Binary => {
                log::debug("push_binary_frame_ignored", json!({}));
            }
            TransportEvent::Errored => {
                log::warn("push_transport_error", json!({ "url": inner.endpoint.url.as_str() }));
            }
            TransportEvent::Closed { code, reason } => {
                log::warn("push_transport_closed", json!({ "code": code, "reason": reason }));
                inner.reconnect().await;
            }
            TransportEvent::HeartbeatMissed => {
                log::warn("push_heartbeat_missed", json!({}));
                inner.reconnect().await;
            }
        }
    }
}

fn js_error_text(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| {
            value
                .dyn_ref::<js_sys::Error>()
                .map(|e| String::from(e.message()))
        })
        .unwrap_or_else(|| format!("{value:?}"))
}
