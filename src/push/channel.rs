use serde_json::Value;

use crate::push::packet::{EnginePacket, Handshake, PacketError, SocketPacket};
use crate::push::Notification;

/// What the transport has to do after a frame was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Write this text frame to the socket.
    Send(String),
    /// (Re)arm the heartbeat watchdog with this many milliseconds.
    Heartbeat(u32),
    /// Namespace joined; this id is what the backend routes events to.
    Connected { socket_id: String },
    Disconnected { reason: String },
    Notify(Notification),
    /// A known event whose payload did not parse; logged, never applied.
    Skipped { event: String, error: String },
}

/// Protocol state of one push connection, independent of the socket API.
#[derive(Debug, Clone)]
pub struct Channel {
    namespace: String,
    handshake: Option<Handshake>,
    socket_id: Option<String>,
}

impl Channel {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            handshake: None,
            socket_id: None,
        }
    }

    pub fn socket_id(&self) -> Option<&str> {
        self.socket_id.as_deref()
    }

    /// Transport went away; everything learned from it is stale.
    pub fn reset(&mut self) {
        self.handshake = None;
        self.socket_id = None;
    }

    pub fn handle_frame(&mut self, frame: &str) -> Result<Vec<Effect>, PacketError> {
        match EnginePacket::decode(frame)? {
            EnginePacket::Open(handshake) => {
                let deadline = handshake.heartbeat_deadline_ms();
                self.handshake = Some(handshake);
                let connect = SocketPacket::Connect {
                    namespace: self.namespace.clone(),
                    data: None,
                };
                Ok(vec![Effect::Send(connect.to_frame()), Effect::Heartbeat(deadline)])
            }
            EnginePacket::Ping => {
                let mut effects = vec![Effect::Send(EnginePacket::Pong.encode())];
                if let Some(h) = &self.handshake {
                    effects.push(Effect::Heartbeat(h.heartbeat_deadline_ms()));
                }
                Ok(effects)
            }
            EnginePacket::Close => {
                self.reset();
                Ok(vec![Effect::Disconnected {
                    reason: "server closed the transport".into(),
                }])
            }
            EnginePacket::Message(data) => self.handle_message(&data),
            EnginePacket::Pong | EnginePacket::Upgrade | EnginePacket::Noop => Ok(Vec::new()),
        }
    }

    fn handle_message(&mut self, data: &str) -> Result<Vec<Effect>, PacketError> {
        let packet = SocketPacket::decode(data)?;
        if packet.namespace() != self.namespace {
            return Ok(Vec::new());
        }

        match packet {
            SocketPacket::Connect { data, .. } => {
                let sid = data
                    .as_ref()
                    .and_then(|d| d.get("sid"))
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .ok_or(PacketError::Unsupported("connect without sid"))?;
                self.socket_id = Some(sid.clone());
                Ok(vec![Effect::Connected { socket_id: sid }])
            }
            SocketPacket::Disconnect { .. } => {
                self.socket_id = None;
                Ok(vec![Effect::Disconnected {
                    reason: "server disconnected the namespace".into(),
                }])
            }
            SocketPacket::ConnectError { data, .. } => {
                self.socket_id = None;
                let reason = data
                    .as_ref()
                    .and_then(|d| d.get("message"))
                    .and_then(Value::as_str)
                    .unwrap_or("connection refused")
                    .to_string();
                Ok(vec![Effect::Disconnected { reason }])
            }
            SocketPacket::Event { id, name, args, .. } => {
                let mut effects = Vec::new();
                if let Some(id) = id {
                    let ack = SocketPacket::Ack {
                        namespace: self.namespace.clone(),
                        id,
                        args: Vec::new(),
                    };
                    effects.push(Effect::Send(ack.to_frame()));
                }
                // The ack goes out even when the payload is unusable.
                match Notification::from_event(&name, args.first()) {
                    Ok(Some(n)) => effects.push(Effect::Notify(n)),
                    Ok(None) => {}
                    Err(err) => effects.push(Effect::Skipped {
                        event: name,
                        error: err.to_string(),
                    }),
                }
                Ok(effects)
            }
            SocketPacket::Ack { .. } => Ok(Vec::new()),
        }
    }
}
