//! Engine.IO v4 / Socket.IO v5 text packets (websocket transport, no binary).

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PacketError {
    #[error("empty frame")]
    Empty,

    #[error("unknown {layer} packet type {kind:?}")]
    UnknownType { layer: &'static str, kind: char },

    #[error("malformed json in packet: {0}")]
    Json(#[from] serde_json::Error),

    #[error("event packet without a name")]
    MissingEventName,

    #[error("unsupported packet: {0}")]
    Unsupported(&'static str),
}

/// Body of the Engine.IO `open` packet.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    pub sid: String,
    #[serde(default)]
    pub upgrades: Vec<String>,
    /// Milliseconds between server pings.
    pub ping_interval: u32,
    /// Milliseconds the server waits for our pong.
    pub ping_timeout: u32,
    #[serde(default)]
    pub max_payload: Option<u64>,
}

impl Handshake {
    /// Silence longer than this means the connection is gone.
    pub fn heartbeat_deadline_ms(&self) -> u32 {
        self.ping_interval.saturating_add(self.ping_timeout)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnginePacket {
    Open(Handshake),
    Close,
    Ping,
    Pong,
    Message(String),
    Upgrade,
    Noop,
}

impl EnginePacket {
    pub fn decode(frame: &str) -> Result<Self, PacketError> {
        let mut chars = frame.chars();
        let kind = chars.next().ok_or(PacketError::Empty)?;
        let data = chars.as_str();
        Ok(match kind {
            '0' => EnginePacket::Open(serde_json::from_str(data)?),
            '1' => EnginePacket::Close,
            '2' => EnginePacket::Ping,
            '3' => EnginePacket::Pong,
            '4' => EnginePacket::Message(data.to_string()),
            '5' => EnginePacket::Upgrade,
            '6' => EnginePacket::Noop,
            kind => {
                return Err(PacketError::UnknownType {
                    layer: "engine.io",
                    kind,
                })
            }
        })
    }

    pub fn encode(&self) -> String {
        match self {
            EnginePacket::Open(_) => "0".to_string(),
            EnginePacket::Close => "1".to_string(),
            EnginePacket::Ping => "2".to_string(),
            EnginePacket::Pong => "3".to_string(),
            EnginePacket::Message(data) => format!("4{data}"),
            EnginePacket::Upgrade => "5".to_string(),
            EnginePacket::Noop => "6".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    Connect {
        namespace: String,
        data: Option<Value>,
    },
    Disconnect {
        namespace: String,
    },
    Event {
        namespace: String,
        id: Option<u64>,
        name: String,
        args: Vec<Value>,
    },
    Ack {
        namespace: String,
        id: u64,
        args: Vec<Value>,
    },
    ConnectError {
        namespace: String,
        data: Option<Value>,
    },
}

impl SocketPacket {
    pub fn namespace(&self) -> &str {
        match self {
            SocketPacket::Connect { namespace, .. }
            | SocketPacket::Disconnect { namespace }
            | SocketPacket::Event { namespace, .. }
            | SocketPacket::Ack { namespace, .. }
            | SocketPacket::ConnectError { namespace, .. } => namespace,
        }
    }

    /// Decodes the payload of an Engine.IO `message`:
    /// `<type>[<namespace>,][<ack id>][<json>]`.
    pub fn decode(data: &str) -> Result<Self, PacketError> {
        let mut chars = data.chars();
        let kind = chars.next().ok_or(PacketError::Empty)?;
        let mut rest = chars.as_str();

        if matches!(kind, '5' | '6') {
            return Err(PacketError::Unsupported("binary socket.io packet"));
        }

        let namespace = if rest.starts_with('/') {
            let (ns, tail) = rest.split_once(',').unwrap_or((rest, ""));
            rest = tail;
            ns.to_string()
        } else {
            "/".to_string()
        };

        let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
        let id = if digits > 0 {
            let (num, tail) = rest.split_at(digits);
            rest = tail;
            num.parse::<u64>().ok()
        } else {
            None
        };

        let json: Option<Value> = if rest.trim().is_empty() {
            None
        } else {
            Some(serde_json::from_str(rest)?)
        };

        Ok(match kind {
            '0' => SocketPacket::Connect {
                namespace,
                data: json,
            },
            '1' => SocketPacket::Disconnect { namespace },
            '2' => {
                let mut args = match json {
                    Some(Value::Array(items)) => items,
                    _ => return Err(PacketError::MissingEventName),
                };
                if args.is_empty() {
                    return Err(PacketError::MissingEventName);
                }
                let name = match args.remove(0) {
                    Value::String(name) => name,
                    _ => return Err(PacketError::MissingEventName),
                };
                SocketPacket::Event {
                    namespace,
                    id,
                    name,
                    args,
                }
            }
            '3' => SocketPacket::Ack {
                namespace,
                id: id.ok_or(PacketError::Unsupported("ack without id"))?,
                args: match json {
                    Some(Value::Array(items)) => items,
                    _ => Vec::new(),
                },
            },
            '4' => SocketPacket::ConnectError {
                namespace,
                data: json,
            },
            kind => {
                return Err(PacketError::UnknownType {
                    layer: "socket.io",
                    kind,
                })
            }
        })
    }

    pub fn encode(&self) -> String {
        let (kind, namespace, id, json) = match self {
            SocketPacket::Connect { namespace, data } => ('0', namespace, None, data.clone()),
            SocketPacket::Disconnect { namespace } => ('1', namespace, None, None),
            SocketPacket::Event {
                namespace,
                id,
                name,
                args,
            } => {
                let mut items = vec![Value::String(name.clone())];
                items.extend(args.iter().cloned());
                ('2', namespace, *id, Some(Value::Array(items)))
            }
            SocketPacket::Ack {
                namespace,
                id,
                args,
            } => ('3', namespace, Some(*id), Some(Value::Array(args.clone()))),
            SocketPacket::ConnectError { namespace, data } => ('4', namespace, None, data.clone()),
        };

        let mut out = String::new();
        out.push(kind);
        if namespace != "/" {
            out.push_str(namespace);
            out.push(',');
        }
        if let Some(id) = id {
            out.push_str(&id.to_string());
        }
        if let Some(json) = json {
            out.push_str(&json.to_string());
        }
        out
    }

    /// Wraps this packet in an Engine.IO `message` frame.
    pub fn to_frame(&self) -> String {
        EnginePacket::Message(self.encode()).encode()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_open_handshake() {
        let frame = r#"0{"sid":"lv_VI97HAXpY6yYWAAAC","upgrades":[],"pingInterval":25000,"pingTimeout":20000,"maxPayload":1000000}"#;
        match EnginePacket::decode(frame).unwrap() {
            EnginePacket::Open(h) => {
                assert_eq!(h.sid, "lv_VI97HAXpY6yYWAAAC");
                assert_eq!(h.ping_interval, 25000);
                assert_eq!(h.heartbeat_deadline_ms(), 45000);
                assert_eq!(h.max_payload, Some(1_000_000));
            }
            other => panic!("expected open, got {other:?}"),
        }
    }

    #[test]
    fn decodes_control_packets() {
        assert_eq!(EnginePacket::decode("2").unwrap(), EnginePacket::Ping);
        assert_eq!(EnginePacket::decode("3").unwrap(), EnginePacket::Pong);
        assert_eq!(EnginePacket::decode("1").unwrap(), EnginePacket::Close);
        assert_eq!(EnginePacket::decode("6").unwrap(), EnginePacket::Noop);
        assert_eq!(
            EnginePacket::decode("40").unwrap(),
            EnginePacket::Message("0".into())
        );
        assert!(matches!(EnginePacket::decode(""), Err(PacketError::Empty)));
        assert!(matches!(
            EnginePacket::decode("9"),
            Err(PacketError::UnknownType { kind: '9', .. })
        ));
        assert_eq!(EnginePacket::Pong.encode(), "3");
    }

    #[test]
    fn decodes_event_with_payload() {
        let p = SocketPacket::decode(r#"2["download-progress",{"url":"u","progress":12}]"#).unwrap();
        assert_eq!(
            p,
            SocketPacket::Event {
                namespace: "/".into(),
                id: None,
                name: "download-progress".into(),
                args: vec![json!({"url": "u", "progress": 12})],
            }
        );
    }

    #[test]
    fn decodes_namespace_and_ack_id() {
        let p = SocketPacket::decode(r#"2/jobs,17["download-complete",{"url":"u","success":true}]"#)
            .unwrap();
        match p {
            SocketPacket::Event {
                namespace, id, name, ..
            } => {
                assert_eq!(namespace, "/jobs");
                assert_eq!(id, Some(17));
                assert_eq!(name, "download-complete");
            }
            other => panic!("expected event, got {other:?}"),
        }
    }

    #[test]
    fn decodes_connect_ack_with_sid() {
        let p = SocketPacket::decode(r#"0{"sid":"wZX3oN0bSVIhsaknAAAI"}"#).unwrap();
        assert_eq!(
            p,
            SocketPacket::Connect {
                namespace: "/".into(),
                data: Some(json!({"sid": "wZX3oN0bSVIhsaknAAAI"})),
            }
        );
        assert_eq!(
            SocketPacket::decode("1/jobs,").unwrap(),
            SocketPacket::Disconnect {
                namespace: "/jobs".into()
            }
        );
    }

    #[test]
    fn rejects_malformed_events() {
        assert!(matches!(
            SocketPacket::decode("2{}"),
            Err(PacketError::MissingEventName)
        ));
        assert!(matches!(
            SocketPacket::decode("2[]"),
            Err(PacketError::MissingEventName)
        ));
        assert!(matches!(
            SocketPacket::decode("2[42]"),
            Err(PacketError::MissingEventName)
        ));
        assert!(matches!(SocketPacket::decode("2[\"x\""), Err(PacketError::Json(_))));
        assert!(matches!(
            SocketPacket::decode(r#"51-["upload",{"_placeholder":true,"num":0}]"#),
            Err(PacketError::Unsupported(_))
        ));
    }

    #[test]
    fn encodes_connect_and_ack_frames() {
        let root = SocketPacket::Connect {
            namespace: "/".into(),
            data: None,
        };
        assert_eq!(root.to_frame(), "40");

        let ns = SocketPacket::Connect {
            namespace: "/jobs".into(),
            data: None,
        };
        assert_eq!(ns.to_frame(), "40/jobs,");

        let ack = SocketPacket::Ack {
            namespace: "/".into(),
            id: 5,
            args: vec![],
        };
        assert_eq!(ack.to_frame(), "435[]");
    }
}
