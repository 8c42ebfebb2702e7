//! Backend push notifications over Socket.IO.
//!
//! `packet` and `channel` are plain protocol code; `socket` binds them to the
//! browser `WebSocket`.

pub mod channel;
pub mod packet;
#[cfg(target_arch = "wasm32")]
pub mod socket;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use url::Url;

pub const PROGRESS_EVENT: &str = "download-progress";
pub const COMPLETE_EVENT: &str = "download-complete";

const RECONNECT_BASE_MS: u32 = 1_000;
const RECONNECT_MAX_MS: u32 = 5_000;

/// Delay before reconnect attempt `attempt` (0-based): 1s, 2s, 4s, then 5s.
pub fn reconnect_delay_ms(attempt: u32) -> u32 {
    RECONNECT_BASE_MS
        .saturating_mul(1u32.checked_shl(attempt).unwrap_or(u32::MAX))
        .min(RECONNECT_MAX_MS)
}

#[derive(Error, Debug)]
pub enum PushError {
    #[error("invalid push endpoint: {0}")]
    Endpoint(#[from] url::ParseError),

    #[error("push endpoint must be http(s) or ws(s), got {0}")]
    Scheme(String),

    #[error("could not open websocket: {0}")]
    Socket(String),
}

/// A backend event about one download, keyed by the URL that was submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Progress {
        url: String,
        progress: u8,
    },
    Complete {
        url: String,
        success: bool,
        filename: Option<String>,
    },
}

#[derive(Deserialize)]
struct ProgressPayload {
    url: String,
    progress: f64,
}

#[derive(Deserialize)]
struct CompletePayload {
    url: String,
    success: bool,
    #[serde(default)]
    filename: Option<String>,
}

impl Notification {
    pub fn url(&self) -> &str {
        match self {
            Notification::Progress { url, .. } | Notification::Complete { url, .. } => url,
        }
    }

    /// `Ok(None)` for events this page does not listen to.
    pub fn from_event(name: &str, payload: Option<&Value>) -> Result<Option<Self>, serde_json::Error> {
        let payload = payload.cloned().unwrap_or(Value::Null);
        match name {
            PROGRESS_EVENT => {
                let p: ProgressPayload = serde_json::from_value(payload)?;
                Ok(Some(Notification::Progress {
                    url: p.url,
                    progress: clamp_percent(p.progress),
                }))
            }
            COMPLETE_EVENT => {
                let c: CompletePayload = serde_json::from_value(payload)?;
                Ok(Some(Notification::Complete {
                    url: c.url,
                    success: c.success,
                    filename: c.filename,
                }))
            }
            _ => Ok(None),
        }
    }
}

fn clamp_percent(p: f64) -> u8 {
    if p.is_nan() {
        return 0;
    }
    p.round().clamp(0.0, 100.0) as u8
}

/// Where to open the websocket and which namespace to join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub url: Url,
    pub namespace: String,
}

impl Endpoint {
    /// `http://host:3500` becomes `ws://host:3500/socket.io/?EIO=4&transport=websocket`.
    /// A path on the base URL selects the namespace, as socket.io clients do.
    pub fn from_backend_url(backend_url: &str) -> Result<Self, PushError> {
        let mut url = Url::parse(backend_url)?;
        let scheme = match url.scheme() {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            other => return Err(PushError::Scheme(other.to_string())),
        };
        url.set_scheme(scheme)
            .map_err(|_| PushError::Scheme(scheme.to_string()))?;

        let namespace = match url.path().trim_end_matches('/') {
            "" => "/".to_string(),
            ns => ns.to_string(),
        };

        url.set_path("/socket.io/");
        url.set_query(Some("EIO=4&transport=websocket"));
        url.set_fragment(None);
        Ok(Self { url, namespace })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn progress_payload_is_rounded_and_clamped() {
        let n = Notification::from_event(PROGRESS_EVENT, Some(&json!({"url": "u", "progress": 42.6})))
            .unwrap()
            .unwrap();
        assert_eq!(
            n,
            Notification::Progress {
                url: "u".into(),
                progress: 43
            }
        );
        let over = Notification::from_event(PROGRESS_EVENT, Some(&json!({"url": "u", "progress": 140})))
            .unwrap()
            .unwrap();
        assert!(matches!(over, Notification::Progress { progress: 100, .. }));
        let under = Notification::from_event(PROGRESS_EVENT, Some(&json!({"url": "u", "progress": -3})))
            .unwrap()
            .unwrap();
        assert!(matches!(under, Notification::Progress { progress: 0, .. }));
    }

    #[test]
    fn completion_filename_is_optional() {
        let n = Notification::from_event(COMPLETE_EVENT, Some(&json!({"url": "u", "success": false})))
            .unwrap()
            .unwrap();
        assert_eq!(
            n,
            Notification::Complete {
                url: "u".into(),
                success: false,
                filename: None
            }
        );
        assert_eq!(n.url(), "u");
    }

    #[test]
    fn unknown_events_are_skipped_and_bad_payloads_rejected() {
        assert_eq!(Notification::from_event("chat", Some(&json!({}))).unwrap(), None);
        assert!(Notification::from_event(PROGRESS_EVENT, Some(&json!({"url": 1}))).is_err());
        assert!(Notification::from_event(COMPLETE_EVENT, None).is_err());
    }

    #[test]
    fn reconnect_delay_doubles_up_to_cap() {
        let delays: Vec<u32> = (0..5).map(reconnect_delay_ms).collect();
        assert_eq!(delays, vec![1_000, 2_000, 4_000, 5_000, 5_000]);
        assert_eq!(reconnect_delay_ms(40), 5_000);
    }

    #[test]
    fn endpoint_from_http_base() {
        let ep = Endpoint::from_backend_url("http://localhost:3500").unwrap();
        assert_eq!(
            ep.url.as_str(),
            "ws://localhost:3500/socket.io/?EIO=4&transport=websocket"
        );
        assert_eq!(ep.namespace, "/");
    }

    #[test]
    fn endpoint_from_https_base_with_namespace() {
        let ep = Endpoint::from_backend_url("https://dl.example.com/jobs/").unwrap();
        assert_eq!(
            ep.url.as_str(),
            "wss://dl.example.com/socket.io/?EIO=4&transport=websocket"
        );
        assert_eq!(ep.namespace, "/jobs");
    }

    #[test]
    fn endpoint_rejects_other_schemes() {
        assert!(matches!(
            Endpoint::from_backend_url("ftp://example.com"),
            Err(PushError::Scheme(_))
        ));
        assert!(matches!(
            Endpoint::from_backend_url("not a url"),
            Err(PushError::Endpoint(_))
        ));
    }
}
