use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum Quality {
    #[serde(rename = "4k")]
    Uhd4k,
    #[serde(rename = "1080p")]
    FullHd,
    #[default]
    #[serde(rename = "best")]
    Best,
}

impl Quality {
    pub const ALL: [Quality; 3] = [Quality::Uhd4k, Quality::FullHd, Quality::Best];

    /// Wire value, also used as the `<option>` value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Quality::Uhd4k => "4k",
            Quality::FullHd => "1080p",
            Quality::Best => "best",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Quality::Uhd4k => "4K (2160p)",
            Quality::FullHd => "Full HD (1080p)",
            Quality::Best => "Best Available",
        }
    }

    pub fn from_value(value: &str) -> Option<Quality> {
        Quality::ALL.into_iter().find(|q| q.as_str() == value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DownloadStatus {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

impl DownloadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DownloadStatus::Idle => "idle",
            DownloadStatus::Loading => "loading",
            DownloadStatus::Success => "success",
            DownloadStatus::Error => "error",
        }
    }
}

/// Body of `POST /download`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadRequest {
    pub url: String,
    pub quality: Quality,
    /// Push channel id the backend routes progress to. Omitted while disconnected.
    #[serde(rename = "socketId", skip_serializing_if = "Option::is_none")]
    pub socket_id: Option<String>,
}

/// 2xx acknowledgement; the download itself finishes later over the push channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StartResponse {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}
