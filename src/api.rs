use crate::config::Config;
use crate::download::coordinator::DownloadApi;
use crate::error::ApiError;
use crate::types::{DownloadRequest, ErrorBody, StartResponse};

/// `DownloadApi` over HTTP. On wasm32 reqwest goes through `fetch`.
#[derive(Clone, Debug)]
pub struct HttpApi {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpApi {
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config.download_endpoint(),
        }
    }
}

impl PartialEq for HttpApi {
    fn eq(&self, other: &Self) -> bool {
        self.endpoint == other.endpoint
    }
}

impl DownloadApi for HttpApi {
    async fn start_download(&self, request: &DownloadRequest) -> Result<StartResponse, ApiError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| ApiError::Unreachable(e.to_string()))?;

        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .map_err(|e| ApiError::Unreachable(e.to_string()))?;
        interpret(status, &body)
    }
}

/// Maps a raw response onto the acknowledgement or a typed error.
/// A 2xx body that is not JSON still counts as an acknowledgement.
fn interpret(status: u16, body: &str) -> Result<StartResponse, ApiError> {
    if (200..300).contains(&status) {
        return Ok(serde_json::from_str(body).unwrap_or_default());
    }
    let error = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error);
    Err(ApiError::Status { status, error })
}
