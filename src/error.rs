use thiserror::Error;

pub const INVALID_URL_MESSAGE: &str = "Please enter a valid YouTube URL";
pub const GENERIC_FAILURE: &str = "Download failed. Please try again.";

/// Why `POST /download` did not produce an acknowledgement.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The request never got a response (server down, CORS, offline).
    #[error("Cannot reach the download server: {0}")]
    Unreachable(String),

    /// Non-2xx status; `error` is the server's own explanation, if any.
    #[error("Server responded with status {status}")]
    Status { status: u16, error: Option<String> },
}

impl ApiError {
    /// Messages we classified ourselves, written for the user.
    pub fn friendly_message(&self) -> Option<String> {
        match self {
            ApiError::Unreachable(_) => Some(
                "Could not connect to the download server. Check that the backend is running and reachable"
                    .to_string(),
            ),
            ApiError::Status { .. } => None,
        }
    }

    pub fn server_error(&self) -> Option<&str> {
        match self {
            ApiError::Status { error: Some(e), .. } if !e.trim().is_empty() => Some(e.as_str()),
            _ => None,
        }
    }

    /// Most specific text available: friendly, then server, then generic.
    pub fn describe(&self) -> String {
        self.friendly_message()
            .or_else(|| self.server_error().map(str::to_string))
            .unwrap_or_else(|| GENERIC_FAILURE.to_string())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    #[error("{}", INVALID_URL_MESSAGE)]
    InvalidUrl,
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Text before the first `.`, used for the one-line banner.
pub fn first_sentence(text: &str) -> &str {
    text.split('.').next().unwrap_or(text)
}

pub fn failure_banner(detail: &str) -> String {
    format!("Download failed: {}", first_sentence(detail))
}
