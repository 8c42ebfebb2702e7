use crate::download::session::SessionAction;
use crate::error::{ApiError, SubmitError};
use crate::types::{DownloadRequest, Quality, StartResponse};
use crate::utils::url::is_valid_youtube_url;

/// The one backend call the page makes. Implemented over HTTP in `api`.
#[allow(async_fn_in_trait)]
pub trait DownloadApi {
    async fn start_download(&self, request: &DownloadRequest) -> Result<StartResponse, ApiError>;
}

/// Validates, announces the new target, then issues exactly one request.
///
/// Every state change goes through `dispatch`, so the caller owns the
/// session (a Yew reducer in the page, a plain value in tests).
pub async fn submit<A, D>(
    api: &A,
    url: &str,
    quality: Quality,
    socket_id: Option<String>,
    dispatch: D,
) -> Result<StartResponse, SubmitError>
where
    A: DownloadApi,
    D: Fn(SessionAction),
{
    // One string for validation, correlation and the wire.
    let url = url.trim();
    if !is_valid_youtube_url(url) {
        dispatch(SessionAction::Rejected);
        return Err(SubmitError::InvalidUrl);
    }

    let url = url.to_string();
    dispatch(SessionAction::Begin { url: url.clone() });

    let request = DownloadRequest {
        url: url.clone(),
        quality,
        socket_id,
    };
    match api.start_download(&request).await {
        Ok(resp) => {
            dispatch(SessionAction::Acknowledged {
                url,
                message: resp.message.clone(),
            });
            Ok(resp)
        }
        Err(err) => {
            dispatch(SessionAction::Failed {
                url,
                detail: err.describe(),
            });
            Err(err.into())
        }
    }
}
