use std::rc::Rc;

use yew::Reducible;

use crate::error::{failure_banner, INVALID_URL_MESSAGE};
use crate::push::Notification;
use crate::types::DownloadStatus;

pub const STARTING_MESSAGE: &str = "Starting download process...";
pub const ACKNOWLEDGED_MESSAGE: &str = "Download started...";
pub const COMPLETE_MESSAGE: &str = "Download complete!";
pub const REMOTE_FAILURE_MESSAGE: &str = "Download failed.";

/// The URL whose notifications are currently accepted. At most one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveTarget(Option<String>);

impl ActiveTarget {
    pub fn track(&mut self, url: impl Into<String>) {
        self.0 = Some(url.into());
    }

    pub fn get(&self) -> Option<&str> {
        self.0.as_deref()
    }

    pub fn matches(&self, url: &str) -> bool {
        self.0.as_deref() == Some(url)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Submit with a URL that failed validation.
    Rejected,
    /// Submit with a valid URL; the request is about to go out.
    Begin { url: String },
    /// 2xx from `POST /download` for `url`.
    Acknowledged { url: String, message: Option<String> },
    /// Request for `url` failed; `detail` is the full error text.
    Failed { url: String, detail: String },
    Notify(Notification),
    Reset,
}

/// Everything the card renders, plus the correlation key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadSession {
    pub status: DownloadStatus,
    pub progress: u8,
    pub message: String,
    pub detailed_error: Option<String>,
    pub result_filename: Option<String>,
    target: ActiveTarget,
}

impl DownloadSession {
    pub fn current_target(&self) -> Option<&str> {
        self.target.get()
    }

    pub fn is_loading(&self) -> bool {
        self.status == DownloadStatus::Loading
    }

    /// The play affordance only exists for a finished file.
    pub fn playable_file(&self) -> Option<&str> {
        match self.status {
            DownloadStatus::Success => self.result_filename.as_deref(),
            _ => None,
        }
    }

    pub fn troubleshooting(&self) -> Option<&str> {
        match self.status {
            DownloadStatus::Error => self.detailed_error.as_deref().filter(|d| !d.is_empty()),
            _ => None,
        }
    }

    pub fn apply(&mut self, action: SessionAction) {
        match action {
            SessionAction::Rejected => {
                self.clear_outcome();
                self.status = DownloadStatus::Error;
                self.message = INVALID_URL_MESSAGE.to_string();
            }
            SessionAction::Begin { url } => {
                self.clear_outcome();
                self.target.track(url);
                self.status = DownloadStatus::Loading;
                self.message = STARTING_MESSAGE.to_string();
            }
            SessionAction::Acknowledged { url, message } => {
                if !self.target.matches(&url) || self.status != DownloadStatus::Loading {
                    return;
                }
                self.message = message
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| ACKNOWLEDGED_MESSAGE.to_string());
            }
            SessionAction::Failed { url, detail } => {
                if !self.target.matches(&url) {
                    return;
                }
                self.status = DownloadStatus::Error;
                self.message = failure_banner(&detail);
                self.detailed_error = Some(detail);
            }
            SessionAction::Notify(notification) => self.notify(notification),
            SessionAction::Reset => *self = Self::default(),
        }
    }

    fn notify(&mut self, notification: Notification) {
        if !self.target.matches(notification.url()) {
            return;
        }
        match notification {
            Notification::Progress { progress, .. } => {
                self.progress = progress;
            }
            Notification::Complete {
                success, filename, ..
            } => {
                self.progress = 100;
                if success {
                    self.status = DownloadStatus::Success;
                    self.message = COMPLETE_MESSAGE.to_string();
                    if let Some(f) = filename.filter(|f| !f.is_empty()) {
                        self.result_filename = Some(f);
                    }
                } else {
                    self.status = DownloadStatus::Error;
                    self.message = REMOTE_FAILURE_MESSAGE.to_string();
                    self.result_filename = None;
                }
            }
        }
    }

    fn clear_outcome(&mut self) {
        self.progress = 0;
        self.message.clear();
        self.detailed_error = None;
        self.result_filename = None;
    }
}

impl Reducible for DownloadSession {
    type Action = SessionAction;

    fn reduce(self: Rc<Self>, action: Self::Action) -> Rc<Self> {
        let mut next = (*self).clone();
        next.apply(action);
        Rc::new(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: &str = "https://www.youtube.com/watch?v=aaaaaaaaaaa";
    const B: &str = "https://www.youtube.com/watch?v=bbbbbbbbbbb";

    fn progress(url: &str, p: u8) -> SessionAction {
        SessionAction::Notify(Notification::Progress {
            url: url.into(),
            progress: p,
        })
    }

    fn complete(url: &str, success: bool, filename: Option<&str>) -> SessionAction {
        SessionAction::Notify(Notification::Complete {
            url: url.into(),
            success,
            filename: filename.map(str::to_string),
        })
    }

    fn loading(url: &str) -> DownloadSession {
        let mut s = DownloadSession::default();
        s.apply(SessionAction::Begin { url: url.into() });
        s
    }

    #[test]
    fn begin_enters_loading_and_tracks_url() {
        let mut s = loading(A);
        s.apply(progress(A, 40));
        s.apply(SessionAction::Begin { url: A.into() });
        assert_eq!(s.status, DownloadStatus::Loading);
        assert_eq!(s.progress, 0);
        assert_eq!(s.message, STARTING_MESSAGE);
        assert_eq!(s.current_target(), Some(A));
    }

    #[test]
    fn rejected_sets_validation_error_without_tracking() {
        let mut s = DownloadSession::default();
        s.apply(SessionAction::Rejected);
        assert_eq!(s.status, DownloadStatus::Error);
        assert_eq!(s.message, INVALID_URL_MESSAGE);
        assert_eq!(s.current_target(), None);
        assert_eq!(s.troubleshooting(), None);
    }

    #[test]
    fn progress_for_foreign_url_is_ignored() {
        let mut s = loading(A);
        s.apply(progress(A, 10));
        s.apply(progress(B, 50));
        assert_eq!(s.progress, 10);
        assert_eq!(s.status, DownloadStatus::Loading);
    }

    #[test]
    fn notifications_ignored_when_nothing_tracked() {
        let mut s = DownloadSession::default();
        s.apply(progress(A, 50));
        s.apply(complete(A, true, Some("x.mp4")));
        assert_eq!(s, DownloadSession::default());
    }

    #[test]
    fn successful_completion_records_filename() {
        let mut s = loading(A);
        s.apply(progress(A, 73));
        s.apply(complete(A, true, Some("x.mp4")));
        assert_eq!(s.status, DownloadStatus::Success);
        assert_eq!(s.progress, 100);
        assert_eq!(s.message, COMPLETE_MESSAGE);
        assert_eq!(s.result_filename.as_deref(), Some("x.mp4"));
        assert_eq!(s.playable_file(), Some("x.mp4"));
    }

    #[test]
    fn success_without_filename_is_not_playable() {
        let mut s = loading(A);
        s.apply(complete(A, true, None));
        assert_eq!(s.status, DownloadStatus::Success);
        assert_eq!(s.result_filename, None);
        assert_eq!(s.playable_file(), None);
    }

    #[test]
    fn failed_completion_leaves_filename_unset() {
        let mut s = loading(A);
        s.apply(complete(A, false, Some("partial.mp4")));
        assert_eq!(s.status, DownloadStatus::Error);
        assert_eq!(s.progress, 100);
        assert_eq!(s.message, REMOTE_FAILURE_MESSAGE);
        assert_eq!(s.result_filename, None);
        assert_eq!(s.detailed_error, None);
    }

    #[test]
    fn completion_is_idempotent() {
        let mut s = loading(A);
        s.apply(complete(A, true, Some("x.mp4")));
        let once = s.clone();
        s.apply(complete(A, true, Some("x.mp4")));
        assert_eq!(s, once);
    }

    #[test]
    fn reset_restores_defaults_and_drops_stray_events() {
        let mut s = loading(A);
        s.apply(SessionAction::Failed {
            url: A.into(),
            detail: "boom. more".into(),
        });
        s.apply(SessionAction::Reset);
        assert_eq!(s, DownloadSession::default());
        s.apply(progress(A, 99));
        s.apply(complete(A, true, Some("late.mp4")));
        assert_eq!(s, DownloadSession::default());
    }

    #[test]
    fn second_begin_supersedes_first_target() {
        let mut s = loading(A);
        s.apply(SessionAction::Begin { url: B.into() });
        assert_eq!(s.current_target(), Some(B));
        s.apply(progress(A, 80));
        s.apply(complete(A, true, Some("a.mp4")));
        assert_eq!(s.status, DownloadStatus::Loading);
        assert_eq!(s.progress, 0);
        assert_eq!(s.result_filename, None);
        s.apply(progress(B, 20));
        assert_eq!(s.progress, 20);
    }

    #[test]
    fn acknowledgement_keeps_loading() {
        let mut s = loading(A);
        s.apply(SessionAction::Acknowledged {
            url: A.into(),
            message: Some("Download queued".into()),
        });
        assert_eq!(s.status, DownloadStatus::Loading);
        assert_eq!(s.message, "Download queued");

        s.apply(SessionAction::Acknowledged {
            url: A.into(),
            message: None,
        });
        assert_eq!(s.message, ACKNOWLEDGED_MESSAGE);
    }

    #[test]
    fn late_acknowledgement_does_not_overwrite_completion() {
        let mut s = loading(A);
        s.apply(complete(A, true, Some("x.mp4")));
        s.apply(SessionAction::Acknowledged {
            url: A.into(),
            message: Some("Download started".into()),
        });
        assert_eq!(s.message, COMPLETE_MESSAGE);
    }

    #[test]
    fn failure_splits_banner_and_detail() {
        let mut s = loading(A);
        s.apply(SessionAction::Failed {
            url: A.into(),
            detail: "Video unavailable. This video is private.".into(),
        });
        assert_eq!(s.status, DownloadStatus::Error);
        assert_eq!(s.message, "Download failed: Video unavailable");
        assert_eq!(
            s.troubleshooting(),
            Some("Video unavailable. This video is private.")
        );
    }

    #[test]
    fn responses_for_superseded_request_are_dropped() {
        let mut s = loading(A);
        s.apply(SessionAction::Begin { url: B.into() });
        s.apply(SessionAction::Failed {
            url: A.into(),
            detail: "old".into(),
        });
        s.apply(SessionAction::Acknowledged {
            url: A.into(),
            message: Some("old ack".into()),
        });
        assert_eq!(s.status, DownloadStatus::Loading);
        assert_eq!(s.message, STARTING_MESSAGE);
    }

    #[test]
    fn reducer_returns_new_state() {
        let start = Rc::new(DownloadSession::default());
        let next = start.clone().reduce(SessionAction::Begin { url: A.into() });
        assert_eq!(start.status, DownloadStatus::Idle);
        assert_eq!(next.status, DownloadStatus::Loading);
    }
}
