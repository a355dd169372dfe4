//! User-facing notifications.

use serde::Serialize;
use tokio::sync::broadcast;

use photoglow_common::error::{ErrorKind, PhotoglowError};

pub const SELECT_SONG_FIRST: &str = "Select a song first!";
pub const ENGINE_LOADING: &str = "Video engine loading... wait 5s";
pub const EXPORT_FAILED: &str = "Video creation failed. It might be blocked by the audio source.";
pub const REMOVAL_FAILED: &str = "Could not remove background.";
pub const REMOVAL_SUCCEEDED: &str = "Background Removed Successfully!";
pub const AUTO_ENHANCED: &str = "Auto Enhanced!";
pub const EXPORT_SUCCEEDED: &str = "Video Downloaded Successfully!";

/// How prominently a notice is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    /// Transient confirmation.
    Toast,
    /// Blocking message the user must acknowledge.
    Alert,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn toast(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Toast,
            message: message.into(),
        }
    }

    pub fn alert(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Alert,
            message: message.into(),
        }
    }

    /// The alert for a failed export, if the user should see one.
    ///
    /// Refused preconditions map to their own message; a missing image or a
    /// busy studio means the export control was not available, so those stay
    /// silent. Every failure after work started gets the generic alert.
    pub fn for_export_error(err: &PhotoglowError) -> Option<Self> {
        if !err.is_precondition() {
            return Some(Self::alert(EXPORT_FAILED));
        }
        match err {
            PhotoglowError::NoTrackSelected => Some(Self::alert(SELECT_SONG_FIRST)),
            PhotoglowError::EngineNotReady { .. } => Some(Self::alert(ENGINE_LOADING)),
            _ => None,
        }
    }

    /// The alert for a failed background removal, if the user should see one.
    pub fn for_removal_error(err: &PhotoglowError) -> Option<Self> {
        match err.kind() {
            ErrorKind::Precondition => None,
            _ => Some(Self::alert(REMOVAL_FAILED)),
        }
    }
}

/// Fan-out of notices to any number of listeners.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: broadcast::Sender<Notice>,
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.tx.subscribe()
    }

    pub fn publish(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Toast => tracing::info!(message = %notice.message, "Toast"),
            NoticeLevel::Alert => tracing::warn!(message = %notice.message, "Alert"),
        }
        // nobody listening is fine
        let _ = self.tx.send(notice);
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_error_mapping() {
        assert_eq!(
            Notice::for_export_error(&PhotoglowError::NoTrackSelected),
            Some(Notice::alert(SELECT_SONG_FIRST))
        );
        assert_eq!(
            Notice::for_export_error(&PhotoglowError::engine_not_ready("loading")),
            Some(Notice::alert(ENGINE_LOADING))
        );
        assert_eq!(
            Notice::for_export_error(&PhotoglowError::fetch("HTTP 403")),
            Some(Notice::alert(EXPORT_FAILED))
        );
        assert_eq!(
            Notice::for_export_error(&PhotoglowError::encode("exit 1")),
            Some(Notice::alert(EXPORT_FAILED))
        );
        assert_eq!(Notice::for_export_error(&PhotoglowError::NoImage), None);
        assert_eq!(Notice::for_export_error(&PhotoglowError::busy("export")), None);
    }

    #[test]
    fn test_removal_error_mapping() {
        assert_eq!(
            Notice::for_removal_error(&PhotoglowError::background_removal("model")),
            Some(Notice::alert(REMOVAL_FAILED))
        );
        assert_eq!(
            Notice::for_removal_error(&PhotoglowError::image_decode("bad cutout")),
            Some(Notice::alert(REMOVAL_FAILED))
        );
        assert_eq!(Notice::for_removal_error(&PhotoglowError::NoImage), None);
        assert_eq!(Notice::for_removal_error(&PhotoglowError::busy("export")), None);
    }

    #[test]
    fn test_publish_reaches_subscribers() {
        let notifier = Notifier::default();
        notifier.publish(Notice::toast("unheard"));

        let mut rx = notifier.subscribe();
        notifier.publish(Notice::toast(AUTO_ENHANCED));
        assert_eq!(rx.try_recv().unwrap(), Notice::toast(AUTO_ENHANCED));
        assert!(rx.try_recv().is_err());
    }
}
