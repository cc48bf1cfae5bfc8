//! User-facing notices and error-to-notice mapping.

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::warn;

use crate::error::{PipelineError, ValidationError};

/// Severity class of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Warning,
    Error,
}

/// Action the UI can offer alongside a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Remediation {
    /// Deep-link to the OS settings page for this app
    OpenSettings,
    SignIn,
    Retry,
}

/// One user-facing notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    /// Persistent notices stay until the underlying condition clears
    pub dismissible: bool,
    pub remediation: Option<Remediation>,
    pub created_at: DateTime<Utc>,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            message: message.into(),
            dismissible: true,
            remediation: None,
            created_at: Utc::now(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Warning,
            message: message.into(),
            dismissible: true,
            remediation: None,
            created_at: Utc::now(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
            dismissible: true,
            remediation: None,
            created_at: Utc::now(),
        }
    }

    pub fn persistent(mut self) -> Self {
        self.dismissible = false;
        self
    }

    pub fn with_remediation(mut self, remediation: Remediation) -> Self {
        self.remediation = Some(remediation);
        self
    }
}

/// Map a pipeline error to the notice the UI should show.
pub fn notice_for(err: &PipelineError) -> Notice {
    match err {
        PipelineError::PermissionDenied => {
            Notice::error("Allow camera and microphone access to record a message")
                .persistent()
                .with_remediation(Remediation::OpenSettings)
        }
        PipelineError::Unauthenticated => {
            Notice::error(err.to_string()).with_remediation(Remediation::SignIn)
        }
        PipelineError::Validation(ValidationError::EmptyTitle) => Notice::warning(err.to_string()),
        PipelineError::Validation(ValidationError::AssetUnreadable) => {
            Notice::error(err.to_string())
        }
        PipelineError::UploadBusy => Notice::info(err.to_string()),
        _ if err.is_retryable() => {
            Notice::error(err.to_string()).with_remediation(Remediation::Retry)
        }
        _ => Notice::error(err.to_string()),
    }
}

/// Fan-out channel the pipeline publishes notices on.
#[derive(Clone)]
pub struct NoticeSink {
    tx: mpsc::UnboundedSender<Notice>,
}

impl NoticeSink {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn publish(&self, notice: Notice) {
        if self.tx.send(notice).is_err() {
            warn!("Notice dropped, no UI receiver attached");
        }
    }

    pub fn publish_error(&self, err: &PipelineError) {
        self.publish(notice_for(err));
    }
}
