//! Pipeline error types.

use thiserror::Error;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Pre-upload validation failures.
///
/// Each variant carries the exact user-facing message; the upload gate
/// reports the first failing check only.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Add a title before sending")]
    EmptyTitle,

    #[error("Recording file is missing or unreadable")]
    AssetUnreadable,
}

/// Errors that can occur in the message pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Camera or microphone permission missing")]
    PermissionDenied,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Sign in to send a message")]
    Unauthenticated,

    #[error("An upload is already in progress")]
    UploadBusy,

    #[error("Playback error: {0}")]
    Playback(String),

    #[error(transparent)]
    Capture(#[from] vmsg_capture::CaptureError),

    #[error(transparent)]
    Media(#[from] vmsg_media::MediaError),

    #[error("Upload failed: {0}")]
    Upload(#[from] vmsg_storage::StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub fn playback(msg: impl Into<String>) -> Self {
        Self::Playback(msg.into())
    }

    /// Whether the user can retry the same action and plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Upload(_) | Self::UploadBusy | Self::Io(_) | Self::Media(_)
        )
    }

    /// Whether the error blocks the flow until the user intervenes.
    pub fn is_blocking(&self) -> bool {
        matches!(self, Self::PermissionDenied | Self::Unauthenticated)
    }
}
