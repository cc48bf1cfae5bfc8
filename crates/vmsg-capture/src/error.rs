//! Capture error types.

use thiserror::Error;

pub type CaptureResult<T> = Result<T, CaptureError>;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Camera or microphone permission missing")]
    PermissionMissing,

    #[error("Camera hardware not ready")]
    CameraNotReady,

    #[error("A recording is already in progress")]
    AlreadyRecording,

    #[error("Hardware error: {0}")]
    Hardware(String),
}

impl CaptureError {
    pub fn hardware(msg: impl Into<String>) -> Self {
        Self::Hardware(msg.into())
    }

    /// Transient errors revert the session to idle and allow an
    /// immediate retry; blocking errors require user remediation.
    pub fn is_transient(&self) -> bool {
        matches!(self, CaptureError::Hardware(_) | CaptureError::CameraNotReady)
    }
}
