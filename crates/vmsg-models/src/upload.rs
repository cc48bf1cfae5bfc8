//! Upload request model.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Direction of a video message. User-recorded messages are always
/// `Sent`; `Received` exists for the gallery's remote records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum MessageDirection {
    #[default]
    Sent,
    Received,
}

impl fmt::Display for MessageDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MessageDirection::Sent => "sent",
            MessageDirection::Received => "received",
        };
        write!(f, "{}", s)
    }
}

/// A validated request handed to the remote storage collaborator.
///
/// Never dispatched while the title is empty after trimming or while
/// the caller is unauthenticated; the upload gate enforces both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct UploadRequest {
    /// Message title, non-empty after whitespace trimming
    pub title: String,
    /// Local path of the final (possibly transcoded) asset
    pub asset_uri: PathBuf,
    /// Clip length rounded to the nearest second, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u64>,
    /// Asset size from filesystem metadata, when available
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size_bytes: Option<u64>,
    /// Fixed to `Sent` for user recordings
    #[serde(default)]
    pub direction: MessageDirection,
}

impl UploadRequest {
    pub fn new(title: impl Into<String>, asset_uri: impl Into<PathBuf>) -> Self {
        Self {
            title: title.into(),
            asset_uri: asset_uri.into(),
            duration_seconds: None,
            file_size_bytes: None,
            direction: MessageDirection::Sent,
        }
    }

    /// Whether the title survives whitespace trimming.
    pub fn has_title(&self) -> bool {
        !self.title.trim().is_empty()
    }

    pub fn with_duration_seconds(mut self, secs: u64) -> Self {
        self.duration_seconds = Some(secs);
        self
    }

    pub fn with_file_size_bytes(mut self, bytes: u64) -> Self {
        self.file_size_bytes = Some(bytes);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_trimming() {
        assert!(UploadRequest::new("For Grandma", "a.mp4").has_title());
        assert!(!UploadRequest::new("", "a.mp4").has_title());
        assert!(!UploadRequest::new("   \t\n", "a.mp4").has_title());
    }

    #[test]
    fn test_direction_defaults_to_sent() {
        let req = UploadRequest::new("hi", "a.mp4");
        assert_eq!(req.direction, MessageDirection::Sent);
    }

    #[test]
    fn test_optional_metadata_omitted_from_json() {
        let req = UploadRequest::new("hi", "a.mp4");
        let json = serde_json::to_string(&req).unwrap();
        assert!(!json.contains("duration_seconds"));
        assert!(!json.contains("file_size_bytes"));

        let json = serde_json::to_string(&req.with_duration_seconds(12)).unwrap();
        assert!(json.contains("\"duration_seconds\":12"));
    }
}
