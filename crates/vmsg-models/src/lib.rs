//! Shared data models for the Keepsake video message pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - The bounded-duration recording session state machine
//! - Edit parameters (crop aspect, color filter, text overlay)
//! - The pure render model shared by live preview and playback
//! - Transcode jobs and trim ranges
//! - Upload requests

pub mod edit;
pub mod job;
pub mod render;
pub mod session;
pub mod upload;

// Re-export common types
pub use edit::{
    ColorFilter, CropAspect, CropAspectParseError, OverlayPosition, OverlaySize, OverlayTone,
    TextOverlay,
};
pub use job::{EncoderAttempt, TranscodeJob, TranscodeStatus, TrimRange};
pub use render::{crop_rect, overlay_color, text_placement, CropRect, Rgba, TextPlacement};
pub use session::{RecordingSession, RecordingStatus, MAX_RECORDING_MS, TICK_INTERVAL_MS};
pub use upload::{MessageDirection, UploadRequest};
