//! Compose-flow orchestration for video messages.
//!
//! This crate is the host-facing surface of the pipeline:
//! - [`EditSession`] and [`PreviewController`] hold edit state and keep
//!   preview playback looping inside the trim window.
//! - [`UploadGate`] validates and dispatches one submission at a time.
//! - [`MessagePipeline`] wires permissions, export, and upload into the
//!   confirm-and-send flow.
//! - [`Notice`] and [`NoticeSink`] carry user-facing conditions to the
//!   host UI.
//!
//! Host capabilities (playback, identity, navigation, chrome) are
//! collaborator traits so the whole flow is testable without a device.

pub mod config;
pub mod edit;
pub mod error;
pub mod focus;
pub mod gate;
pub mod logging;
pub mod notice;
pub mod pipeline;

pub use config::PipelineConfig;
pub use edit::{
    EditSession, PlaybackEngine, PlaybackStatus, PreviewController, MIN_CLIP_MS, POSITION_TICK_MS,
};
pub use error::{PipelineError, PipelineResult, ValidationError};
pub use focus::{FocusGuard, HostChrome};
pub use gate::{AuthProvider, HostNavigator, SendReceipt, UploadGate};
pub use notice::{notice_for, Notice, NoticeKind, NoticeSink, Remediation};
pub use pipeline::MessagePipeline;
