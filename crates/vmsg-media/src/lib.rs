//! FFmpeg orchestration for message export.
//!
//! This crate treats encoding as an external capability: it builds
//! encoder command lines, runs the process, verifies the declared
//! output, and escalates primary -> fallback -> original when the
//! encoder cannot deliver. It never implements a codec.

pub mod command;
pub mod error;
pub mod probe;
pub mod profile;
pub mod transcode;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use probe::{probe_video, VideoInfo};
pub use profile::EncodeProfile;
pub use transcode::{
    crop_filter_expr, EncoderBackend, ExportOutcome, ExportRequest, FfmpegBackend, TranscodeEngine,
};
