//! Pipeline configuration.

use std::path::PathBuf;

use vmsg_models::MAX_RECORDING_MS;

use crate::edit::MIN_CLIP_MS;

/// Runtime configuration for the message pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory transcode attempts write into
    pub scratch_dir: PathBuf,
    /// Hard recording cap in milliseconds
    pub max_recording_ms: u64,
    /// Minimum trim window width in milliseconds
    pub min_clip_ms: u64,
    /// Per-attempt encoder timeout in seconds
    pub encode_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            scratch_dir: std::env::temp_dir().join("vmsg-exports"),
            max_recording_ms: MAX_RECORDING_MS,
            min_clip_ms: MIN_CLIP_MS,
            encode_timeout_secs: 120,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            scratch_dir: std::env::var("VMSG_SCRATCH_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.scratch_dir),
            max_recording_ms: env_u64("VMSG_MAX_RECORDING_MS", defaults.max_recording_ms),
            min_clip_ms: env_u64("VMSG_MIN_CLIP_MS", defaults.min_clip_ms),
            encode_timeout_secs: env_u64("VMSG_ENCODE_TIMEOUT_SECS", defaults.encode_timeout_secs),
        }
    }
}

fn env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
