//! Transcode job types.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Which encode profile a job attempt is using.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EncoderAttempt {
    /// Modern high-efficiency codec
    Primary,
    /// Broadly compatible lower-efficiency codec
    Fallback,
}

impl fmt::Display for EncoderAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EncoderAttempt::Primary => "primary",
            EncoderAttempt::Fallback => "fallback",
        };
        write!(f, "{}", s)
    }
}

/// Lifecycle of a transcode job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum TranscodeStatus {
    #[default]
    Pending,
    Running,
    Succeeded,
    Failed,
}

/// A trim sub-interval in whole seconds, as fed to the encoder.
///
/// `end > start` holds by construction: the conversion from
/// milliseconds floors the start, and pushes the end to at least one
/// second past it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TrimRange {
    /// Start offset in whole seconds
    pub start_secs: u64,
    /// End offset in whole seconds
    pub end_secs: u64,
}

impl TrimRange {
    /// Convert a millisecond trim range to encoder seconds.
    pub fn from_ms(start_ms: u64, end_ms: u64) -> Self {
        let start_secs = start_ms / 1000;
        let end_secs = (end_ms / 1000).max(start_secs + 1);
        Self { start_secs, end_secs }
    }

    /// Clip length in seconds.
    pub fn duration_secs(&self) -> u64 {
        self.end_secs - self.start_secs
    }
}

/// A single transcode attempt over the recorded source.
///
/// Created only when the edit session indicates a non-trivial edit
/// (crop selected, or trim narrower than the full duration). The input
/// is read-only; every attempt writes to its own distinct output path.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TranscodeJob {
    /// Source asset (never written to)
    pub input: PathBuf,
    /// Output path for this attempt
    pub output: PathBuf,
    /// Crop filter expression, omitted for free aspect
    pub crop_filter: Option<String>,
    /// Trim range in whole seconds, omitted for full duration
    pub trim: Option<TrimRange>,
    /// Profile this attempt uses
    pub attempt: EncoderAttempt,
    /// Job lifecycle state
    #[serde(default)]
    pub status: TranscodeStatus,
}

impl TranscodeJob {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>, attempt: EncoderAttempt) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            crop_filter: None,
            trim: None,
            attempt,
            status: TranscodeStatus::Pending,
        }
    }

    pub fn with_crop_filter(mut self, filter: impl Into<String>) -> Self {
        self.crop_filter = Some(filter.into());
        self
    }

    pub fn with_trim(mut self, trim: TrimRange) -> Self {
        self.trim = Some(trim);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_range_whole_seconds() {
        let trim = TrimRange::from_ms(2_400, 7_900);
        assert_eq!(trim.start_secs, 2);
        assert_eq!(trim.end_secs, 7);
        assert_eq!(trim.duration_secs(), 5);
    }

    #[test]
    fn test_trim_range_end_floor() {
        // Sub-second clips still produce a positive encoder gap
        let trim = TrimRange::from_ms(2_600, 2_900);
        assert_eq!(trim.start_secs, 2);
        assert_eq!(trim.end_secs, 3);

        let trim = TrimRange::from_ms(0, 400);
        assert_eq!(trim.start_secs, 0);
        assert_eq!(trim.end_secs, 1);
    }

    #[test]
    fn test_job_builder() {
        let job = TranscodeJob::new("in.mp4", "out.mp4", EncoderAttempt::Primary)
            .with_crop_filter("crop=100:100:0:0")
            .with_trim(TrimRange::from_ms(0, 5_000));
        assert_eq!(job.status, TranscodeStatus::Pending);
        assert_eq!(job.trim.unwrap().end_secs, 5);
        assert!(job.crop_filter.unwrap().starts_with("crop="));
    }
}
