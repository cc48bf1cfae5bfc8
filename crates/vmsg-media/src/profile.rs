//! Encode profiles for the primary/fallback export ladder.

use serde::{Deserialize, Serialize};
use vmsg_models::EncoderAttempt;

/// Primary codec: modern high-efficiency HEVC.
pub const PRIMARY_CODEC: &str = "libx265";
/// Fallback codec: broadly compatible H.264.
pub const FALLBACK_CODEC: &str = "libx264";
/// Fixed quality target for the primary profile.
pub const PRIMARY_CRF: u8 = 28;
/// Fixed quality target for the fallback profile.
pub const FALLBACK_CRF: u8 = 23;
/// Shared encoding preset.
pub const DEFAULT_PRESET: &str = "fast";

/// A fixed encode profile.
///
/// Both rungs copy the audio stream without re-encoding and enable
/// `+faststart` so the exported file supports progressive playback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodeProfile {
    /// Video codec (e.g. "libx265", "libx264")
    pub codec: String,
    /// Constant Rate Factor (quality, lower is better)
    pub crf: u8,
    /// Encoding preset
    pub preset: String,
    /// Container codec tag, needed for HEVC playback on consumer devices
    pub video_tag: Option<String>,
}

impl EncodeProfile {
    /// Primary profile: HEVC with the `hvc1` tag.
    pub fn primary() -> Self {
        Self {
            codec: PRIMARY_CODEC.to_string(),
            crf: PRIMARY_CRF,
            preset: DEFAULT_PRESET.to_string(),
            video_tag: Some("hvc1".to_string()),
        }
    }

    /// Fallback profile: H.264, lower efficiency, plays everywhere.
    pub fn fallback() -> Self {
        Self {
            codec: FALLBACK_CODEC.to_string(),
            crf: FALLBACK_CRF,
            preset: DEFAULT_PRESET.to_string(),
            video_tag: None,
        }
    }

    /// Profile for a ladder rung.
    pub fn for_attempt(attempt: EncoderAttempt) -> Self {
        match attempt {
            EncoderAttempt::Primary => Self::primary(),
            EncoderAttempt::Fallback => Self::fallback(),
        }
    }

    /// Convert to FFmpeg output arguments.
    pub fn to_ffmpeg_args(&self) -> Vec<String> {
        let mut args = vec![
            "-c:v".to_string(),
            self.codec.clone(),
            "-preset".to_string(),
            self.preset.clone(),
            "-crf".to_string(),
            self.crf.to_string(),
        ];

        if let Some(tag) = &self.video_tag {
            args.extend_from_slice(&["-tag:v".to_string(), tag.clone()]);
        }

        // Audio untouched; faststart for progressive playback
        args.extend_from_slice(&[
            "-c:a".to_string(),
            "copy".to_string(),
            "-movflags".to_string(),
            "+faststart".to_string(),
        ]);

        args
    }
}
