//! Transcode engine: decision rule, encode ladder, verification.
//!
//! The engine decides whether an edit actually requires re-encoding;
//! untouched recordings are forwarded verbatim, which is a correctness
//! requirement rather than an optimization. When a re-encode is
//! needed it runs the primary profile, escalates to the fallback on a
//! non-success exit, verifies the declared output exists, and degrades
//! to the original source when both rungs are exhausted. A failed
//! export never blocks the user from sending their message.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};
use uuid::Uuid;

use vmsg_models::{CropAspect, EncoderAttempt, TranscodeJob, TranscodeStatus, TrimRange};

use crate::command::{check_ffmpeg, FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::profile::EncodeProfile;

/// What the edit session wants exported.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    /// Recorded source asset; read-only input
    pub source: PathBuf,
    /// Authoritative source duration
    pub duration_ms: u64,
    /// Trim window start
    pub trim_start_ms: u64,
    /// Trim window end
    pub trim_end_ms: u64,
    /// Selected crop aspect
    pub crop_aspect: CropAspect,
}

impl ExportRequest {
    /// Whether the trim window is narrower than the full duration.
    pub fn is_trimmed(&self) -> bool {
        self.trim_start_ms > 0 || self.trim_end_ms < self.duration_ms
    }

    /// Whether any edit requires re-encoding.
    pub fn needs_transcode(&self) -> bool {
        self.crop_aspect.requires_crop() || self.is_trimmed()
    }
}

/// Final asset decision for the upload gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// No edit required re-encoding; the source is forwarded verbatim
    Passthrough { source: PathBuf },
    /// An encode rung succeeded and was verified
    Encoded { output: PathBuf, attempt: EncoderAttempt },
    /// All rungs exhausted; the unedited source is used instead
    UsedOriginal { source: PathBuf },
}

impl ExportOutcome {
    /// The asset the upload gate should send.
    pub fn asset_path(&self) -> &Path {
        match self {
            ExportOutcome::Passthrough { source } => source,
            ExportOutcome::Encoded { output, .. } => output,
            ExportOutcome::UsedOriginal { source } => source,
        }
    }

    /// True when the edit could not be applied and the original is
    /// being sent; the UI surfaces a non-fatal "using original" notice.
    pub fn is_degraded(&self) -> bool {
        matches!(self, ExportOutcome::UsedOriginal { .. })
    }
}

/// Crop filter expression for a target aspect, relative to input
/// dimensions.
///
/// Exactly the centered geometry of [`vmsg_models::crop_rect`]: the
/// overflowing dimension is trimmed to `min`, the rect is centered in
/// both axes. Keeping the two derivations in lockstep is what makes
/// the preview bit-accurate to the exported crop.
pub fn crop_filter_expr(aspect: CropAspect) -> Option<String> {
    let (a, b) = aspect.ratio()?;
    Some(format!(
        "crop='min(iw,ih*{a}/{b})':'min(ih,iw*{b}/{a})':(iw-ow)/2:(ih-oh)/2"
    ))
}

/// External encoder capability.
///
/// Injectable so its absence is a first-class always-pass-through
/// strategy instead of an exception path.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EncoderBackend: Send + Sync {
    /// Run one encode attempt to its declared output path.
    async fn encode(&self, job: &TranscodeJob) -> MediaResult<()>;
}

/// Real backend shelling out to ffmpeg.
pub struct FfmpegBackend {
    timeout_secs: Option<u64>,
}

impl FfmpegBackend {
    pub fn new() -> Self {
        Self { timeout_secs: None }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }
}

impl Default for FfmpegBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EncoderBackend for FfmpegBackend {
    async fn encode(&self, job: &TranscodeJob) -> MediaResult<()> {
        let profile = EncodeProfile::for_attempt(job.attempt);

        let mut cmd = FfmpegCommand::new(&job.input, &job.output);
        if let Some(trim) = job.trim {
            cmd = cmd
                .seek(trim.start_secs as f64)
                .duration(trim.duration_secs() as f64);
        }
        if let Some(filter) = &job.crop_filter {
            cmd = cmd.video_filter(filter.clone());
        }
        cmd = cmd.output_args(profile.to_ffmpeg_args());

        let mut runner = FfmpegRunner::new();
        if let Some(secs) = self.timeout_secs {
            runner = runner.with_timeout(secs);
        }
        runner.run(&cmd).await
    }
}

/// Orchestrates the export ladder for one edit session.
pub struct TranscodeEngine {
    backend: Option<Arc<dyn EncoderBackend>>,
    scratch_dir: PathBuf,
    busy: AtomicBool,
}

struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl TranscodeEngine {
    /// Create an engine with an injected backend (or none).
    pub fn new(backend: Option<Arc<dyn EncoderBackend>>, scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            scratch_dir: scratch_dir.into(),
            busy: AtomicBool::new(false),
        }
    }

    /// Feature-detect ffmpeg on PATH; absence yields the pass-through
    /// strategy. `timeout_secs` bounds every encode attempt.
    pub fn detect(scratch_dir: impl Into<PathBuf>, timeout_secs: u64) -> Self {
        let backend: Option<Arc<dyn EncoderBackend>> = match check_ffmpeg() {
            Ok(path) => {
                info!(ffmpeg = %path.display(), timeout_secs, "Encoder detected");
                Some(Arc::new(FfmpegBackend::new().with_timeout(timeout_secs)))
            }
            Err(_) => {
                warn!("FFmpeg not found; exports will pass the original through");
                None
            }
        };
        Self::new(backend, scratch_dir)
    }

    /// Whether an export is currently in flight.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Run the export decision and ladder.
    ///
    /// At most one export per engine may be in flight; concurrent
    /// invocations (rapid repeated confirmation taps) get
    /// [`MediaError::Busy`]. The source is never written to: every
    /// attempt targets a distinct scratch output, so a failed transcode
    /// cannot corrupt the recording.
    pub async fn export(&self, request: &ExportRequest) -> MediaResult<ExportOutcome> {
        if !request.needs_transcode() {
            info!(source = %request.source.display(), "No edit requires re-encoding, passing through");
            return Ok(ExportOutcome::Passthrough { source: request.source.clone() });
        }

        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| MediaError::Busy)?;
        let _guard = BusyGuard(&self.busy);

        let Some(backend) = self.backend.as_ref() else {
            warn!("No encoder available, using original recording");
            return Ok(ExportOutcome::UsedOriginal { source: request.source.clone() });
        };

        tokio::fs::create_dir_all(&self.scratch_dir).await?;

        match self.attempt(backend.as_ref(), request, EncoderAttempt::Primary).await {
            Ok(output) => {
                return Ok(ExportOutcome::Encoded { output, attempt: EncoderAttempt::Primary });
            }
            Err(e) if e.should_try_fallback() => {
                warn!(error = %e, "Primary encode failed, trying fallback profile");
            }
            Err(e) => {
                warn!(error = %e, "Encoder unavailable, using original recording");
                return Ok(ExportOutcome::UsedOriginal { source: request.source.clone() });
            }
        }

        match self.attempt(backend.as_ref(), request, EncoderAttempt::Fallback).await {
            Ok(output) => Ok(ExportOutcome::Encoded { output, attempt: EncoderAttempt::Fallback }),
            Err(e) => {
                warn!(error = %e, "Fallback encode failed, using original recording");
                Ok(ExportOutcome::UsedOriginal { source: request.source.clone() })
            }
        }
    }

    /// Build, run, and verify one encode attempt.
    async fn attempt(
        &self,
        backend: &dyn EncoderBackend,
        request: &ExportRequest,
        attempt: EncoderAttempt,
    ) -> MediaResult<PathBuf> {
        let output = self
            .scratch_dir
            .join(format!("{}-{}.mp4", Uuid::new_v4(), attempt));

        let mut job = TranscodeJob::new(&request.source, &output, attempt);
        if let Some(expr) = crop_filter_expr(request.crop_aspect) {
            job = job.with_crop_filter(expr);
        }
        if request.is_trimmed() {
            job = job.with_trim(TrimRange::from_ms(request.trim_start_ms, request.trim_end_ms));
        }
        job.status = TranscodeStatus::Running;

        info!(
            attempt = %attempt,
            input = %job.input.display(),
            output = %job.output.display(),
            crop = job.crop_filter.as_deref().unwrap_or("none"),
            "Starting encode attempt"
        );

        backend.encode(&job).await?;

        // Trust the filesystem over the exit status
        match tokio::fs::metadata(&output).await {
            Ok(meta) if meta.is_file() => Ok(output),
            _ => Err(MediaError::OutputMissing(output)),
        }
    }
}
