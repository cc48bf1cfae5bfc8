//! Edit session state and looping preview control.
//!
//! [`EditSession`] owns the mutable edit parameters for one recording:
//! scrub position, trim window, crop aspect, color filter, and text
//! overlay. All mutations clamp rather than error, so the session can
//! never hold an out-of-range value regardless of input order.
//!
//! [`PreviewController`] binds a session to a host playback engine and
//! enforces loop-within-trim: playback that reaches the trim end seeks
//! back to the trim start and keeps playing.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use vmsg_media::ExportRequest;
use vmsg_models::{ColorFilter, CropAspect, TextOverlay};

use crate::error::PipelineResult;

/// Narrowest trim window the UI allows.
pub const MIN_CLIP_MS: u64 = 500;

/// Cadence of playback position reports from the host player.
pub const POSITION_TICK_MS: u64 = 100;

/// Host playback engine collaborator.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlaybackEngine: Send + Sync {
    /// Load a local asset for playback.
    async fn load(&self, source: &Path) -> PipelineResult<()>;

    /// Seek to an absolute position.
    async fn seek(&self, position_ms: u64) -> PipelineResult<()>;

    async fn play(&self) -> PipelineResult<()>;

    async fn pause(&self) -> PipelineResult<()>;
}

/// Periodic status report from the host player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackStatus {
    pub position_ms: u64,
    /// Known once the asset's container has been read
    pub duration_ms: Option<u64>,
    pub is_loaded: bool,
}

/// Mutable edit state for one recorded message.
#[derive(Debug, Clone)]
pub struct EditSession {
    source: PathBuf,
    /// Authoritative duration, known once the player reports it
    duration_ms: Option<u64>,
    position_ms: u64,
    trim_start_ms: u64,
    /// `None` until a duration is attached; then defaults to duration
    trim_end_ms: Option<u64>,
    pub crop_aspect: CropAspect,
    pub color_filter: ColorFilter,
    pub text_overlay: Option<TextOverlay>,
}

impl EditSession {
    /// Start an edit session over a recorded source.
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            duration_ms: None,
            position_ms: 0,
            trim_start_ms: 0,
            trim_end_ms: None,
            crop_aspect: CropAspect::Free,
            color_filter: ColorFilter::None,
            text_overlay: None,
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn duration_ms(&self) -> Option<u64> {
        self.duration_ms
    }

    pub fn position_ms(&self) -> u64 {
        self.position_ms
    }

    pub fn trim_start_ms(&self) -> u64 {
        self.trim_start_ms
    }

    /// Trim window end; the full duration until the user narrows it.
    pub fn trim_end_ms(&self) -> u64 {
        self.trim_end_ms.or(self.duration_ms).unwrap_or(0)
    }

    /// Record the duration reported by the player.
    ///
    /// The first report initializes the trim window to the full clip.
    /// Later reports re-clamp an existing window instead of resetting
    /// the user's selection.
    pub fn attach_duration(&mut self, duration_ms: u64) {
        self.duration_ms = Some(duration_ms);
        match self.trim_end_ms {
            None => self.trim_end_ms = Some(duration_ms),
            Some(end) if end > duration_ms => self.trim_end_ms = Some(duration_ms),
            Some(_) => {}
        }
        self.position_ms = self.position_ms.min(duration_ms);
        self.trim_start_ms = self
            .trim_start_ms
            .min(self.trim_end_ms().saturating_sub(MIN_CLIP_MS));
    }

    /// Scrub to a requested position, clamping into `[0, duration]`.
    ///
    /// Takes a signed input because host scrubbers report overshoot
    /// past either edge; both directions clamp silently.
    pub fn scrub_to(&mut self, requested_ms: i64) -> u64 {
        let upper = self.duration_ms.unwrap_or(0);
        self.position_ms = requested_ms.max(0).min(upper as i64) as u64;
        self.position_ms
    }

    /// Move the trim start, keeping the window at least [`MIN_CLIP_MS`]
    /// wide.
    pub fn set_trim_start(&mut self, start_ms: u64) -> u64 {
        let limit = self.trim_end_ms().saturating_sub(MIN_CLIP_MS);
        self.trim_start_ms = start_ms.min(limit);
        self.trim_start_ms
    }

    /// Move the trim end.
    ///
    /// An end at or below the start is pushed to `start + MIN_CLIP_MS`,
    /// then clamped to the duration.
    pub fn set_trim_end(&mut self, end_ms: u64) -> u64 {
        let upper = self.duration_ms.unwrap_or(end_ms);
        let end = if end_ms <= self.trim_start_ms {
            self.trim_start_ms + MIN_CLIP_MS
        } else {
            end_ms
        };
        self.trim_end_ms = Some(end.min(upper));
        self.trim_end_ms()
    }

    /// Loop rule for a playback position report.
    ///
    /// Returns the position to seek to when the report means the next
    /// tick would land at or past the trim end. Looping targets the
    /// trim start exactly, not the clip start.
    pub fn on_position(&mut self, position_ms: u64) -> Option<u64> {
        self.position_ms = position_ms.min(self.duration_ms.unwrap_or(position_ms));
        if position_ms + POSITION_TICK_MS >= self.trim_end_ms() && self.trim_end_ms() > 0 {
            debug!(
                position_ms,
                trim_start_ms = self.trim_start_ms,
                "Loop point reached, seeking to trim start"
            );
            self.position_ms = self.trim_start_ms;
            Some(self.trim_start_ms)
        } else {
            None
        }
    }

    /// Whether the current edits require re-encoding on export.
    pub fn needs_transcode(&self) -> bool {
        self.export_request().map_or(false, |r| r.needs_transcode())
    }

    /// Snapshot the session as an export request.
    ///
    /// `None` until the duration is known; exporting an unloaded clip
    /// is a UI ordering bug, not a recoverable state.
    pub fn export_request(&self) -> Option<ExportRequest> {
        let duration_ms = self.duration_ms?;
        Some(ExportRequest {
            source: self.source.clone(),
            duration_ms,
            trim_start_ms: self.trim_start_ms,
            trim_end_ms: self.trim_end_ms(),
            crop_aspect: self.crop_aspect,
        })
    }
}

/// Binds an [`EditSession`] to the host player and keeps playback
/// inside the trim window.
pub struct PreviewController {
    session: EditSession,
    player: Arc<dyn PlaybackEngine>,
}

impl PreviewController {
    pub fn new(session: EditSession, player: Arc<dyn PlaybackEngine>) -> Self {
        Self { session, player }
    }

    pub fn session(&self) -> &EditSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut EditSession {
        &mut self.session
    }

    /// Load the source and start looping playback from the trim start.
    pub async fn start(&mut self, duration_ms: u64) -> PipelineResult<()> {
        self.player.load(self.session.source()).await?;
        self.session.attach_duration(duration_ms);
        self.player.seek(self.session.trim_start_ms()).await?;
        self.player.play().await
    }

    /// Scrub: pause, clamp, seek to the clamped position.
    pub async fn scrub(&mut self, requested_ms: i64) -> PipelineResult<u64> {
        self.player.pause().await?;
        let clamped = self.session.scrub_to(requested_ms);
        self.player.seek(clamped).await?;
        Ok(clamped)
    }

    /// Handle a periodic position report from the player.
    pub async fn on_position(&mut self, position_ms: u64) -> PipelineResult<()> {
        if let Some(target) = self.session.on_position(position_ms) {
            self.player.seek(target).await?;
        }
        Ok(())
    }

    /// Handle a full status report from the player.
    ///
    /// Unloaded reports are ignored; a reported duration becomes the
    /// session's authoritative duration before the loop rule runs.
    pub async fn on_status(&mut self, status: PlaybackStatus) -> PipelineResult<()> {
        if !status.is_loaded {
            return Ok(());
        }
        if let Some(duration_ms) = status.duration_ms {
            self.session.attach_duration(duration_ms);
        }
        self.on_position(status.position_ms).await
    }

    /// Narrow the trim start and resync playback into the new window.
    pub async fn set_trim_start(&mut self, start_ms: u64) -> PipelineResult<u64> {
        let start = self.session.set_trim_start(start_ms);
        if self.session.position_ms() < start {
            self.player.seek(start).await?;
            self.session.scrub_to(start as i64);
        }
        Ok(start)
    }

    /// Narrow the trim end and resync playback into the new window.
    pub async fn set_trim_end(&mut self, end_ms: u64) -> PipelineResult<u64> {
        let end = self.session.set_trim_end(end_ms);
        if self.session.position_ms() >= end {
            let start = self.session.trim_start_ms();
            self.player.seek(start).await?;
            self.session.scrub_to(start as i64);
        }
        Ok(end)
    }
}
