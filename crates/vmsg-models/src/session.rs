//! Recording session state machine.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum recording duration in milliseconds.
pub const MAX_RECORDING_MS: u64 = 30_000;

/// Elapsed-time tick granularity in milliseconds.
pub const TICK_INTERVAL_MS: u64 = 100;

/// Recording lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum RecordingStatus {
    /// Not recording, ready to start
    #[default]
    Idle,
    /// Actively recording, elapsed time accumulating
    Recording,
    /// Recording finished (user stop or auto-stop)
    Stopped,
}

impl fmt::Display for RecordingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RecordingStatus::Idle => "idle",
            RecordingStatus::Recording => "recording",
            RecordingStatus::Stopped => "stopped",
        };
        write!(f, "{}", s)
    }
}

/// A bounded-duration recording session.
///
/// Elapsed time accumulates only while `status` is `Recording`.
/// Reaching `max_duration_ms` forces a transition to `Stopped` exactly
/// once; the overshoot is bounded by a single tick interval.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RecordingSession {
    /// Current lifecycle state
    pub status: RecordingStatus,
    /// Accumulated recording time in milliseconds
    pub elapsed_ms: u64,
    /// Hard cap on recording duration
    pub max_duration_ms: u64,
}

impl Default for RecordingSession {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingSession {
    /// Create a new idle session with the standard 30 second cap.
    pub fn new() -> Self {
        Self {
            status: RecordingStatus::Idle,
            elapsed_ms: 0,
            max_duration_ms: MAX_RECORDING_MS,
        }
    }

    /// Create a session with a custom cap (tests and future tiers).
    pub fn with_max_duration(max_duration_ms: u64) -> Self {
        Self {
            status: RecordingStatus::Idle,
            elapsed_ms: 0,
            max_duration_ms,
        }
    }

    /// Transition `Idle -> Recording`. Returns false if not idle.
    pub fn begin(&mut self) -> bool {
        if self.status != RecordingStatus::Idle {
            return false;
        }
        self.status = RecordingStatus::Recording;
        self.elapsed_ms = 0;
        true
    }

    /// Accumulate one tick of elapsed time.
    ///
    /// Returns true when this tick crossed the duration cap and forced
    /// the auto-stop transition. Ticks outside `Recording` are ignored,
    /// so the forced transition can fire at most once.
    pub fn tick(&mut self, delta_ms: u64) -> bool {
        if self.status != RecordingStatus::Recording {
            return false;
        }
        self.elapsed_ms += delta_ms;
        if self.elapsed_ms >= self.max_duration_ms {
            self.status = RecordingStatus::Stopped;
            return true;
        }
        false
    }

    /// Transition `Recording -> Stopped`. Idempotent: stopping while
    /// not recording is a no-op and returns false.
    pub fn stop(&mut self) -> bool {
        if self.status != RecordingStatus::Recording {
            return false;
        }
        self.status = RecordingStatus::Stopped;
        true
    }

    /// Discard the session ("retake"): back to idle, elapsed cleared.
    pub fn reset(&mut self) {
        self.status = RecordingStatus::Idle;
        self.elapsed_ms = 0;
    }

    /// Whether the session is actively recording.
    pub fn is_recording(&self) -> bool {
        self.status == RecordingStatus::Recording
    }

    /// Remaining time before auto-stop.
    pub fn remaining_ms(&self) -> u64 {
        self.max_duration_ms.saturating_sub(self.elapsed_ms)
    }
}
