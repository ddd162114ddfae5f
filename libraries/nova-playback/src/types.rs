//! Core types for playback management

use nova_core::{Track, TrackId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Playback state
///
/// ```text
/// Idle → Buffering → Ready → Playing ⇄ Paused → Ended
///            ↘         ↙
///              Error → (retry) Buffering | (skip) next item | Ended
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlaybackState {
    /// Nothing selected, or playback stopped
    Idle,

    /// Engine is preparing the selected track
    Buffering,

    /// Engine prepared the track but is not playing it
    Ready,

    /// Currently playing
    Playing,

    /// Paused mid-track
    Paused,

    /// Reached the end of the queue
    Ended,

    /// Engine reported a failure that recovery has not resolved yet
    Error,
}

impl PlaybackState {
    /// Whether the engine has a prepared track it can seek in
    pub fn is_seekable(self) -> bool {
        matches!(
            self,
            PlaybackState::Ready | PlaybackState::Playing | PlaybackState::Paused
        )
    }

    /// Whether the user considers playback to be "on"
    pub fn is_active(self) -> bool {
        matches!(self, PlaybackState::Buffering | PlaybackState::Playing)
    }
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PlaybackState::Idle => "idle",
            PlaybackState::Buffering => "buffering",
            PlaybackState::Ready => "ready",
            PlaybackState::Playing => "playing",
            PlaybackState::Paused => "paused",
            PlaybackState::Ended => "ended",
            PlaybackState::Error => "error",
        };
        f.write_str(name)
    }
}

/// Repeat mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    /// Stop when queue ends
    #[default]
    None,

    /// Loop current track only
    One,

    /// Loop entire queue
    All,
}

/// Position within the current track, in milliseconds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    /// Track the sample belongs to
    pub track_id: TrackId,

    /// Current position, never greater than `duration_ms`
    pub position_ms: u64,

    /// Track duration as reported by the engine
    pub duration_ms: u64,
}

/// Published controller state
///
/// Every state-changing command produces a new snapshot with a higher
/// `revision`. Consumers read it without touching the controller.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSnapshot {
    /// Monotonic counter, one step per applied state change
    pub revision: u64,

    /// Transport state
    pub state: PlaybackState,

    /// Queue contents in play order
    pub queue: Arc<[Arc<Track>]>,

    /// Cursor into `queue`, `None` when nothing is selected
    pub current_index: Option<usize>,

    /// Track at `current_index`
    pub current_track: Option<Arc<Track>>,

    /// Repeat mode
    pub repeat_mode: RepeatMode,

    /// Whether the queue is shuffled
    pub shuffle: bool,

    /// Last known position when this snapshot was taken
    pub position_ms: u64,

    /// Duration of the current track once the engine reported it
    pub duration_ms: Option<u64>,

    /// Bumped on every track change or seek; progress samples from an older
    /// epoch are stale
    pub progress_epoch: u64,

    /// Message of the most recent engine failure, cleared by the next success
    pub last_error: Option<String>,
}

impl PlayerSnapshot {
    /// Snapshot of a freshly constructed controller
    pub fn initial(repeat_mode: RepeatMode, shuffle: bool) -> Self {
        Self {
            revision: 0,
            state: PlaybackState::Idle,
            queue: Arc::from(Vec::new()),
            current_index: None,
            current_track: None,
            repeat_mode,
            shuffle,
            position_ms: 0,
            duration_ms: None,
            progress_epoch: 0,
            last_error: None,
        }
    }

    /// Whether another item follows the cursor under the current repeat mode
    pub fn has_next(&self) -> bool {
        match self.current_index {
            Some(index) => index + 1 < self.queue.len() || self.repeat_mode == RepeatMode::All,
            None => false,
        }
    }
}

/// Configuration for the playback controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Progress sampling interval while playing (default: 1000 ms)
    pub progress_interval_ms: u64,

    /// Maximum time a track may stay in `Buffering` (default: 15 s)
    pub prepare_timeout_ms: u64,

    /// Engine attach attempts per track before skipping (default: 2)
    pub max_attach_attempts: u8,

    /// `SkipPrevious` restarts the track instead when past this point
    /// (default: 3000 ms)
    pub restart_threshold_ms: u64,

    /// Teardown delay while paused in the background (default: 5 min)
    pub background_idle_timeout_secs: u64,

    /// Capacity of the `PlaybackEvent` broadcast channel (default: 64)
    pub event_capacity: usize,

    /// Base URL of the secondary audio endpoint, if the backend has one
    pub fallback_endpoint: Option<String>,

    /// Initial repeat mode (default: None)
    pub repeat: RepeatMode,

    /// Initial shuffle flag (default: false)
    pub shuffle: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            progress_interval_ms: 1000,
            prepare_timeout_ms: 15_000,
            max_attach_attempts: 2,
            restart_threshold_ms: 3000,
            background_idle_timeout_secs: 5 * 60,
            event_capacity: 64,
            fallback_endpoint: None,
            repeat: RepeatMode::None,
            shuffle: false,
        }
    }
}

impl PlaybackConfig {
    /// Progress sampling interval
    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms.max(1))
    }

    /// Prepare timeout
    pub fn prepare_timeout(&self) -> Duration {
        Duration::from_millis(self.prepare_timeout_ms)
    }

    /// Background idle timeout
    pub fn background_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.background_idle_timeout_secs)
    }
}
