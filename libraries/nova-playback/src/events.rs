//! Playback Events
//!
//! Discrete notifications broadcast by the controller alongside the snapshot
//! observable. Events are emitted at key points:
//! - State changes (buffering, playing, paused, ended, ...)
//! - Track changes (cursor moved to a different item)
//! - Queue edits
//! - Engine failures and recovery outcomes
//!
//! Snapshots carry the full state; events are for consumers that want to
//! react to a transition rather than diff snapshots themselves.

use crate::types::{PlaybackState, RepeatMode};
use nova_core::TrackId;
use serde::{Deserialize, Serialize};

/// Events emitted by the playback controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlaybackEvent {
    /// Transport state changed
    StateChanged {
        /// The new playback state
        state: PlaybackState,
    },

    /// The current item changed
    TrackChanged {
        /// ID of the new (current) track
        track_id: TrackId,
        /// ID of the previous track (if any)
        previous_track_id: Option<TrackId>,
    },

    /// Track finished playing naturally (reached end)
    TrackFinished {
        /// ID of the finished track
        track_id: TrackId,
    },

    /// Queue changed (tracks added/removed/reordered)
    QueueChanged {
        /// New queue length
        length: usize,
    },

    /// A `SetQueue` with no tracks was rejected
    EmptyQueue,

    /// Repeat mode changed
    RepeatModeChanged {
        /// New repeat mode
        mode: RepeatMode,
    },

    /// Shuffle toggled
    ShuffleChanged {
        /// Whether shuffle is now on
        enabled: bool,
    },

    /// Engine failure for the current track
    Error {
        /// Error message
        message: String,
    },

    /// A track was given up on after exhausting its attach attempts
    TrackSkipped {
        /// ID of the skipped track
        track_id: TrackId,
    },
}

impl PlaybackEvent {
    /// Short name for logging
    pub fn kind(&self) -> &'static str {
        match self {
            PlaybackEvent::StateChanged { .. } => "state_changed",
            PlaybackEvent::TrackChanged { .. } => "track_changed",
            PlaybackEvent::TrackFinished { .. } => "track_finished",
            PlaybackEvent::QueueChanged { .. } => "queue_changed",
            PlaybackEvent::EmptyQueue => "empty_queue",
            PlaybackEvent::RepeatModeChanged { .. } => "repeat_mode_changed",
            PlaybackEvent::ShuffleChanged { .. } => "shuffle_changed",
            PlaybackEvent::Error { .. } => "error",
            PlaybackEvent::TrackSkipped { .. } => "track_skipped",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serializes_with_variant_tag() {
        let event = PlaybackEvent::TrackChanged {
            track_id: TrackId::new("yt:b"),
            previous_track_id: Some(TrackId::new("yt:a")),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["TrackChanged"]["track_id"], "yt:b");
        assert_eq!(json["TrackChanged"]["previous_track_id"], "yt:a");
    }

    #[test]
    fn test_event_kind() {
        assert_eq!(PlaybackEvent::EmptyQueue.kind(), "empty_queue");
        assert_eq!(
            PlaybackEvent::StateChanged {
                state: PlaybackState::Playing
            }
            .kind(),
            "state_changed"
        );
    }
}
