//! Commands consumed by the controller task

use crate::engine::EngineEvent;
use crate::types::RepeatMode;
use nova_core::{Track, TrackId};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// Transport and queue operations
///
/// Every trigger (foreground UI, session surface, lifecycle timers) speaks
/// this enum; the controller applies them strictly in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportAction {
    /// Start playback, resuming or re-attaching as needed
    Play,

    /// Pause playback
    Pause,

    /// Resume from pause
    Resume,

    /// Stop playback and clear the queue
    Stop,

    /// Seek within the current track
    SeekTo(u64),

    /// Skip to next queue item
    SkipNext,

    /// Restart the current track or go to the previous queue item
    SkipPrevious,

    /// Enable or disable shuffle
    SetShuffle(bool),

    /// Set repeat mode
    SetRepeatMode(RepeatMode),

    /// Jump to the queue item at this index
    PlayQueueItemAt(usize),

    /// Stop, clear the queue and forget the last error
    ClearCurrentSong,

    /// Replace the queue with a single track and play it
    PlayTrack(Arc<Track>),

    /// Replace the queue and play from `start_id` (or the first item)
    SetQueue {
        /// New queue contents
        tracks: Vec<Arc<Track>>,
        /// Item to start from
        start_id: Option<TrackId>,
    },

    /// Move a track one position earlier
    MoveUp(TrackId),

    /// Move a track one position later
    MoveDown(TrackId),

    /// Remove a track (refused for the current one)
    Remove(TrackId),

    /// Replace the queue order
    Reorder(Vec<Arc<Track>>),

    /// Add tracks to the end of the queue
    Append(Vec<Arc<Track>>),

    /// Insert a track right after the current one
    InsertNext(Arc<Track>),

    /// Stop when the current track ends naturally
    StopAfterCurrent(bool),

    /// Stop and release the engine
    Teardown,
}

impl TransportAction {
    /// Short name for logging
    pub fn name(&self) -> &'static str {
        match self {
            TransportAction::Play => "play",
            TransportAction::Pause => "pause",
            TransportAction::Resume => "resume",
            TransportAction::Stop => "stop",
            TransportAction::SeekTo(_) => "seek_to",
            TransportAction::SkipNext => "skip_next",
            TransportAction::SkipPrevious => "skip_previous",
            TransportAction::SetShuffle(_) => "set_shuffle",
            TransportAction::SetRepeatMode(_) => "set_repeat_mode",
            TransportAction::PlayQueueItemAt(_) => "play_queue_item_at",
            TransportAction::ClearCurrentSong => "clear_current_song",
            TransportAction::PlayTrack(_) => "play_track",
            TransportAction::SetQueue { .. } => "set_queue",
            TransportAction::MoveUp(_) => "move_up",
            TransportAction::MoveDown(_) => "move_down",
            TransportAction::Remove(_) => "remove",
            TransportAction::Reorder(_) => "reorder",
            TransportAction::Append(_) => "append",
            TransportAction::InsertNext(_) => "insert_next",
            TransportAction::StopAfterCurrent(_) => "stop_after_current",
            TransportAction::Teardown => "teardown",
        }
    }
}

/// Sampled engine position, answered by the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ProgressSample {
    pub track_id: TrackId,
    pub progress_epoch: u64,
    pub position_ms: u64,
    pub duration_ms: u64,
}

/// Everything that enters the controller's command stream
#[derive(Debug)]
pub(crate) enum Command {
    /// Transport action; `reply` receives the action's boolean outcome
    Action {
        action: TransportAction,
        reply: Option<oneshot::Sender<bool>>,
    },

    /// Engine report for prepare generation `generation`
    Engine { generation: u64, event: EngineEvent },

    /// Prepare generation `generation` did not finish in time
    PrepareTimedOut { generation: u64 },

    /// Progress sampler wants the engine position
    SampleProgress {
        reply: oneshot::Sender<Option<ProgressSample>>,
    },

    /// Stop the controller task
    Shutdown,
}

/// Fire-and-forget entry point into the controller
///
/// Used by triggers that never wait on the outcome: the session surface's
/// inbound actions and lifecycle timers. Holds the controller only weakly.
#[derive(Debug, Clone)]
pub struct CommandSender {
    tx: mpsc::WeakUnboundedSender<Command>,
}

impl CommandSender {
    pub(crate) fn new(tx: mpsc::WeakUnboundedSender<Command>) -> Self {
        Self { tx }
    }

    /// Enqueue `action`; returns `false` once the controller is gone
    pub fn send(&self, action: TransportAction) -> bool {
        self.send_command(Command::Action { action, reply: None })
    }

    /// Whether the controller task has ended
    pub fn is_closed(&self) -> bool {
        self.tx.upgrade().map_or(true, |tx| tx.is_closed())
    }

    /// Ask the controller for the engine position of the playing track
    pub(crate) async fn sample_progress(&self) -> Option<ProgressSample> {
        let (reply, rx) = oneshot::channel();
        if !self.send_command(Command::SampleProgress { reply }) {
            return None;
        }
        rx.await.ok().flatten()
    }

    fn send_command(&self, command: Command) -> bool {
        match self.tx.upgrade() {
            Some(tx) => tx.send(command).is_ok(),
            None => false,
        }
    }
}
