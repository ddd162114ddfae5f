//! Caller-facing controller handle

use super::command::{Command, CommandSender, TransportAction};
use crate::error::{PlaybackError, Result};
use crate::events::PlaybackEvent;
use crate::observable::Observable;
use crate::types::{PlayerSnapshot, RepeatMode};
use nova_core::{Track, TrackId};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, oneshot};

/// Handle to a running transport controller
///
/// Cheap to clone. Every async method resolves once the controller has
/// applied the action and reports whether it had an effect (`false` for a
/// refused queue edit or a skip with nothing to skip to). The controller
/// task ends when the last handle is dropped or [`shutdown`] is called.
///
/// [`shutdown`]: ControllerHandle::shutdown
#[derive(Debug, Clone)]
pub struct ControllerHandle {
    tx: mpsc::UnboundedSender<Command>,
    snapshot: Observable<PlayerSnapshot>,
    events: broadcast::Sender<PlaybackEvent>,
}

impl ControllerHandle {
    pub(crate) fn new(
        tx: mpsc::UnboundedSender<Command>,
        snapshot: Observable<PlayerSnapshot>,
        events: broadcast::Sender<PlaybackEvent>,
    ) -> Self {
        Self {
            tx,
            snapshot,
            events,
        }
    }

    /// Apply `action` and wait for its outcome
    pub async fn request(&self, action: TransportAction) -> Result<bool> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Action {
                action,
                reply: Some(reply),
            })
            .map_err(|_| PlaybackError::ControllerClosed)?;
        rx.await.map_err(|_| PlaybackError::ControllerClosed)
    }

    /// Start playback
    pub async fn play(&self) -> Result<bool> {
        self.request(TransportAction::Play).await
    }

    /// Pause playback
    pub async fn pause(&self) -> Result<bool> {
        self.request(TransportAction::Pause).await
    }

    /// Resume paused playback
    pub async fn resume(&self) -> Result<bool> {
        self.request(TransportAction::Resume).await
    }

    /// Stop playback and clear the queue
    pub async fn stop(&self) -> Result<bool> {
        self.request(TransportAction::Stop).await
    }

    /// Seek within the current track
    pub async fn seek_to(&self, position_ms: u64) -> Result<bool> {
        self.request(TransportAction::SeekTo(position_ms)).await
    }

    /// Skip to the next queue item
    pub async fn skip_next(&self) -> Result<bool> {
        self.request(TransportAction::SkipNext).await
    }

    /// Restart the track, or go to the previous queue item
    pub async fn skip_previous(&self) -> Result<bool> {
        self.request(TransportAction::SkipPrevious).await
    }

    /// Enable or disable shuffle
    pub async fn set_shuffle(&self, enabled: bool) -> Result<bool> {
        self.request(TransportAction::SetShuffle(enabled)).await
    }

    /// Set repeat mode
    pub async fn set_repeat_mode(&self, mode: RepeatMode) -> Result<bool> {
        self.request(TransportAction::SetRepeatMode(mode)).await
    }

    /// Play the queue item at `index`
    pub async fn play_queue_item_at(&self, index: usize) -> Result<bool> {
        self.request(TransportAction::PlayQueueItemAt(index)).await
    }

    /// Stop, clear the queue and the last error
    pub async fn clear_current_song(&self) -> Result<bool> {
        self.request(TransportAction::ClearCurrentSong).await
    }

    /// Play a single track, replacing the queue
    pub async fn play_track(&self, track: Arc<Track>) -> Result<bool> {
        self.request(TransportAction::PlayTrack(track)).await
    }

    /// Replace the queue and start at `start_id`
    pub async fn set_queue(
        &self,
        tracks: Vec<Arc<Track>>,
        start_id: Option<TrackId>,
    ) -> Result<bool> {
        self.request(TransportAction::SetQueue { tracks, start_id })
            .await
    }

    /// Move a track one position earlier
    pub async fn move_up(&self, id: TrackId) -> Result<bool> {
        self.request(TransportAction::MoveUp(id)).await
    }

    /// Move a track one position later
    pub async fn move_down(&self, id: TrackId) -> Result<bool> {
        self.request(TransportAction::MoveDown(id)).await
    }

    /// Remove a track; refused for the current one
    pub async fn remove(&self, id: TrackId) -> Result<bool> {
        self.request(TransportAction::Remove(id)).await
    }

    /// Replace the queue order
    pub async fn reorder(&self, tracks: Vec<Arc<Track>>) -> Result<bool> {
        self.request(TransportAction::Reorder(tracks)).await
    }

    /// Add tracks to the end of the queue
    pub async fn append(&self, tracks: Vec<Arc<Track>>) -> Result<bool> {
        self.request(TransportAction::Append(tracks)).await
    }

    /// Insert a track right after the current one
    pub async fn insert_next(&self, track: Arc<Track>) -> Result<bool> {
        self.request(TransportAction::InsertNext(track)).await
    }

    /// Stop once the current track ends
    pub async fn stop_after_current(&self, enabled: bool) -> Result<bool> {
        self.request(TransportAction::StopAfterCurrent(enabled)).await
    }

    /// Stop and release the engine
    pub async fn teardown(&self) -> Result<bool> {
        self.request(TransportAction::Teardown).await
    }

    /// Latest published state
    pub fn snapshot(&self) -> PlayerSnapshot {
        self.snapshot.get()
    }

    /// Observe published state
    pub fn subscribe(&self) -> Observable<PlayerSnapshot> {
        self.snapshot.clone()
    }

    /// Receive discrete playback events from now on
    pub fn events(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.events.subscribe()
    }

    /// Fire-and-forget sender for external triggers
    ///
    /// Does not keep the controller alive.
    pub fn sender(&self) -> CommandSender {
        CommandSender::new(self.tx.downgrade())
    }

    /// Ask the controller to stop and release the engine
    ///
    /// Commands already queued are applied first.
    pub fn shutdown(&self) {
        let _ = self.tx.send(Command::Shutdown);
    }

    /// Whether the controller task has ended
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
