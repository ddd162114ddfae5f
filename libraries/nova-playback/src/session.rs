//! Session projector
//!
//! Mirrors controller state into an external now-playing surface (lock
//! screen, media notification, desktop media keys) and routes the surface's
//! buttons back into the controller.
//!
//! Pushes follow snapshot order. An artwork lookup started for one track can
//! finish after the user skipped to another; its result is only applied if
//! it belongs to the newest lookup.

use crate::controller::{CommandSender, ControllerHandle, TransportAction};
use crate::types::{PlaybackState, PlayerSnapshot};
use async_trait::async_trait;
use nova_core::{Track, TrackId};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Transport buttons a session surface can expose
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    /// Start or resume playback
    Play,
    /// Pause playback
    Pause,
    /// Skip to the next item
    Next,
    /// Restart or go to the previous item
    Previous,
    /// Seek to a position in milliseconds
    Seek(u64),
    /// Stop playback
    Stop,
}

impl From<SessionAction> for TransportAction {
    fn from(action: SessionAction) -> Self {
        match action {
            SessionAction::Play => TransportAction::Play,
            SessionAction::Pause => TransportAction::Pause,
            SessionAction::Next => TransportAction::SkipNext,
            SessionAction::Previous => TransportAction::SkipPrevious,
            SessionAction::Seek(position_ms) => TransportAction::SeekTo(position_ms),
            SessionAction::Stop => TransportAction::Stop,
        }
    }
}

/// Which buttons are currently meaningful
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AvailableActions {
    /// A track is loaded and not playing
    pub play: bool,

    /// Playback is active
    pub pause: bool,

    /// Another item follows under the current repeat mode
    pub next: bool,

    /// A track is loaded; previous restarts it when past the threshold
    pub previous: bool,

    /// The engine can seek in the current media
    pub seek: bool,

    /// A track is loaded
    pub stop: bool,
}

impl AvailableActions {
    fn for_snapshot(snapshot: &PlayerSnapshot) -> Self {
        let has_track = snapshot.current_track.is_some();
        let playing = snapshot.state.is_active();
        Self {
            play: has_track && !playing,
            pause: playing,
            next: snapshot.has_next(),
            // Previous also restarts the current track
            previous: has_track,
            seek: snapshot.state.is_seekable(),
            stop: has_track,
        }
    }
}

/// What the session surface displays
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    /// Current track
    pub track_id: TrackId,

    /// Track title
    pub title: String,

    /// Artist credit
    pub artist: String,

    /// Album name
    pub album: String,

    /// Duration once the engine reports it
    pub duration_ms: Option<u64>,

    /// Last sampled position
    pub position_ms: u64,

    /// Whether playback is active
    pub is_playing: bool,

    /// Buttons the surface should enable
    pub available_actions: AvailableActions,

    /// Artwork location, once looked up
    pub artwork: Option<String>,
}

impl SessionSummary {
    /// Summary of `snapshot`, or `None` when nothing is selected
    pub fn from_snapshot(snapshot: &PlayerSnapshot) -> Option<Self> {
        let track = snapshot.current_track.as_ref()?;
        Some(Self {
            track_id: track.id.clone(),
            title: track.title.clone(),
            artist: track.artist.clone(),
            album: track.album.clone(),
            duration_ms: snapshot.duration_ms,
            position_ms: snapshot.position_ms,
            is_playing: snapshot.state == PlaybackState::Playing,
            available_actions: AvailableActions::for_snapshot(snapshot),
            artwork: None,
        })
    }
}

/// External now-playing surface
#[async_trait]
pub trait SessionSurface: Send + Sync {
    /// Show `summary`
    async fn publish(&self, summary: &SessionSummary);

    /// Nothing is selected any more
    async fn clear(&self);
}

/// Artwork lookup for the session surface
#[async_trait]
pub trait ArtworkProvider: Send + Sync {
    /// Artwork location for `track`, if any
    async fn artwork_for(&self, track: &Track) -> Option<String>;
}

/// Background task projecting controller state onto a [`SessionSurface`]
#[derive(Debug)]
pub struct SessionProjector {
    commands: CommandSender,
    task: JoinHandle<()>,
}

impl SessionProjector {
    /// Start projecting `controller` onto `surface`
    pub fn spawn(
        controller: &ControllerHandle,
        surface: Arc<dyn SessionSurface>,
        artwork: Option<Arc<dyn ArtworkProvider>>,
    ) -> Self {
        let projection = Projection {
            snapshots: controller.subscribe().receiver(),
            surface,
            artwork,
            pushed: None,
            cleared: true,
            artwork_token: 0,
            artwork_for: None,
        };
        let task = tokio::spawn(projection.run());
        Self {
            commands: controller.sender(),
            task,
        }
    }

    /// Route an inbound surface action into the controller
    ///
    /// Returns `false` once the controller is gone.
    pub fn dispatch(&self, action: SessionAction) -> bool {
        tracing::debug!("Session action {:?}", action);
        self.commands.send(action.into())
    }

    /// Sender the surface can keep for its own callbacks
    pub fn commands(&self) -> CommandSender {
        self.commands.clone()
    }
}

impl Drop for SessionProjector {
    fn drop(&mut self) {
        self.task.abort();
    }
}

struct Projection {
    snapshots: watch::Receiver<PlayerSnapshot>,
    surface: Arc<dyn SessionSurface>,
    artwork: Option<Arc<dyn ArtworkProvider>>,
    /// Last summary pushed to the surface
    pushed: Option<SessionSummary>,
    cleared: bool,
    /// Identifies the newest artwork lookup
    artwork_token: u64,
    /// Track and result of the newest lookup
    artwork_for: Option<(TrackId, Option<String>)>,
}

impl Projection {
    async fn run(mut self) {
        let (artwork_tx, mut artwork_rx) = mpsc::unbounded_channel::<(u64, Option<String>)>();

        // Project the state at subscription time before waiting for changes
        self.snapshots.mark_changed();

        loop {
            tokio::select! {
                changed = self.snapshots.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let snapshot = self.snapshots.borrow_and_update().clone();
                    self.on_snapshot(&snapshot, &artwork_tx).await;
                }
                Some((token, artwork)) = artwork_rx.recv() => {
                    self.on_artwork(token, artwork).await;
                }
            }
        }
        tracing::debug!("Session projector stopped");
    }

    async fn on_snapshot(
        &mut self,
        snapshot: &PlayerSnapshot,
        artwork_tx: &mpsc::UnboundedSender<(u64, Option<String>)>,
    ) {
        let Some(mut summary) = SessionSummary::from_snapshot(snapshot) else {
            self.pushed = None;
            if !self.cleared {
                self.cleared = true;
                self.surface.clear().await;
            }
            return;
        };

        let known = matches!(&self.artwork_for, Some((id, _)) if *id == summary.track_id);
        if known {
            summary.artwork = self.artwork_for.as_ref().and_then(|(_, art)| art.clone());
        } else {
            self.artwork_for = Some((summary.track_id.clone(), None));
            self.request_artwork(snapshot, artwork_tx);
        }

        self.push(summary).await;
    }

    fn request_artwork(
        &mut self,
        snapshot: &PlayerSnapshot,
        artwork_tx: &mpsc::UnboundedSender<(u64, Option<String>)>,
    ) {
        self.artwork_token += 1;
        let (Some(provider), Some(track)) = (self.artwork.clone(), snapshot.current_track.clone())
        else {
            return;
        };
        let token = self.artwork_token;
        let tx = artwork_tx.clone();
        tokio::spawn(async move {
            let artwork = provider.artwork_for(&track).await;
            let _ = tx.send((token, artwork));
        });
    }

    async fn on_artwork(&mut self, token: u64, artwork: Option<String>) {
        if token != self.artwork_token {
            tracing::debug!("Dropping artwork from superseded lookup {}", token);
            return;
        }
        if let Some((_, slot)) = self.artwork_for.as_mut() {
            *slot = artwork.clone();
        }
        if let Some(mut summary) = self.pushed.clone() {
            summary.artwork = artwork;
            self.push(summary).await;
        }
    }

    async fn push(&mut self, summary: SessionSummary) {
        if self.pushed.as_ref() == Some(&summary) {
            return;
        }
        self.surface.publish(&summary).await;
        self.cleared = false;
        self.pushed = Some(summary);
    }
}
