//! Transport controller
//!
//! The single writer of playback state. Foreground calls, session-surface
//! actions, engine callbacks and timers all become [`Command`]s on one
//! channel and are applied by one task.
//!
//! ```text
//! ControllerHandle ─┐
//! CommandSender ────┼─► mpsc ─► ControllerActor ─► MediaEngine
//! EngineEventSink ──┤                │
//! timers ───────────┘                ├─► watch<PlayerSnapshot>
//!                                    └─► broadcast<PlaybackEvent>
//! ```

mod actor;
mod command;
mod handle;

pub use command::{CommandSender, TransportAction};
pub use handle::ControllerHandle;

pub(crate) use command::{Command, ProgressSample};

use crate::engine::{EngineEventSink, MediaEngine};
use crate::observable::Publisher;
use crate::types::{PlaybackConfig, PlayerSnapshot};
use actor::ControllerActor;
use nova_core::RecentlyPlayed;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};

/// Builder for a controller task
pub struct TransportController<E: MediaEngine> {
    engine: E,
    config: PlaybackConfig,
    recently_played: Option<Arc<dyn RecentlyPlayed>>,
}

impl<E: MediaEngine> TransportController<E> {
    /// Controller driving `engine`
    pub fn new(engine: E, config: PlaybackConfig) -> Self {
        Self {
            engine,
            config,
            recently_played: None,
        }
    }

    /// Record every committed track transition in `repository`
    pub fn with_recently_played(mut self, repository: Arc<dyn RecentlyPlayed>) -> Self {
        self.recently_played = Some(repository);
        self
    }

    /// Start the controller task on the current tokio runtime
    pub fn spawn(self) -> ControllerHandle {
        let Self {
            mut engine,
            config,
            recently_played,
        } = self;

        let (tx, rx) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        let snapshot = Publisher::new(PlayerSnapshot::initial(config.repeat, config.shuffle));
        let observable = snapshot.observable();

        engine.attach_sink(EngineEventSink::new(tx.downgrade()));

        let actor = ControllerActor::new(
            engine,
            config,
            snapshot,
            events.clone(),
            recently_played,
            tx.downgrade(),
        );
        tokio::spawn(actor.run(rx));

        ControllerHandle::new(tx, observable, events)
    }
}
