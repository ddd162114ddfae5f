//! Media engine adapter
//!
//! Abstracts the decode/output engine so the controller works the same way
//! against a real player, a simulated one, or a scripted test double.
//!
//! Transport calls are synchronous and only *initiate* work. Everything the
//! engine learns later (prepared, failed, finished) comes back through the
//! [`EngineEventSink`], tagged with the generation of the prepare request it
//! belongs to, and re-enters the controller's command stream.

use crate::controller::Command;
use crate::error::{EngineError, EngineResult};
use nova_core::Track;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Platform media engine
///
/// Exclusively owned by the transport controller; nothing else calls it.
pub trait MediaEngine: Send + 'static {
    /// Hand the engine the sink it reports asynchronous events through
    ///
    /// Called once, before any other method.
    fn attach_sink(&mut self, sink: EngineEventSink);

    /// Start buffering `request.locator`
    ///
    /// Completion is reported as [`EngineEvent::Ready`] or
    /// [`EngineEvent::Error`] carrying `request.generation`. A new prepare
    /// supersedes any in-flight one.
    fn prepare(&mut self, request: PrepareRequest) -> EngineResult<()>;

    /// Start or resume output of the prepared media
    fn play(&mut self) -> EngineResult<()>;

    /// Pause output, keeping the prepared media
    fn pause(&mut self) -> EngineResult<()>;

    /// Seek within the prepared media
    fn seek(&mut self, position_ms: u64) -> EngineResult<()>;

    /// Stop output and drop the prepared media
    fn stop(&mut self) -> EngineResult<()>;

    /// Release every resource the engine holds
    ///
    /// The engine must accept a later `prepare` after this.
    fn release(&mut self);

    /// Current position of the prepared media
    fn position_ms(&self) -> u64;

    /// Duration of the prepared media, if known
    fn duration_ms(&self) -> Option<u64>;

    /// What the engine supports; queried once at controller start
    fn capabilities(&self) -> EngineCapabilities {
        EngineCapabilities::default()
    }

    /// Mirror a single queue edit into the engine's own playlist
    ///
    /// Only called when [`EngineCapabilities::incremental_queue_edits`] is set.
    fn apply_queue_edit(&mut self, _edit: QueueEdit) -> EngineResult<()> {
        Ok(())
    }

    /// Replace the engine's own playlist wholesale
    fn rebuild_queue(
        &mut self,
        _tracks: &[Arc<Track>],
        _current: Option<usize>,
    ) -> EngineResult<()> {
        Ok(())
    }
}

/// Request to prepare one track
#[derive(Debug, Clone, PartialEq)]
pub struct PrepareRequest {
    /// Generation the completion must be tagged with
    pub generation: u64,

    /// Track being prepared
    pub track: Arc<Track>,

    /// Locator to open; the track's own locator or a fallback
    pub locator: String,
}

/// Asynchronous engine notifications
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Media prepared; duration if the container reports one
    Ready {
        /// Track duration
        duration_ms: Option<u64>,
    },

    /// Prepare or playback failed
    Error(EngineError),

    /// Reached the end of the media
    Ended,

    /// Periodic position report
    Position {
        /// Current position
        position_ms: u64,
    },
}

/// Engine feature flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineCapabilities {
    /// Engine keeps its own playlist and can apply single edits to it
    pub incremental_queue_edits: bool,
}

/// How queue changes are mirrored into the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueSyncStrategy {
    /// Send each edit as a [`QueueEdit`]; whole-order changes still rebuild
    Incremental,

    /// Always send the full track list
    Rebuild,
}

impl QueueSyncStrategy {
    /// Pick the strategy for an engine
    pub fn for_capabilities(capabilities: EngineCapabilities) -> Self {
        if capabilities.incremental_queue_edits {
            QueueSyncStrategy::Incremental
        } else {
            QueueSyncStrategy::Rebuild
        }
    }
}

/// A single queue edit, in engine playlist indices
#[derive(Debug, Clone, PartialEq)]
pub enum QueueEdit {
    /// Move the item at `from` to `to`
    Move {
        /// Source index
        from: usize,
        /// Destination index
        to: usize,
    },

    /// Remove the item at `index`
    Remove {
        /// Index removed
        index: usize,
    },

    /// Insert `track` at `index`
    Insert {
        /// Index inserted at
        index: usize,
        /// Track inserted
        track: Arc<Track>,
    },

    /// Append `tracks` to the end
    Append {
        /// Tracks appended
        tracks: Vec<Arc<Track>>,
    },
}

/// Channel the engine reports through
///
/// Holds only a weak reference to the controller: an engine that outlives
/// its controller simply has its reports dropped.
#[derive(Debug, Clone)]
pub struct EngineEventSink {
    tx: mpsc::WeakUnboundedSender<Command>,
}

impl EngineEventSink {
    pub(crate) fn new(tx: mpsc::WeakUnboundedSender<Command>) -> Self {
        Self { tx }
    }

    /// Report that generation `generation` is prepared
    pub fn ready(&self, generation: u64, duration_ms: Option<u64>) -> bool {
        self.send(generation, EngineEvent::Ready { duration_ms })
    }

    /// Report a failure for generation `generation`
    pub fn error(&self, generation: u64, error: EngineError) -> bool {
        self.send(generation, EngineEvent::Error(error))
    }

    /// Report that generation `generation` played to its end
    pub fn ended(&self, generation: u64) -> bool {
        self.send(generation, EngineEvent::Ended)
    }

    /// Report the playback position of generation `generation`
    pub fn position(&self, generation: u64, position_ms: u64) -> bool {
        self.send(generation, EngineEvent::Position { position_ms })
    }

    /// Deliver an event; returns `false` once the controller is gone
    pub fn send(&self, generation: u64, event: EngineEvent) -> bool {
        match self.tx.upgrade() {
            Some(tx) => tx.send(Command::Engine { generation, event }).is_ok(),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_follows_capabilities() {
        assert_eq!(
            QueueSyncStrategy::for_capabilities(EngineCapabilities::default()),
            QueueSyncStrategy::Rebuild
        );
        assert_eq!(
            QueueSyncStrategy::for_capabilities(EngineCapabilities {
                incremental_queue_edits: true
            }),
            QueueSyncStrategy::Incremental
        );
    }

    #[test]
    fn sink_tags_events_with_generation() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sink = EngineEventSink::new(tx.downgrade());

        assert!(sink.ready(7, Some(1000)));
        match rx.try_recv() {
            Ok(Command::Engine { generation, event }) => {
                assert_eq!(generation, 7);
                assert_eq!(event, EngineEvent::Ready { duration_ms: Some(1000) });
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn sink_reports_closed_controller() {
        let (tx, rx) = mpsc::unbounded_channel::<Command>();
        let sink = EngineEventSink::new(tx.downgrade());
        drop(tx);
        drop(rx);

        assert!(!sink.ended(1));
    }
}
