//! Nova Player - Playback Queue & Session Controller
//!
//! Platform-agnostic playback control for Nova Player.
//!
//! This crate provides:
//! - Queue editing with an identity-following cursor (move, remove, reorder)
//! - Shuffle with exact restore of the original order
//! - Repeat modes (None, One, All)
//! - A single-writer transport controller driving a pluggable media engine
//! - Retry-with-fallback and skip-on-failure recovery
//! - Progress sampling, session-surface projection, idle and sleep timers
//!
//! # Architecture
//!
//! `nova-playback` owns no audio code. The engine, the session surface, the
//! artwork source and the recently-played repository are traits implemented
//! by the host application.
//!
//! ```text
//! UI / session surface / timers / engine callbacks
//!                 │
//!                 ▼
//!        TransportController  (one task, one command stream)
//!          │            │
//!     QueueStore    MediaEngine
//!          │
//!          ▼
//!   watch<PlayerSnapshot> ──► ProgressPublisher, SessionProjector,
//!                             IdleLifecycleManager
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use nova_core::{Track, TrackId};
//! use nova_playback::{MediaEngine, PlaybackConfig, TransportController};
//! use std::sync::Arc;
//!
//! # async fn demo(engine: impl MediaEngine) -> nova_playback::Result<()> {
//! let controller = TransportController::new(engine, PlaybackConfig::default()).spawn();
//!
//! let tracks = vec![
//!     Arc::new(Track::new(TrackId::new("yt:a"), "A", "Artist", "Album", "https://x/a")),
//!     Arc::new(Track::new(TrackId::new("yt:b"), "B", "Artist", "Album", "https://x/b")),
//! ];
//! controller.set_queue(tracks, Some(TrackId::new("yt:b"))).await?;
//! controller.skip_next().await?;
//!
//! let snapshot = controller.snapshot();
//! println!("{} ({})", snapshot.state, snapshot.queue.len());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod controller;
pub mod engine;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod observable;
pub mod progress;
pub mod queue;
pub mod recovery;
pub mod session;
pub mod shuffle;
pub mod types;

pub use controller::{CommandSender, ControllerHandle, TransportAction, TransportController};
pub use engine::{
    EngineCapabilities, EngineEvent, EngineEventSink, MediaEngine, PrepareRequest, QueueEdit,
    QueueSyncStrategy,
};
pub use error::{EngineError, EngineResult, PlaybackError, Result};
pub use events::PlaybackEvent;
pub use lifecycle::{IdleLifecycleManager, LifecycleStatus, SleepTimer};
pub use observable::{Observable, Publisher};
pub use progress::ProgressPublisher;
pub use queue::QueueStore;
pub use recovery::{AttachAttempt, FailureRecoveryPolicy, RecoveryDecision};
pub use session::{
    ArtworkProvider, AvailableActions, SessionAction, SessionProjector, SessionSummary,
    SessionSurface,
};
pub use types::{PlaybackConfig, PlaybackState, PlayerSnapshot, Progress, RepeatMode};
