//! Controller task
//!
//! Owns the engine, the queue and the recovery policy. Every mutation of
//! playback state happens here, one command at a time, in arrival order.
//!
//! Engine completions are matched against `generation`, which is bumped on
//! every prepare and every stop. The comparison happens when the completion
//! is *applied*, so a prepare superseded by a later skip is dropped even if
//! it finishes first.

use super::command::{Command, ProgressSample, TransportAction};
use crate::engine::{EngineEvent, MediaEngine, PrepareRequest, QueueEdit, QueueSyncStrategy};
use crate::error::EngineError;
use crate::events::PlaybackEvent;
use crate::observable::Publisher;
use crate::queue::QueueStore;
use crate::recovery::{AttachAttempt, FailureRecoveryPolicy, RecoveryDecision};
use crate::types::{PlaybackConfig, PlaybackState, PlayerSnapshot, RepeatMode};
use nova_core::{RecentlyPlayed, Track, TrackId};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

pub(crate) struct ControllerActor<E: MediaEngine> {
    engine: E,
    queue: QueueStore,
    policy: FailureRecoveryPolicy,
    config: PlaybackConfig,
    sync: QueueSyncStrategy,

    state: PlaybackState,
    repeat_mode: RepeatMode,

    /// Prepare generation; engine events tagged with any other value are stale
    generation: u64,
    /// Locator of the in-flight or prepared media
    locator: Option<String>,
    /// Attach history of the current track
    attempt: AttachAttempt,
    play_when_ready: bool,
    stop_after_current: bool,

    /// Track the last `TrackChanged` was emitted for
    active_track: Option<TrackId>,
    /// Whether the current transition was already recorded as recently played
    recorded: bool,

    position_ms: u64,
    duration_ms: Option<u64>,
    progress_epoch: u64,
    last_error: Option<String>,
    /// Bumped on every recorded error
    error_serial: u64,

    published: PlayerSnapshot,
    snapshot: Publisher<PlayerSnapshot>,
    events: broadcast::Sender<PlaybackEvent>,
    recently_played: Option<Arc<dyn RecentlyPlayed>>,

    self_tx: mpsc::WeakUnboundedSender<Command>,
    prepare_timeout: Option<JoinHandle<()>>,
}

impl<E: MediaEngine> ControllerActor<E> {
    pub(crate) fn new(
        engine: E,
        config: PlaybackConfig,
        snapshot: Publisher<PlayerSnapshot>,
        events: broadcast::Sender<PlaybackEvent>,
        recently_played: Option<Arc<dyn RecentlyPlayed>>,
        self_tx: mpsc::WeakUnboundedSender<Command>,
    ) -> Self {
        let sync = QueueSyncStrategy::for_capabilities(engine.capabilities());
        let policy = FailureRecoveryPolicy::new(config.max_attach_attempts)
            .with_fallback_endpoint(config.fallback_endpoint.clone());

        let mut queue = QueueStore::new();
        queue.set_shuffle(config.shuffle);

        Self {
            engine,
            queue,
            policy,
            sync,
            state: PlaybackState::Idle,
            repeat_mode: config.repeat,
            generation: 0,
            locator: None,
            attempt: AttachAttempt::default(),
            play_when_ready: false,
            stop_after_current: false,
            active_track: None,
            recorded: false,
            position_ms: 0,
            duration_ms: None,
            progress_epoch: 0,
            last_error: None,
            error_serial: 0,
            published: snapshot.current(),
            snapshot,
            events,
            recently_played,
            self_tx,
            prepare_timeout: None,
            config,
        }
    }

    pub(crate) async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Command>) {
        tracing::debug!(strategy = ?self.sync, "Playback controller started");

        while let Some(command) = rx.recv().await {
            match command {
                Command::Action { action, reply } => {
                    tracing::debug!(action = action.name(), state = %self.state, "Applying action");
                    let errors_before = self.error_serial;
                    let applied = self.apply(action);
                    if applied && self.error_serial == errors_before {
                        self.last_error = None;
                    }
                    // Callers must observe the new snapshot once they get a reply
                    self.publish();
                    if let Some(reply) = reply {
                        let _ = reply.send(applied);
                    }
                    continue;
                }
                Command::Engine {
                    generation,
                    event: EngineEvent::Position { position_ms },
                } => {
                    // Position reports refresh the internal position only; the
                    // next real state change publishes it
                    if generation == self.generation && self.state == PlaybackState::Playing {
                        self.position_ms = position_ms;
                    }
                    continue;
                }
                Command::Engine { generation, event } => self.on_engine_event(generation, event),
                Command::PrepareTimedOut { generation } => self.on_prepare_timeout(generation),
                Command::SampleProgress { reply } => {
                    let _ = reply.send(self.sample());
                    continue;
                }
                Command::Shutdown => break,
            }
            self.publish();
        }

        self.cancel_prepare_timeout();
        if let Err(e) = self.engine.stop() {
            tracing::debug!("Engine stop on shutdown failed: {}", e);
        }
        self.engine.release();
        tracing::debug!("Playback controller stopped");
    }

    // ===== Actions =====

    fn apply(&mut self, action: TransportAction) -> bool {
        match action {
            TransportAction::Play => self.play(),
            TransportAction::Pause => self.pause(),
            TransportAction::Resume => self.resume(),
            TransportAction::Stop => {
                self.stop_playback();
                true
            }
            TransportAction::SeekTo(position_ms) => self.seek_to(position_ms),
            TransportAction::SkipNext => self.skip_next(),
            TransportAction::SkipPrevious => self.skip_previous(),
            TransportAction::SetShuffle(enabled) => self.set_shuffle(enabled),
            TransportAction::SetRepeatMode(mode) => {
                if self.repeat_mode != mode {
                    self.repeat_mode = mode;
                    self.emit(PlaybackEvent::RepeatModeChanged { mode });
                }
                true
            }
            TransportAction::PlayQueueItemAt(index) => self.go_to(index),
            TransportAction::ClearCurrentSong => {
                self.stop_playback();
                self.last_error = None;
                true
            }
            TransportAction::PlayTrack(track) => self.set_queue(vec![track], None),
            TransportAction::SetQueue { tracks, start_id } => self.set_queue(tracks, start_id),
            TransportAction::MoveUp(id) => self.move_track(&id, true),
            TransportAction::MoveDown(id) => self.move_track(&id, false),
            TransportAction::Remove(id) => self.remove(&id),
            TransportAction::Reorder(tracks) => {
                self.reorder(tracks);
                true
            }
            TransportAction::Append(tracks) => self.append(tracks),
            TransportAction::InsertNext(track) => {
                let index = self.queue.insert_next(Arc::clone(&track));
                self.sync_edit(QueueEdit::Insert { index, track });
                self.emit_queue_changed();
                true
            }
            TransportAction::StopAfterCurrent(enabled) => {
                self.stop_after_current = enabled;
                true
            }
            TransportAction::Teardown => {
                self.teardown();
                true
            }
        }
    }

    fn play(&mut self) -> bool {
        match self.state {
            PlaybackState::Playing => true,
            PlaybackState::Paused | PlaybackState::Ready => self.start_output(),
            PlaybackState::Buffering => {
                self.play_when_ready = true;
                true
            }
            PlaybackState::Idle | PlaybackState::Ended | PlaybackState::Error => {
                if self.queue.current_track().is_none() {
                    return false;
                }
                self.attach_current(true);
                true
            }
        }
    }

    fn resume(&mut self) -> bool {
        match self.state {
            PlaybackState::Paused | PlaybackState::Ready => self.start_output(),
            PlaybackState::Buffering => {
                self.play_when_ready = true;
                true
            }
            PlaybackState::Playing => true,
            _ => false,
        }
    }

    fn pause(&mut self) -> bool {
        match self.state {
            PlaybackState::Playing => {
                if let Err(e) = self.engine.pause() {
                    self.record_error(&e);
                    return false;
                }
                self.position_ms = self.engine.position_ms();
                self.play_when_ready = false;
                self.state = PlaybackState::Paused;
                true
            }
            PlaybackState::Buffering | PlaybackState::Ready => {
                self.play_when_ready = false;
                true
            }
            PlaybackState::Paused => true,
            _ => false,
        }
    }

    fn seek_to(&mut self, position_ms: u64) -> bool {
        if !self.state.is_seekable() {
            return false;
        }
        let target = match self.duration_ms {
            Some(duration) if duration > 0 => position_ms.min(duration),
            _ => position_ms,
        };
        if let Err(e) = self.engine.seek(target) {
            self.record_error(&e);
            return false;
        }
        self.position_ms = target;
        self.progress_epoch += 1;
        true
    }

    fn skip_next(&mut self) -> bool {
        if self.queue.is_empty() {
            return false;
        }
        match self.queue.next_index(self.repeat_mode == RepeatMode::All) {
            Some(index) => self.go_to(index),
            None => {
                tracing::debug!("Skip past the last item; ending playback");
                self.end_playback();
                false
            }
        }
    }

    fn skip_previous(&mut self) -> bool {
        if self.queue.is_empty() {
            return false;
        }
        if self.state.is_seekable()
            && self.engine.position_ms() > self.config.restart_threshold_ms
        {
            return self.seek_to(0);
        }
        match self.queue.previous_index() {
            Some(index) => self.go_to(index),
            None => false,
        }
    }

    fn set_shuffle(&mut self, enabled: bool) -> bool {
        if !self.queue.set_shuffle(enabled) {
            return false;
        }
        self.sync_rebuild();
        self.emit(PlaybackEvent::ShuffleChanged { enabled });
        true
    }

    fn go_to(&mut self, index: usize) -> bool {
        if self.queue.select(index).is_none() {
            return false;
        }
        self.attach_current(true);
        true
    }

    fn set_queue(&mut self, tracks: Vec<Arc<Track>>, start_id: Option<TrackId>) -> bool {
        if !self.queue.set_queue(tracks, start_id.as_ref()) {
            tracing::debug!("Ignoring empty queue");
            self.emit(PlaybackEvent::EmptyQueue);
            return false;
        }
        self.sync_rebuild();
        self.emit_queue_changed();
        self.attach_current(true);
        true
    }

    fn move_track(&mut self, id: &TrackId, up: bool) -> bool {
        let Some(from) = self.queue.position_of(id) else {
            return false;
        };
        let moved = if up {
            self.queue.move_up(id)
        } else {
            self.queue.move_down(id)
        };
        if !moved {
            return false;
        }
        let to = if up { from - 1 } else { from + 1 };
        self.sync_edit(QueueEdit::Move { from, to });
        self.emit_queue_changed();
        true
    }

    fn remove(&mut self, id: &TrackId) -> bool {
        let Some(index) = self.queue.position_of(id) else {
            return false;
        };
        if !self.queue.remove(id) {
            return false;
        }
        self.sync_edit(QueueEdit::Remove { index });
        self.emit_queue_changed();
        true
    }

    fn reorder(&mut self, tracks: Vec<Arc<Track>>) {
        let previous = self.queue.current_track().map(|t| t.id.clone());
        self.queue.reorder(tracks);
        self.sync_rebuild();
        self.emit_queue_changed();

        let current = self.queue.current_track().map(|t| t.id.clone());
        if current == previous {
            return;
        }

        // The playing track was dropped from the queue
        match current {
            None => self.stop_playback(),
            Some(_) if self.state == PlaybackState::Idle => {}
            Some(_) => {
                let keep_playing = self.state.is_active() || self.play_when_ready;
                self.attach_current(keep_playing);
            }
        }
    }

    fn append(&mut self, tracks: Vec<Arc<Track>>) -> bool {
        if tracks.is_empty() {
            return false;
        }
        self.queue.append(tracks.clone());
        self.sync_edit(QueueEdit::Append { tracks });
        self.emit_queue_changed();
        true
    }

    // ===== Engine =====

    fn start_output(&mut self) -> bool {
        match self.engine.play() {
            Ok(()) => {
                self.play_when_ready = true;
                self.state = PlaybackState::Playing;
                true
            }
            Err(e) => {
                self.on_attach_failed(e);
                false
            }
        }
    }

    /// Attach the track under the cursor from its primary locator
    fn attach_current(&mut self, play_when_ready: bool) {
        let Some(track) = self.queue.current_track().cloned() else {
            return;
        };
        let locator = track.source_locator.clone();

        if self.active_track.as_ref() != Some(&track.id) {
            let previous_track_id = self.active_track.replace(track.id.clone());
            tracing::info!("Now playing {} ({})", track.title, track.id);
            self.emit(PlaybackEvent::TrackChanged {
                track_id: track.id.clone(),
                previous_track_id,
            });
        }
        self.recorded = false;
        self.attach(track, locator, AttachAttempt::first(), play_when_ready);
    }

    fn attach(
        &mut self,
        track: Arc<Track>,
        locator: String,
        attempt: AttachAttempt,
        play_when_ready: bool,
    ) {
        self.cancel_prepare_timeout();
        self.generation += 1;
        self.progress_epoch += 1;
        self.position_ms = 0;
        self.duration_ms = None;
        self.attempt = attempt;
        self.play_when_ready = play_when_ready;
        self.state = PlaybackState::Buffering;
        self.locator = Some(locator.clone());

        let request = PrepareRequest {
            generation: self.generation,
            track,
            locator,
        };
        match self.engine.prepare(request) {
            Ok(()) => self.arm_prepare_timeout(),
            Err(e) => {
                // Re-enter like any asynchronous failure
                let delivered = self.self_tx.upgrade().is_some_and(|tx| {
                    tx.send(Command::Engine {
                        generation: self.generation,
                        event: EngineEvent::Error(e),
                    })
                    .is_ok()
                });
                if !delivered {
                    tracing::error!("Controller channel closed while preparing");
                }
            }
        }
    }

    fn on_engine_event(&mut self, generation: u64, event: EngineEvent) {
        if generation != self.generation {
            tracing::warn!(
                generation,
                current = self.generation,
                "Dropping stale engine event: {:?}",
                event
            );
            return;
        }

        match event {
            EngineEvent::Ready { duration_ms } => self.on_ready(duration_ms),
            EngineEvent::Error(e) => {
                if matches!(self.state, PlaybackState::Idle | PlaybackState::Ended) {
                    return;
                }
                self.on_attach_failed(e);
            }
            EngineEvent::Ended => self.on_ended(),
            EngineEvent::Position { .. } => {}
        }
    }

    fn on_ready(&mut self, duration_ms: Option<u64>) {
        if self.state != PlaybackState::Buffering {
            return;
        }
        self.cancel_prepare_timeout();
        self.duration_ms = duration_ms.or_else(|| self.engine.duration_ms());
        self.last_error = None;

        if !self.recorded {
            self.recorded = true;
            if let Some(track) = self.queue.current_track() {
                self.record_recently_played(Arc::clone(track));
            }
        }

        if self.play_when_ready {
            self.start_output();
        } else {
            self.state = PlaybackState::Ready;
        }
    }

    fn on_ended(&mut self) {
        if !matches!(self.state, PlaybackState::Playing | PlaybackState::Paused) {
            return;
        }
        if let Some(track) = self.queue.current_track() {
            let track_id = track.id.clone();
            self.emit(PlaybackEvent::TrackFinished { track_id });
        }

        if self.stop_after_current {
            tracing::info!("Stopping after current track");
            self.teardown();
            return;
        }

        if self.repeat_mode == RepeatMode::One {
            let restarted = self.engine.seek(0).and_then(|()| self.engine.play());
            match restarted {
                Ok(()) => {
                    self.position_ms = 0;
                    self.progress_epoch += 1;
                }
                Err(e) => self.on_attach_failed(e),
            }
            return;
        }

        match self.queue.next_index(self.repeat_mode == RepeatMode::All) {
            Some(index) => {
                self.go_to(index);
            }
            None => {
                self.position_ms = self.duration_ms.unwrap_or(self.position_ms);
                self.end_playback();
            }
        }
    }

    fn on_prepare_timeout(&mut self, generation: u64) {
        if generation != self.generation || self.state != PlaybackState::Buffering {
            return;
        }
        let locator = self.locator.clone().unwrap_or_default();
        tracing::warn!("Prepare of {} timed out", locator);
        self.on_attach_failed(EngineError::Prepare {
            locator,
            reason: format!("timed out after {} ms", self.config.prepare_timeout_ms),
        });
    }

    /// Route an engine failure for the current track through the policy
    fn on_attach_failed(&mut self, error: EngineError) {
        self.cancel_prepare_timeout();
        self.record_error(&error);
        self.state = PlaybackState::Error;

        let Some(track) = self.queue.current_track().cloned() else {
            self.end_playback();
            return;
        };

        let next = self.queue.next_index(false);
        let decision = self.policy.decide(&self.attempt, &track, next);
        tracing::warn!(
            attempts = self.attempt.attempts,
            "Attach of {} failed: {}; recovering with {:?}",
            track.id,
            error,
            decision
        );

        match decision {
            RecoveryDecision::RetryWithFallback { locator } => {
                let attempt = self.attempt.retried_with_fallback();
                let play_when_ready = self.play_when_ready;
                self.attach(track, locator, attempt, play_when_ready);
            }
            RecoveryDecision::SkipTo(index) => {
                self.emit(PlaybackEvent::TrackSkipped {
                    track_id: track.id.clone(),
                });
                self.go_to(index);
            }
            RecoveryDecision::End => {
                self.emit(PlaybackEvent::TrackSkipped {
                    track_id: track.id.clone(),
                });
                self.end_playback();
            }
        }
    }

    /// Stop the engine and move to `Ended`, keeping queue and cursor
    fn end_playback(&mut self) {
        self.halt_engine();
        self.state = PlaybackState::Ended;
    }

    /// Stop the engine, clear the queue and go `Idle`
    fn stop_playback(&mut self) {
        self.halt_engine();
        self.queue.clear();
        self.sync_rebuild();
        self.active_track = None;
        self.position_ms = 0;
        self.duration_ms = None;
        self.progress_epoch += 1;
        self.stop_after_current = false;
        self.state = PlaybackState::Idle;
        self.emit_queue_changed();
    }

    fn teardown(&mut self) {
        self.stop_playback();
        self.engine.release();
        tracing::info!("Engine released");
    }

    fn halt_engine(&mut self) {
        self.cancel_prepare_timeout();
        self.generation += 1;
        self.play_when_ready = false;
        self.locator = None;
        if let Err(e) = self.engine.stop() {
            tracing::debug!("Engine stop failed: {}", e);
        }
    }

    fn sample(&self) -> Option<ProgressSample> {
        if self.state != PlaybackState::Playing {
            return None;
        }
        let track = self.queue.current_track()?;
        let duration_ms = self.engine.duration_ms().or(self.duration_ms).unwrap_or(0);
        let mut position_ms = self.engine.position_ms();
        if duration_ms > 0 {
            position_ms = position_ms.min(duration_ms);
        }
        Some(ProgressSample {
            track_id: track.id.clone(),
            progress_epoch: self.progress_epoch,
            position_ms,
            duration_ms,
        })
    }

    // ===== Timers =====

    fn arm_prepare_timeout(&mut self) {
        self.cancel_prepare_timeout();
        if self.config.prepare_timeout_ms == 0 {
            return;
        }
        let tx = self.self_tx.clone();
        let generation = self.generation;
        let timeout = self.config.prepare_timeout();
        self.prepare_timeout = Some(tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            if let Some(tx) = tx.upgrade() {
                let _ = tx.send(Command::PrepareTimedOut { generation });
            }
        }));
    }

    fn cancel_prepare_timeout(&mut self) {
        if let Some(task) = self.prepare_timeout.take() {
            task.abort();
        }
    }

    // ===== Queue sync =====

    fn sync_edit(&mut self, edit: QueueEdit) {
        let result = match self.sync {
            QueueSyncStrategy::Incremental => self.engine.apply_queue_edit(edit),
            QueueSyncStrategy::Rebuild => self
                .engine
                .rebuild_queue(self.queue.tracks(), self.queue.current_index()),
        };
        if let Err(e) = result {
            tracing::warn!("Engine queue sync failed: {}", e);
        }
    }

    fn sync_rebuild(&mut self) {
        if let Err(e) = self
            .engine
            .rebuild_queue(self.queue.tracks(), self.queue.current_index())
        {
            tracing::warn!("Engine queue rebuild failed: {}", e);
        }
    }

    // ===== Publishing =====

    fn record_error(&mut self, error: &EngineError) {
        let message = error.to_string();
        self.last_error = Some(message.clone());
        self.error_serial += 1;
        self.emit(PlaybackEvent::Error { message });
    }

    fn record_recently_played(&self, track: Arc<Track>) {
        if let Some(repository) = &self.recently_played {
            record_recently_played(Arc::clone(repository), track);
        }
    }

    fn emit_queue_changed(&self) {
        self.emit(PlaybackEvent::QueueChanged {
            length: self.queue.len(),
        });
    }

    fn emit(&self, event: PlaybackEvent) {
        tracing::trace!(kind = event.kind(), "Emitting event");
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    fn build_snapshot(&self, revision: u64) -> PlayerSnapshot {
        PlayerSnapshot {
            revision,
            state: self.state,
            queue: Arc::from(self.queue.tracks().to_vec()),
            current_index: self.queue.current_index(),
            current_track: self.queue.current_track().cloned(),
            repeat_mode: self.repeat_mode,
            shuffle: self.queue.is_shuffled(),
            position_ms: self.position_ms,
            duration_ms: self.duration_ms,
            progress_epoch: self.progress_epoch,
            last_error: self.last_error.clone(),
        }
    }

    /// Publish a new snapshot if anything observable changed
    fn publish(&mut self) {
        let mut next = self.build_snapshot(self.published.revision);
        if next == self.published {
            return;
        }
        next.revision += 1;
        if next.state != self.published.state {
            self.emit(PlaybackEvent::StateChanged { state: next.state });
        }
        self.published = next.clone();
        self.snapshot.publish(next);
    }
}

/// Record `track` in the repository without blocking the controller
///
/// Failures are logged and swallowed.
pub(crate) fn record_recently_played(
    repository: Arc<dyn RecentlyPlayed>,
    track: Arc<Track>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = repository.add_to_recently_played(&track).await {
            tracing::warn!("Failed to record {} as recently played: {}", track.id, e);
        }
    })
}
