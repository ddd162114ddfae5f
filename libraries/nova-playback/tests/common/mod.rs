//! Shared helpers for nova-playback integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use nova_core::{NovaError, RecentlyPlayed, Track, TrackId};
use nova_playback::{
    ArtworkProvider, ControllerHandle, EngineCapabilities, EngineError, EngineEventSink,
    EngineResult, MediaEngine, PlaybackConfig, PlaybackState, PlayerSnapshot, PrepareRequest,
    QueueEdit, SessionSummary, SessionSurface, TransportController,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ===== Tracks =====

pub fn create_test_track(id: &str) -> Arc<Track> {
    Arc::new(Track::new(
        TrackId::new(id),
        format!("Title {}", id),
        "Test Artist",
        "Test Album",
        format!("https://media.invalid/{}", id),
    ))
}

pub fn create_tracks(ids: &[&str]) -> Vec<Arc<Track>> {
    ids.iter().map(|id| create_test_track(id)).collect()
}

pub fn queue_ids(snapshot: &PlayerSnapshot) -> Vec<String> {
    snapshot.queue.iter().map(|t| t.id.to_string()).collect()
}

pub fn current_id(snapshot: &PlayerSnapshot) -> Option<String> {
    snapshot.current_track.as_ref().map(|t| t.id.to_string())
}

// ===== Scripted engine =====

/// Engine call, as recorded by [`ScriptedEngine`]
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Prepare { generation: u64, locator: String },
    Play,
    Pause,
    Seek(u64),
    Stop,
    Release,
    Edit(QueueEdit),
    Rebuild { len: usize, current: Option<usize> },
}

#[derive(Default)]
struct EngineState {
    sink: Option<EngineEventSink>,
    calls: Vec<EngineCall>,
    failing: HashSet<String>,
    hanging: HashSet<String>,
    durations: HashMap<String, u64>,
    last_generation: u64,
    position_ms: u64,
    duration_ms: Option<u64>,
    auto_ready: bool,
}

/// In-memory engine whose prepare outcomes are scripted per locator
///
/// By default every prepare completes immediately with a 180 s duration.
pub struct ScriptedEngine {
    state: Arc<Mutex<EngineState>>,
    capabilities: EngineCapabilities,
}

/// Test-side view of a [`ScriptedEngine`] moved into a controller
#[derive(Clone)]
pub struct EngineRemote {
    state: Arc<Mutex<EngineState>>,
}

impl ScriptedEngine {
    pub fn new() -> (Self, EngineRemote) {
        Self::with_capabilities(EngineCapabilities::default())
    }

    pub fn with_capabilities(capabilities: EngineCapabilities) -> (Self, EngineRemote) {
        let state = Arc::new(Mutex::new(EngineState {
            auto_ready: true,
            ..Default::default()
        }));
        (
            Self {
                state: Arc::clone(&state),
                capabilities,
            },
            EngineRemote { state },
        )
    }

    fn record(&self, call: EngineCall) {
        self.state.lock().unwrap().calls.push(call);
    }
}

impl MediaEngine for ScriptedEngine {
    fn attach_sink(&mut self, sink: EngineEventSink) {
        self.state.lock().unwrap().sink = Some(sink);
    }

    fn prepare(&mut self, request: PrepareRequest) -> EngineResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(EngineCall::Prepare {
            generation: request.generation,
            locator: request.locator.clone(),
        });
        state.last_generation = request.generation;
        state.position_ms = 0;
        state.duration_ms = None;

        if state.hanging.contains(&request.locator) || !state.auto_ready {
            return Ok(());
        }
        let Some(sink) = state.sink.clone() else {
            return Err(EngineError::NotPrepared);
        };

        if state.failing.contains(&request.locator) {
            sink.error(
                request.generation,
                EngineError::Prepare {
                    locator: request.locator,
                    reason: "HTTP 403".into(),
                },
            );
        } else {
            let duration = state
                .durations
                .get(&request.locator)
                .copied()
                .unwrap_or(180_000);
            state.duration_ms = Some(duration);
            sink.ready(request.generation, Some(duration));
        }
        Ok(())
    }

    fn play(&mut self) -> EngineResult<()> {
        self.record(EngineCall::Play);
        Ok(())
    }

    fn pause(&mut self) -> EngineResult<()> {
        self.record(EngineCall::Pause);
        Ok(())
    }

    fn seek(&mut self, position_ms: u64) -> EngineResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(EngineCall::Seek(position_ms));
        state.position_ms = position_ms;
        Ok(())
    }

    fn stop(&mut self) -> EngineResult<()> {
        self.record(EngineCall::Stop);
        Ok(())
    }

    fn release(&mut self) {
        self.record(EngineCall::Release);
    }

    fn position_ms(&self) -> u64 {
        self.state.lock().unwrap().position_ms
    }

    fn duration_ms(&self) -> Option<u64> {
        self.state.lock().unwrap().duration_ms
    }

    fn capabilities(&self) -> EngineCapabilities {
        self.capabilities
    }

    fn apply_queue_edit(&mut self, edit: QueueEdit) -> EngineResult<()> {
        self.record(EngineCall::Edit(edit));
        Ok(())
    }

    fn rebuild_queue(&mut self, tracks: &[Arc<Track>], current: Option<usize>) -> EngineResult<()> {
        self.record(EngineCall::Rebuild {
            len: tracks.len(),
            current,
        });
        Ok(())
    }
}

impl EngineRemote {
    pub fn calls(&self) -> Vec<EngineCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    /// Locators passed to `prepare`, in order
    pub fn prepared_locators(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                EngineCall::Prepare { locator, .. } => Some(locator),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, call: &EngineCall) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }

    pub fn fail_locator(&self, locator: impl Into<String>) {
        self.state.lock().unwrap().failing.insert(locator.into());
    }

    pub fn hang_locator(&self, locator: impl Into<String>) {
        self.state.lock().unwrap().hanging.insert(locator.into());
    }

    /// Leave every prepare pending until the test completes it
    pub fn set_auto_ready(&self, auto_ready: bool) {
        self.state.lock().unwrap().auto_ready = auto_ready;
    }

    pub fn set_position(&self, position_ms: u64) {
        self.state.lock().unwrap().position_ms = position_ms;
    }

    pub fn last_generation(&self) -> u64 {
        self.state.lock().unwrap().last_generation
    }

    fn sink(&self) -> EngineEventSink {
        self.state
            .lock()
            .unwrap()
            .sink
            .clone()
            .expect("engine sink attached")
    }

    pub fn complete_prepare(&self, generation: u64, duration_ms: u64) {
        self.state.lock().unwrap().duration_ms = Some(duration_ms);
        self.sink().ready(generation, Some(duration_ms));
    }

    pub fn fail(&self, generation: u64, reason: &str) {
        self.sink()
            .error(generation, EngineError::Playback(reason.to_string()));
    }

    /// Report the end of the most recently prepared media
    pub fn finish_current(&self) {
        let generation = self.last_generation();
        self.sink().ended(generation);
    }
}

// ===== Controller =====

pub fn spawn_controller(config: PlaybackConfig) -> (ControllerHandle, EngineRemote) {
    let (engine, remote) = ScriptedEngine::new();
    (TransportController::new(engine, config).spawn(), remote)
}

/// Wait until the published state satisfies `predicate`
pub async fn wait_for(
    handle: &ControllerHandle,
    predicate: impl FnMut(&PlayerSnapshot) -> bool,
) -> PlayerSnapshot {
    let mut observable = handle.subscribe();
    tokio::time::timeout(Duration::from_secs(60), observable.wait_for(predicate))
        .await
        .expect("timed out waiting for controller state")
        .expect("controller closed")
}

pub async fn wait_for_state(handle: &ControllerHandle, state: PlaybackState) -> PlayerSnapshot {
    wait_for(handle, |s| s.state == state).await
}

// ===== Collaborators =====

/// Session surface that records every push; `None` marks a clear
#[derive(Default)]
pub struct RecordingSurface {
    pub pushes: Mutex<Vec<Option<SessionSummary>>>,
}

impl RecordingSurface {
    pub fn pushes(&self) -> Vec<Option<SessionSummary>> {
        self.pushes.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<SessionSummary> {
        self.pushes().into_iter().flatten().last()
    }
}

#[async_trait]
impl SessionSurface for RecordingSurface {
    async fn publish(&self, summary: &SessionSummary) {
        self.pushes.lock().unwrap().push(Some(summary.clone()));
    }

    async fn clear(&self) {
        self.pushes.lock().unwrap().push(None);
    }
}

/// Artwork provider whose lookup time depends on the track
pub struct DelayedArtwork {
    pub delays: HashMap<String, Duration>,
}

#[async_trait]
impl ArtworkProvider for DelayedArtwork {
    async fn artwork_for(&self, track: &Track) -> Option<String> {
        let delay = self
            .delays
            .get(track.id.as_str())
            .copied()
            .unwrap_or_default();
        tokio::time::sleep(delay).await;
        Some(format!("art://{}", track.id))
    }
}

/// Repository that records every call
#[derive(Default)]
pub struct RecordingRepository {
    pub played: Mutex<Vec<TrackId>>,
    pub fail: bool,
}

impl RecordingRepository {
    pub fn played(&self) -> Vec<String> {
        self.played
            .lock()
            .unwrap()
            .iter()
            .map(|id| id.to_string())
            .collect()
    }
}

#[async_trait]
impl RecentlyPlayed for RecordingRepository {
    async fn add_to_recently_played(&self, track: &Track) -> nova_core::Result<()> {
        self.played.lock().unwrap().push(track.id.clone());
        if self.fail {
            return Err(NovaError::repository("database is locked"));
        }
        Ok(())
    }
}
