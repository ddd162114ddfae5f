//! Simulated media engine
//!
//! Plays nothing. Prepares complete after a fixed delay, every track has the
//! same duration, and "playback" is a clock. Locators matching a configured
//! fragment fail to prepare, which exercises retry-with-fallback and skip.

use crate::config::SimulationSettings;
use nova_core::Track;
use nova_playback::{
    EngineCapabilities, EngineError, EngineEventSink, EngineResult, MediaEngine, PrepareRequest,
    QueueEdit,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Media prepared by the last successful `prepare`
#[derive(Debug)]
struct Prepared {
    generation: u64,
    duration_ms: u64,
    /// Position when output last started or paused
    offset_ms: u64,
    /// Set while output runs
    started: Option<Instant>,
}

impl Prepared {
    fn position_ms(&self) -> u64 {
        let running = self
            .started
            .map_or(0, |started| started.elapsed().as_millis() as u64);
        (self.offset_ms + running).min(self.duration_ms)
    }
}

pub struct SimulatedEngine {
    settings: SimulationSettings,
    sink: Option<EngineEventSink>,
    prepared: Option<Prepared>,
    /// Pending prepare completion or end-of-media timer
    timer: Option<JoinHandle<()>>,
}

impl SimulatedEngine {
    pub fn new(settings: SimulationSettings) -> Self {
        Self {
            settings,
            sink: None,
            prepared: None,
            timer: None,
        }
    }

    fn fails(&self, locator: &str) -> bool {
        self.settings
            .failing_locators
            .iter()
            .any(|fragment| locator.contains(fragment.as_str()))
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }

    /// Schedule the end-of-media report for the running output
    fn schedule_end(&mut self) {
        self.cancel_timer();
        let (Some(sink), Some(prepared)) = (self.sink.clone(), self.prepared.as_ref()) else {
            return;
        };
        let generation = prepared.generation;
        let remaining = prepared.duration_ms.saturating_sub(prepared.position_ms());

        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(remaining)).await;
            sink.ended(generation);
        }));
    }

    fn prepared_mut(&mut self) -> EngineResult<&mut Prepared> {
        self.prepared.as_mut().ok_or(EngineError::NotPrepared)
    }
}

impl MediaEngine for SimulatedEngine {
    fn attach_sink(&mut self, sink: EngineEventSink) {
        self.sink = Some(sink);
    }

    fn prepare(&mut self, request: PrepareRequest) -> EngineResult<()> {
        self.cancel_timer();
        self.prepared = None;

        let Some(sink) = self.sink.clone() else {
            return Err(EngineError::NotPrepared);
        };
        let generation = request.generation;
        let delay = Duration::from_millis(self.settings.prepare_delay_ms);
        tracing::debug!(generation, "Simulated prepare of {}", request.locator);

        if self.fails(&request.locator) {
            let error = EngineError::Prepare {
                locator: request.locator,
                reason: "simulated source failure".to_string(),
            };
            self.timer = Some(tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                sink.error(generation, error);
            }));
            return Ok(());
        }

        let duration_ms = self.settings.track_duration_secs * 1000;
        self.prepared = Some(Prepared {
            generation,
            duration_ms,
            offset_ms: 0,
            started: None,
        });
        self.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            sink.ready(generation, Some(duration_ms));
        }));
        Ok(())
    }

    fn play(&mut self) -> EngineResult<()> {
        let prepared = self.prepared_mut()?;
        if prepared.started.is_none() {
            prepared.started = Some(Instant::now());
        }
        self.schedule_end();
        Ok(())
    }

    fn pause(&mut self) -> EngineResult<()> {
        let prepared = self.prepared_mut()?;
        prepared.offset_ms = prepared.position_ms();
        prepared.started = None;
        self.cancel_timer();
        Ok(())
    }

    fn seek(&mut self, position_ms: u64) -> EngineResult<()> {
        let prepared = self.prepared_mut()?;
        prepared.offset_ms = position_ms.min(prepared.duration_ms);
        let running = prepared.started.is_some();
        if running {
            prepared.started = Some(Instant::now());
            self.schedule_end();
        }
        Ok(())
    }

    fn stop(&mut self) -> EngineResult<()> {
        self.cancel_timer();
        self.prepared = None;
        Ok(())
    }

    fn release(&mut self) {
        self.cancel_timer();
        self.prepared = None;
        tracing::debug!("Simulated engine released");
    }

    fn position_ms(&self) -> u64 {
        self.prepared.as_ref().map_or(0, Prepared::position_ms)
    }

    fn duration_ms(&self) -> Option<u64> {
        self.prepared.as_ref().map(|p| p.duration_ms)
    }

    fn capabilities(&self) -> EngineCapabilities {
        EngineCapabilities {
            incremental_queue_edits: self.settings.incremental_queue_edits,
        }
    }

    fn apply_queue_edit(&mut self, edit: QueueEdit) -> EngineResult<()> {
        tracing::trace!("Engine playlist edit: {:?}", edit);
        Ok(())
    }

    fn rebuild_queue(&mut self, tracks: &[Arc<Track>], current: Option<usize>) -> EngineResult<()> {
        tracing::trace!(
            "Engine playlist rebuilt: {} items, current {:?}",
            tracks.len(),
            current
        );
        Ok(())
    }
}

impl Drop for SimulatedEngine {
    fn drop(&mut self) {
        self.cancel_timer();
    }
}
