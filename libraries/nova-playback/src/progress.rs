//! Progress publisher
//!
//! Samples position and duration while the controller reports `Playing` and
//! publishes them as an observable [`Progress`]. Sampling stops the moment
//! the published state leaves `Playing`.
//!
//! A sample is requested through the controller's command stream, so it is
//! taken between two commands. It is still checked against the latest
//! snapshot before publishing: a skip or seek that lands while the reply is
//! in flight makes it stale.

use crate::controller::{CommandSender, ControllerHandle, ProgressSample};
use crate::observable::{Observable, Publisher};
use crate::types::{PlaybackState, PlayerSnapshot, Progress};
use nova_core::TrackId;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Background sampler of the playing track's progress
#[derive(Debug)]
pub struct ProgressPublisher {
    progress: Observable<Option<Progress>>,
    task: JoinHandle<()>,
}

impl ProgressPublisher {
    /// Start sampling `controller` every `interval` while it plays
    pub fn spawn(controller: &ControllerHandle, interval: Duration) -> Self {
        let publisher = Publisher::new(None);
        let progress = publisher.observable();
        let sampler = Sampler {
            commands: controller.sender(),
            snapshots: controller.subscribe().receiver(),
            publisher,
            interval: interval.max(Duration::from_millis(1)),
            last: None,
        };
        let task = tokio::spawn(sampler.run());
        Self { progress, task }
    }

    /// Observable progress of the current track; `None` when nothing is selected
    pub fn progress(&self) -> Observable<Option<Progress>> {
        self.progress.clone()
    }

    /// Latest published progress
    pub fn current(&self) -> Option<Progress> {
        self.progress.get()
    }
}

impl Drop for ProgressPublisher {
    fn drop(&mut self) {
        self.task.abort();
    }
}

struct Sampler {
    commands: CommandSender,
    snapshots: watch::Receiver<PlayerSnapshot>,
    publisher: Publisher<Option<Progress>>,
    interval: Duration,
    /// Track and epoch of the last published value
    last: Option<(TrackId, u64)>,
}

impl Sampler {
    async fn run(mut self) {
        loop {
            let snapshot = self.snapshots.borrow_and_update().clone();

            if snapshot.state == PlaybackState::Playing {
                if !self.sample_while_playing().await {
                    break;
                }
                continue;
            }

            self.publish_idle(&snapshot);
            if self.snapshots.changed().await.is_err() {
                break;
            }
        }
        tracing::debug!("Progress publisher stopped");
    }

    /// Tick until the snapshot changes; `false` once the controller is gone
    async fn sample_while_playing(&mut self) -> bool {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                changed = self.snapshots.changed() => return changed.is_ok(),
                _ = ticker.tick() => {
                    match self.commands.sample_progress().await {
                        Some(sample) => self.accept(sample),
                        None if self.commands.is_closed() => return false,
                        None => {}
                    }
                }
            }
        }
    }

    /// Publish `sample` unless a newer track or seek superseded it
    fn accept(&mut self, sample: ProgressSample) {
        let latest = self.snapshots.borrow();
        let current = latest.current_track.as_ref().map(|t| &t.id);
        if current != Some(&sample.track_id)
            || latest.progress_epoch != sample.progress_epoch
            || latest.state != PlaybackState::Playing
        {
            tracing::debug!("Discarding stale progress sample for {}", sample.track_id);
            return;
        }
        drop(latest);

        let same_epoch =
            self.last.as_ref() == Some(&(sample.track_id.clone(), sample.progress_epoch));
        if same_epoch {
            if let Some(previous) = self.publisher.current() {
                if sample.position_ms < previous.position_ms {
                    // Position only moves forward within one epoch
                    return;
                }
            }
        }

        self.last = Some((sample.track_id.clone(), sample.progress_epoch));
        self.publisher.publish_if_changed(Some(Progress {
            track_id: sample.track_id,
            position_ms: sample.position_ms,
            duration_ms: sample.duration_ms,
        }));
    }

    /// Reflect a non-playing snapshot: frozen while paused, reset on a new
    /// track or seek, cleared when nothing is selected
    fn publish_idle(&mut self, snapshot: &PlayerSnapshot) {
        let Some(track) = snapshot.current_track.as_ref() else {
            self.last = None;
            self.publisher.publish_if_changed(None);
            return;
        };

        let key = (track.id.clone(), snapshot.progress_epoch);
        if self.last.as_ref() == Some(&key) {
            return;
        }
        self.last = Some(key);

        let duration_ms = snapshot.duration_ms.unwrap_or(0);
        let position_ms = if duration_ms > 0 {
            snapshot.position_ms.min(duration_ms)
        } else {
            snapshot.position_ms
        };
        self.publisher.publish_if_changed(Some(Progress {
            track_id: track.id.clone(),
            position_ms,
            duration_ms,
        }));
    }
}
