//! Player wiring
//!
//! Builds the controller around the simulated engine, starts the progress,
//! session and lifecycle tasks, and executes console commands against them.

use crate::catalog::Catalog;
use crate::commands::{PlayerCommand, SleepSetting, HELP};
use crate::config::AppConfig;
use crate::engine::SimulatedEngine;
use crate::error::Result;
use crate::session::{LoggingSurface, MemoryHistory, ThumbnailArtwork};
use nova_core::TrackId;
use nova_playback::{
    ControllerHandle, IdleLifecycleManager, PlayerSnapshot, ProgressPublisher, SessionProjector,
    SleepTimer, TransportController,
};
use std::sync::Arc;

/// Recently-played entries kept in memory
const HISTORY_CAPACITY: usize = 50;

/// What the console loop does after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    Quit,
}

pub struct Player {
    controller: ControllerHandle,
    lifecycle: Arc<IdleLifecycleManager>,
    progress: ProgressPublisher,
    _session: SessionProjector,
    history: Arc<MemoryHistory>,
    catalog: Catalog,
}

impl Player {
    /// Start the controller and its satellite tasks
    ///
    /// Must be called inside a tokio runtime.
    pub fn start(config: &AppConfig) -> Self {
        let engine = SimulatedEngine::new(config.simulation.clone());
        let history = Arc::new(MemoryHistory::new(HISTORY_CAPACITY));

        let controller = TransportController::new(engine, config.playback.clone())
            .with_recently_played(history.clone())
            .spawn();

        let progress = ProgressPublisher::spawn(&controller, config.playback.progress_interval());
        let session = SessionProjector::spawn(
            &controller,
            Arc::new(LoggingSurface),
            Some(Arc::new(ThumbnailArtwork)),
        );
        let lifecycle =
            IdleLifecycleManager::spawn(&controller, config.playback.background_idle_timeout());

        tracing::info!("Player started");
        Self {
            controller,
            lifecycle,
            progress,
            _session: session,
            history,
            catalog: Catalog::new(config.simulation.source_endpoint.clone()),
        }
    }

    pub fn controller(&self) -> &ControllerHandle {
        &self.controller
    }

    pub fn lifecycle(&self) -> &Arc<IdleLifecycleManager> {
        &self.lifecycle
    }

    pub fn progress(&self) -> &ProgressPublisher {
        &self.progress
    }

    pub fn history(&self) -> &Arc<MemoryHistory> {
        &self.history
    }

    /// Replace the queue with `ids` and start at the first one
    pub async fn load(&self, ids: &[TrackId]) -> Result<bool> {
        let tracks = self.catalog.tracks(ids);
        Ok(self.controller.set_queue(tracks, None).await?)
    }

    /// Execute one console command
    pub async fn execute(&self, command: PlayerCommand) -> Result<Outcome> {
        tracing::debug!("Executing {:?}", command);
        let controller = &self.controller;

        let applied = match command {
            PlayerCommand::Play => controller.play().await?,
            PlayerCommand::Pause => controller.pause().await?,
            PlayerCommand::Resume => controller.resume().await?,
            PlayerCommand::Stop => controller.stop().await?,
            PlayerCommand::Next => controller.skip_next().await?,
            PlayerCommand::Previous => controller.skip_previous().await?,
            PlayerCommand::Seek(position_ms) => controller.seek_to(position_ms).await?,
            PlayerCommand::Goto(index) => controller.play_queue_item_at(index).await?,
            PlayerCommand::Shuffle(enabled) => controller.set_shuffle(enabled).await?,
            PlayerCommand::Repeat(mode) => controller.set_repeat_mode(mode).await?,
            PlayerCommand::Add(id) => controller.append(vec![self.catalog.track(&id)]).await?,
            PlayerCommand::PlayNext(id) => controller.insert_next(self.catalog.track(&id)).await?,
            PlayerCommand::MoveUp(id) => controller.move_up(id).await?,
            PlayerCommand::MoveDown(id) => controller.move_down(id).await?,
            PlayerCommand::Remove(id) => controller.remove(id).await?,
            PlayerCommand::Sleep(setting) => {
                match setting {
                    SleepSetting::After(delay) => {
                        self.lifecycle.arm_sleep(SleepTimer::After(delay))
                    }
                    SleepSetting::EndOfTrack => self.lifecycle.arm_sleep(SleepTimer::EndOfTrack),
                    SleepSetting::Off => self.lifecycle.cancel_sleep(),
                }
                true
            }
            PlayerCommand::Background => {
                self.lifecycle.app_backgrounded();
                true
            }
            PlayerCommand::Foreground => {
                self.lifecycle.app_foregrounded();
                true
            }
            PlayerCommand::Queue => {
                println!("{}", describe_queue(&controller.snapshot()));
                true
            }
            PlayerCommand::History => {
                for (i, id) in self.history.recent().await.iter().enumerate() {
                    println!("{:>3}  {}", i + 1, id);
                }
                true
            }
            PlayerCommand::Help => {
                println!("{}", HELP);
                true
            }
            PlayerCommand::Quit => return Ok(Outcome::Quit),
        };

        if !applied {
            tracing::info!("Command had no effect");
        }
        Ok(Outcome::Continue)
    }

    /// Stop the controller; satellite tasks end with it
    pub fn shutdown(&self) {
        self.controller.shutdown();
    }
}

/// Human-readable queue listing with the cursor marked
pub fn describe_queue(snapshot: &PlayerSnapshot) -> String {
    let mut out = format!(
        "{} | repeat {:?} | shuffle {} | {} items",
        snapshot.state,
        snapshot.repeat_mode,
        if snapshot.shuffle { "on" } else { "off" },
        snapshot.queue.len()
    );
    for (i, track) in snapshot.queue.iter().enumerate() {
        let marker = if snapshot.current_index == Some(i) { '>' } else { ' ' };
        out.push_str(&format!("\n{} {:>3}  {}  {}", marker, i, track.id, track.title));
    }
    if let Some(error) = &snapshot.last_error {
        out.push_str(&format!("\nlast error: {}", error));
    }
    out
}
