//! Idle lifecycle manager
//!
//! Two single-shot, cancelable timers on one scheduler task:
//!
//! - **Background idle**: armed while the app is backgrounded and playback
//!   is not running; tears the engine down when it fires. Foregrounding or
//!   any playback start cancels it.
//! - **Sleep**: a fixed delay, or "end of the current track". Fires a
//!   teardown (stop and engine release).
//!
//! Arming a timer that is already pending replaces it, so a timer fires at
//! most once per arm. Construct one manager per process and share the `Arc`.

use crate::controller::{CommandSender, ControllerHandle, TransportAction};
use crate::observable::{Observable, Publisher};
use crate::types::PlayerSnapshot;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Sleep;

/// Sleep timer setting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SleepTimer {
    /// Stop after this long
    After(Duration),
    /// Stop when the current track ends
    EndOfTrack,
}

/// Observable state of the lifecycle timers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LifecycleStatus {
    /// Host application is in the background
    pub backgrounded: bool,
    /// Background idle timer is pending
    pub idle_armed: bool,
    /// Pending sleep timer
    pub sleep: Option<SleepTimer>,
}

#[derive(Debug)]
enum LifecycleCommand {
    AppBackgrounded,
    AppForegrounded,
    ArmSleep(SleepTimer),
    CancelSleep,
}

/// Schedules idle and sleep teardown for a controller
#[derive(Debug)]
pub struct IdleLifecycleManager {
    tx: mpsc::UnboundedSender<LifecycleCommand>,
    status: Observable<LifecycleStatus>,
    task: JoinHandle<()>,
}

impl IdleLifecycleManager {
    /// Start the scheduler for `controller`
    pub fn spawn(controller: &ControllerHandle, idle_timeout: Duration) -> Arc<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        let status = Publisher::new(LifecycleStatus::default());
        let observable = status.observable();

        let snapshots = controller.subscribe().receiver();
        let had_track = snapshots.borrow().current_track.is_some();
        let scheduler = Scheduler {
            commands: controller.sender(),
            snapshots,
            status,
            idle_timeout,
            backgrounded: false,
            idle_fired: false,
            idle: None,
            sleep: None,
            sleep_mode: None,
            had_track,
        };
        let task = tokio::spawn(scheduler.run(rx));

        Arc::new(Self {
            tx,
            status: observable,
            task,
        })
    }

    /// Host application moved to the background
    pub fn app_backgrounded(&self) {
        self.send(LifecycleCommand::AppBackgrounded);
    }

    /// Host application returned to the foreground
    pub fn app_foregrounded(&self) {
        self.send(LifecycleCommand::AppForegrounded);
    }

    /// Arm the sleep timer, replacing any pending one
    pub fn arm_sleep(&self, timer: SleepTimer) {
        self.send(LifecycleCommand::ArmSleep(timer));
    }

    /// Cancel the sleep timer
    pub fn cancel_sleep(&self) {
        self.send(LifecycleCommand::CancelSleep);
    }

    /// Observable timer state
    pub fn status(&self) -> Observable<LifecycleStatus> {
        self.status.clone()
    }

    fn send(&self, command: LifecycleCommand) {
        if self.tx.send(command).is_err() {
            tracing::debug!("Lifecycle scheduler is gone");
        }
    }
}

impl Drop for IdleLifecycleManager {
    fn drop(&mut self) {
        self.task.abort();
    }
}

struct Scheduler {
    commands: CommandSender,
    snapshots: watch::Receiver<PlayerSnapshot>,
    status: Publisher<LifecycleStatus>,
    idle_timeout: Duration,
    backgrounded: bool,
    /// Idle teardown already happened for this background period
    idle_fired: bool,
    idle: Option<Pin<Box<Sleep>>>,
    sleep: Option<Pin<Box<Sleep>>>,
    sleep_mode: Option<SleepTimer>,
    /// Whether the previous snapshot had a current track
    had_track: bool,
}

impl Scheduler {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<LifecycleCommand>) {
        loop {
            tokio::select! {
                command = rx.recv() => match command {
                    Some(command) => self.on_command(command),
                    None => break,
                },
                changed = self.snapshots.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    self.evaluate_idle();
                }
                () = wait(&mut self.idle) => self.on_idle_fired(),
                () = wait(&mut self.sleep) => self.on_sleep_fired(),
            }
            self.publish_status();
        }
        tracing::debug!("Lifecycle scheduler stopped");
    }

    fn on_command(&mut self, command: LifecycleCommand) {
        match command {
            LifecycleCommand::AppBackgrounded => {
                self.backgrounded = true;
                self.idle_fired = false;
                self.evaluate_idle();
            }
            LifecycleCommand::AppForegrounded => {
                self.backgrounded = false;
                self.idle_fired = false;
                self.idle = None;
            }
            LifecycleCommand::ArmSleep(timer) => self.arm_sleep(timer),
            LifecycleCommand::CancelSleep => self.cancel_sleep(),
        }
    }

    fn arm_sleep(&mut self, timer: SleepTimer) {
        self.cancel_sleep();
        match timer {
            SleepTimer::After(delay) => {
                tracing::info!("Sleep timer armed for {:?}", delay);
                self.sleep = Some(Box::pin(tokio::time::sleep(delay)));
            }
            SleepTimer::EndOfTrack => {
                tracing::info!("Sleep timer armed for end of track");
                self.commands.send(TransportAction::StopAfterCurrent(true));
            }
        }
        self.sleep_mode = Some(timer);
    }

    fn cancel_sleep(&mut self) {
        if self.sleep_mode.take() == Some(SleepTimer::EndOfTrack) {
            self.commands.send(TransportAction::StopAfterCurrent(false));
        }
        self.sleep = None;
    }

    /// Arm or cancel the idle timer for the latest snapshot
    fn evaluate_idle(&mut self) {
        let (state, has_track) = {
            let snapshot = self.snapshots.borrow_and_update();
            (snapshot.state, snapshot.current_track.is_some())
        };

        // Losing the current track means a stop, which consumes the controller's flag
        if self.had_track && !has_track && self.sleep_mode == Some(SleepTimer::EndOfTrack) {
            self.sleep_mode = None;
        }
        self.had_track = has_track;

        if state.is_active() {
            self.idle = None;
            self.idle_fired = false;
            return;
        }
        if self.backgrounded && !self.idle_fired && self.idle.is_none() {
            tracing::debug!("Arming background idle timer ({:?})", self.idle_timeout);
            self.idle = Some(Box::pin(tokio::time::sleep(self.idle_timeout)));
        }
    }

    fn on_idle_fired(&mut self) {
        self.idle = None;
        self.idle_fired = true;
        tracing::info!("Background idle timeout reached; tearing down engine");
        self.commands.send(TransportAction::Teardown);
    }

    fn on_sleep_fired(&mut self) {
        self.sleep = None;
        self.sleep_mode = None;
        tracing::info!("Sleep timer fired; stopping playback");
        self.commands.send(TransportAction::Teardown);
    }

    fn publish_status(&self) {
        self.status.publish_if_changed(LifecycleStatus {
            backgrounded: self.backgrounded,
            idle_armed: self.idle.is_some(),
            sleep: self.sleep_mode,
        });
    }
}

/// Resolve when the timer in `slot` fires; pend forever while unarmed
fn wait(slot: &mut Option<Pin<Box<Sleep>>>) -> impl Future<Output = ()> + '_ {
    async move {
        match slot {
            Some(sleep) => sleep.as_mut().await,
            None => std::future::pending().await,
        }
    }
}
