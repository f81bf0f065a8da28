//! Async actor that owns a [`FocusController`] and drives its clock.
//!
//! Commands, lifecycle signals and ticks all arrive in one loop, so the
//! timer state only ever has one writer. The one-second interval exists only
//! while the timer is running: it is created on entering `Running` and
//! dropped on every transition out of it.
//!
//! # Usage
//!
//! ```ignore
//! let (handle, task) = TimerDriver::spawn(controller);
//! let mut events = handle.subscribe();
//! handle.start().await?;
//! while let Ok(event) = events.recv().await {
//!     // render
//! }
//! ```

use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tracing::debug;

use super::controller::{Finalization, FocusController};
use super::engine::AppState;
use super::mode::TimerMode;
use crate::events::Event;

const COMMAND_CAPACITY: usize = 64;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DriverError {
    #[error("timer driver has shut down")]
    ChannelClosed,
}

#[derive(Debug)]
pub enum TimerCommand {
    Start,
    Pause,
    Reset,
    Finish {
        respond_to: oneshot::Sender<Option<Finalization>>,
    },
    ChangeMode(TimerMode),
    SetDuration(u64),
    SelectCategory(String),
    AppState(AppState),
    Snapshot {
        respond_to: oneshot::Sender<Event>,
    },
    Shutdown,
}

pub struct TimerDriver {
    controller: FocusController,
    receiver: mpsc::Receiver<TimerCommand>,
    tick_period: Duration,
    finalizations: Option<mpsc::UnboundedSender<Finalization>>,
}

impl TimerDriver {
    /// Spawn the actor on the current tokio runtime with a one-second tick.
    ///
    /// The join handle yields the controller back after shutdown.
    pub fn spawn(controller: FocusController) -> (TimerHandle, JoinHandle<FocusController>) {
        Self::spawn_with_period(controller, Duration::from_secs(1))
    }

    pub fn spawn_with_period(
        controller: FocusController,
        tick_period: Duration,
    ) -> (TimerHandle, JoinHandle<FocusController>) {
        Self::launch(controller, tick_period, None)
    }

    /// Like [`TimerDriver::spawn`], also reporting every finalization that
    /// comes from the countdown running out.
    pub fn spawn_reporting(
        controller: FocusController,
        tick_period: Duration,
    ) -> (
        TimerHandle,
        mpsc::UnboundedReceiver<Finalization>,
        JoinHandle<FocusController>,
    ) {
        let (fin_tx, fin_rx) = mpsc::unbounded_channel();
        let (handle, task) = Self::launch(controller, tick_period, Some(fin_tx));
        (handle, fin_rx, task)
    }

    fn launch(
        controller: FocusController,
        tick_period: Duration,
        finalizations: Option<mpsc::UnboundedSender<Finalization>>,
    ) -> (TimerHandle, JoinHandle<FocusController>) {
        let (sender, receiver) = mpsc::channel(COMMAND_CAPACITY);
        let handle = TimerHandle {
            sender,
            event_sender: controller.event_sender(),
        };
        let driver = Self {
            controller,
            receiver,
            tick_period,
            finalizations,
        };
        (handle, tokio::spawn(driver.run()))
    }

    async fn run(mut self) -> FocusController {
        let mut ticker: Option<Interval> = None;
        loop {
            self.sync_ticker(&mut ticker);
            tokio::select! {
                command = self.receiver.recv() => match command {
                    None | Some(TimerCommand::Shutdown) => break,
                    Some(command) => self.handle(command).await,
                },
                _ = next_tick(&mut ticker) => {
                    if let Some(outcome) = self.controller.tick().await {
                        self.report(outcome);
                    }
                }
            }
        }
        debug!("timer driver stopped");
        self.controller
    }

    async fn handle(&mut self, command: TimerCommand) {
        match command {
            TimerCommand::Start => {
                self.controller.start();
            }
            TimerCommand::Pause => {
                self.controller.pause();
            }
            TimerCommand::Reset => {
                self.controller.reset();
            }
            TimerCommand::Finish { respond_to } => {
                let outcome = self.controller.finish().await;
                let _ = respond_to.send(outcome);
            }
            TimerCommand::ChangeMode(mode) => {
                self.controller.change_mode(mode);
            }
            TimerCommand::SetDuration(secs) => {
                self.controller.set_duration(secs);
            }
            TimerCommand::SelectCategory(category) => {
                self.controller.select_category(category);
            }
            TimerCommand::AppState(state) => {
                self.controller.app_state(state);
            }
            TimerCommand::Snapshot { respond_to } => {
                let _ = respond_to.send(self.controller.snapshot());
            }
            TimerCommand::Shutdown => {}
        }
    }

    fn report(&self, outcome: Finalization) {
        if let Some(tx) = &self.finalizations {
            let _ = tx.send(outcome);
        }
    }

    fn sync_ticker(&self, ticker: &mut Option<Interval>) {
        let running = self.controller.engine().is_running();
        match (running, ticker.is_some()) {
            (true, false) => {
                let mut interval =
                    time::interval_at(Instant::now() + self.tick_period, self.tick_period);
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                *ticker = Some(interval);
            }
            (false, true) => *ticker = None,
            _ => {}
        }
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

/// Cheap-to-clone handle for talking to a running [`TimerDriver`].
#[derive(Clone)]
pub struct TimerHandle {
    sender: mpsc::Sender<TimerCommand>,
    event_sender: broadcast::Sender<Event>,
}

impl TimerHandle {
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_sender.subscribe()
    }

    pub async fn start(&self) -> Result<(), DriverError> {
        self.send(TimerCommand::Start).await
    }

    pub async fn pause(&self) -> Result<(), DriverError> {
        self.send(TimerCommand::Pause).await
    }

    pub async fn reset(&self) -> Result<(), DriverError> {
        self.send(TimerCommand::Reset).await
    }

    pub async fn change_mode(&self, mode: TimerMode) -> Result<(), DriverError> {
        self.send(TimerCommand::ChangeMode(mode)).await
    }

    pub async fn set_duration(&self, secs: u64) -> Result<(), DriverError> {
        self.send(TimerCommand::SetDuration(secs)).await
    }

    pub async fn select_category(&self, category: impl Into<String>) -> Result<(), DriverError> {
        self.send(TimerCommand::SelectCategory(category.into())).await
    }

    pub async fn app_state(&self, state: AppState) -> Result<(), DriverError> {
        self.send(TimerCommand::AppState(state)).await
    }

    /// End the run now. `None` if nothing was running.
    pub async fn finish(&self) -> Result<Option<Finalization>, DriverError> {
        let (tx, rx) = oneshot::channel();
        self.send(TimerCommand::Finish { respond_to: tx }).await?;
        rx.await.map_err(|_| DriverError::ChannelClosed)
    }

    pub async fn snapshot(&self) -> Result<Event, DriverError> {
        let (tx, rx) = oneshot::channel();
        self.send(TimerCommand::Snapshot { respond_to: tx }).await?;
        rx.await.map_err(|_| DriverError::ChannelClosed)
    }

    pub async fn shutdown(&self) -> Result<(), DriverError> {
        self.send(TimerCommand::Shutdown).await
    }

    async fn send(&self, command: TimerCommand) -> Result<(), DriverError> {
        self.sender
            .send(command)
            .await
            .map_err(|_| DriverError::ChannelClosed)
    }
}
