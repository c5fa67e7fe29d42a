//! Single-task executor for a [`TimerEngine`].
//!
//! The engine is moved into one tokio task. Commands arrive over an mpsc
//! queue and are handled to completion one at a time; the periodic tick is a
//! branch of the same `select!`, so a tick never runs in the middle of a
//! command and vice versa.

use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::engine::TimerEngine;
use super::snapshot::TimerSnapshot;
use crate::error::{CoreError, Result};
use crate::events::Event;

/// Reference cadence of the completion check.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(100);

const EVENT_BUFFER: usize = 64;

enum Command {
    Start(String, oneshot::Sender<Result<Event>>),
    Pause(oneshot::Sender<Option<Event>>),
    Resume(oneshot::Sender<Option<Event>>),
    Skip(oneshot::Sender<Option<Event>>),
    Reset(oneshot::Sender<Event>),
    State(oneshot::Sender<(TimerSnapshot, u64)>),
    Shutdown,
}

/// Cloneable handle to a running driver.
#[derive(Clone)]
pub struct TimerHandle {
    commands: mpsc::Sender<Command>,
    events: broadcast::Sender<Event>,
}

pub struct TimerDriver;

impl TimerDriver {
    /// Spawn the driver task on the current tokio runtime.
    ///
    /// The returned join handle yields the engine back once the driver is
    /// shut down or every handle has been dropped.
    pub fn spawn(engine: TimerEngine, tick_interval: Duration) -> (TimerHandle, JoinHandle<TimerEngine>) {
        let (commands, rx) = mpsc::channel(32);
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        let task = tokio::spawn(run(engine, rx, events.clone(), tick_interval));
        (TimerHandle { commands, events }, task)
    }
}

async fn run(
    mut engine: TimerEngine,
    mut commands: mpsc::Receiver<Command>,
    events: broadcast::Sender<Event>,
    tick_interval: Duration,
) -> TimerEngine {
    let mut ticker = tokio::time::interval(tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            command = commands.recv() => {
                let Some(command) = command else { break };
                match command {
                    Command::Start(category_id, reply) => {
                        let result = engine.start(&category_id);
                        if let Ok(event) = &result {
                            let _ = events.send(event.clone());
                        }
                        let _ = reply.send(result);
                    }
                    Command::Pause(reply) => {
                        let event = engine.pause();
                        publish(&events, &event);
                        let _ = reply.send(event);
                    }
                    Command::Resume(reply) => {
                        let event = engine.resume();
                        publish(&events, &event);
                        let _ = reply.send(event);
                    }
                    Command::Skip(reply) => {
                        let event = engine.skip_phase();
                        publish(&events, &event);
                        let _ = reply.send(event);
                    }
                    Command::Reset(reply) => {
                        let event = engine.reset();
                        let _ = events.send(event.clone());
                        let _ = reply.send(event);
                    }
                    Command::State(reply) => {
                        let _ = reply.send((engine.state(), engine.remaining_ms()));
                    }
                    Command::Shutdown => break,
                }
            }
            _ = ticker.tick() => {
                if engine.is_ticking() {
                    let event = engine.tick();
                    publish(&events, &event);
                }
            }
        }
    }

    tracing::debug!("timer driver stopped");
    engine
}

fn publish(events: &broadcast::Sender<Event>, event: &Option<Event>) {
    if let Some(event) = event {
        // No receivers is fine.
        let _ = events.send(event.clone());
    }
}

impl TimerHandle {
    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(make(tx))
            .await
            .map_err(|_| CoreError::DriverStopped)?;
        rx.await.map_err(|_| CoreError::DriverStopped)
    }

    pub async fn start(&self, category_id: impl Into<String>) -> Result<Event> {
        let category_id = category_id.into();
        self.request(|tx| Command::Start(category_id, tx)).await?
    }

    pub async fn pause(&self) -> Result<Option<Event>> {
        self.request(Command::Pause).await
    }

    pub async fn resume(&self) -> Result<Option<Event>> {
        self.request(Command::Resume).await
    }

    pub async fn skip_phase(&self) -> Result<Option<Event>> {
        self.request(Command::Skip).await
    }

    pub async fn reset(&self) -> Result<Event> {
        self.request(Command::Reset).await
    }

    pub async fn state(&self) -> Result<TimerSnapshot> {
        Ok(self.request(Command::State).await?.0)
    }

    pub async fn remaining_ms(&self) -> Result<u64> {
        Ok(self.request(Command::State).await?.1)
    }

    /// Receive every event produced from now on, including tick completions.
    pub fn events(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    /// Ask the driver to stop after the commands already queued.
    pub async fn shutdown(&self) -> Result<()> {
        self.commands
            .send(Command::Shutdown)
            .await
            .map_err(|_| CoreError::DriverStopped)
    }
}
