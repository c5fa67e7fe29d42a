use std::io::Write;
use std::time::Duration;

use clap::Subcommand;
use focuscycle_core::{format_countdown, Config, Event, TimerDriver};

use crate::app::App;

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start a focus session credited to a category
    Start {
        /// Category ID (see `category list`)
        category_id: String,
    },
    /// Freeze the countdown
    Pause,
    /// Continue a paused countdown
    Resume,
    /// Abandon the current phase without crediting it
    Skip,
    /// Return to idle without crediting the phase in progress
    Reset,
    /// Print current timer state as JSON
    Status,
    /// Run the timer in the foreground until Ctrl-C
    Watch,
}

fn print_event(event: &Event) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(event)?);
    Ok(())
}

pub fn run(action: TimerAction, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let app = App::open()?;
    let (mut engine, caught_up) = app.restore_timer(config);
    if let Some(event) = &caught_up {
        print_event(event)?;
    }

    match action {
        TimerAction::Start { category_id } => {
            if app.categories.get(&category_id).is_none() {
                tracing::warn!(%category_id, "starting timer for an unknown category");
            }
            let event = engine.start(&category_id)?;
            print_event(&event)?;
        }
        TimerAction::Pause => match engine.pause() {
            Some(event) => print_event(&event)?,
            None => print_event(&engine.snapshot())?,
        },
        TimerAction::Resume => match engine.resume() {
            Some(event) => print_event(&event)?,
            None => print_event(&engine.snapshot())?,
        },
        TimerAction::Skip => match engine.skip_phase() {
            Some(event) => print_event(&event)?,
            None => print_event(&engine.snapshot())?,
        },
        TimerAction::Reset => {
            print_event(&engine.reset())?;
        }
        TimerAction::Status => {
            print_event(&engine.snapshot())?;
        }
        TimerAction::Watch => {
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(watch(engine, config.tick_interval()))?;
        }
    }
    Ok(())
}

async fn watch(
    engine: focuscycle_core::TimerEngine,
    tick_interval: Duration,
) -> Result<(), Box<dyn std::error::Error>> {
    let (handle, task) = TimerDriver::spawn(engine, tick_interval);
    let mut events = handle.events();
    let mut display = tokio::time::interval(Duration::from_secs(1));
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            event = events.recv() => {
                if let Ok(event) = event {
                    eprintln!();
                    println!("{}", serde_json::to_string(&event)?);
                }
            }
            _ = display.tick() => {
                let state = handle.state().await?;
                let remaining = handle.remaining_ms().await?;
                let paused = if state.is_paused { " (paused)" } else { "" };
                eprint!("\r{:<12} {}{paused}   ", state.phase.to_string(), format_countdown(remaining));
                std::io::stderr().flush()?;
            }
        }
    }

    eprintln!();
    handle.shutdown().await?;
    task.await?;
    Ok(())
}
