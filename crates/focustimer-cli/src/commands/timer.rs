use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use clap::Subcommand;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use focustimer_core::timer::GatedAlerter;
use focustimer_core::{
    format_clock, AlertPattern, Alerter, AppState, CategoryRepository, Config, Event,
    Finalization, FocusController, ModeDurations, SessionRepository, TimerDriver, TimerEngine,
    TimerHandle, TimerMode, TimerState,
};

use super::{open_store, CliResult};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Run a countdown in the foreground.
    ///
    /// Reads one command per line from stdin: p pause, s start/resume,
    /// f finish, r reset, a leave and return (counts a distraction), q quit.
    Run {
        /// Focus length in minutes (defaults to the configured length)
        #[arg(long)]
        minutes: Option<u64>,
        /// Run a break instead of a focus session
        #[arg(long = "break")]
        break_mode: bool,
        /// Category to file the session under
        #[arg(long)]
        category: Option<String>,
    },
}

/// Bell plus a line on stderr.
struct TerminalAlerter;

impl Alerter for TerminalAlerter {
    fn alert(&self, pattern: AlertPattern) {
        let text = match pattern {
            AlertPattern::Completion => "time is up",
            AlertPattern::Distraction => "distraction recorded, timer paused",
        };
        debug!(vibration_ms = ?pattern.vibration_ms(), "alert");
        eprint!("\x07\n{text}\n");
    }

    fn set_keep_awake(&self, on: bool) {
        debug!(on, "keep awake");
    }
}

pub async fn run(action: TimerAction) -> CliResult {
    match action {
        TimerAction::Run {
            minutes,
            break_mode,
            category,
        } => run_countdown(minutes, break_mode, category).await,
    }
}

async fn run_countdown(
    minutes: Option<u64>,
    break_mode: bool,
    category: Option<String>,
) -> CliResult {
    let config = Config::load()?;
    let store = open_store()?;
    let categories = CategoryRepository::new(store.clone()).list().await;

    let category = match category {
        Some(name) => {
            if !categories.iter().any(|c| c.name == name) {
                return Err(format!("unknown category: {name}").into());
            }
            name
        }
        None => pick_default_category(&config, &categories),
    };

    let alerter = Arc::new(GatedAlerter::new(
        Arc::new(TerminalAlerter),
        &config.notifications,
    ));
    let engine = TimerEngine::new(ModeDurations::from_config(&config.timer), alerter);
    let mut controller =
        FocusController::new(engine, SessionRepository::new(store), category.clone());

    if break_mode {
        controller.change_mode(TimerMode::Break);
    }
    if let Some(minutes) = minutes {
        let secs = duration_secs(minutes)?;
        let presets = &config.timer.focus_presets_min;
        if !break_mode && !presets.contains(&minutes) {
            warn!(minutes, ?presets, "length is not one of the presets");
        }
        controller.set_duration(secs);
    }

    let (handle, mut finalizations, task) =
        TimerDriver::spawn_reporting(controller, Duration::from_secs(1));
    let mut events = handle.subscribe();

    let mode = if break_mode { TimerMode::Break } else { TimerMode::Focus };
    eprintln!(
        "{} [{}]  p pause · s resume · f finish · r reset · a leave · q quit",
        mode.label(),
        category
    );
    handle.start().await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    let outcome = loop {
        tokio::select! {
            line = lines.next_line(), if stdin_open => match line? {
                Some(line) => match line.trim() {
                    "p" => handle.pause().await?,
                    "s" => handle.start().await?,
                    "r" => handle.reset().await?,
                    "a" => {
                        handle.app_state(AppState::Background).await?;
                        handle.app_state(AppState::Active).await?;
                    }
                    "f" => match handle.finish().await? {
                        Some(outcome) => break Some(outcome),
                        None => eprintln!("timer is not running"),
                    },
                    "q" => break None,
                    "" => {}
                    other => eprintln!("unknown command: {other}"),
                },
                None => {
                    stdin_open = false;
                    if !is_running(&handle).await? {
                        break None;
                    }
                }
            },
            outcome = finalizations.recv() => break outcome,
            event = events.recv() => match event {
                Ok(event) => render(&event),
                Err(RecvError::Lagged(skipped)) => debug!(skipped, "event receiver lagged"),
                Err(RecvError::Closed) => break None,
            },
        }
    };

    eprintln!();
    handle.shutdown().await?;
    task.await?;

    match outcome {
        Some(Finalization::Recorded(session)) => {
            println!("{}", serde_json::to_string_pretty(&session)?);
        }
        Some(Finalization::SaveFailed(_)) => {
            return Err("session finished but could not be saved".into());
        }
        Some(Finalization::BreakOver) => println!("break over"),
        None => {}
    }
    Ok(())
}

/// Whole minutes from the command line as seconds.
fn duration_secs(minutes: u64) -> CliResult<u64> {
    if minutes == 0 {
        return Err("--minutes must be at least 1".into());
    }
    Ok(minutes.checked_mul(60).ok_or("--minutes is too large")?)
}

fn pick_default_category(config: &Config, categories: &[focustimer_core::Category]) -> String {
    if let Some(name) = &config.default_category {
        if categories.iter().any(|c| &c.name == name) {
            return name.clone();
        }
        warn!(category = %name, "configured default category no longer exists");
    }
    categories
        .first()
        .map(|c| c.name.clone())
        .unwrap_or_default()
}

async fn is_running(handle: &TimerHandle) -> CliResult<bool> {
    let snapshot = handle.snapshot().await?;
    Ok(matches!(
        snapshot,
        Event::StateSnapshot {
            state: TimerState::Running,
            ..
        }
    ))
}

fn render(event: &Event) {
    match event {
        Event::Tick { time_left_secs, .. } => {
            eprint!("\r{}", format_clock(*time_left_secs));
            let _ = std::io::stderr().flush();
        }
        Event::TimerPaused { time_left_secs, .. } => {
            eprint!("\r{} paused", format_clock(*time_left_secs));
        }
        Event::TimerStarted { time_left_secs, .. } => {
            eprint!("\r{}", format_clock(*time_left_secs));
        }
        Event::TimerReset { duration_secs, .. } => {
            eprint!("\r{} reset (s to start)", format_clock(*duration_secs));
        }
        other => debug!(?other, "timer event"),
    }
}
