use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::Session;
use crate::timer::{TimerMode, TimerState};

/// Every state change in the timer produces an Event.
/// Front-ends subscribe to them through the controller or driver handle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        mode: TimerMode,
        duration_secs: u64,
        time_left_secs: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        time_left_secs: u64,
        at: DateTime<Utc>,
    },
    TimerReset {
        mode: TimerMode,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    ModeChanged {
        mode: TimerMode,
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    DurationChanged {
        duration_secs: u64,
        at: DateTime<Utc>,
    },
    /// One second elapsed while running.
    Tick {
        time_left_secs: u64,
        at: DateTime<Utc>,
    },
    /// Countdown reached zero.
    TimerCompleted {
        mode: TimerMode,
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    /// The app went to the background mid-countdown; the timer paused itself.
    DistractionRecorded {
        distractions: u32,
        time_left_secs: u64,
        at: DateTime<Utc>,
    },
    SessionRecorded {
        session: Session,
        at: DateTime<Utc>,
    },
    /// A break ended; the timer is back in focus mode.
    BreakOver {
        at: DateTime<Utc>,
    },
    CategorySelected {
        category: String,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: TimerState,
        mode: TimerMode,
        duration_secs: u64,
        time_left_secs: u64,
        distractions: u32,
        progress: f64,
        category: Option<String>,
        at: DateTime<Utc>,
    },
}
