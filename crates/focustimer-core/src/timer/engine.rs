//! Timer engine implementation.
//!
//! The engine is a tick-driven state machine. It does not use internal
//! threads - the owner calls `tick()` once per elapsed second while running.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Paused
//!   ^        |          |
//!   +--------+----------+   (reset, change_mode, countdown reaching zero)
//! ```
//!
//! `Idle` with zero time left means the countdown just completed; the owner
//! finalizes the session and resets.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(ModeDurations::default(), alerter);
//! engine.start();
//! // Once per second:
//! engine.tick(); // Returns Some(Event::TimerCompleted) when time runs out
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use super::alert::{AlertPattern, Alerter};
use super::mode::{ModeDurations, TimerMode};
use crate::events::Event;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    Paused,
}

/// App lifecycle as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppState {
    Active,
    Inactive,
    Background,
}

impl AppState {
    pub fn is_backgrounded(self) -> bool {
        matches!(self, AppState::Inactive | AppState::Background)
    }
}

/// Core timer engine.
///
/// Holds only in-memory state; nothing here is persisted.
pub struct TimerEngine {
    durations: ModeDurations,
    mode: TimerMode,
    duration_secs: u64,
    time_left_secs: u64,
    state: TimerState,
    distractions: u32,
    app_state: AppState,
    alerter: Arc<dyn Alerter>,
}

impl fmt::Debug for TimerEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerEngine")
            .field("mode", &self.mode)
            .field("state", &self.state)
            .field("duration_secs", &self.duration_secs)
            .field("time_left_secs", &self.time_left_secs)
            .field("distractions", &self.distractions)
            .field("app_state", &self.app_state)
            .finish()
    }
}

impl TimerEngine {
    /// Create an idle engine in focus mode.
    pub fn new(durations: ModeDurations, alerter: Arc<dyn Alerter>) -> Self {
        let duration_secs = durations.for_mode(TimerMode::Focus);
        Self {
            durations,
            mode: TimerMode::Focus,
            duration_secs,
            time_left_secs: duration_secs,
            state: TimerState::Idle,
            distractions: 0,
            app_state: AppState::Active,
            alerter,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn mode(&self) -> TimerMode {
        self.mode
    }

    pub fn duration_secs(&self) -> u64 {
        self.duration_secs
    }

    pub fn time_left_secs(&self) -> u64 {
        self.time_left_secs
    }

    pub fn distractions(&self) -> u32 {
        self.distractions
    }

    pub fn durations(&self) -> ModeDurations {
        self.durations
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.duration_secs - self.time_left_secs
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, TimerState::Running | TimerState::Paused)
    }

    pub fn is_paused(&self) -> bool {
        self.state == TimerState::Paused
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    /// Countdown hit zero and nobody has reset yet.
    pub fn is_completed(&self) -> bool {
        self.state == TimerState::Idle && self.time_left_secs == 0
    }

    /// 0.0 .. 1.0 progress within the current run.
    pub fn progress(&self) -> f64 {
        if self.duration_secs == 0 {
            return 0.0;
        }
        self.elapsed_secs() as f64 / self.duration_secs as f64
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self, category: Option<&str>) -> Event {
        Event::StateSnapshot {
            state: self.state,
            mode: self.mode,
            duration_secs: self.duration_secs,
            time_left_secs: self.time_left_secs,
            distractions: self.distractions,
            progress: self.progress(),
            category: category.map(str::to_string),
            at: Utc::now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Option<Event> {
        match self.state {
            TimerState::Idle | TimerState::Paused => {
                if self.time_left_secs == 0 {
                    self.time_left_secs = self.duration_secs;
                }
                self.state = TimerState::Running;
                self.alerter.set_keep_awake(true);
                debug!(mode = ?self.mode, time_left = self.time_left_secs, "timer started");
                Some(Event::TimerStarted {
                    mode: self.mode,
                    duration_secs: self.duration_secs,
                    time_left_secs: self.time_left_secs,
                    at: Utc::now(),
                })
            }
            TimerState::Running => None, // Already running.
        }
    }

    pub fn pause(&mut self) -> Option<Event> {
        if self.state != TimerState::Running {
            return None;
        }
        self.enter_paused();
        Some(Event::TimerPaused {
            time_left_secs: self.time_left_secs,
            at: Utc::now(),
        })
    }

    pub fn reset(&mut self) -> Event {
        self.stop();
        self.time_left_secs = self.duration_secs;
        self.distractions = 0;
        Event::TimerReset {
            mode: self.mode,
            duration_secs: self.duration_secs,
            at: Utc::now(),
        }
    }

    /// Switch mode, discarding any countdown in progress.
    pub fn change_mode(&mut self, mode: TimerMode) -> Event {
        self.stop();
        self.mode = mode;
        self.duration_secs = self.durations.for_mode(mode);
        self.time_left_secs = self.duration_secs;
        self.distractions = 0;
        debug!(?mode, duration = self.duration_secs, "mode changed");
        Event::ModeChanged {
            mode,
            duration_secs: self.duration_secs,
            at: Utc::now(),
        }
    }

    /// Configure the length of the next run.
    ///
    /// Only applies while idle, and never to zero seconds.
    pub fn set_duration(&mut self, secs: u64) -> Option<Event> {
        if secs == 0 || self.is_active() {
            debug!(secs, state = ?self.state, "duration change ignored");
            return None;
        }
        self.duration_secs = secs;
        self.time_left_secs = secs;
        Some(Event::DurationChanged {
            duration_secs: secs,
            at: Utc::now(),
        })
    }

    /// Call once per elapsed second. Returns `Some(Event::TimerCompleted)`
    /// when the countdown reaches zero, `Some(Event::Tick)` otherwise while
    /// running.
    pub fn tick(&mut self) -> Option<Event> {
        if self.state != TimerState::Running {
            return None;
        }
        self.time_left_secs = self.time_left_secs.saturating_sub(1);
        if self.time_left_secs > 0 {
            return Some(Event::Tick {
                time_left_secs: self.time_left_secs,
                at: Utc::now(),
            });
        }

        self.stop();
        self.alerter.alert(AlertPattern::Completion);
        debug!(mode = ?self.mode, "countdown complete");
        Some(Event::TimerCompleted {
            mode: self.mode,
            elapsed_secs: self.duration_secs,
            at: Utc::now(),
        })
    }

    /// Feed a lifecycle change. Leaving the foreground mid-countdown pauses
    /// the timer and counts one distraction.
    pub fn on_app_state(&mut self, next: AppState) -> Option<Event> {
        self.app_state = next;
        if !next.is_backgrounded() || self.state != TimerState::Running {
            return None;
        }
        self.enter_paused();
        self.distractions += 1;
        self.alerter.alert(AlertPattern::Distraction);
        debug!(distractions = self.distractions, "distraction recorded");
        Some(Event::DistractionRecorded {
            distractions: self.distractions,
            time_left_secs: self.time_left_secs,
            at: Utc::now(),
        })
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn enter_paused(&mut self) {
        self.state = TimerState::Paused;
        self.alerter.set_keep_awake(false);
    }

    fn stop(&mut self) {
        if self.state == TimerState::Running {
            self.alerter.set_keep_awake(false);
        }
        self.state = TimerState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::alert::{AlertCall, RecordingAlerter, SilentAlerter};
    use proptest::prelude::*;

    fn engine() -> TimerEngine {
        TimerEngine::new(ModeDurations::default(), Arc::new(SilentAlerter))
    }

    fn short_engine(focus_secs: u64, alerter: Arc<dyn Alerter>) -> TimerEngine {
        TimerEngine::new(
            ModeDurations {
                focus_secs,
                break_secs: 2,
            },
            alerter,
        )
    }

    #[test]
    fn start_pause_resume() {
        let mut engine = engine();
        assert_eq!(engine.state(), TimerState::Idle);
        assert!(!engine.is_active());

        assert!(engine.start().is_some());
        assert_eq!(engine.state(), TimerState::Running);
        assert!(engine.start().is_none());

        assert!(engine.pause().is_some());
        assert_eq!(engine.state(), TimerState::Paused);
        assert!(engine.is_active() && engine.is_paused());
        assert!(engine.pause().is_none());

        assert!(engine.start().is_some());
        assert_eq!(engine.state(), TimerState::Running);
    }

    #[test]
    fn pause_while_idle_is_noop() {
        let mut engine = engine();
        assert!(engine.pause().is_none());
        assert_eq!(engine.state(), TimerState::Idle);
    }

    #[test]
    fn countdown_completes_to_idle_with_zero_left() {
        let alerter = Arc::new(RecordingAlerter::new());
        let mut engine = short_engine(3, alerter.clone());
        engine.start();
        assert!(matches!(engine.tick(), Some(Event::Tick { time_left_secs: 2, .. })));
        assert!(matches!(engine.tick(), Some(Event::Tick { time_left_secs: 1, .. })));
        assert!(matches!(
            engine.tick(),
            Some(Event::TimerCompleted { mode: TimerMode::Focus, elapsed_secs: 3, .. })
        ));
        assert!(engine.is_completed());
        assert_eq!(engine.elapsed_secs(), 3);
        assert!(engine.tick().is_none());
        assert_eq!(alerter.alerts(), vec![AlertPattern::Completion]);
    }

    #[test]
    fn start_after_completion_refills() {
        let mut engine = short_engine(1, Arc::new(SilentAlerter));
        engine.start();
        engine.tick();
        assert!(engine.is_completed());
        engine.start();
        assert_eq!(engine.time_left_secs(), 1);
        assert!(engine.is_running());
    }

    #[test]
    fn paused_engine_does_not_tick() {
        let mut engine = engine();
        engine.start();
        engine.tick();
        engine.pause();
        assert!(engine.tick().is_none());
        assert_eq!(engine.time_left_secs(), 1499);
    }

    #[test]
    fn reset_restores_duration_and_clears_distractions() {
        let mut engine = engine();
        engine.start();
        engine.tick();
        engine.on_app_state(AppState::Background);
        assert_eq!(engine.distractions(), 1);

        engine.reset();
        assert_eq!(engine.state(), TimerState::Idle);
        assert_eq!(engine.time_left_secs(), 1500);
        assert_eq!(engine.distractions(), 0);
    }

    #[test]
    fn mode_round_trip_restores_focus_defaults() {
        let mut engine = engine();
        engine.set_duration(45 * 60);
        engine.start();
        engine.on_app_state(AppState::Background);

        engine.change_mode(TimerMode::Break);
        assert_eq!(engine.duration_secs(), 300);
        assert_eq!(engine.state(), TimerState::Idle);

        engine.change_mode(TimerMode::Focus);
        assert_eq!(engine.mode(), TimerMode::Focus);
        assert_eq!(engine.duration_secs(), 1500);
        assert_eq!(engine.time_left_secs(), 1500);
        assert_eq!(engine.distractions(), 0);
    }

    #[test]
    fn set_duration_only_while_idle() {
        let mut engine = engine();
        assert!(engine.set_duration(15 * 60).is_some());
        assert_eq!(engine.time_left_secs(), 900);

        engine.start();
        assert!(engine.set_duration(60 * 60).is_none());
        engine.pause();
        assert!(engine.set_duration(60 * 60).is_none());
        assert_eq!(engine.duration_secs(), 900);

        engine.reset();
        assert!(engine.set_duration(0).is_none());
        assert_eq!(engine.duration_secs(), 900);
    }

    #[test]
    fn backgrounding_while_running_pauses_and_counts() {
        let alerter = Arc::new(RecordingAlerter::new());
        let mut engine = short_engine(60, alerter.clone());
        engine.start();

        let event = engine.on_app_state(AppState::Background);
        assert!(matches!(event, Some(Event::DistractionRecorded { distractions: 1, .. })));
        assert_eq!(engine.state(), TimerState::Paused);
        assert_eq!(alerter.alerts(), vec![AlertPattern::Distraction]);

        // Already paused: ignored.
        assert!(engine.on_app_state(AppState::Inactive).is_none());
        assert_eq!(engine.distractions(), 1);

        // Each fresh background event while running counts again.
        engine.on_app_state(AppState::Active);
        engine.start();
        engine.on_app_state(AppState::Inactive);
        assert_eq!(engine.distractions(), 2);
    }

    #[test]
    fn backgrounding_while_idle_is_noop() {
        let mut engine = engine();
        assert!(engine.on_app_state(AppState::Background).is_none());
        assert_eq!(engine.distractions(), 0);
        assert_eq!(engine.state(), TimerState::Idle);
    }

    #[test]
    fn keep_awake_follows_running_state() {
        let alerter = Arc::new(RecordingAlerter::new());
        let mut engine = short_engine(60, alerter.clone());
        engine.start();
        engine.pause();
        engine.start();
        engine.reset();
        engine.reset();
        assert_eq!(
            alerter.calls(),
            vec![
                AlertCall::KeepAwake(true),
                AlertCall::KeepAwake(false),
                AlertCall::KeepAwake(true),
                AlertCall::KeepAwake(false),
            ]
        );
    }

    #[test]
    fn snapshot_returns_valid_event() {
        let engine = engine();
        match engine.snapshot(Some("Coding")) {
            Event::StateSnapshot {
                state,
                time_left_secs,
                category,
                progress,
                ..
            } => {
                assert_eq!(state, TimerState::Idle);
                assert_eq!(time_left_secs, 1500);
                assert_eq!(category.as_deref(), Some("Coding"));
                assert_eq!(progress, 0.0);
            }
            _ => panic!("Expected StateSnapshot"),
        }
    }

    proptest! {
        #[test]
        fn ticks_below_duration_keep_running(duration in 2u64..400, frac in 0.0f64..1.0) {
            let n = ((duration - 1) as f64 * frac) as u64;
            let mut engine = short_engine(duration, Arc::new(SilentAlerter));
            engine.start();
            for _ in 0..n {
                engine.tick();
            }
            prop_assert_eq!(engine.time_left_secs(), duration - n);
            prop_assert_eq!(engine.state(), TimerState::Running);
        }

        #[test]
        fn ticking_out_completes_exactly_once(duration in 1u64..200) {
            let mut engine = short_engine(duration, Arc::new(SilentAlerter));
            engine.start();
            let mut completions = 0;
            for _ in 0..duration + 5 {
                if let Some(Event::TimerCompleted { .. }) = engine.tick() {
                    completions += 1;
                }
            }
            prop_assert_eq!(completions, 1);
            prop_assert!(engine.is_completed());
        }
    }
}
