//! Single owner of the timer engine.
//!
//! The controller forwards commands to the engine, broadcasts every event
//! they produce, and decides what happens when a run ends: focus runs become
//! stored sessions, break runs hand back to focus.

use chrono::Utc;
use tokio::sync::broadcast;
use tracing::{info, warn};

use super::engine::{AppState, TimerEngine};
use super::mode::TimerMode;
use crate::events::Event;
use crate::storage::{Session, SessionRepository};

const EVENT_CAPACITY: usize = 256;

/// What ending a run produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Finalization {
    /// Focus run stored in the session history.
    Recorded(Session),
    /// Focus run ended but the store rejected it.
    SaveFailed(Session),
    /// Break ended; no session is kept.
    BreakOver,
}

impl Finalization {
    pub fn session(&self) -> Option<&Session> {
        match self {
            Finalization::Recorded(s) | Finalization::SaveFailed(s) => Some(s),
            Finalization::BreakOver => None,
        }
    }
}

pub struct FocusController {
    engine: TimerEngine,
    sessions: SessionRepository,
    category: String,
    events: broadcast::Sender<Event>,
}

impl FocusController {
    pub fn new(engine: TimerEngine, sessions: SessionRepository, category: impl Into<String>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            engine,
            sessions,
            category: category.into(),
            events,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn engine(&self) -> &TimerEngine {
        &self.engine
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    pub(crate) fn event_sender(&self) -> broadcast::Sender<Event> {
        self.events.clone()
    }

    pub fn snapshot(&self) -> Event {
        self.engine.snapshot(Some(&self.category))
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Option<Event> {
        let event = self.engine.start();
        self.publish_opt(event)
    }

    pub fn pause(&mut self) -> Option<Event> {
        let event = self.engine.pause();
        self.publish_opt(event)
    }

    pub fn reset(&mut self) -> Event {
        let event = self.engine.reset();
        self.publish(event)
    }

    pub fn change_mode(&mut self, mode: TimerMode) -> Event {
        let event = self.engine.change_mode(mode);
        self.publish(event)
    }

    pub fn set_duration(&mut self, secs: u64) -> Option<Event> {
        let event = self.engine.set_duration(secs);
        self.publish_opt(event)
    }

    pub fn select_category(&mut self, category: impl Into<String>) -> Event {
        self.category = category.into();
        self.publish(Event::CategorySelected {
            category: self.category.clone(),
            at: Utc::now(),
        })
    }

    pub fn app_state(&mut self, state: AppState) -> Option<Event> {
        let event = self.engine.on_app_state(state);
        self.publish_opt(event)
    }

    /// Advance one second; finalizes the run if the countdown just ran out.
    pub async fn tick(&mut self) -> Option<Finalization> {
        let event = self.engine.tick();
        let event = self.publish_opt(event);
        if matches!(event, Some(Event::TimerCompleted { .. })) {
            Some(self.finalize().await)
        } else {
            None
        }
    }

    /// End the current run early. Ignored unless a countdown is active.
    pub async fn finish(&mut self) -> Option<Finalization> {
        if !self.engine.is_active() {
            return None;
        }
        Some(self.finalize().await)
    }

    async fn finalize(&mut self) -> Finalization {
        let outcome = match self.engine.mode() {
            TimerMode::Focus => {
                let session = Session::new(
                    Utc::now(),
                    self.engine.duration_secs(),
                    self.engine.elapsed_secs(),
                    self.category.clone(),
                    self.engine.distractions(),
                );
                match self.sessions.save(session.clone()).await {
                    Some(saved) => {
                        info!(
                            id = %saved.id,
                            elapsed = saved.elapsed,
                            category = %saved.category,
                            "focus session recorded"
                        );
                        self.publish(Event::SessionRecorded {
                            session: saved.clone(),
                            at: Utc::now(),
                        });
                        Finalization::Recorded(saved)
                    }
                    None => {
                        warn!(elapsed = session.elapsed, "focus session could not be stored");
                        Finalization::SaveFailed(session)
                    }
                }
            }
            TimerMode::Break => {
                self.publish(Event::BreakOver { at: Utc::now() });
                self.change_mode(TimerMode::Focus);
                Finalization::BreakOver
            }
        };
        self.reset();
        outcome
    }

    fn publish(&self, event: Event) -> Event {
        // No subscribers is fine.
        let _ = self.events.send(event.clone());
        event
    }

    fn publish_opt(&self, event: Option<Event>) -> Option<Event> {
        event.map(|e| self.publish(e))
    }
}
