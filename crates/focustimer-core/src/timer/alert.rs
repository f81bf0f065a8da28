//! Platform side effects the timer triggers but does not own.
//!
//! Vibration and keep-awake are fire-and-forget: the engine never looks at a
//! result. Front-ends plug in their own [`Alerter`].

use std::sync::{Arc, Mutex};

use crate::storage::NotificationsConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertPattern {
    /// Countdown finished.
    Completion,
    /// Timer auto-paused because the app left the foreground.
    Distraction,
}

impl AlertPattern {
    /// Vibration pattern in milliseconds (alternating on/off).
    pub fn vibration_ms(self) -> &'static [u64] {
        match self {
            AlertPattern::Completion => &[500, 500, 500],
            AlertPattern::Distraction => &[100, 200],
        }
    }
}

pub trait Alerter: Send + Sync {
    fn alert(&self, pattern: AlertPattern);

    /// Ask the platform to keep the screen on while a countdown runs.
    fn set_keep_awake(&self, _on: bool) {
        // default no-op
    }
}

/// Does nothing. For headless use.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentAlerter;

impl Alerter for SilentAlerter {
    fn alert(&self, _pattern: AlertPattern) {}
}

/// Applies the `[notifications]` switches in front of another alerter.
pub struct GatedAlerter {
    inner: Arc<dyn Alerter>,
    vibration: bool,
    keep_awake: bool,
}

impl GatedAlerter {
    pub fn new(inner: Arc<dyn Alerter>, config: &NotificationsConfig) -> Self {
        Self {
            inner,
            vibration: config.vibration,
            keep_awake: config.keep_awake,
        }
    }
}

impl Alerter for GatedAlerter {
    fn alert(&self, pattern: AlertPattern) {
        if self.vibration {
            self.inner.alert(pattern);
        }
    }

    fn set_keep_awake(&self, on: bool) {
        if self.keep_awake {
            self.inner.set_keep_awake(on);
        }
    }
}

/// Something an [`Alerter`] was asked to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertCall {
    Alert(AlertPattern),
    KeepAwake(bool),
}

/// Remembers every call. Lets tests and headless drivers observe alerts.
#[derive(Debug, Default)]
pub struct RecordingAlerter {
    calls: Mutex<Vec<AlertCall>>,
}

impl RecordingAlerter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<AlertCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn alerts(&self) -> Vec<AlertPattern> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                AlertCall::Alert(p) => Some(p),
                AlertCall::KeepAwake(_) => None,
            })
            .collect()
    }

    fn push(&self, call: AlertCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

impl Alerter for RecordingAlerter {
    fn alert(&self, pattern: AlertPattern) {
        self.push(AlertCall::Alert(pattern));
    }

    fn set_keep_awake(&self, on: bool) {
        self.push(AlertCall::KeepAwake(on));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patterns_match_platform_vibrations() {
        assert_eq!(AlertPattern::Completion.vibration_ms(), &[500, 500, 500]);
        assert_eq!(AlertPattern::Distraction.vibration_ms(), &[100, 200]);
    }

    #[test]
    fn gate_blocks_disabled_channels() {
        let recorder = Arc::new(RecordingAlerter::new());
        let gated = GatedAlerter::new(
            recorder.clone(),
            &NotificationsConfig {
                vibration: false,
                keep_awake: true,
            },
        );
        gated.alert(AlertPattern::Completion);
        gated.set_keep_awake(true);
        assert_eq!(recorder.calls(), vec![AlertCall::KeepAwake(true)]);
    }
}
