use serde::{Deserialize, Serialize};

use crate::storage::TimerConfig;

/// Focus presets offered before a run, in minutes.
pub const FOCUS_PRESETS_MIN: [u64; 5] = [15, 25, 30, 45, 60];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerMode {
    #[default]
    Focus,
    Break,
}

impl TimerMode {
    pub fn label(self) -> &'static str {
        match self {
            TimerMode::Focus => "Focus",
            TimerMode::Break => "Break",
        }
    }
}

/// Length each mode resets to, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeDurations {
    pub focus_secs: u64,
    pub break_secs: u64,
}

impl ModeDurations {
    pub fn for_mode(&self, mode: TimerMode) -> u64 {
        match mode {
            TimerMode::Focus => self.focus_secs,
            TimerMode::Break => self.break_secs,
        }
    }

    /// Zero-length entries in the file fall back to one minute.
    pub fn from_config(config: &TimerConfig) -> Self {
        Self {
            focus_secs: config.focus_secs().max(60),
            break_secs: config.break_secs().max(60),
        }
    }
}

impl Default for ModeDurations {
    fn default() -> Self {
        Self {
            focus_secs: 25 * 60,
            break_secs: 5 * 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_25_and_5_minutes() {
        let d = ModeDurations::default();
        assert_eq!(d.for_mode(TimerMode::Focus), 1500);
        assert_eq!(d.for_mode(TimerMode::Break), 300);
        assert_eq!(ModeDurations::from_config(&TimerConfig::default()), d);
    }

    #[test]
    fn zero_minutes_in_config_are_clamped() {
        let config = TimerConfig {
            focus_duration_min: 0,
            break_duration_min: 10,
            focus_presets_min: vec![],
        };
        let d = ModeDurations::from_config(&config);
        assert_eq!(d.focus_secs, 60);
        assert_eq!(d.break_secs, 600);
    }
}
