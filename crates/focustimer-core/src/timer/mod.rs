mod alert;
mod controller;
mod driver;
mod engine;
mod mode;

pub use alert::{AlertCall, AlertPattern, Alerter, GatedAlerter, RecordingAlerter, SilentAlerter};
pub use controller::{Finalization, FocusController};
pub use driver::{DriverError, TimerCommand, TimerDriver, TimerHandle};
pub use engine::{AppState, TimerEngine, TimerState};
pub use mode::{ModeDurations, TimerMode, FOCUS_PRESETS_MIN};
