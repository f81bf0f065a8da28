//! # Focustimer Core Library
//!
//! This library provides the core logic for Focustimer, a focus/break
//! countdown that tracks distractions and keeps a categorized session log.
//! Front-ends (the `focustimer` CLI, or any GUI) are thin layers over it.
//!
//! ## Architecture
//!
//! - **Timer Engine**: a tick-driven state machine; the owner calls `tick()`
//!   once per second while running
//! - **Controller / Driver**: the single owner of the engine, which turns
//!   finished focus runs into stored sessions and publishes events
//! - **Storage**: session and category repositories over an async
//!   key-value store (SQLite or in-memory), plus TOML configuration
//! - **Stats**: the report aggregation over the session log
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core timer state machine
//! - [`FocusController`], [`TimerDriver`]: Session finalization and clock
//! - [`SessionRepository`], [`CategoryRepository`]: Persistence
//! - [`aggregate`]: Report building
//! - [`Config`]: Application configuration management

pub mod error;
pub mod events;
pub mod stats;
pub mod storage;
pub mod timer;

pub use error::{CategoryError, ConfigError, CoreError, StoreError};
pub use events::Event;
pub use stats::{aggregate, aggregate_now, format_clock, CategorySlice, DayPoint, FocusReport};
pub use storage::{
    Category, CategoryRepository, Config, KeyValueStore, MemoryStore, Session, SessionRepository,
    SqliteStore,
};
pub use timer::{
    AlertPattern, Alerter, AppState, Finalization, FocusController, ModeDurations, TimerDriver,
    TimerEngine, TimerHandle, TimerMode, TimerState,
};
