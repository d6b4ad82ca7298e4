//! # habitkeep Core Library
//!
//! This library provides the core logic for tracking recurring habits and the
//! unbroken streaks built from daily completions. Front-ends (the bundled CLI,
//! a chat bot, ...) are thin layers that call one engine operation per user
//! action and pass the timestamp of that action explicitly.
//!
//! ## Architecture
//!
//! - **Calendar**: the pure day-count function streak lengths are built on
//! - **Streak Engine**: completion events, idempotence and the one-day grace
//!   window that decides which streak is current
//! - **Habit Engine**: habit lifecycle, reflections, status overview
//! - **Reflection Cadence**: when to ask for a reflective note
//! - **Storage**: store traits with SQLite and in-memory adapters, and TOML
//!   configuration
//!
//! ## Key Components
//!
//! - [`days_between`]: streak length in calendar days
//! - [`StreakEngine`]: per-habit streak state machine
//! - [`HabitEngine`]: entry point for front-ends
//! - [`SqliteStore`] / [`MemoryStore`]: storage adapters
//! - [`Config`]: application configuration

pub mod calendar;
pub mod clock;
pub mod error;
pub mod habit;
pub mod model;
pub mod motivation;
pub mod reflection;
pub mod storage;
pub mod streak;

pub use calendar::{days_between, same_day, Timestamp};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ConfigError, CoreError, StoreError, ValidationError};
pub use habit::{CreateHabit, HabitEngine};
pub use model::{
    DailyMark, Habit, HabitFilter, HabitId, HabitStatus, MarkKind, Reflection, Streak, UserId,
};
pub use motivation::{AffirmationGate, Motivation, PhrasePool};
pub use reflection::ReflectionCadence;
pub use storage::{Config, DailyMarkStore, HabitStore, MemoryStore, SqliteStore, StreakStore};
pub use streak::StreakEngine;
