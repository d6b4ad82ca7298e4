//! Subcommands and the wiring they share.

pub mod affirmation;
pub mod config;
pub mod habit;
pub mod reflect;
pub mod status;

use std::sync::Arc;

use chrono::DateTime;
use habitkeep_core::{Clock, Config, HabitEngine, Motivation, SqliteStore, SystemClock, Timestamp};
use serde::Serialize;
use tracing::warn;

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Everything a command needs: loaded config, the opened store and an
/// engine over it.
pub struct Context {
    pub config: Config,
    pub store: Arc<SqliteStore>,
    pub engine: HabitEngine,
    clock: Arc<SystemClock>,
}

impl Context {
    pub fn open() -> Result<Self, Box<dyn std::error::Error>> {
        let config = Config::load()?;
        let store = Arc::new(SqliteStore::open(&config.database_path()?)?);
        let clock = Arc::new(SystemClock);
        let engine = HabitEngine::new(store.clone(), store.clone(), store.clone(), clock.clone())
            .with_cadence(config.reflection_cadence());
        Ok(Self {
            config,
            store,
            engine,
            clock,
        })
    }

    /// Phrase pools from the configured files, or the fallback phrases when a
    /// file cannot be read.
    pub fn motivation(&self) -> Motivation {
        Motivation::from_config(&self.config.motivation).unwrap_or_else(|e| {
            warn!(error = %e, "failed to load phrase files, using fallbacks");
            Motivation::fallback(&self.config.motivation)
        })
    }

    /// The `--at` timestamp if given, otherwise the current local time.
    pub fn at_or_now(&self, at: Option<Timestamp>) -> Timestamp {
        at.unwrap_or_else(|| self.clock.now())
    }
}

/// Value parser for `--at` arguments.
pub fn parse_timestamp(s: &str) -> Result<Timestamp, String> {
    DateTime::parse_from_rfc3339(s).map_err(|e| format!("expected RFC 3339 timestamp: {e}"))
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CmdResult {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}
