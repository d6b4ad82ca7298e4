//! Streak engine.
//!
//! Applies completion events to a habit's streak through a [`StreakStore`].
//! The engine holds no state of its own; every call is a read followed by at
//! most one conditional write.
//!
//! ## State Transitions
//!
//! ```text
//! NoStreak --complete--> Open --complete (new day)--> Open
//!                          \--complete (same day)--> AlreadyCompleted
//! ```
//!
//! A streak is "current" while its end boundary is after midnight at the
//! start of yesterday: a user who has not completed the habit yet today has
//! not broken the streak.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::calendar::{days_between, same_day, start_of_previous_day, Timestamp};
use crate::error::{CoreError, Result, StoreError};
use crate::model::{HabitId, Streak, StreakFilter, StreakPatch};
use crate::storage::StreakStore;

#[derive(Clone)]
pub struct StreakEngine {
    store: Arc<dyn StreakStore>,
}

impl StreakEngine {
    pub fn new(store: Arc<dyn StreakStore>) -> Self {
        Self { store }
    }

    /// The habit's current streak at `when`, if any.
    ///
    /// Should the store hold several eligible streaks, the one with the
    /// earliest end boundary wins.
    pub fn current_streak(&self, habit_id: &HabitId, when: Timestamp) -> Result<Option<Streak>> {
        let cutoff = start_of_previous_day(when);
        let streaks = self
            .store
            .list_streaks(habit_id, &StreakFilter::ended_after(cutoff))?;
        if streaks.len() > 1 {
            debug!(habit_id = %habit_id, count = streaks.len(), "multiple current streaks");
        }
        Ok(streaks.into_iter().min_by_key(|s| s.end))
    }

    /// Record a completion of the habit at `when`.
    ///
    /// Starts a new streak if none is current, extends the current one
    /// otherwise, and refuses a second completion on the same calendar date.
    ///
    /// # Errors
    /// [`CoreError::AlreadyCompleted`] when the current streak already ends
    /// on `when`'s date; store failures are passed through.
    pub fn complete_today(&self, habit_id: &HabitId, when: Timestamp) -> Result<Streak> {
        let Some(current) = self.current_streak(habit_id, when)? else {
            return self.start(habit_id, when);
        };

        if same_day(current.end, when) {
            debug!(habit_id = %habit_id, end = %current.end, "already completed today");
            return Err(already_completed(habit_id, when));
        }

        self.extend(current, when)
    }

    /// Current streak length in days at `when`; 0 if there is none.
    pub fn current_streak_length(&self, habit_id: &HabitId, when: Timestamp) -> Result<u32> {
        Ok(self
            .current_streak(habit_id, when)?
            .map_or(0, |s| days_between(s.start, s.end)))
    }

    /// Insert a fresh streak, provided no streak became current since the
    /// caller looked.
    fn start(&self, habit_id: &HabitId, when: Timestamp) -> Result<Streak> {
        let streak = Streak {
            habit_id: habit_id.clone(),
            start: when,
            end: when,
        };
        let guard = StreakFilter::ended_after(start_of_previous_day(when));

        match self.store.create_streak(&streak, Some(&guard)) {
            Ok(created) => {
                info!(habit_id = %habit_id, start = %when, "started streak");
                Ok(created)
            }
            Err(StoreError::Conflict { entity, id }) => {
                let winner = self.current_streak(habit_id, when)?;
                if winner.is_some_and(|w| same_day(w.end, when)) {
                    return Err(already_completed(habit_id, when));
                }
                warn!(habit_id = %habit_id, "streak started concurrently");
                Err(CoreError::StoreUnavailable(StoreError::Conflict { entity, id }))
            }
            Err(e) => {
                warn!(habit_id = %habit_id, error = %e, "failed to create streak");
                Err(e.into())
            }
        }
    }

    fn extend(&self, mut streak: Streak, when: Timestamp) -> Result<Streak> {
        let key = streak.key();
        let patch = StreakPatch {
            end: when,
            expected_end: Some(streak.end),
        };

        match self.store.update_streak(&key, &patch) {
            Ok(()) => {
                info!(habit_id = %streak.habit_id, start = %streak.start, end = %when, "extended streak");
                streak.end = when;
                Ok(streak)
            }
            Err(StoreError::Conflict { entity, id }) => {
                // Someone else moved the end since we read it.
                let winner = self.store.get_streak(&key)?;
                if same_day(winner.end, when) {
                    return Err(already_completed(&streak.habit_id, when));
                }
                warn!(habit_id = %streak.habit_id, "streak changed concurrently");
                Err(CoreError::StoreUnavailable(StoreError::Conflict { entity, id }))
            }
            Err(e) => {
                warn!(habit_id = %streak.habit_id, error = %e, "failed to extend streak");
                Err(e.into())
            }
        }
    }
}

fn already_completed(habit_id: &HabitId, when: Timestamp) -> CoreError {
    CoreError::AlreadyCompleted {
        habit_id: habit_id.clone(),
        date: when.date_naive(),
    }
}
