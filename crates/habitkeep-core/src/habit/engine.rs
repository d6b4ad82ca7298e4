//! Habit engine.
//!
//! Owns the habit lifecycle and composes the [`StreakEngine`] and the
//! [`ReflectionCadence`]. Every operation takes its timestamp from the
//! caller; the clock is only used to stamp reflections.

use std::sync::Arc;

use chrono::Duration;
use tracing::{debug, info, warn};

use crate::calendar::Timestamp;
use crate::clock::Clock;
use crate::error::{Result, ValidationError};
use crate::model::{
    DailyMark, Habit, HabitFilter, HabitPatch, HabitStatus, MarkKind, NewHabit,
    Reflection, Streak, StreakFilter,
};
use crate::reflection::ReflectionCadence;
use crate::storage::{DailyMarkStore, HabitStore, StreakStore};
use crate::streak::StreakEngine;

/// Input for [`HabitEngine::create_habit`].
#[derive(Debug, Clone)]
pub struct CreateHabit {
    pub user_id: String,
    pub name: String,
    /// Days completed before tracking started, not counting today.
    pub days_already_completed: u32,
    pub created_at: Timestamp,
}

pub struct HabitEngine {
    habits: Arc<dyn HabitStore>,
    streaks: Arc<dyn StreakStore>,
    marks: Arc<dyn DailyMarkStore>,
    streak_engine: StreakEngine,
    cadence: ReflectionCadence,
    clock: Arc<dyn Clock>,
}

impl HabitEngine {
    pub fn new(
        habits: Arc<dyn HabitStore>,
        streaks: Arc<dyn StreakStore>,
        marks: Arc<dyn DailyMarkStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            streak_engine: StreakEngine::new(streaks.clone()),
            habits,
            streaks,
            marks,
            cadence: ReflectionCadence::default(),
            clock,
        }
    }

    /// Replace the default reflection cadence.
    pub fn with_cadence(mut self, cadence: ReflectionCadence) -> Self {
        self.cadence = cadence;
        self
    }

    pub fn cadence(&self) -> &ReflectionCadence {
        &self.cadence
    }

    pub fn streak_engine(&self) -> &StreakEngine {
        &self.streak_engine
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Create a habit, seeding a streak for days completed before tracking.
    ///
    /// The seed runs from `created_at - N days` to `created_at - 1 day`, so
    /// it never covers today; today's completion goes through
    /// [`HabitEngine::complete_today`].
    ///
    /// # Errors
    /// [`CoreError::InvalidInput`](crate::CoreError::InvalidInput) when the
    /// name or user id is blank, or when the seed would start before the
    /// earliest representable date.
    pub fn create_habit(&self, input: CreateHabit) -> Result<Habit> {
        let name = input.name.trim();
        if name.is_empty() {
            return Err(ValidationError::Empty("name").into());
        }
        if input.user_id.trim().is_empty() {
            return Err(ValidationError::Empty("user_id").into());
        }

        let seed = match input.days_already_completed {
            0 => None,
            days => Some(seed_bounds(input.created_at, days)?),
        };

        let habit = self.habits.create_habit(NewHabit {
            user_id: input.user_id,
            name: name.to_string(),
        })?;
        info!(habit_id = %habit.id, user_id = %habit.user_id, "created habit");

        let Some((start, end)) = seed else {
            return Ok(habit);
        };

        let streak = Streak {
            habit_id: habit.id.clone(),
            start,
            end,
        };
        if let Err(e) = self
            .streaks
            .create_streak(&streak, Some(&StreakFilter::default()))
        {
            warn!(habit_id = %habit.id, error = %e, "failed to seed streak");
            return Err(e.into());
        }
        debug!(
            habit_id = %habit.id,
            days = input.days_already_completed,
            "seeded streak"
        );

        Ok(habit)
    }

    pub fn get_habit(&self, habit_id: &str) -> Result<Habit> {
        Ok(self.habits.get_habit(habit_id)?)
    }

    /// All habits of the user, archived ones included.
    pub fn list_all(&self, user_id: &str) -> Result<Vec<Habit>> {
        Ok(self.habits.list_habits(user_id, HabitFilter::All)?)
    }

    pub fn list_active(&self, user_id: &str) -> Result<Vec<Habit>> {
        Ok(self.habits.list_habits(user_id, HabitFilter::Active)?)
    }

    /// Flip the archived flag and return the updated habit.
    pub fn toggle_archive(&self, habit_id: &str) -> Result<Habit> {
        let mut habit = self.habits.get_habit(habit_id)?;
        let archived = !habit.archived;
        self.habits.update_habit(
            habit_id,
            &HabitPatch {
                archived: Some(archived),
            },
        )?;
        info!(habit_id = %habit_id, archived, "toggled archive");
        habit.archived = archived;
        Ok(habit)
    }

    /// Append a reflection stamped with the current clock time.
    ///
    /// No deduplication: callers decide when to ask.
    pub fn append_reflection(&self, habit_id: &str, text: &str) -> Result<Reflection> {
        self.append_reflection_at(habit_id, text, self.clock.now())
    }

    pub fn append_reflection_at(
        &self,
        habit_id: &str,
        text: &str,
        created_at: Timestamp,
    ) -> Result<Reflection> {
        if text.trim().is_empty() {
            return Err(ValidationError::Empty("text").into());
        }
        let reflection = Reflection {
            content: text.to_string(),
            created_at,
        };
        self.habits.append_reflection(habit_id, reflection.clone())?;
        info!(habit_id = %habit_id, "added reflection");
        Ok(reflection)
    }

    // ── Streaks ──────────────────────────────────────────────────────

    /// Mark the habit done at `when`.
    ///
    /// # Errors
    /// `NotFound` for an unknown habit, `AlreadyCompleted` when it was
    /// already completed on `when`'s calendar date.
    pub fn complete_today(&self, habit_id: &str, when: Timestamp) -> Result<Streak> {
        let habit = self.habits.get_habit(habit_id)?;
        self.streak_engine.complete_today(&habit.id, when)
    }

    pub fn current_streak_length(&self, habit_id: &str, when: Timestamp) -> Result<u32> {
        self.streak_engine
            .current_streak_length(&habit_id.to_string(), when)
    }

    /// Current streak length of every active habit of the user.
    pub fn status(&self, user_id: &str, when: Timestamp) -> Result<Vec<HabitStatus>> {
        self.list_active(user_id)?
            .into_iter()
            .map(|habit| {
                let streak_length = self.streak_engine.current_streak_length(&habit.id, when)?;
                Ok(HabitStatus {
                    habit_id: habit.id,
                    name: habit.name,
                    streak_length,
                })
            })
            .collect()
    }

    // ── Reflection cadence ───────────────────────────────────────────

    /// Whether to ask the user for a reflection on this habit at `when`.
    pub fn should_prompt_reflection(&self, habit_id: &str, when: Timestamp) -> Result<bool> {
        let habit = self.habits.get_habit(habit_id)?;
        let streak_length = self.streak_engine.current_streak_length(&habit.id, when)?;
        let prompt = self
            .cadence
            .should_prompt(streak_length, &habit.reflections, when);
        debug!(habit_id = %habit_id, streak_length, prompt, "reflection cadence");
        Ok(prompt)
    }

    /// Like [`should_prompt_reflection`](Self::should_prompt_reflection), but
    /// also records the prompt so it is issued at most once per habit per
    /// calendar day, across restarts and processes sharing the store.
    pub fn claim_reflection_prompt(&self, habit_id: &str, when: Timestamp) -> Result<bool> {
        if !self.should_prompt_reflection(habit_id, when)? {
            return Ok(false);
        }
        let claimed = self
            .marks
            .mark(&DailyMark::new(habit_id, MarkKind::ReflectionPrompt, when))?;
        if !claimed {
            debug!(habit_id = %habit_id, "reflection prompt already issued today");
        }
        Ok(claimed)
    }
}

/// Seed streak boundaries for `days` completions before `created_at`.
fn seed_bounds(created_at: Timestamp, days: u32) -> Result<(Timestamp, Timestamp)> {
    let out_of_range = || ValidationError::InvalidValue {
        field: "days_already_completed",
        message: format!("{days} days before {created_at} is out of range"),
    };
    let start = created_at
        .checked_sub_signed(Duration::days(i64::from(days)))
        .ok_or_else(out_of_range)?;
    let end = created_at
        .checked_sub_signed(Duration::days(1))
        .ok_or_else(out_of_range)?;
    Ok((start, end))
}

impl std::fmt::Debug for HabitEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HabitEngine")
            .field("cadence", &self.cadence)
            .finish_non_exhaustive()
    }
}
