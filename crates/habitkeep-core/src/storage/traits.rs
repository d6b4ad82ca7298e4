use crate::error::StoreError;
use crate::model::{
    DailyMark, Habit, HabitFilter, HabitId, HabitPatch, NewHabit, Reflection, Streak,
    StreakFilter, StreakKey, StreakPatch,
};

/// Habit persistence.
///
/// Lookups of unknown ids must return [`StoreError::NotFound`], distinct
/// from transport or storage failures.
pub trait HabitStore: Send + Sync {
    /// Persist a new habit and assign its id.
    fn create_habit(&self, habit: NewHabit) -> Result<Habit, StoreError>;

    fn get_habit(&self, id: &str) -> Result<Habit, StoreError>;

    /// Habits owned by `user_id`, in store order.
    fn list_habits(&self, user_id: &str, filter: HabitFilter) -> Result<Vec<Habit>, StoreError>;

    fn update_habit(&self, id: &str, patch: &HabitPatch) -> Result<(), StoreError>;

    /// Append to the habit's reflection log.
    fn append_reflection(&self, id: &str, reflection: Reflection) -> Result<(), StoreError>;
}

/// Streak persistence.
///
/// The engine does no locking of its own. Both writes are conditional and
/// must be applied atomically against the stored state, so concurrent
/// completions of one habit cannot both succeed.
pub trait StreakStore: Send + Sync {
    /// Insert a new streak.
    ///
    /// With `unless_any` set, the insert only happens if no streak of the
    /// same habit matches that filter. A match, like an existing key, is
    /// reported as [`StoreError::Conflict`].
    fn create_streak(
        &self,
        streak: &Streak,
        unless_any: Option<&StreakFilter>,
    ) -> Result<Streak, StoreError>;

    fn get_streak(&self, key: &StreakKey) -> Result<Streak, StoreError>;

    /// Streaks of `habit_id` matching `filter`. Uniqueness is not guaranteed.
    fn list_streaks(
        &self,
        habit_id: &HabitId,
        filter: &StreakFilter,
    ) -> Result<Vec<Streak>, StoreError>;

    /// Returns [`StoreError::Conflict`] when `patch.expected_end` no longer
    /// matches the stored end.
    fn update_streak(&self, key: &StreakKey, patch: &StreakPatch) -> Result<(), StoreError>;
}

/// Persisted once-per-day records.
pub trait DailyMarkStore: Send + Sync {
    /// Record the mark. Returns `true` if it was newly recorded and `false`
    /// if it already existed.
    fn mark(&self, mark: &DailyMark) -> Result<bool, StoreError>;

    fn is_marked(&self, mark: &DailyMark) -> Result<bool, StoreError>;
}
