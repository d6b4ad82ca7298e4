//! In-process store.
//!
//! Implements every storage trait behind one mutex, which serializes all
//! writes and therefore satisfies the conditional-update contract of
//! [`StreakStore`]. Used by tests and by embedders that persist elsewhere.

use std::collections::HashSet;
use std::sync::Mutex;

use uuid::Uuid;

use super::traits::{DailyMarkStore, HabitStore, StreakStore};
use crate::error::StoreError;
use crate::model::{
    DailyMark, Habit, HabitFilter, HabitId, HabitPatch, NewHabit, Reflection, Streak,
    StreakFilter, StreakKey, StreakPatch,
};

#[derive(Debug, Default)]
struct Inner {
    habits: Vec<Habit>,
    streaks: Vec<Streak>,
    marks: HashSet<DailyMark>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

fn habit_not_found(id: &str) -> StoreError {
    StoreError::NotFound {
        entity: "habit",
        id: id.to_string(),
    }
}

fn streak_not_found(key: &StreakKey) -> StoreError {
    StoreError::NotFound {
        entity: "streak",
        id: key.to_string(),
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HabitStore for MemoryStore {
    fn create_habit(&self, habit: NewHabit) -> Result<Habit, StoreError> {
        let habit = Habit {
            id: Uuid::new_v4().to_string(),
            user_id: habit.user_id,
            name: habit.name,
            archived: false,
            reflections: Vec::new(),
        };
        self.inner.lock()?.habits.push(habit.clone());
        Ok(habit)
    }

    fn get_habit(&self, id: &str) -> Result<Habit, StoreError> {
        self.inner
            .lock()?
            .habits
            .iter()
            .find(|h| h.id == id)
            .cloned()
            .ok_or_else(|| habit_not_found(id))
    }

    fn list_habits(&self, user_id: &str, filter: HabitFilter) -> Result<Vec<Habit>, StoreError> {
        Ok(self
            .inner
            .lock()?
            .habits
            .iter()
            .filter(|h| h.user_id == user_id && filter.matches(h))
            .cloned()
            .collect())
    }

    fn update_habit(&self, id: &str, patch: &HabitPatch) -> Result<(), StoreError> {
        let mut inner = self.inner.lock()?;
        let habit = inner
            .habits
            .iter_mut()
            .find(|h| h.id == id)
            .ok_or_else(|| habit_not_found(id))?;
        if let Some(archived) = patch.archived {
            habit.archived = archived;
        }
        Ok(())
    }

    fn append_reflection(&self, id: &str, reflection: Reflection) -> Result<(), StoreError> {
        let mut inner = self.inner.lock()?;
        let habit = inner
            .habits
            .iter_mut()
            .find(|h| h.id == id)
            .ok_or_else(|| habit_not_found(id))?;
        habit.reflections.push(reflection);
        Ok(())
    }
}

impl StreakStore for MemoryStore {
    fn create_streak(
        &self,
        streak: &Streak,
        unless_any: Option<&StreakFilter>,
    ) -> Result<Streak, StoreError> {
        let mut inner = self.inner.lock()?;
        let key = streak.key();
        let blocked = inner.streaks.iter().any(|s| {
            s.key() == key
                || (s.habit_id == streak.habit_id && unless_any.is_some_and(|f| f.matches(s)))
        });
        if blocked {
            return Err(StoreError::Conflict {
                entity: "streak",
                id: key.to_string(),
            });
        }
        inner.streaks.push(streak.clone());
        Ok(streak.clone())
    }

    fn get_streak(&self, key: &StreakKey) -> Result<Streak, StoreError> {
        self.inner
            .lock()?
            .streaks
            .iter()
            .find(|s| s.habit_id == key.habit_id && s.start == key.start)
            .cloned()
            .ok_or_else(|| streak_not_found(key))
    }

    fn list_streaks(
        &self,
        habit_id: &HabitId,
        filter: &StreakFilter,
    ) -> Result<Vec<Streak>, StoreError> {
        Ok(self
            .inner
            .lock()?
            .streaks
            .iter()
            .filter(|s| &s.habit_id == habit_id && filter.matches(s))
            .cloned()
            .collect())
    }

    fn update_streak(&self, key: &StreakKey, patch: &StreakPatch) -> Result<(), StoreError> {
        let mut inner = self.inner.lock()?;
        let streak = inner
            .streaks
            .iter_mut()
            .find(|s| s.habit_id == key.habit_id && s.start == key.start)
            .ok_or_else(|| streak_not_found(key))?;
        if let Some(expected) = patch.expected_end {
            if streak.end != expected {
                return Err(StoreError::Conflict {
                    entity: "streak",
                    id: key.to_string(),
                });
            }
        }
        streak.end = patch.end;
        Ok(())
    }
}

impl DailyMarkStore for MemoryStore {
    fn mark(&self, mark: &DailyMark) -> Result<bool, StoreError> {
        Ok(self.inner.lock()?.marks.insert(mark.clone()))
    }

    fn is_marked(&self, mark: &DailyMark) -> Result<bool, StoreError> {
        Ok(self.inner.lock()?.marks.contains(mark))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::Timestamp;
    use crate::model::MarkKind;
    use chrono::DateTime;

    fn ts(s: &str) -> Timestamp {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    #[test]
    fn habits_are_listed_per_owner_and_filter() {
        let store = MemoryStore::new();
        let a = store
            .create_habit(NewHabit {
                user_id: "u1".into(),
                name: "run".into(),
            })
            .unwrap();
        store
            .create_habit(NewHabit {
                user_id: "u2".into(),
                name: "read".into(),
            })
            .unwrap();
        store
            .update_habit(
                &a.id,
                &HabitPatch {
                    archived: Some(true),
                },
            )
            .unwrap();

        assert_eq!(store.list_habits("u1", HabitFilter::All).unwrap().len(), 1);
        assert!(store.list_habits("u1", HabitFilter::Active).unwrap().is_empty());
    }

    #[test]
    fn unknown_habit_is_not_found() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.get_habit("missing"),
            Err(StoreError::NotFound { .. })
        ));
        assert!(matches!(
            store.update_habit("missing", &HabitPatch::default()),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn streak_update_checks_expected_end() {
        let store = MemoryStore::new();
        let streak = Streak {
            habit_id: "h".into(),
            start: ts("2024-01-01T10:00:00Z"),
            end: ts("2024-01-01T10:00:00Z"),
        };
        store.create_streak(&streak, None).unwrap();

        let stale = StreakPatch {
            end: ts("2024-01-02T10:00:00Z"),
            expected_end: Some(ts("2023-12-31T10:00:00Z")),
        };
        assert!(matches!(
            store.update_streak(&streak.key(), &stale),
            Err(StoreError::Conflict { .. })
        ));

        let fresh = StreakPatch {
            end: ts("2024-01-02T10:00:00Z"),
            expected_end: Some(streak.end),
        };
        store.update_streak(&streak.key(), &fresh).unwrap();
        assert_eq!(store.get_streak(&streak.key()).unwrap().end, fresh.end);
    }

    #[test]
    fn marks_are_recorded_once() {
        let store = MemoryStore::new();
        let mark = DailyMark::new("u1", MarkKind::Affirmation, ts("2024-01-01T10:00:00Z"));
        assert!(!store.is_marked(&mark).unwrap());
        assert!(store.mark(&mark).unwrap());
        assert!(!store.mark(&mark).unwrap());
        assert!(store.is_marked(&mark).unwrap());
    }
}
