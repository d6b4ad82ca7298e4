//! Domain records shared by the engines and the storage adapters.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::Timestamp;

pub type HabitId = String;
pub type UserId = String;

/// A free-text note attached to a habit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reflection {
    pub content: String,
    pub created_at: Timestamp,
}

/// A recurring behavior tracked for one user.
///
/// Habits are never deleted, only archived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Habit {
    pub id: HabitId,
    pub user_id: UserId,
    pub name: String,
    #[serde(default)]
    pub archived: bool,
    /// Reflection log in insertion order.
    #[serde(default)]
    pub reflections: Vec<Reflection>,
}

/// Fields for a habit that does not have an id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHabit {
    pub user_id: UserId,
    pub name: String,
}

/// Partial update of a habit; `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HabitPatch {
    pub archived: Option<bool>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HabitFilter {
    #[default]
    All,
    Active,
}

impl HabitFilter {
    pub fn matches(&self, habit: &Habit) -> bool {
        match self {
            HabitFilter::All => true,
            HabitFilter::Active => !habit.archived,
        }
    }
}

/// A contiguous run of daily completions.
///
/// Identified by `(habit_id, start)`. `start <= end` always holds and
/// `end` only ever moves forward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Streak {
    pub habit_id: HabitId,
    pub start: Timestamp,
    pub end: Timestamp,
}

impl Streak {
    pub fn key(&self) -> StreakKey {
        StreakKey {
            habit_id: self.habit_id.clone(),
            start: self.start,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StreakKey {
    pub habit_id: HabitId,
    pub start: Timestamp,
}

impl std::fmt::Display for StreakKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.habit_id, self.start.to_rfc3339())
    }
}

/// Filter for listing a habit's streaks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreakFilter {
    /// Keep streaks whose end boundary is strictly after this instant.
    pub ended_after: Option<Timestamp>,
}

impl StreakFilter {
    pub fn ended_after(cutoff: Timestamp) -> Self {
        Self {
            ended_after: Some(cutoff),
        }
    }

    pub fn matches(&self, streak: &Streak) -> bool {
        self.ended_after.map_or(true, |cutoff| streak.end > cutoff)
    }
}

/// Conditional move of a streak's end boundary.
///
/// When `expected_end` is set the store must only apply the write if the
/// stored end still equals it, and report a conflict otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreakPatch {
    pub end: Timestamp,
    pub expected_end: Option<Timestamp>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkKind {
    /// Daily affirmation handed to a user.
    Affirmation,
    /// Reflection prompt issued for a habit.
    ReflectionPrompt,
}

impl MarkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarkKind::Affirmation => "affirmation",
            MarkKind::ReflectionPrompt => "reflection_prompt",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "affirmation" => Some(MarkKind::Affirmation),
            "reflection_prompt" => Some(MarkKind::ReflectionPrompt),
            _ => None,
        }
    }
}

/// Idempotence record: "`kind` happened for `subject` on `date`".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DailyMark {
    pub subject: String,
    pub kind: MarkKind,
    pub date: NaiveDate,
}

impl DailyMark {
    pub fn new(subject: impl Into<String>, kind: MarkKind, when: Timestamp) -> Self {
        Self {
            subject: subject.into(),
            kind,
            date: when.date_naive(),
        }
    }
}

/// One row of a user's status overview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitStatus {
    pub habit_id: HabitId,
    pub name: String,
    pub streak_length: u32,
}
