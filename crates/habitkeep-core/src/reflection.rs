//! Reflection prompt cadence.
//!
//! Encouragement is front-loaded (day 1, day 3) and then weekly, and a habit
//! is never prompted twice on a calendar day it already has a reflection for.

use serde::{Deserialize, Serialize};

use crate::calendar::{same_day, Timestamp};
use crate::model::Reflection;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReflectionCadence {
    /// Streak lengths that always prompt.
    pub early_days: Vec<u32>,
    /// Prompt whenever the streak length is a multiple of this. 0 disables.
    pub weekly_every: u32,
}

impl Default for ReflectionCadence {
    fn default() -> Self {
        Self {
            early_days: vec![1, 3],
            weekly_every: 7,
        }
    }
}

impl ReflectionCadence {
    /// Whether a streak of `streak_length` days is a prompting length.
    pub fn matches_length(&self, streak_length: u32) -> bool {
        if streak_length == 0 {
            return false;
        }
        self.early_days.contains(&streak_length)
            || (self.weekly_every > 0 && streak_length % self.weekly_every == 0)
    }

    /// Decide whether to ask for a reflection at `when`.
    pub fn should_prompt(
        &self,
        streak_length: u32,
        reflections: &[Reflection],
        when: Timestamp,
    ) -> bool {
        if reflections.iter().any(|r| same_day(r.created_at, when)) {
            return false;
        }
        self.matches_length(streak_length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn ts(s: &str) -> Timestamp {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    #[test]
    fn default_cadence_lengths() {
        let cadence = ReflectionCadence::default();
        for len in [1, 3, 7, 14, 21, 70] {
            assert!(cadence.matches_length(len), "length {len} should prompt");
        }
        for len in [0, 2, 4, 5, 6, 8, 13, 15] {
            assert!(!cadence.matches_length(len), "length {len} should not prompt");
        }
    }

    #[test]
    fn same_day_reflection_suppresses_prompt() {
        let cadence = ReflectionCadence::default();
        let when = ts("2024-06-07T20:00:00+02:00");
        let reflections = vec![Reflection {
            content: "tired but done".into(),
            created_at: ts("2024-06-07T08:00:00+02:00"),
        }];
        assert!(!cadence.should_prompt(7, &reflections, when));
    }

    #[test]
    fn older_reflection_does_not_suppress() {
        let cadence = ReflectionCadence::default();
        let when = ts("2024-06-07T20:00:00+02:00");
        let reflections = vec![Reflection {
            content: "week one".into(),
            created_at: ts("2024-06-06T23:59:59+02:00"),
        }];
        assert!(cadence.should_prompt(7, &reflections, when));
    }

    #[test]
    fn weekly_rule_can_be_disabled() {
        let cadence = ReflectionCadence {
            early_days: vec![1],
            weekly_every: 0,
        };
        assert!(cadence.matches_length(1));
        assert!(!cadence.matches_length(7));
    }
}
