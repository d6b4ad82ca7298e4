//! Integration tests for habit completion, streak length and reflection
//! cadence, run against both storage adapters.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use chrono::{DateTime, Duration};
use habitkeep_core::model::{HabitId, Streak, StreakFilter, StreakKey, StreakPatch};
use habitkeep_core::{
    CreateHabit, Habit, HabitEngine, ManualClock, MemoryStore, SqliteStore, StoreError,
    StreakEngine, StreakStore, Timestamp,
};

fn ts(s: &str) -> Timestamp {
    DateTime::parse_from_rfc3339(s).unwrap()
}

fn memory_engine(now: Timestamp) -> HabitEngine {
    let store = Arc::new(MemoryStore::new());
    HabitEngine::new(
        store.clone(),
        store.clone(),
        store,
        Arc::new(ManualClock::new(now)),
    )
}

fn sqlite_engine(now: Timestamp) -> HabitEngine {
    let store = Arc::new(SqliteStore::open_memory().unwrap());
    HabitEngine::new(
        store.clone(),
        store.clone(),
        store,
        Arc::new(ManualClock::new(now)),
    )
}

fn engines(now: Timestamp) -> Vec<(&'static str, HabitEngine)> {
    vec![("memory", memory_engine(now)), ("sqlite", sqlite_engine(now))]
}

fn create(engine: &HabitEngine, days: u32, at: Timestamp) -> Habit {
    engine
        .create_habit(CreateHabit {
            user_id: "user-1".into(),
            name: "x".into(),
            days_already_completed: days,
            created_at: at,
        })
        .unwrap()
}

#[test]
fn test_double_completion_same_day() {
    let t = ts("2024-03-10T09:15:00+01:00");
    for (name, engine) in engines(t) {
        let habit = create(&engine, 0, t);

        let streak = engine.complete_today(&habit.id, t).unwrap();
        assert_eq!(engine.current_streak_length(&habit.id, t).unwrap(), 1, "{name}");

        let later = t + Duration::hours(5);
        let err = engine.complete_today(&habit.id, later).unwrap_err();
        assert!(err.is_already_completed(), "{name}: {err}");

        let current = engine
            .streak_engine()
            .current_streak(&habit.id, later)
            .unwrap()
            .unwrap();
        assert_eq!(current, streak, "{name}");
        assert_eq!(current.end, t, "{name}");
    }
}

#[test]
fn test_seeded_habit_lengths() {
    let t = ts("2024-03-10T20:00:00+03:00");
    for (name, engine) in engines(t) {
        let habit = create(&engine, 5, t);

        assert_eq!(
            engine
                .current_streak_length(&habit.id, t - Duration::days(1))
                .unwrap(),
            5,
            "{name}"
        );
        // Creation day: the seed ended yesterday and is still current.
        assert_eq!(engine.current_streak_length(&habit.id, t).unwrap(), 5, "{name}");

        // Completing on the creation day extends the seed.
        engine.complete_today(&habit.id, t).unwrap();
        assert_eq!(engine.current_streak_length(&habit.id, t).unwrap(), 6, "{name}");
        assert_eq!(
            engine
                .current_streak_length(&habit.id, t + Duration::days(1))
                .unwrap(),
            6,
            "{name}"
        );
    }
}

#[test]
fn test_seed_lapses_when_creation_day_is_missed() {
    let t = ts("2024-03-10T08:00:00Z");
    for (name, engine) in engines(t) {
        let habit = create(&engine, 5, t);
        assert_eq!(
            engine
                .current_streak_length(&habit.id, t + Duration::days(1))
                .unwrap(),
            0,
            "{name}"
        );
    }
}

#[test]
fn test_never_completed_habit() {
    let t = ts("2024-03-10T08:00:00Z");
    for (name, engine) in engines(t) {
        let habit = create(&engine, 0, t);
        assert_eq!(engine.current_streak_length(&habit.id, t).unwrap(), 0, "{name}");
        assert!(!engine.should_prompt_reflection(&habit.id, t).unwrap(), "{name}");
        assert!(!engine.claim_reflection_prompt(&habit.id, t).unwrap(), "{name}");
    }
}

#[test]
fn test_cadence_over_daily_completions() {
    let start = ts("2024-04-01T07:30:00+02:00");
    for (name, engine) in engines(start) {
        let habit = create(&engine, 0, start);

        let mut prompted = Vec::new();
        for day in 0..15 {
            // Completion time drifts around the clock from day to day.
            let when = start + Duration::days(day) + Duration::minutes((day * 37) % 600);
            engine.complete_today(&habit.id, when).unwrap();
            let length = engine.current_streak_length(&habit.id, when).unwrap();
            assert_eq!(length, day as u32 + 1, "{name} day {day}");
            if engine.should_prompt_reflection(&habit.id, when).unwrap() {
                prompted.push(length);
            }
        }
        assert_eq!(prompted, vec![1, 3, 7, 14], "{name}");
    }
}

#[test]
fn test_reflection_today_suppresses_prompt() {
    let t = ts("2024-04-07T21:00:00+02:00");
    for (name, engine) in engines(t) {
        let habit = create(&engine, 6, t);
        engine.complete_today(&habit.id, t).unwrap();
        assert_eq!(engine.current_streak_length(&habit.id, t).unwrap(), 7, "{name}");
        assert!(engine.should_prompt_reflection(&habit.id, t).unwrap(), "{name}");

        engine
            .append_reflection_at(&habit.id, "a week in", t + Duration::minutes(5))
            .unwrap();
        assert!(!engine.should_prompt_reflection(&habit.id, t).unwrap(), "{name}");

        // Yesterday's reflection does not suppress today's check while the
        // streak still reads 7; completing moves it off the cadence.
        let tomorrow = t + Duration::days(1);
        assert!(engine.should_prompt_reflection(&habit.id, tomorrow).unwrap(), "{name}");
        engine.complete_today(&habit.id, tomorrow).unwrap();
        assert_eq!(
            engine.current_streak_length(&habit.id, tomorrow).unwrap(),
            8,
            "{name}"
        );
        assert!(!engine.should_prompt_reflection(&habit.id, tomorrow).unwrap(), "{name}");
    }
}

#[test]
fn test_status_lists_active_habits_only() {
    let t = ts("2024-05-01T10:00:00Z");
    for (name, engine) in engines(t) {
        let run = create(&engine, 2, t);
        let read = create(&engine, 0, t);
        engine.complete_today(&run.id, t).unwrap();
        engine.toggle_archive(&read.id).unwrap();

        let status = engine.status("user-1", t).unwrap();
        assert_eq!(status.len(), 1, "{name}");
        assert_eq!(status[0].habit_id, run.id, "{name}");
        assert_eq!(status[0].streak_length, 3, "{name}");
    }
}

#[test]
fn test_sqlite_state_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("habitkeep.db");
    let t = ts("2024-05-01T10:00:00-04:00");

    let habit_id = {
        let store = Arc::new(SqliteStore::open(&path).unwrap());
        let engine = HabitEngine::new(
            store.clone(),
            store.clone(),
            store,
            Arc::new(ManualClock::new(t)),
        );
        let habit = create(&engine, 2, t);
        engine.complete_today(&habit.id, t).unwrap();
        assert!(engine.claim_reflection_prompt(&habit.id, t).unwrap());
        habit.id
    };

    let store = Arc::new(SqliteStore::open(&path).unwrap());
    let engine = HabitEngine::new(
        store.clone(),
        store.clone(),
        store,
        Arc::new(ManualClock::new(t)),
    );
    assert_eq!(engine.current_streak_length(&habit_id, t).unwrap(), 3);
    assert!(engine.should_prompt_reflection(&habit_id, t).unwrap());
    assert!(engine
        .complete_today(&habit_id, t + Duration::hours(1))
        .unwrap_err()
        .is_already_completed());
    assert!(!engine.claim_reflection_prompt(&habit_id, t).unwrap());
}

/// Streak store handle whose first listings across all handles sharing the
/// barrier wait for each other after reading.
struct Lockstep {
    inner: Arc<dyn StreakStore>,
    barrier: Arc<Barrier>,
    pending: Arc<AtomicUsize>,
}

impl StreakStore for Lockstep {
    fn create_streak(
        &self,
        streak: &Streak,
        unless_any: Option<&StreakFilter>,
    ) -> Result<Streak, StoreError> {
        self.inner.create_streak(streak, unless_any)
    }

    fn get_streak(&self, key: &StreakKey) -> Result<Streak, StoreError> {
        self.inner.get_streak(key)
    }

    fn list_streaks(
        &self,
        habit_id: &HabitId,
        filter: &StreakFilter,
    ) -> Result<Vec<Streak>, StoreError> {
        let streaks = self.inner.list_streaks(habit_id, filter);
        if self
            .pending
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            self.barrier.wait();
        }
        streaks
    }

    fn update_streak(&self, key: &StreakKey, patch: &StreakPatch) -> Result<(), StoreError> {
        self.inner.update_streak(key, patch)
    }
}

fn race_first_completions(name: &str, stores: [Arc<dyn StreakStore>; 2]) {
    let barrier = Arc::new(Barrier::new(2));
    let pending = Arc::new(AtomicUsize::new(2));
    let habit_id: HabitId = "habit-race".into();
    let times = ["2024-06-01T09:00:00Z", "2024-06-01T09:00:05Z"];

    let handles: Vec<_> = stores
        .iter()
        .zip(times)
        .map(|(store, at)| {
            let engine = StreakEngine::new(Arc::new(Lockstep {
                inner: store.clone(),
                barrier: barrier.clone(),
                pending: pending.clone(),
            }));
            let habit_id = habit_id.clone();
            thread::spawn(move || engine.complete_today(&habit_id, ts(at)))
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1, "{name}");
    assert!(
        results
            .iter()
            .any(|r| matches!(r, Err(e) if e.is_already_completed())),
        "{name}: {results:?}"
    );
    let streaks = stores[0]
        .list_streaks(&habit_id, &StreakFilter::default())
        .unwrap();
    assert_eq!(streaks.len(), 1, "{name}");
}

#[test]
fn test_concurrent_first_completions_memory() {
    let store: Arc<dyn StreakStore> = Arc::new(MemoryStore::new());
    race_first_completions("memory", [store.clone(), store]);
}

#[test]
fn test_concurrent_first_completions_across_sqlite_connections() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("habitkeep.db");
    let first: Arc<dyn StreakStore> = Arc::new(SqliteStore::open(&path).unwrap());
    let second: Arc<dyn StreakStore> = Arc::new(SqliteStore::open(&path).unwrap());
    race_first_completions("sqlite", [first, second]);
}
