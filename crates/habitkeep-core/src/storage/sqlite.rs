//! SQLite-backed store.
//!
//! Provides persistent storage for:
//! - Habits and their reflection log
//! - Streak boundaries
//! - Once-per-day marks

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, NaiveDate, SecondsFormat};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use uuid::Uuid;

use super::migrations;
use super::traits::{DailyMarkStore, HabitStore, StreakStore};
use crate::calendar::Timestamp;
use crate::error::StoreError;
use crate::model::{
    DailyMark, Habit, HabitFilter, HabitId, HabitPatch, NewHabit, Reflection, Streak,
    StreakFilter, StreakKey, StreakPatch,
};

// === Helper Functions ===

/// Format a timestamp for storage, keeping nanoseconds and offset.
fn format_ts(ts: &Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn parse_ts(field: &'static str, value: &str) -> Result<Timestamp, StoreError> {
    DateTime::parse_from_rfc3339(value).map_err(|_| StoreError::Corrupt {
        field,
        value: value.to_string(),
    })
}

fn format_day(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

fn habit_not_found(id: &str) -> StoreError {
    StoreError::NotFound {
        entity: "habit",
        id: id.to_string(),
    }
}

/// SQLite database implementing every storage trait.
///
/// The connection is guarded by a mutex; each trait call runs under it.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and apply migrations.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|source| StoreError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_connection(conn)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        migrations::migrate(&conn).map_err(|e| StoreError::MigrationFailed(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn load_reflections(conn: &Connection, habit_id: &str) -> Result<Vec<Reflection>, StoreError> {
        let mut stmt = conn.prepare(
            "SELECT content, created_at FROM reflections
             WHERE habit_id = ?1
             ORDER BY id",
        )?;
        let rows = stmt.query_map(params![habit_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut reflections = Vec::new();
        for row in rows {
            let (content, created_at) = row?;
            reflections.push(Reflection {
                content,
                created_at: parse_ts("reflections.created_at", &created_at)?,
            });
        }
        Ok(reflections)
    }

    fn row_to_streak(habit_id: String, start: &str, end: &str) -> Result<Streak, StoreError> {
        Ok(Streak {
            habit_id,
            start: parse_ts("streaks.start_at", start)?,
            end: parse_ts("streaks.end_at", end)?,
        })
    }

    fn query_streaks(
        conn: &Connection,
        habit_id: &str,
        filter: &StreakFilter,
    ) -> Result<Vec<Streak>, StoreError> {
        let mut stmt = conn.prepare(
            "SELECT habit_id, start_at, end_at FROM streaks
             WHERE habit_id = ?1",
        )?;
        let rows = stmt.query_map(params![habit_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        // Offsets differ between rows, so the time filter runs on parsed values.
        let mut streaks = Vec::new();
        for row in rows {
            let (habit_id, start, end) = row?;
            let streak = Self::row_to_streak(habit_id, &start, &end)?;
            if filter.matches(&streak) {
                streaks.push(streak);
            }
        }
        Ok(streaks)
    }
}

impl HabitStore for SqliteStore {
    fn create_habit(&self, habit: NewHabit) -> Result<Habit, StoreError> {
        let habit = Habit {
            id: Uuid::new_v4().to_string(),
            user_id: habit.user_id,
            name: habit.name,
            archived: false,
            reflections: Vec::new(),
        };
        let conn = self.conn.lock()?;
        conn.execute(
            "INSERT INTO habits (id, user_id, name, archived) VALUES (?1, ?2, ?3, 0)",
            params![habit.id, habit.user_id, habit.name],
        )?;
        Ok(habit)
    }

    fn get_habit(&self, id: &str) -> Result<Habit, StoreError> {
        let conn = self.conn.lock()?;
        let row = conn
            .query_row(
                "SELECT id, user_id, name, archived FROM habits WHERE id = ?1",
                params![id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, bool>(3)?,
                    ))
                },
            )
            .optional()?;

        let (id, user_id, name, archived) = row.ok_or_else(|| habit_not_found(id))?;
        let reflections = Self::load_reflections(&conn, &id)?;
        Ok(Habit {
            id,
            user_id,
            name,
            archived,
            reflections,
        })
    }

    fn list_habits(&self, user_id: &str, filter: HabitFilter) -> Result<Vec<Habit>, StoreError> {
        let conn = self.conn.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, name, archived FROM habits
             WHERE user_id = ?1
             ORDER BY rowid",
        )?;
        let rows = stmt.query_map(params![user_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, bool>(3)?,
            ))
        })?;

        let mut habits = Vec::new();
        for row in rows {
            let (id, user_id, name, archived) = row?;
            let mut habit = Habit {
                id,
                user_id,
                name,
                archived,
                reflections: Vec::new(),
            };
            if !filter.matches(&habit) {
                continue;
            }
            habit.reflections = Self::load_reflections(&conn, &habit.id)?;
            habits.push(habit);
        }
        Ok(habits)
    }

    fn update_habit(&self, id: &str, patch: &HabitPatch) -> Result<(), StoreError> {
        let conn = self.conn.lock()?;
        let tx = conn.unchecked_transaction()?;
        let exists = tx
            .query_row("SELECT 1 FROM habits WHERE id = ?1", params![id], |_| Ok(()))
            .optional()?
            .is_some();
        if !exists {
            return Err(habit_not_found(id));
        }
        if let Some(archived) = patch.archived {
            tx.execute(
                "UPDATE habits SET archived = ?1 WHERE id = ?2",
                params![archived, id],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn append_reflection(&self, id: &str, reflection: Reflection) -> Result<(), StoreError> {
        let conn = self.conn.lock()?;
        let inserted = conn.execute(
            "INSERT INTO reflections (habit_id, content, created_at)
             SELECT id, ?2, ?3 FROM habits WHERE id = ?1",
            params![id, reflection.content, format_ts(&reflection.created_at)],
        )?;
        if inserted == 0 {
            return Err(habit_not_found(id));
        }
        Ok(())
    }
}

impl StreakStore for SqliteStore {
    fn create_streak(
        &self,
        streak: &Streak,
        unless_any: Option<&StreakFilter>,
    ) -> Result<Streak, StoreError> {
        let conflict = || StoreError::Conflict {
            entity: "streak",
            id: streak.key().to_string(),
        };

        let mut conn = self.conn.lock()?;
        // Write lock before the check; other connections may share the file.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        if let Some(filter) = unless_any {
            if !Self::query_streaks(&tx, &streak.habit_id, filter)?.is_empty() {
                return Err(conflict());
            }
        }
        let inserted = tx.execute(
            "INSERT OR IGNORE INTO streaks (habit_id, start_at, end_at) VALUES (?1, ?2, ?3)",
            params![
                streak.habit_id,
                format_ts(&streak.start),
                format_ts(&streak.end)
            ],
        )?;
        if inserted == 0 {
            return Err(conflict());
        }
        tx.commit()?;
        Ok(streak.clone())
    }

    fn get_streak(&self, key: &StreakKey) -> Result<Streak, StoreError> {
        let conn = self.conn.lock()?;
        let row = conn
            .query_row(
                "SELECT habit_id, start_at, end_at FROM streaks
                 WHERE habit_id = ?1 AND start_at = ?2",
                params![key.habit_id, format_ts(&key.start)],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                    ))
                },
            )
            .optional()?;

        let (habit_id, start, end) = row.ok_or_else(|| StoreError::NotFound {
            entity: "streak",
            id: key.to_string(),
        })?;
        Self::row_to_streak(habit_id, &start, &end)
    }

    fn list_streaks(
        &self,
        habit_id: &HabitId,
        filter: &StreakFilter,
    ) -> Result<Vec<Streak>, StoreError> {
        let conn = self.conn.lock()?;
        Self::query_streaks(&conn, habit_id, filter)
    }

    fn update_streak(&self, key: &StreakKey, patch: &StreakPatch) -> Result<(), StoreError> {
        let conn = self.conn.lock()?;
        let start = format_ts(&key.start);
        let end = format_ts(&patch.end);

        let updated = match patch.expected_end {
            Some(expected) => conn.execute(
                "UPDATE streaks SET end_at = ?1
                 WHERE habit_id = ?2 AND start_at = ?3 AND end_at = ?4",
                params![end, key.habit_id, start, format_ts(&expected)],
            )?,
            None => conn.execute(
                "UPDATE streaks SET end_at = ?1
                 WHERE habit_id = ?2 AND start_at = ?3",
                params![end, key.habit_id, start],
            )?,
        };
        if updated == 1 {
            return Ok(());
        }

        let exists = conn
            .query_row(
                "SELECT 1 FROM streaks WHERE habit_id = ?1 AND start_at = ?2",
                params![key.habit_id, start],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if exists {
            Err(StoreError::Conflict {
                entity: "streak",
                id: key.to_string(),
            })
        } else {
            Err(StoreError::NotFound {
                entity: "streak",
                id: key.to_string(),
            })
        }
    }
}

impl DailyMarkStore for SqliteStore {
    fn mark(&self, mark: &DailyMark) -> Result<bool, StoreError> {
        let conn = self.conn.lock()?;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO daily_marks (subject, kind, day) VALUES (?1, ?2, ?3)",
            params![mark.subject, mark.kind.as_str(), format_day(mark.date)],
        )?;
        Ok(inserted == 1)
    }

    fn is_marked(&self, mark: &DailyMark) -> Result<bool, StoreError> {
        let conn = self.conn.lock()?;
        let found = conn
            .query_row(
                "SELECT 1 FROM daily_marks WHERE subject = ?1 AND kind = ?2 AND day = ?3",
                params![mark.subject, mark.kind.as_str(), format_day(mark.date)],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }
}
