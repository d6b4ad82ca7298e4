//! Habit management and completion commands for CLI.

use clap::Subcommand;
use habitkeep_core::{CreateHabit, Timestamp};
use serde_json::json;

use super::{parse_timestamp, print_json, CmdResult, Context};

#[derive(Subcommand)]
pub enum HabitAction {
    /// Create a new habit
    Create {
        /// Owning user ID
        user: String,
        /// Habit name
        name: String,
        /// Days already completed before today (default: 0)
        #[arg(long, default_value = "0")]
        days: u32,
        /// Creation time (RFC 3339, default: now)
        #[arg(long, value_parser = parse_timestamp)]
        at: Option<Timestamp>,
    },
    /// List a user's habits
    List {
        /// User ID
        user: String,
        /// Include archived habits
        #[arg(long)]
        all: bool,
    },
    /// Archive a habit, or restore it if already archived
    Archive {
        /// Habit ID
        id: String,
    },
    /// Mark a habit as done today
    Complete {
        /// Habit ID
        id: String,
        /// Completion time (RFC 3339, default: now)
        #[arg(long, value_parser = parse_timestamp)]
        at: Option<Timestamp>,
    },
    /// Show the current streak of a habit
    Streak {
        /// Habit ID
        id: String,
        /// Evaluation time (RFC 3339, default: now)
        #[arg(long, value_parser = parse_timestamp)]
        at: Option<Timestamp>,
    },
}

pub fn run(action: HabitAction) -> CmdResult {
    let ctx = Context::open()?;

    match action {
        HabitAction::Create {
            user,
            name,
            days,
            at,
        } => {
            let habit = ctx.engine.create_habit(CreateHabit {
                user_id: user,
                name,
                days_already_completed: days,
                created_at: ctx.at_or_now(at),
            })?;
            print_json(&habit)?;
        }
        HabitAction::List { user, all } => {
            let habits = if all {
                ctx.engine.list_all(&user)?
            } else {
                ctx.engine.list_active(&user)?
            };
            print_json(&habits)?;
        }
        HabitAction::Archive { id } => {
            let habit = ctx.engine.toggle_archive(&id)?;
            print_json(&habit)?;
        }
        HabitAction::Complete { id, at } => {
            let when = ctx.at_or_now(at);
            match ctx.engine.complete_today(&id, when) {
                Ok(_) => {
                    let kudo = ctx
                        .motivation()
                        .random_kudo(&mut rand::thread_rng())
                        .to_string();
                    let streak_length = ctx.engine.current_streak_length(&id, when)?;
                    let reflection_prompt = ctx.engine.claim_reflection_prompt(&id, when)?;
                    print_json(&json!({
                        "habit_id": id,
                        "completed": true,
                        "streak_length": streak_length,
                        "kudo": kudo,
                        "reflection_prompt": reflection_prompt,
                    }))?;
                }
                Err(e) if e.is_already_completed() => {
                    let streak_length = ctx.engine.current_streak_length(&id, when)?;
                    print_json(&json!({
                        "habit_id": id,
                        "completed": false,
                        "already_completed": true,
                        "streak_length": streak_length,
                    }))?;
                }
                Err(e) => return Err(e.into()),
            }
        }
        HabitAction::Streak { id, at } => {
            let when = ctx.at_or_now(at);
            let habit = ctx.engine.get_habit(&id)?;
            let current = ctx.engine.streak_engine().current_streak(&habit.id, when)?;
            let streak_length = ctx.engine.current_streak_length(&id, when)?;
            print_json(&json!({
                "habit_id": habit.id,
                "name": habit.name,
                "streak_length": streak_length,
                "streak": current,
            }))?;
        }
    }
    Ok(())
}
