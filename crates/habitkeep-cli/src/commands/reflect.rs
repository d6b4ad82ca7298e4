use clap::Subcommand;
use habitkeep_core::Timestamp;
use serde_json::json;

use super::{parse_timestamp, print_json, CmdResult, Context};

#[derive(Subcommand)]
pub enum ReflectAction {
    /// Add a reflection to a habit
    Add {
        /// Habit ID
        id: String,
        /// Reflection text
        text: String,
    },
    /// Check whether a reflection is due
    Check {
        /// Habit ID
        id: String,
        /// Evaluation time (RFC 3339, default: now)
        #[arg(long, value_parser = parse_timestamp)]
        at: Option<Timestamp>,
    },
}

pub fn run(action: ReflectAction) -> CmdResult {
    let ctx = Context::open()?;

    match action {
        ReflectAction::Add { id, text } => {
            let reflection = ctx.engine.append_reflection(&id, &text)?;
            print_json(&reflection)?;
        }
        ReflectAction::Check { id, at } => {
            let when = ctx.at_or_now(at);
            let due = ctx.engine.should_prompt_reflection(&id, when)?;
            let streak_length = ctx.engine.current_streak_length(&id, when)?;
            print_json(&json!({
                "habit_id": id,
                "streak_length": streak_length,
                "reflection_due": due,
            }))?;
        }
    }
    Ok(())
}
