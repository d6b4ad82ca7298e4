use clap::Args;
use habitkeep_core::{AffirmationGate, Timestamp};
use serde_json::json;

use super::{parse_timestamp, print_json, CmdResult, Context};

#[derive(Args)]
pub struct AffirmationArgs {
    /// User ID
    user: String,
    /// Request time (RFC 3339, default: now)
    #[arg(long, value_parser = parse_timestamp)]
    at: Option<Timestamp>,
}

pub fn run(args: AffirmationArgs) -> CmdResult {
    let ctx = Context::open()?;
    let when = ctx.at_or_now(args.at);

    let gate = AffirmationGate::new(ctx.store.clone());
    if gate.check_and_mark(&args.user, when)? {
        return print_json(&json!({
            "user_id": args.user,
            "sent": false,
        }));
    }

    let motivation = ctx.motivation();
    let affirmation = motivation.random_affirmation(&mut rand::thread_rng());
    print_json(&json!({
        "user_id": args.user,
        "sent": true,
        "affirmation": affirmation,
    }))
}
