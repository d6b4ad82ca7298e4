use clap::Args;
use habitkeep_core::Timestamp;

use super::{parse_timestamp, print_json, CmdResult, Context};

#[derive(Args)]
pub struct StatusArgs {
    /// User ID
    user: String,
    /// Evaluation time (RFC 3339, default: now)
    #[arg(long, value_parser = parse_timestamp)]
    at: Option<Timestamp>,
}

pub fn run(args: StatusArgs) -> CmdResult {
    let ctx = Context::open()?;
    let status = ctx.engine.status(&args.user, ctx.at_or_now(args.at))?;
    print_json(&status)
}
