// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `atwf gather/respond/reply-needed/request`

use crate::context::Context;
use crate::output::{print_row, read_message};
use anyhow::Result;
use atwf_storage::requests;
use clap::Args;

#[derive(Args)]
pub struct GatherArgs {
    /// Targets (full|base); at least one
    pub targets: Vec<String>,
    #[arg(long)]
    pub message: Option<String>,
    #[arg(long)]
    pub topic: Option<String>,
    /// Reply deadline, e.g. 600 or 30m (clamped 60s..24h)
    #[arg(long)]
    pub deadline: Option<String>,
    #[arg(long = "as")]
    pub as_target: Option<String>,
}

pub async fn gather(ctx: &Context, args: GatherArgs) -> Result<()> {
    let message = read_message(args.message)?;
    let request_id = ctx
        .engine()
        .gather(
            args.as_target.as_deref(),
            &args.targets,
            args.topic.as_deref(),
            &message,
            args.deadline.as_deref(),
        )
        .await?;
    println!("{}", request_id);
    Ok(())
}

#[derive(Args)]
pub struct RespondArgs {
    pub request_id: String,
    /// Reply body (`-` reads stdin); optional with --blocked
    pub message: Option<String>,
    /// Acknowledge without replying; snoozes reminders
    #[arg(long)]
    pub blocked: bool,
    /// Snooze duration for --blocked, e.g. 15m (clamped 30s..24h)
    #[arg(long)]
    pub snooze: Option<String>,
    /// Base you are waiting on (reply-drive wakes debtors first)
    #[arg(long)]
    pub waiting_on: Option<String>,
    #[arg(long = "as")]
    pub as_target: Option<String>,
}

pub async fn respond(ctx: &Context, args: RespondArgs) -> Result<()> {
    let message = if args.blocked && args.message.is_none() {
        String::new()
    } else {
        read_message(args.message)?
    };
    let outcome = ctx
        .engine()
        .respond(
            args.as_target.as_deref(),
            &args.request_id,
            &message,
            args.blocked,
            args.snooze.as_deref(),
            args.waiting_on.as_deref().unwrap_or(""),
        )
        .await?;
    if outcome.blocked {
        print_row(&[
            &outcome.request_id,
            "blocked",
            &format!("until={}", outcome.blocked_until),
        ]);
    } else if let Some(final_id) = outcome.finalized_msg_id {
        print_row(&[
            &outcome.request_id,
            "replied",
            &format!("finalized={}", final_id),
        ]);
    } else {
        print_row(&[&outcome.request_id, "replied"]);
    }
    Ok(())
}

#[derive(Args)]
pub struct ReplyNeededArgs {
    /// Member to list for (defaults to the current worker)
    #[arg(long)]
    pub target: Option<String>,
}

pub async fn reply_needed(ctx: &Context, args: ReplyNeededArgs) -> Result<()> {
    let engine = ctx.engine();
    let reg = engine.load_registry()?;
    let member = engine.resolve_actor(&reg, args.target.as_deref()).await?;
    let rows = engine.reply_needed_rows(member.base_name())?;
    if rows.is_empty() {
        println!("(none)");
        return Ok(());
    }
    for (req_id, status, topic, from_base, deadline_at) in rows {
        print_row(&[&req_id, &status, &topic, &from_base, &deadline_at]);
    }
    Ok(())
}

#[derive(Args)]
pub struct RequestArgs {
    pub request_id: String,
}

pub fn request(ctx: &Context, args: RequestArgs) -> Result<()> {
    let meta = requests::load_meta(&ctx.team, &args.request_id)?;
    print!("{}", requests::render_result(&ctx.team, &meta, meta.status));
    Ok(())
}
