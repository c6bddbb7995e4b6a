// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `atwf handoff/send/notice/action/receipts`

use crate::context::Context;
use crate::output::{print_row, read_message};
use anyhow::Result;
use atwf_core::time::parse_duration_secs;
use atwf_engine::{IntentKind, TargetSelection};
use clap::Args;

#[derive(Args)]
pub struct HandoffArgs {
    /// First endpoint (full|base)
    pub a: String,
    /// Second endpoint (full|base)
    pub b: String,
    /// Act as this member (required outside tmux)
    #[arg(long = "as")]
    pub as_target: Option<String>,
    /// Permit lifetime, e.g. 3600 or 1h (omit for no expiry)
    #[arg(long)]
    pub ttl: Option<String>,
    #[arg(long)]
    pub reason: Option<String>,
    /// Also inject the handoff notice into both sessions
    #[arg(long)]
    pub notify: bool,
    #[arg(long)]
    pub dry_run: bool,
}

pub async fn handoff(ctx: &Context, args: HandoffArgs) -> Result<()> {
    let ttl_seconds = args
        .ttl
        .as_deref()
        .map(|raw| parse_duration_secs(raw, 3600.0) as i64);
    let outcome = ctx
        .engine()
        .handoff(
            args.as_target.as_deref(),
            &args.a,
            &args.b,
            ttl_seconds,
            args.reason.as_deref().unwrap_or(""),
            args.notify,
            args.dry_run,
        )
        .await?;
    if args.dry_run {
        println!("dry_run: true");
        println!("a: {}", outcome.a_full);
        println!("b: {}", outcome.b_full);
        println!("permit_exists: {}", outcome.existed);
        if !outcome.existed {
            println!("permit_id: (would-create)");
        }
        return Ok(());
    }
    match outcome.permit_id {
        Some(id) => println!("{}", id),
        None => println!("(existing)"),
    }
    Ok(())
}

#[derive(Args)]
pub struct SendArgs {
    /// Target (full|base|role-member)
    pub name: String,
    /// Message body (`-` reads stdin)
    pub message: Option<String>,
    #[arg(long = "as")]
    pub as_target: Option<String>,
    /// Also inject a short notice into the target session
    #[arg(long)]
    pub notify: bool,
}

pub async fn send(ctx: &Context, args: SendArgs) -> Result<()> {
    let message = read_message(args.message)?;
    let msg_id = ctx
        .engine()
        .send(args.as_target.as_deref(), &args.name, &message, args.notify)
        .await?;
    println!("{}", msg_id);
    Ok(())
}

#[derive(Args)]
pub struct IntentArgs {
    /// Explicit targets (full|base); or use --role / --subtree
    pub targets: Vec<String>,
    #[arg(long)]
    pub role: Option<String>,
    /// Deliver to the whole subtree rooted at this member
    #[arg(long)]
    pub subtree: Option<String>,
    #[arg(long)]
    pub message: Option<String>,
    #[arg(long = "as")]
    pub as_target: Option<String>,
    /// Also inject a short notice into each target session
    #[arg(long)]
    pub notify: bool,
    /// Include broadcast-excluded roles in subtree deliveries
    #[arg(long)]
    pub include_excluded: bool,
}

pub async fn intent(ctx: &Context, args: IntentArgs, kind: IntentKind) -> Result<()> {
    let message = read_message(args.message)?;
    let selection = TargetSelection {
        targets: args.targets,
        role: args.role,
        subtree: args.subtree,
    };
    let msg_id = ctx
        .engine()
        .intent(
            args.as_target.as_deref(),
            kind,
            &selection,
            &message,
            args.notify,
            args.include_excluded,
        )
        .await?;
    println!("{}", msg_id);
    Ok(())
}

#[derive(Args)]
pub struct ReceiptsArgs {
    pub msg_id: String,
    /// Explicit recipients; defaults to the whole team
    pub targets: Vec<String>,
    #[arg(long)]
    pub role: Option<String>,
    #[arg(long)]
    pub subtree: Option<String>,
}

pub fn receipts(ctx: &Context, args: ReceiptsArgs) -> Result<()> {
    let rows = ctx.engine().receipts(
        &args.msg_id,
        &TargetSelection {
            targets: args.targets,
            role: args.role,
            subtree: args.subtree,
        },
    )?;
    if rows.is_empty() {
        println!("(no targets)");
        return Ok(());
    }
    for row in rows {
        print_row(&[&row.status, &row.role, &row.base, &row.full]);
    }
    Ok(())
}
