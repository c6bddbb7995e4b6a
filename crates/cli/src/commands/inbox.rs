// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `atwf inbox/inbox-open/inbox-ack/inbox-pending`

use crate::context::Context;
use crate::output::print_row;
use anyhow::Result;
use atwf_storage::InboxState;
use clap::Args;

#[derive(Args)]
pub struct InboxArgs {
    /// Member to list for (defaults to the current worker)
    #[arg(long)]
    pub target: Option<String>,
}

pub async fn inbox(ctx: &Context, args: InboxArgs) -> Result<()> {
    let engine = ctx.engine();
    let reg = engine.load_registry()?;
    let is_self = args.target.is_none();
    let member = engine
        .resolve_actor(&reg, args.target.as_deref())
        .await?
        .clone();
    let rows = engine.inbox_rows(member.base_name());
    if rows.is_empty() {
        println!("(empty)");
    } else {
        for row in rows {
            let mut cols = vec![row.msg_id.as_str(), row.from_base.as_str(), row.kind.as_str()];
            if !row.summary.is_empty() {
                cols.push(row.summary.as_str());
            }
            if row.state != InboxState::Unread {
                cols.push(row.state.dir_name());
            }
            print_row(&cols);
        }
    }
    // Listing your own inbox counts as checking it.
    if is_self {
        engine.record_inbox_check(&member)?;
    }
    Ok(())
}

#[derive(Args)]
pub struct InboxOpenArgs {
    pub msg_id: String,
    #[arg(long)]
    pub target: Option<String>,
}

pub async fn inbox_open(ctx: &Context, args: InboxOpenArgs) -> Result<()> {
    let engine = ctx.engine();
    let reg = engine.load_registry()?;
    let is_self = args.target.is_none();
    let member = engine
        .resolve_actor(&reg, args.target.as_deref())
        .await?
        .clone();
    let content = engine.open_message(member.base_name(), &args.msg_id)?;
    print!("{}", content);
    if !content.ends_with('\n') {
        println!();
    }
    if is_self {
        // Opening your own message auto-acks it and records the check.
        engine.ack_message(member.base_name(), &args.msg_id)?;
        engine.record_inbox_check(&member)?;
    }
    Ok(())
}

#[derive(Args)]
pub struct InboxAckArgs {
    pub msg_id: String,
    /// Member to ack for (defaults to the current worker)
    #[arg(long)]
    pub target: Option<String>,
}

pub async fn inbox_ack(ctx: &Context, args: InboxAckArgs) -> Result<()> {
    let engine = ctx.engine();
    let reg = engine.load_registry()?;
    let is_self = args.target.is_none();
    let member = engine
        .resolve_actor(&reg, args.target.as_deref())
        .await?
        .clone();
    engine.ack_message(member.base_name(), &args.msg_id)?;
    println!("OK");
    if is_self {
        engine.record_inbox_check(&member)?;
    }
    Ok(())
}

#[derive(Args)]
pub struct InboxPendingArgs {
    /// Recipient whose thread to inspect
    pub target: String,
    #[arg(long = "as")]
    pub as_target: Option<String>,
}

pub async fn inbox_pending(ctx: &Context, args: InboxPendingArgs) -> Result<()> {
    let engine = ctx.engine();
    let reg = engine.load_registry()?;
    let actor = engine
        .resolve_actor(&reg, args.as_target.as_deref())
        .await?
        .clone();
    let target = atwf_storage::registry::require_member(&reg, &args.target)?;
    let (unread, overflow) = engine.pending_between(actor.base_name(), target.base_name());
    println!("unread={} overflow={}", unread, overflow);
    Ok(())
}
