// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `atwf state/state-set/state-set-self`

use crate::context::Context;
use crate::output::print_row;
use anyhow::Result;
use atwf_core::{AgentStatus, TeamError};
use clap::Args;

fn parse_status(raw: &str) -> Result<AgentStatus, TeamError> {
    AgentStatus::parse(raw).ok_or_else(|| {
        TeamError::InvalidInput(format!(
            "invalid status: {} (allowed: working|draining|idle)",
            raw
        ))
    })
}

#[derive(Args)]
pub struct StateArgs {
    /// Member to show; omit for the whole team
    pub target: Option<String>,
}

pub fn state(ctx: &Context, args: StateArgs) -> Result<()> {
    let rows = ctx.engine().state_rows(args.target.as_deref())?;
    if args.target.is_none() {
        print_row(&["full", "role", "base", "status", "updated_at", "wakeup_due_at"]);
    }
    for row in rows {
        print_row(&[
            &row.full,
            &row.role,
            &row.base,
            row.status.as_str(),
            &row.updated_at,
            &row.wakeup_due_at,
        ]);
    }
    Ok(())
}

#[derive(Args)]
pub struct StateSetArgs {
    pub target: String,
    /// working|draining|idle
    pub status: String,
    /// Required for draining/idle (worker-owned states)
    #[arg(long)]
    pub force: bool,
}

pub fn state_set(ctx: &Context, args: StateSetArgs) -> Result<()> {
    let desired = parse_status(&args.status)?;
    let status = ctx.engine().state_set(&args.target, desired, args.force)?;
    println!("{}", status);
    Ok(())
}

#[derive(Args)]
pub struct StateSetSelfArgs {
    /// working|draining|idle
    pub status: String,
    #[arg(long = "as")]
    pub as_target: Option<String>,
}

pub async fn state_set_self(ctx: &Context, args: StateSetSelfArgs) -> Result<()> {
    let desired = parse_status(&args.status)?;
    let status = ctx
        .engine()
        .state_set_self(args.as_target.as_deref(), desired)
        .await?;
    println!("{}", status);
    Ok(())
}
