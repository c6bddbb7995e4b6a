// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `atwf watch` - the long-running watcher loop.
//!
//! Run one watcher per team dir (a uniquely-named mux session is the usual
//! guard). `--once` runs a single tick, `--dry-run` observes without
//! writing state or injecting keys.

use crate::context::Context;
use anyhow::Result;
use atwf_core::time::parse_duration_secs;
use atwf_core::SystemClock;
use atwf_engine::{WatchConfig, Watcher};
use clap::Args;

#[derive(Args)]
pub struct WatchArgs {
    /// Seconds between ticks (default: team.state.watch_interval)
    #[arg(long)]
    pub interval: Option<String>,
    /// Idle wake delay (default: team.state.idle_wake_delay)
    #[arg(long)]
    pub delay: Option<String>,
    /// Stale-inbox threshold while working
    #[arg(long)]
    pub working_stale: Option<String>,
    /// Stale-alert cooldown
    #[arg(long)]
    pub alert_cooldown: Option<String>,
    /// Override the wake message
    #[arg(long)]
    pub message: Option<String>,
    /// Run a single tick and exit
    #[arg(long)]
    pub once: bool,
    /// Observe only: no state writes, no key injection
    #[arg(long)]
    pub dry_run: bool,
}

pub async fn watch(ctx: &Context, args: WatchArgs) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let parse = |raw: &Option<String>, default: f64| {
        raw.as_deref().map(|s| parse_duration_secs(s, default))
    };
    let cfg = WatchConfig {
        interval_s: parse(&args.interval, ctx.settings.watch_interval_s),
        idle_wake_delay_s: parse(&args.delay, ctx.settings.idle_wake_delay_s),
        working_stale_s: parse(&args.working_stale, ctx.settings.working_stale_threshold_s),
        alert_cooldown_s: parse(&args.alert_cooldown, ctx.settings.working_alert_cooldown_s),
        wake_message: args.message.clone(),
        once: args.once,
        dry_run: args.dry_run,
    };

    ctx.team.ensure_layout()?;
    let watcher = Watcher::new(
        ctx.team.clone(),
        ctx.policy.clone(),
        ctx.settings.clone(),
        ctx.config_path.clone(),
        cfg,
        ctx.mux.clone(),
        ctx.ctl.clone(),
        SystemClock,
    );
    watcher.run().await?;
    Ok(())
}
