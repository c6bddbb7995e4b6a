// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The watcher: one long-running loop that keeps the team honest.
//!
//! Each tick samples every member's pane, derives working/idle, schedules
//! and fires wakes, sweeps reply-needed requests for finalization, and runs
//! the anti-stall drive controller. One worker's failure never halts the
//! loop: per-member errors are logged and skipped.
//!
//! The watcher is single-threaded by design; drive arbitration depends on
//! it. Running two watchers against one team dir is unsupported.

mod drive;
mod observe;

use atwf_adapters::{Mux, WorkerCtl};
use atwf_core::settings::drive_mode_hot;
use atwf_core::{AgentStatus, Clock, DriveMode, RequestStatus, Settings, TeamError, TeamPolicy};
use atwf_storage::{msg_seq, registry, requests, TeamDir};
use std::path::PathBuf;

/// Per-invocation overrides for the watch loop.
#[derive(Debug, Clone, Default)]
pub struct WatchConfig {
    pub interval_s: Option<f64>,
    pub idle_wake_delay_s: Option<f64>,
    pub working_stale_s: Option<f64>,
    pub alert_cooldown_s: Option<f64>,
    pub wake_message: Option<String>,
    pub once: bool,
    pub dry_run: bool,
}

/// Snapshot of one member for this tick's drive arithmetic.
#[derive(Debug, Clone)]
pub struct MemberSnapshot {
    pub full: String,
    pub base: String,
    pub role: String,
    pub status: AgentStatus,
    pub pending: usize,
    pub alive: bool,
}

/// What one tick did, for tests and tracing.
#[derive(Debug, Default)]
pub struct TickReport {
    pub member_count: usize,
    pub all_idle: bool,
    pub any_pending: bool,
    pub woke: Vec<String>,
    pub finalized: Vec<(String, RequestStatus)>,
    pub stale_alerts: Vec<String>,
    pub reply_drive_target: Option<String>,
    pub drive_suppressed: bool,
    pub drive_msg_id: Option<String>,
}

/// The watch loop and its cached configuration.
pub struct Watcher<M: Mux, W: WorkerCtl, C: Clock> {
    team: TeamDir,
    policy: TeamPolicy,
    settings: Settings,
    config_path: PathBuf,
    interval_s: f64,
    idle_wake_delay_s: f64,
    working_stale_s: f64,
    alert_cooldown_s: f64,
    wake_message: String,
    dry_run: bool,
    once: bool,
    mux: M,
    ctl: W,
    clock: C,
}

impl<M: Mux, W: WorkerCtl, C: Clock> Watcher<M, W, C> {
    pub fn new(
        team: TeamDir,
        policy: TeamPolicy,
        settings: Settings,
        config_path: PathBuf,
        cfg: WatchConfig,
        mux: M,
        ctl: W,
        clock: C,
    ) -> Self {
        let interval_s = cfg.interval_s.unwrap_or(settings.watch_interval_s);
        let idle_wake_delay_s = cfg.idle_wake_delay_s.unwrap_or(settings.idle_wake_delay_s);
        let working_stale_s = cfg.working_stale_s.unwrap_or(settings.working_stale_threshold_s);
        let alert_cooldown_s = cfg.alert_cooldown_s.unwrap_or(settings.working_alert_cooldown_s);
        let wake_message = cfg
            .wake_message
            .clone()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| settings.wake_message.clone());
        Self {
            team,
            policy,
            settings,
            config_path,
            interval_s,
            idle_wake_delay_s,
            working_stale_s,
            alert_cooldown_s,
            wake_message,
            dry_run: cfg.dry_run,
            once: cfg.once,
            mux,
            ctl,
            clock,
        }
    }

    pub fn team(&self) -> &TeamDir {
        &self.team
    }

    pub(crate) fn settings(&self) -> &Settings {
        &self.settings
    }

    pub(crate) fn mux(&self) -> &M {
        &self.mux
    }

    pub(crate) fn ctl(&self) -> &W {
        &self.ctl
    }

    pub(crate) fn dry_run(&self) -> bool {
        self.dry_run
    }

    pub(crate) fn idle_wake_delay(&self) -> f64 {
        self.idle_wake_delay_s
    }

    pub(crate) fn working_stale_threshold(&self) -> f64 {
        self.working_stale_s
    }

    pub(crate) fn alert_cooldown(&self) -> f64 {
        self.alert_cooldown_s
    }

    pub(crate) fn wake_message(&self) -> &str {
        &self.wake_message
    }

    /// Run until killed (or once, with `--once`).
    pub async fn run(&self) -> Result<(), TeamError> {
        loop {
            if self.team.is_paused() {
                tracing::debug!("team paused, skipping tick");
            } else {
                match self.tick().await {
                    Ok(report) => {
                        tracing::debug!(
                            members = report.member_count,
                            all_idle = report.all_idle,
                            any_pending = report.any_pending,
                            woke = report.woke.len(),
                            "tick complete"
                        );
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "tick failed");
                    }
                }
            }
            if self.once {
                return Ok(());
            }
            let sleep_s = self.interval_s.max(1.0);
            tokio::time::sleep(std::time::Duration::from_secs_f64(sleep_s)).await;
        }
    }

    /// One full pass. Public so tests (and `--once`) can drive single ticks.
    pub async fn tick(&self) -> Result<TickReport, TeamError> {
        let now = self.clock.now();
        let reg = registry::load(&self.team, now)?;
        let drive_mode = drive_mode_hot(&self.config_path);
        let coord = reg.resolve_latest_by_role(&self.policy.root_role).cloned();

        let mut report = TickReport::default();
        let mut snapshots: Vec<MemberSnapshot> = Vec::new();

        for member in reg.members.clone() {
            if member.full.trim().is_empty() {
                continue;
            }
            match self
                .observe_member(&member, coord.as_ref(), now, &mut report)
                .await
            {
                Ok(snapshot) => snapshots.push(snapshot),
                Err(err) => {
                    tracing::warn!(member = %member.full, error = %err, "member observation failed");
                }
            }
        }

        report.member_count = snapshots.len();
        report.all_idle = snapshots.iter().all(|s| s.status == AgentStatus::Idle);
        report.any_pending = snapshots.iter().any(|s| s.pending > 0);

        // Auto-finalize reply-needed requests (single consolidated delivery).
        if !self.dry_run {
            let scan = requests::scan_requests(&self.team, now);
            for (req_id, final_status) in scan.finalizable {
                let msg_id = msg_seq::next_msg_id(&self.team, now)?;
                match requests::finalize(
                    &self.team,
                    &reg,
                    &req_id,
                    &msg_id,
                    final_status,
                    self.settings.max_unread_per_thread,
                    now,
                ) {
                    Ok(true) => {
                        // The result message is new pending inbox content;
                        // suppress drive until the next tick.
                        report.any_pending = true;
                        report.finalized.push((req_id, final_status));
                    }
                    Ok(false) => {}
                    Err(err) => {
                        tracing::warn!(request = %req_id, error = %err, "finalize failed");
                    }
                }
            }
        }

        let team_quiet = report.member_count > 0 && report.all_idle && !report.any_pending;

        // Reply-drive takes precedence: wake the debtor, not the driver.
        let mut suppress_drive = false;
        if team_quiet && !self.dry_run && drive_mode == DriveMode::Running {
            suppress_drive = self.reply_drive(&reg, now, &mut report).await?;
        }
        report.drive_suppressed = suppress_drive;

        if !self.dry_run && drive_mode == DriveMode::Running && !suppress_drive {
            let target = self.resolve_drive_target(&reg).await;
            if self.settings.drive_unit_role.is_empty() {
                if team_quiet {
                    if let Some(target) = target {
                        self.team_drive(&reg, &target, drive_mode, now, &mut report)
                            .await?;
                    }
                }
            } else if let Some(target) = target {
                self.subtree_drive(&reg, &snapshots, &target, drive_mode, now, &mut report)
                    .await?;
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
#[path = "watch_tests.rs"]
mod tests;
