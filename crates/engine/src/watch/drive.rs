// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The anti-stall controller: reply-drive, subtree drive, whole-team drive.
//!
//! Reply-drive runs first and sets an in-memory suppression flag for the
//! tick; checking that flag before the other branches is what prevents
//! double-drive spam. Subtree drive only scans subtrees with at least one
//! live session, so parked chains do not re-trigger forever.

use super::{MemberSnapshot, TickReport, Watcher};
use atwf_adapters::{Mux, WorkerCtl};
use atwf_core::time::{format_iso, parse_iso, secs_between};
use atwf_core::{envelope, AgentStatus, Clock, DriveMode, Registry, SubtreeStatus, TeamError};
use atwf_storage::{agent_state, drive_state, inbox, msg_seq, org, requests, WriteMessage};
use chrono::NaiveDateTime;
use std::collections::BTreeMap;

/// Sender identity for drive inbox messages.
const DRIVE_SENDER: &str = "atwf-drive";

/// The worker a drive nudge goes to.
#[derive(Debug, Clone)]
pub(super) struct DriveTarget {
    pub full: String,
    pub base: String,
    pub role: String,
}

/// One stalled subtree, for the drive message body.
struct StalledSubtree {
    root_full: String,
    root_base: String,
    member_count: usize,
    alive_count: usize,
    missing: Vec<String>,
}

fn drive_body(now_iso: &str, subtree_section: Option<&str>) -> String {
    let mut body = format!(
        "[DRIVE] team stalled: ALL IDLE + INBOX EMPTY\n\
         - detected_at: {now_iso}\n\
         - meaning: no one is driving work. This is an ABNORMAL STALL.\n\
         \n\
         1) Diagnose now:\n\
         - atwf state\n\
         - atwf list\n\
         - atwf inbox (your own inbox)\n\
         \n\
         Summarize why the team reached \"all idle + inbox empty\", find the root cause, then re-drive the team back to work.\n"
    );
    if let Some(section) = subtree_section {
        body.push('\n');
        body.push_str(section);
    }
    body
}

fn drive_summary(msg_id: &str) -> String {
    format!(
        "[DRIVE] team stalled: ALL IDLE + INBOX EMPTY\n\
         inbox id={msg_id} (open: atwf inbox-open {msg_id})\n\
         Action: diagnose root cause, then re-drive the team back to work.\n"
    )
}

impl<M: Mux, W: WorkerCtl, C: Clock> Watcher<M, W, C> {
    /// Primary driver, or the backup when the driver's session is dead.
    /// `None` when no member carries the driver role.
    pub(super) async fn resolve_drive_target(&self, reg: &Registry) -> Option<DriveTarget> {
        let driver_role = self.settings().drive_driver_role.clone();
        let driver = reg.resolve_latest_by_role(&driver_role)?;
        let mut target = DriveTarget {
            full: driver.full.clone(),
            base: driver.base_name().to_string(),
            role: driver_role,
        };
        if !self.mux().alive(&target.full).await.unwrap_or(false) {
            let backup_role = self.settings().drive_backup_role.clone();
            if let Some(backup) = reg.resolve_latest_by_role(&backup_role) {
                if self.mux().alive(&backup.full).await.unwrap_or(false) {
                    target = DriveTarget {
                        full: backup.full.clone(),
                        base: backup.base_name().to_string(),
                        role: backup_role,
                    };
                }
            }
        }
        Some(target)
    }

    /// Reply-drive: the team is quiet but reply-needed requests are open.
    ///
    /// Returns true when drive must be suppressed for this tick — either a
    /// debtor was (or recently was) woken, or every pending target is
    /// snoozed.
    pub(super) async fn reply_drive(
        &self,
        reg: &Registry,
        now: NaiveDateTime,
        report: &mut TickReport,
    ) -> Result<bool, TeamError> {
        let scan = requests::scan_requests(self.team(), now);
        if !scan.has_pending {
            return Ok(false);
        }
        if scan.due.is_empty() {
            // Everyone snoozed: effective standby, no drive either.
            return Ok(true);
        }

        // (priority, request_id, base, full), priority = waiting-on count.
        let mut runnable: Vec<(usize, String, String, String)> = Vec::new();
        for due in &scan.due {
            let Some(m) = reg.resolve(&due.base) else { continue };
            if self.mux().alive(&m.full).await.unwrap_or(false) {
                let prio = scan.waiters.get(&due.base).copied().unwrap_or(0);
                runnable.push((prio, due.request_id.clone(), due.base.clone(), m.full.clone()));
            }
        }
        if runnable.is_empty() {
            // Due replies exist but no reachable debtor; let drive handle it.
            return Ok(false);
        }

        let reply_state = {
            let _lock = self.team().lock_state()?;
            drive_state::load_reply_unlocked(self.team(), now)?
        };
        let cooled = match parse_iso(&reply_state.last_triggered_at) {
            Some(last) => secs_between(last, now) >= self.settings().drive_cooldown_s.max(0.0),
            None => true,
        };
        if !cooled {
            return Ok(true);
        }

        runnable.sort_by(|a, b| {
            b.0.cmp(&a.0)
                .then_with(|| a.1.cmp(&b.1))
                .then_with(|| a.2.cmp(&b.2))
        });
        let (_prio, request_id, base, full) = runnable[0].clone();
        let role = reg
            .resolve(&full)
            .map(|m| m.role_name().to_string())
            .unwrap_or_default();

        agent_state::update(self.team(), &full, &base, &role, now, |r| {
            r.status = AgentStatus::Working;
            r.status_source = "watch".into();
            r.wakeup_sent_at = format_iso(now);
            r.wakeup_reason = format!("reply-needed:{}", request_id);
            r.idle_since.clear();
            r.idle_inbox_empty_at.clear();
            Ok(())
        })?;
        self.ctl()
            .send(&full, &self.settings().reply_wake_message)
            .await?;
        drive_state::update_reply(self.team(), now, |s| {
            s.last_triggered_at = format_iso(now);
            s.last_reason = "all_idle_inbox_empty_reply_pending".into();
            s.last_request_id = request_id.clone();
            s.last_target_base = base.clone();
            s.last_target_full = full.clone();
        })?;
        report.reply_drive_target = Some(full);
        Ok(true)
    }

    /// Per-subtree drive: nudge the driver about every stalled unit.
    pub(super) async fn subtree_drive(
        &self,
        reg: &Registry,
        snapshots: &[MemberSnapshot],
        target: &DriveTarget,
        drive_mode: DriveMode,
        now: NaiveDateTime,
        report: &mut TickReport,
    ) -> Result<(), TeamError> {
        let unit_role = self.settings().drive_unit_role.clone();
        let roots = org::members_by_role(reg, &unit_role);
        if roots.is_empty() {
            return Ok(());
        }

        let status_by_full: BTreeMap<&str, &MemberSnapshot> =
            snapshots.iter().map(|s| (s.full.as_str(), s)).collect();

        let subtree_state = {
            let _lock = self.team().lock_state()?;
            drive_state::load_subtree_unlocked(self.team(), drive_mode, now)?
        };

        let mut stalled: Vec<StalledSubtree> = Vec::new();
        for root_full in roots {
            let root_base = reg
                .resolve(&root_full)
                .map(|m| m.base_name().to_string())
                .unwrap_or_else(|| root_full.clone());
            let entry = subtree_state.subtrees.get(&root_base);
            if entry.is_some_and(|e| e.status == SubtreeStatus::Stopped) {
                continue;
            }

            let members = org::subtree_fulls(reg, &root_full);
            if members.is_empty() {
                continue;
            }

            let mut sub_all_idle = true;
            let mut sub_any_pending = false;
            let mut alive_count = 0;
            let mut missing: Vec<String> = Vec::new();
            for full in &members {
                match status_by_full.get(full.as_str()) {
                    Some(snap) => {
                        if snap.status != AgentStatus::Idle {
                            sub_all_idle = false;
                        }
                        if snap.pending > 0 {
                            sub_any_pending = true;
                        }
                        if snap.alive {
                            alive_count += 1;
                        } else {
                            missing.push(full.clone());
                        }
                    }
                    None => missing.push(full.clone()),
                }
            }
            // Only scan active subtrees: a parked chain with no running
            // session must not re-trigger drive forever.
            if alive_count == 0 {
                continue;
            }
            if !sub_all_idle || sub_any_pending {
                continue;
            }
            let cooled = match entry.and_then(|e| parse_iso(&e.last_triggered_at)) {
                Some(last) => secs_between(last, now) >= self.settings().drive_cooldown_s.max(0.0),
                None => true,
            };
            if !cooled {
                continue;
            }
            stalled.push(StalledSubtree {
                root_full,
                root_base,
                member_count: members.len(),
                alive_count,
                missing,
            });
        }

        if stalled.is_empty() {
            return Ok(());
        }

        let fmt_missing = |fulls: &[String]| -> String {
            let mut parts: Vec<String> = fulls
                .iter()
                .take(6)
                .map(|full| {
                    let (base, role) = reg
                        .resolve(full)
                        .map(|m| (m.base_name().to_string(), m.role_name().to_string()))
                        .unwrap_or_else(|| (full.clone(), String::new()));
                    let role = if role.is_empty() { "?".to_string() } else { role };
                    format!("{}({})", base, role)
                })
                .collect();
            if fulls.len() > 6 {
                parts.push("...".to_string());
            }
            parts.join(", ")
        };

        let mut lines: Vec<String> = Vec::new();
        for s in &stalled {
            let tail = if s.missing.is_empty() {
                String::new()
            } else {
                format!(" missing=[{}]", fmt_missing(&s.missing))
            };
            lines.push(format!(
                "- {}: root={} members={} tmux_running={} tmux_missing={}{}",
                s.root_base,
                s.root_full,
                s.member_count,
                s.alive_count,
                s.missing.len(),
                tail
            ));
        }
        let bases: Vec<&str> = stalled.iter().map(|s| s.root_base.as_str()).collect();
        let bases_short = if bases.len() > 5 {
            format!("{}, ...", bases[..5].join(", "))
        } else {
            bases.join(", ")
        };
        let section = format!(
            "Stalled subtrees (unit_role={}): {}\n{}\n",
            unit_role,
            bases_short,
            lines.join("\n")
        );

        let now_iso = format_iso(now);
        let msg_id = msg_seq::next_msg_id(self.team(), now)?;
        let body = drive_body(&now_iso, Some(&section));
        self.deliver_drive(target, &msg_id, &body, now).await?;

        drive_state::update_subtree(self.team(), drive_mode, now, |state| {
            for s in &stalled {
                let entry = state.entry(&s.root_base);
                entry.last_triggered_at = now_iso.clone();
                entry.last_msg_id = msg_id.clone();
                entry.last_reason = "subtree_all_idle_inbox_empty".into();
            }
        })?;
        report.drive_msg_id = Some(msg_id);
        Ok(())
    }

    /// Legacy whole-team drive; only runs when `unit_role` is empty.
    pub(super) async fn team_drive(
        &self,
        _reg: &Registry,
        target: &DriveTarget,
        drive_mode: DriveMode,
        now: NaiveDateTime,
        report: &mut TickReport,
    ) -> Result<(), TeamError> {
        let drive = {
            let _lock = self.team().lock_state()?;
            drive_state::load_drive_unlocked(self.team(), drive_mode, now)?
        };
        let cooled = match parse_iso(&drive.last_triggered_at) {
            Some(last) => secs_between(last, now) >= self.settings().drive_cooldown_s.max(0.0),
            None => true,
        };
        if !cooled {
            return Ok(());
        }

        let now_iso = format_iso(now);
        let msg_id = msg_seq::next_msg_id(self.team(), now)?;
        let body = drive_body(&now_iso, None);
        self.deliver_drive(target, &msg_id, &body, now).await?;

        drive_state::update_drive(self.team(), drive_mode, now, |state| {
            state.last_triggered_at = now_iso.clone();
            state.last_msg_id = msg_id.clone();
            state.last_reason = "all_idle_inbox_empty".into();
            state.last_driver_full = target.full.clone();
        })?;
        report.drive_msg_id = Some(msg_id);
        Ok(())
    }

    /// One drive inbox message + the injected short summary.
    async fn deliver_drive(
        &self,
        target: &DriveTarget,
        msg_id: &str,
        body: &str,
        now: NaiveDateTime,
    ) -> Result<(), TeamError> {
        inbox::write_message(
            self.team(),
            &WriteMessage {
                msg_id,
                kind: "drive",
                from_full: DRIVE_SENDER,
                from_base: DRIVE_SENDER,
                from_role: "system",
                to_full: &target.full,
                to_base: &target.base,
                to_role: &target.role,
                body,
            },
            self.settings().max_unread_per_thread,
            now,
        )?;
        let wrapped = envelope::wrap_team_message(
            msg_id,
            "drive",
            DRIVE_SENDER,
            Some("system"),
            &target.full,
            &format_iso(now),
            &drive_summary(msg_id),
        );
        if let Err(err) = self.ctl().send(&target.full, &wrapped).await {
            tracing::warn!(target = %target.full, error = %err, "drive injection failed");
        }
        Ok(())
    }
}
