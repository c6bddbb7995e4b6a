// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-member observation: pane sampling, state derivation, auto-enter
//! recovery, wake scheduling, and the stale-inbox alert.

use super::{MemberSnapshot, TickReport, Watcher};
use atwf_adapters::{Mux, WorkerCtl};
use atwf_core::time::{format_iso, parse_iso, secs_between};
use atwf_core::{envelope, slug, AgentStatus, Clock, Member, TeamError};
use atwf_storage::{agent_state, inbox, msg_seq, WriteMessage};
use chrono::NaiveDateTime;

impl<M: Mux, W: WorkerCtl, C: Clock> Watcher<M, W, C> {
    /// Sample one member, update its state record, and run the stale-alert
    /// and wake branches. Returns the tick snapshot.
    pub(super) async fn observe_member(
        &self,
        member: &Member,
        coord: Option<&Member>,
        now: NaiveDateTime,
        report: &mut TickReport,
    ) -> Result<MemberSnapshot, TeamError> {
        let full = member.full.as_str();
        let base = member.base_name().to_string();
        let role = member.role_name().to_string();

        let prev = match agent_state::read(self.team(), full)? {
            Some(record) => record,
            None => agent_state::update(self.team(), full, &base, &role, now, |_r| Ok(()))?,
        };
        let prev_status = prev.status;

        let (unread, overflow, _ids) = inbox::unread_stats(self.team(), &base);
        let pending = unread + overflow;

        let alive = self.mux().alive(full).await.unwrap_or(false);

        // Pane sampling: hash the CRLF-normalized tail and track changes.
        let mut captured: Option<String> = None;
        let mut changed_at = parse_iso(&prev.last_output_change_at);
        let mut auto_enter: Option<(String, bool)> = None;
        if alive {
            if let Ok(Some(tail)) = self
                .mux()
                .capture_tail(full, self.settings().capture_lines)
                .await
            {
                let digest = slug::text_digest(&tail);
                if digest != prev.last_output_hash || changed_at.is_none() {
                    changed_at = Some(now);
                }
                captured = Some(digest);

                auto_enter = self.try_auto_enter(full, &prev, &tail, now).await;
            }
        }

        // Working while output moves, or within the grace window of a wake.
        let wake_sent = parse_iso(&prev.wakeup_sent_at);
        let mut active = changed_at
            .is_some_and(|t| secs_between(t, now) <= self.settings().activity_window_s.max(0.0));
        if !active && self.settings().active_grace_period_s > 0.0 {
            active = wake_sent.is_some_and(|t| {
                secs_between(t, now) <= self.settings().active_grace_period_s
            });
        }
        let status = if active {
            AgentStatus::Working
        } else {
            AgentStatus::Idle
        };

        let record = if self.dry_run() {
            prev.clone()
        } else {
            agent_state::update(self.team(), full, &base, &role, now, |r| {
                if let Some(digest) = &captured {
                    r.last_output_hash = digest.clone();
                    r.last_output_capture_at = format_iso(now);
                    if let Some(changed) = changed_at {
                        r.last_output_change_at = format_iso(changed);
                    }
                }
                if let Some((reason, sent)) = &auto_enter {
                    r.auto_enter_last_sent_at = format_iso(now);
                    r.auto_enter_last_reason = reason.clone();
                    if *sent {
                        r.auto_enter_count += 1;
                    }
                }
                r.status = status;
                r.status_source = "watch".into();
                r.last_inbox_unread = unread as u32;
                r.last_inbox_overflow = overflow as u32;
                if status == AgentStatus::Idle {
                    if prev_status != AgentStatus::Idle {
                        r.idle_since = format_iso(now);
                    }
                    r.idle_inbox_empty_at = if pending == 0 {
                        format_iso(now)
                    } else {
                        String::new()
                    };
                } else {
                    r.idle_since.clear();
                    r.idle_inbox_empty_at.clear();
                    r.clear_wake_schedule();
                }
                Ok(())
            })?
        };

        let snapshot = MemberSnapshot {
            full: full.to_string(),
            base: base.clone(),
            role: role.clone(),
            status,
            pending,
            alive,
        };

        if status == AgentStatus::Working {
            self.maybe_stale_alert(member, coord, &record, unread, overflow, wake_sent, now, report)
                .await?;
        } else {
            self.schedule_or_fire_wake(member, &record, now, report)
                .await?;
        }

        Ok(snapshot)
    }

    /// Recovery from known UI prompts: one Enter keystroke, rate-limited
    /// per worker. A cooldown of 0 disables the rate limit.
    async fn try_auto_enter(
        &self,
        full: &str,
        prev: &agent_state::AgentStateRecord,
        tail: &str,
        now: NaiveDateTime,
    ) -> Option<(String, bool)> {
        if self.dry_run()
            || !self.settings().auto_enter_enabled
            || self.settings().auto_enter_patterns.is_empty()
        {
            return None;
        }
        let lines: Vec<&str> = tail.lines().collect();
        let window_start = lines
            .len()
            .saturating_sub(self.settings().auto_enter_tail_lines.max(1));
        let window = lines[window_start..].join("\n");
        let matched = self
            .settings()
            .auto_enter_patterns
            .iter()
            .find(|p| window.contains(p.as_str()))?
            .clone();

        let cooled = match parse_iso(&prev.auto_enter_last_sent_at) {
            Some(last) => secs_between(last, now) >= self.settings().auto_enter_cooldown_s.max(0.0),
            None => true,
        };
        if !cooled {
            return None;
        }
        let sent = self.mux().press_enter(full).await.is_ok();
        Some((matched, sent))
    }

    /// Working + old pending inbox: alert the root-role worker, with a
    /// cooldown and a grace window after wakes.
    #[allow(clippy::too_many_arguments)]
    async fn maybe_stale_alert(
        &self,
        member: &Member,
        coord: Option<&Member>,
        record: &agent_state::AgentStateRecord,
        unread: usize,
        overflow: usize,
        wake_sent: Option<NaiveDateTime>,
        now: NaiveDateTime,
        report: &mut TickReport,
    ) -> Result<(), TeamError> {
        let Some(coord) = coord else { return Ok(()) };
        if self.dry_run() || member.full == coord.full {
            return Ok(());
        }
        let pending = unread + overflow;
        if pending == 0 || self.working_stale_threshold() <= 0.0 {
            return Ok(());
        }
        let Some((_min_n, min_id)) = inbox::pending_min_id(self.team(), member.base_name()) else {
            return Ok(());
        };
        let Some(created) = inbox::message_created_at(self.team(), member.base_name(), &min_id)
        else {
            return Ok(());
        };

        let age_s = secs_between(created, now);
        let mut should_alert = age_s >= self.working_stale_threshold().max(1.0);
        // A freshly-woken worker gets the grace window before any alert.
        if should_alert && self.settings().active_grace_period_s > 0.0 {
            if let Some(wake) = wake_sent {
                if secs_between(wake, now) < self.settings().active_grace_period_s.max(1.0) {
                    should_alert = false;
                }
            }
        }
        if should_alert {
            if let Some(checked) = parse_iso(&record.last_inbox_check_at) {
                should_alert = secs_between(checked, now) >= self.working_stale_threshold().max(1.0);
            }
        }
        if should_alert {
            if let Some(last_alert) = parse_iso(&record.stale_alert_sent_at) {
                should_alert = secs_between(last_alert, now) >= self.alert_cooldown().max(1.0);
            }
        }
        if !should_alert {
            return Ok(());
        }

        let base = member.base_name();
        let role = if member.role_name().is_empty() {
            "?"
        } else {
            member.role_name()
        };
        let msg_id = msg_seq::next_msg_id(self.team(), now)?;
        let body = format!(
            "[ALERT] stale inbox while working\n\
             - worker: {full} (role={role}, base={base})\n\
             - status: working\n\
             - pending: unread={unread} overflow={overflow}\n\
             - oldest_id: {min_id} age_s={age}\n\
             - last_inbox_check_at: {checked}\n\
             Suggested action:\n\
             - Ask the worker to run: atwf inbox\n\
             - If they are stuck, re-scope or pause/unpause that worker.\n",
            full = member.full,
            age = age_s as i64,
            checked = if record.last_inbox_check_at.is_empty() {
                "(never)"
            } else {
                record.last_inbox_check_at.as_str()
            },
        );
        inbox::write_message(
            self.team(),
            &WriteMessage {
                msg_id: &msg_id,
                kind: "alert-stale-inbox",
                from_full: "atwf-watch",
                from_base: "atwf-watch",
                from_role: "system",
                to_full: &coord.full,
                to_base: coord.base_name(),
                to_role: coord.role_name(),
                body: &body,
            },
            self.settings().max_unread_per_thread,
            now,
        )?;

        // Short notice into the coordinator's CLI so governance alerts land
        // even when coord is not polling its inbox.
        let short = format!(
            "[ALERT] stale inbox while working\nworker={base} role={role} pending={unread}+{overflow} oldest={min_id} age_s={age}\ninbox id={msg_id} (run: atwf inbox-open {msg_id} --target {coord_base})\n",
            age = age_s as i64,
            coord_base = coord.base_name(),
        );
        let wrapped = envelope::wrap_team_message(
            &msg_id,
            "alert-stale-inbox",
            "atwf-watch",
            Some("system"),
            &coord.full,
            &format_iso(now),
            &short,
        );
        if let Err(err) = self.ctl().send(&coord.full, &wrapped).await {
            tracing::warn!(target = %coord.full, error = %err, "stale alert injection failed");
        }

        agent_state::update(
            self.team(),
            &member.full,
            base,
            member.role_name(),
            now,
            |r| {
                r.stale_alert_sent_at = format_iso(now);
                r.stale_alert_msg_id = msg_id.clone();
                r.stale_alert_reason = format!(
                    "pending:{}+{} oldest:{} age_s:{}",
                    unread, overflow, min_id, age_s as i64
                );
                Ok(())
            },
        )?;
        report.stale_alerts.push(member.full.clone());
        Ok(())
    }

    /// Idle-member wake scheduling and firing.
    async fn schedule_or_fire_wake(
        &self,
        member: &Member,
        record: &agent_state::AgentStateRecord,
        now: NaiveDateTime,
        report: &mut TickReport,
    ) -> Result<(), TeamError> {
        let full = member.full.as_str();
        let base = member.base_name().to_string();
        let role = member.role_name().to_string();

        let (unread, overflow, _ids) = inbox::unread_stats(self.team(), &base);
        let pending = unread + overflow;
        if pending == 0 {
            if !record.wakeup_due_at.is_empty()
                || !record.wakeup_scheduled_at.is_empty()
                || !record.wakeup_reason.is_empty()
            {
                if !self.dry_run() {
                    agent_state::update(self.team(), full, &base, &role, now, |r| {
                        r.clear_wake_schedule();
                        Ok(())
                    })?;
                }
            }
            return Ok(());
        }

        let due = parse_iso(&record.wakeup_due_at);
        let Some(due) = due else {
            if !self.dry_run() {
                let due_at = now + chrono::Duration::seconds(self.idle_wake_delay().max(1.0) as i64);
                agent_state::update(self.team(), full, &base, &role, now, |r| {
                    r.wakeup_scheduled_at = format_iso(now);
                    r.wakeup_due_at = format_iso(due_at);
                    r.wakeup_reason = format!("inbox_pending:{}+{}", unread, overflow);
                    Ok(())
                })?;
            }
            return Ok(());
        };
        if now < due {
            return Ok(());
        }

        // Due: re-check state + inbox + session before sending.
        let current = agent_state::read(self.team(), full)?.unwrap_or_else(|| record.clone());
        if current.status != AgentStatus::Idle {
            return Ok(());
        }
        let (unread2, overflow2, _ids2) = inbox::unread_stats(self.team(), &base);
        if unread2 + overflow2 == 0 {
            return Ok(());
        }
        if !self.mux().alive(full).await.unwrap_or(false) {
            // Keep the due time; retry next tick.
            return Ok(());
        }

        if !self.dry_run() {
            agent_state::update(self.team(), full, &base, &role, now, |r| {
                // Optimistically working: the grace period suppresses an
                // immediate re-wake while the worker spins up.
                r.status = AgentStatus::Working;
                r.status_source = "watch".into();
                r.wakeup_sent_at = format_iso(now);
                r.clear_wake_schedule();
                r.wakeup_reason = format!("inbox_pending:{}+{}", unread2, overflow2);
                r.idle_since.clear();
                r.idle_inbox_empty_at.clear();
                r.last_inbox_unread = unread2 as u32;
                r.last_inbox_overflow = overflow2 as u32;
                Ok(())
            })?;
            // Minimal wake: no envelope, just the reminder to read inbox.
            self.ctl().send(full, self.wake_message()).await?;
            report.woke.push(full.to_string());
        }
        Ok(())
    }
}
