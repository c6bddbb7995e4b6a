// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reply-needed orchestration: `gather` and `respond`.

use super::Engine;
use crate::comm::require_comm_allowed;
use atwf_adapters::{Mux, WorkerCtl};
use atwf_core::time::{format_iso, parse_duration_secs};
use atwf_core::{Clock, RequestStatus, TargetStatus, TeamError};
use atwf_storage::{inbox, io, msg_seq, requests, Party, RequestMeta, RequestTarget, WriteMessage};

/// What `respond` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RespondOutcome {
    pub request_id: String,
    pub blocked: bool,
    pub blocked_until: String,
    /// Set when this respond call finalized the request (the result msg id).
    pub finalized_msg_id: Option<String>,
}

impl<M: Mux, W: WorkerCtl, C: Clock> Engine<M, W, C> {
    /// Open a reply-needed request against one or more targets.
    ///
    /// Every id (the request's and one notification per target) is
    /// allocated before the team lock is taken; the meta and all
    /// notifications are then written in a single critical section.
    /// Returns the request id.
    pub async fn gather(
        &self,
        as_target: Option<&str>,
        targets: &[String],
        topic: Option<&str>,
        message: &str,
        deadline: Option<&str>,
    ) -> Result<String, TeamError> {
        let reg = self.load_registry()?;
        let actor = self.resolve_actor(&reg, as_target).await?.clone();
        let now = self.now();

        if targets.is_empty() {
            return Err(TeamError::InvalidInput(
                "gather requires at least one target".into(),
            ));
        }
        let message = message.trim_end();
        if message.trim().is_empty() {
            return Err(TeamError::InvalidInput("empty message".into()));
        }
        let topic = match topic.map(str::trim).filter(|t| !t.is_empty()) {
            Some(t) => t.to_string(),
            None => {
                let s = inbox::summary_line(message);
                if s.is_empty() {
                    "reply-needed".to_string()
                } else {
                    s
                }
            }
        };

        let deadline_s = {
            let default = self.settings().reply_deadline_s;
            let raw = deadline.map(str::trim).unwrap_or("");
            let n = if raw.is_empty() {
                default
            } else {
                parse_duration_secs(raw, default)
            };
            n.clamp(60.0, 86400.0)
        };

        // Reserve ids up front (the counter takes the team lock itself).
        let req_seq = msg_seq::next_msg_id(self.team(), now)?;
        let request_id = format!("req-{}", req_seq);

        let mut resolved: Vec<(String, String, String)> = Vec::new();
        let mut seen_bases = std::collections::BTreeSet::new();
        for raw in targets {
            let m = atwf_storage::registry::require_member(&reg, raw)?;
            require_comm_allowed(self.policy(), &reg, &actor.full, &m.full, now)?;
            let base = m.base_name().to_string();
            if base == actor.base_name() || !seen_bases.insert(base.clone()) {
                continue;
            }
            resolved.push((m.full.clone(), base, m.role_name().to_string()));
        }
        if resolved.is_empty() {
            return Err(TeamError::InvalidInput(
                "gather has no valid targets after resolution/dedupe".into(),
            ));
        }

        let mut notify_ids = Vec::with_capacity(resolved.len());
        for _ in &resolved {
            notify_ids.push(msg_seq::next_msg_id(self.team(), now)?);
        }

        let created_at = format_iso(now);
        let deadline_at = format_iso(now + chrono::Duration::seconds(deadline_s as i64));

        let mut meta = RequestMeta {
            version: 1,
            id: request_id.clone(),
            created_at: created_at.clone(),
            updated_at: created_at.clone(),
            status: RequestStatus::Open,
            topic: topic.clone(),
            message: message.to_string(),
            deadline_s,
            deadline_at: deadline_at.clone(),
            from: Party {
                full: actor.full.clone(),
                base: actor.base_name().to_string(),
                role: actor.role_name().to_string(),
            },
            ..RequestMeta::default()
        };
        for ((full, base, role), notify_id) in resolved.iter().zip(&notify_ids) {
            meta.targets.insert(
                base.clone(),
                RequestTarget {
                    full: full.clone(),
                    base: base.clone(),
                    role: role.clone(),
                    status: TargetStatus::Pending,
                    requested_at: created_at.clone(),
                    notify_msg_id: notify_id.clone(),
                    ..RequestTarget::default()
                },
            );
        }

        {
            let _lock = self.team().lock_team()?;
            self.team().ensure_layout()?;
            std::fs::create_dir_all(requests::responses_dir(self.team(), &request_id))?;
            requests::save_meta_unlocked(self.team(), &mut meta, now)?;

            let actor_role = if actor.role_name().is_empty() {
                "?"
            } else {
                actor.role_name()
            };
            for ((full, base, role), notify_id) in resolved.iter().zip(&notify_ids) {
                let body = format!(
                    "[REPLY-NEEDED] request_id={request_id}\n\
                     - topic: {topic}\n\
                     - from: {from_base} (role={actor_role})\n\
                     - created_at: {created_at}\n\
                     - deadline_at: {deadline_at}\n\
                     \n\
                     Respond (required):\n\
                     - atwf respond {request_id} \"<your reply>\"\n\
                     \n\
                     If blocked, snooze reminders (default 15m):\n\
                     - atwf respond {request_id} --blocked --snooze 15m --waiting-on <base> \"why blocked\"\n\
                     \n\
                     View pending reply-needed:\n\
                     - atwf reply-needed\n\
                     \n\
                     Message:\n\
                     {message}\n",
                    from_base = actor.base_name(),
                );
                inbox::write_message_unlocked(
                    self.team(),
                    &WriteMessage {
                        msg_id: notify_id,
                        kind: "reply-needed",
                        from_full: &actor.full,
                        from_base: actor.base_name(),
                        from_role: actor.role_name(),
                        to_full: full,
                        to_base: base,
                        to_role: role,
                        body: &body,
                    },
                    now,
                )?;
                inbox::enforce_unread_limit_unlocked(
                    self.team(),
                    base,
                    actor.base_name(),
                    self.settings().max_unread_per_thread,
                )?;
            }
        }

        Ok(request_id)
    }

    /// Record a reply (or a blocked acknowledgement) for the acting worker.
    ///
    /// Finalization is attempted in the same critical section as the
    /// target mutation; the original notification is acked after the lock
    /// drops (mark_read takes its own lock).
    pub async fn respond(
        &self,
        as_target: Option<&str>,
        request_id: &str,
        message: &str,
        blocked: bool,
        snooze: Option<&str>,
        waiting_on: &str,
    ) -> Result<RespondOutcome, TeamError> {
        let reg = self.load_registry()?;
        let actor = self.resolve_actor(&reg, as_target).await?.clone();
        let now = self.now();

        let request_id = requests::resolve_request_id(self.team(), request_id)?;
        if !requests::meta_path(self.team(), &request_id).is_file() {
            return Err(TeamError::NotFound(format!(
                "request not found: {}",
                request_id
            )));
        }

        let message = message.trim_end();
        let snooze_s = {
            let default = self.settings().reply_blocked_snooze_s;
            let raw = snooze.map(str::trim).unwrap_or("");
            let n = if raw.is_empty() {
                default
            } else {
                parse_duration_secs(raw, default)
            };
            n.clamp(30.0, 86400.0)
        };

        // Peek at the meta to decide whether this response can finalize the
        // request. The counter takes the team lock on its own descriptor, so
        // the id must be reserved before entering the critical section; if a
        // concurrent writer changes the picture the id is simply unused and
        // the watcher sweep delivers on the next tick.
        let delivery_msg_id = {
            let meta = requests::load_meta(self.team(), &request_id)?;
            let mine = |t: &RequestTarget| t.base == actor.base_name() || t.full == actor.full;
            let would_complete = !blocked
                && !meta.targets.is_empty()
                && meta
                    .targets
                    .values()
                    .all(|t| t.status == TargetStatus::Replied || mine(t));
            let deadline_passed = atwf_core::time::parse_iso(&meta.deadline_at)
                .map(|d| now >= d)
                .unwrap_or(false);
            if !meta.is_finalized() && (would_complete || deadline_passed) {
                Some(msg_seq::next_msg_id(self.team(), now)?)
            } else {
                None
            }
        };

        let mut notify_msg_id = String::new();
        let mut blocked_until_out = String::new();
        let mut did_finalize = false;

        {
            let _lock = self.team().lock_team()?;
            let mut meta = requests::load_meta(self.team(), &request_id)?;
            // Once final_msg_id is set the meta is immutable, full stop.
            if meta.status.is_final() || meta.is_finalized() {
                return Err(TeamError::AlreadyFinalized(format!(
                    "{} ({})",
                    request_id, meta.status
                )));
            }
            if meta.targets.is_empty() {
                return Err(TeamError::InvalidInput(format!(
                    "request has no targets: {}",
                    request_id
                )));
            }

            let key = if meta.targets.contains_key(actor.base_name()) {
                actor.base_name().to_string()
            } else {
                meta.targets
                    .iter()
                    .find(|(_k, t)| t.full == actor.full)
                    .map(|(k, _t)| k.clone())
                    .ok_or_else(|| {
                        TeamError::PolicyDenied(format!(
                            "you are not a target of request {} (base={})",
                            request_id,
                            actor.base_name()
                        ))
                    })?
            };

            {
                let target = meta
                    .targets
                    .get_mut(&key)
                    .ok_or_else(|| TeamError::NotFound(format!("target missing: {}", key)))?;
                notify_msg_id = target.notify_msg_id.trim().to_string();

                if blocked {
                    let reason = if message.trim().is_empty() {
                        "(blocked)".to_string()
                    } else {
                        message.trim().to_string()
                    };
                    let blocked_until =
                        format_iso(now + chrono::Duration::seconds(snooze_s as i64));
                    blocked_until_out = blocked_until.clone();
                    target.status = TargetStatus::Blocked;
                    target.blocked_until = blocked_until;
                    target.blocked_reason = reason;
                    target.waiting_on = waiting_on.trim().to_string();
                    target.responded_at.clear();
                    target.response_file.clear();
                } else {
                    if message.trim().is_empty() {
                        return Err(TeamError::InvalidInput(
                            "reply body missing (provide as arg or via stdin)".into(),
                        ));
                    }
                    let resp_path =
                        requests::response_path(self.team(), &request_id, actor.base_name());
                    let actor_role = if actor.role_name().is_empty() {
                        "?"
                    } else {
                        actor.role_name()
                    };
                    let payload = format!(
                        "# ATWF Reply-Needed Response\n\n\
                         - request_id: `{request_id}`\n\
                         - from: `{full}` (base `{base}` role `{actor_role}`)\n\
                         - created_at: {created}\n\n\
                         ---\n\n\
                         {body}\n",
                        full = actor.full,
                        base = actor.base_name(),
                        created = format_iso(now),
                        body = message.trim_end(),
                    );
                    io::write_text_atomic(&resp_path, &payload)?;
                    let rel = resp_path
                        .strip_prefix(self.team().root())
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|_| resp_path.display().to_string());

                    target.status = TargetStatus::Replied;
                    target.responded_at = format_iso(now);
                    target.response_file = rel;
                    target.blocked_until.clear();
                    target.blocked_reason.clear();
                    target.waiting_on.clear();
                }
            }

            // Finalize in the same critical section when complete or late.
            // Without a pre-reserved delivery id (a concurrent mutation got
            // here first), leave finalization to the watcher sweep.
            if !meta.is_finalized() {
                if let Some(delivery_id) = &delivery_msg_id {
                    let all_replied = meta.all_replied();
                    let timed_out = atwf_core::time::parse_iso(&meta.deadline_at)
                        .map(|d| now >= d)
                        .unwrap_or(false)
                        && !all_replied;
                    if all_replied || timed_out {
                        let final_status = if all_replied {
                            RequestStatus::Done
                        } else {
                            RequestStatus::TimedOut
                        };
                        did_finalize = requests::finalize_in_place(
                            self.team(),
                            &reg,
                            &mut meta,
                            delivery_id,
                            final_status,
                            self.settings().max_unread_per_thread,
                            now,
                        )?;
                    }
                }
            }

            requests::save_meta_unlocked(self.team(), &mut meta, now)?;
        }

        // Ack the original reply-needed notice (its own lock).
        if !notify_msg_id.is_empty() {
            inbox::mark_read(self.team(), actor.base_name(), &notify_msg_id)?;
        }

        Ok(RespondOutcome {
            request_id,
            blocked,
            blocked_until: blocked_until_out,
            finalized_msg_id: if did_finalize { delivery_msg_id } else { None },
        })
    }

    /// Pending reply-needed rows for a base: (request_id, status, topic,
    /// from_base, deadline_at). Snoozed targets are annotated.
    pub fn reply_needed_rows(
        &self,
        to_base: &str,
    ) -> Result<Vec<(String, String, String, String, String)>, TeamError> {
        let now = self.now();
        let mut rows = Vec::new();
        for req_id in requests::list_request_ids(self.team()) {
            let Ok(meta) = requests::load_meta(self.team(), &req_id) else {
                continue;
            };
            if meta.status != RequestStatus::Open {
                continue;
            }
            let Some(target) = meta.targets.get(to_base) else {
                continue;
            };
            if target.status == TargetStatus::Replied {
                continue;
            }
            let mut status = target.status.as_str().to_string();
            if atwf_core::time::parse_iso(&target.blocked_until).is_some_and(|until| now < until) {
                status.push_str("(snoozed)");
            }
            rows.push((
                req_id,
                status,
                meta.topic.clone(),
                meta.from.base.clone(),
                meta.deadline_at.clone(),
            ));
        }
        rows.sort();
        Ok(rows)
    }
}

#[cfg(test)]
#[path = "gather_tests.rs"]
mod tests;
