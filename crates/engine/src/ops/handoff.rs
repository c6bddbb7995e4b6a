// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Handoff permits: grant two bases direct comm.

use super::Engine;
use crate::comm::{add_handoff_permit, permit_allows};
use atwf_adapters::{Mux, WorkerCtl};
use atwf_core::time::format_iso;
use atwf_core::{envelope, Clock, TeamError};
use atwf_storage::{inbox, msg_seq, registry, WriteMessage};

/// Result of a handoff operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandoffOutcome {
    /// New permit id, or `None` when an equivalent permit already existed.
    pub permit_id: Option<String>,
    pub a_full: String,
    pub b_full: String,
    pub existed: bool,
}

impl<M: Mux, W: WorkerCtl, C: Clock> Engine<M, W, C> {
    /// Create a handoff permit between `a` and `b` and notify both sides.
    ///
    /// Only `comm_handoff_creators` roles may do this. With `dry_run`,
    /// report whether a permit already exists without writing anything.
    #[allow(clippy::too_many_arguments)]
    pub async fn handoff(
        &self,
        as_target: Option<&str>,
        a: &str,
        b: &str,
        ttl_seconds: Option<i64>,
        reason: &str,
        notify: bool,
        dry_run: bool,
    ) -> Result<HandoffOutcome, TeamError> {
        let now = self.now();
        let mut permit_id = None;
        let existed;
        let (actor, a_m, b_m);

        {
            let _lock = self.team().lock_team()?;
            let mut reg = registry::load(self.team(), now)?;
            actor = self.resolve_actor(&reg, as_target).await?.clone();
            if !self
                .policy()
                .comm_handoff_creators
                .contains(actor.role_name())
            {
                let allowed: Vec<&str> = self
                    .policy()
                    .comm_handoff_creators
                    .iter()
                    .map(String::as_str)
                    .collect();
                return Err(TeamError::PolicyDenied(format!(
                    "handoff not permitted by policy.\n   actor: {} (role={})\n   allowed_roles: {}",
                    actor.full,
                    if actor.role_name().is_empty() { "?" } else { actor.role_name() },
                    if allowed.is_empty() { "(none)".to_string() } else { allowed.join(", ") }
                )));
            }

            a_m = registry::require_member(&reg, a)?.clone();
            b_m = registry::require_member(&reg, b)?.clone();

            existed = permit_allows(&reg, a_m.base_name(), b_m.base_name(), now);
            if !existed && !dry_run {
                let permit = add_handoff_permit(
                    &mut reg,
                    a_m.base_name(),
                    b_m.base_name(),
                    &actor.full,
                    actor.role_name(),
                    reason,
                    ttl_seconds,
                    now,
                    std::process::id(),
                )?;
                permit_id = Some(permit.id);
                registry::save_unlocked(self.team(), &mut reg, now)?;
            }
        }

        if dry_run {
            return Ok(HandoffOutcome {
                permit_id: None,
                a_full: a_m.full,
                b_full: b_m.full,
                existed,
            });
        }

        // Tell both sides they may talk directly now.
        let reason_line = if reason.trim().is_empty() {
            String::new()
        } else {
            format!("reason: {}\n", reason.trim())
        };
        let actor_role = if actor.role_name().is_empty() {
            "?"
        } else {
            actor.role_name()
        };
        let msg_a = format!(
            "[HANDOFF]\ncreator: {} (role={})\npeer: {} ({})\n{}You are permitted to talk directly. Use:\n- atwf send {} \"...\"  # inbox-only by default; peer must poll inbox while working\n",
            actor.full, actor_role, b_m.base_name(), b_m.full, reason_line, b_m.base_name(),
        );
        let msg_b = format!(
            "[HANDOFF]\ncreator: {} (role={})\npeer: {} ({})\n{}Please reply directly to the requester (avoid relaying via {}).\nUse:\n- atwf send {} \"...\"  # inbox-only by default; peer must poll inbox while working\n",
            actor.full,
            actor_role,
            a_m.base_name(),
            a_m.full,
            reason_line,
            self.policy().root_role,
            a_m.base_name(),
        );

        let handoff_id = msg_seq::next_msg_id(self.team(), now)?;
        for (target, body) in [(&a_m, msg_a), (&b_m, msg_b)] {
            inbox::write_message(
                self.team(),
                &WriteMessage {
                    msg_id: &handoff_id,
                    kind: "handoff",
                    from_full: &actor.full,
                    from_base: actor.base_name(),
                    from_role: actor_role,
                    to_full: &target.full,
                    to_base: target.base_name(),
                    to_role: target.role_name(),
                    body: &body,
                },
                self.settings().max_unread_per_thread,
                now,
            )?;
        }

        if notify {
            let notice = envelope::inbox_notice(&handoff_id);
            let ts = format_iso(now);
            for target in [&a_m, &b_m] {
                let wrapped = envelope::wrap_team_message(
                    &handoff_id,
                    "handoff",
                    &actor.full,
                    Some(actor_role),
                    &target.full,
                    &ts,
                    &notice,
                );
                if let Err(err) = self.ctl().send(&target.full, &wrapped).await {
                    tracing::warn!(target = %target.full, error = %err, "handoff notify failed");
                }
            }
        }

        Ok(HandoffOutcome {
            permit_id,
            a_full: a_m.full,
            b_full: b_m.full,
            existed,
        })
    }
}

#[cfg(test)]
#[path = "handoff_tests.rs"]
mod tests;
