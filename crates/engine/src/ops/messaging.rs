// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Point-to-point sends, intent deliveries, and read receipts.

use super::Engine;
use crate::comm::require_comm_allowed;
use atwf_adapters::{Mux, WorkerCtl};
use atwf_core::time::format_iso;
use atwf_core::{envelope, Clock, Registry, TeamError};
use atwf_storage::{inbox, msg_seq, org, registry, WriteMessage};

/// Intent kinds for inbox-backed deliveries.
///
/// `Notice` is FYI (recipients must not ACK upward; receipts confirm the
/// read). `Action` is an instruction; recipients report up when done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentKind {
    Notice,
    Action,
}

impl IntentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentKind::Notice => "notice",
            IntentKind::Action => "action",
        }
    }
}

/// How a multi-recipient operation picks its targets.
#[derive(Debug, Clone, Default)]
pub struct TargetSelection {
    pub targets: Vec<String>,
    pub role: Option<String>,
    pub subtree: Option<String>,
}

/// One row of a receipts query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptRow {
    /// `unread`, `overflow`, `read`, or `missing`.
    pub status: String,
    pub role: String,
    pub base: String,
    pub full: String,
}

/// Bound for parallel notify injection.
const NOTIFY_FANOUT: usize = 16;

impl<M: Mux, W: WorkerCtl, C: Clock> Engine<M, W, C> {
    /// Comm-gated point-to-point send (kind `send`).
    ///
    /// Workers inside their own sessions must use `notice`/`action`
    /// instead; legacy `send` stays an operator door.
    pub async fn send(
        &self,
        as_target: Option<&str>,
        target: &str,
        message: &str,
        notify: bool,
    ) -> Result<String, TeamError> {
        let reg = self.load_registry()?;
        // Workers never get the legacy door, not even with --as.
        if self.inside_worker_session(&reg).await {
            return Err(TeamError::PolicyDenied(
                "use `atwf notice <target>` or `atwf action <target>` (legacy `send` is disabled for team members)".into(),
            ));
        }
        let actor = self.resolve_actor(&reg, as_target).await?.clone();
        let target_m = registry::require_member(&reg, target)?.clone();
        let now = self.now();
        require_comm_allowed(self.policy(), &reg, &actor.full, &target_m.full, now)?;

        let message = message.trim();
        if message.is_empty() {
            return Err(TeamError::InvalidInput("empty message".into()));
        }

        let msg_id = msg_seq::next_msg_id(self.team(), now)?;
        inbox::write_message(
            self.team(),
            &WriteMessage {
                msg_id: &msg_id,
                kind: "send",
                from_full: &actor.full,
                from_base: actor.base_name(),
                from_role: actor.role_name(),
                to_full: &target_m.full,
                to_base: target_m.base_name(),
                to_role: target_m.role_name(),
                body: message,
            },
            self.settings().max_unread_per_thread,
            now,
        )?;

        if notify {
            let wrapped = envelope::wrap_team_message(
                &msg_id,
                "send",
                &actor.full,
                Some(actor.role_name()).filter(|r| !r.is_empty()),
                &target_m.full,
                &format_iso(now),
                &envelope::inbox_notice(&msg_id),
            );
            self.ctl().send(&target_m.full, &wrapped).await?;
        }
        Ok(msg_id)
    }

    /// Deliver a `notice`/`action` to one or many recipients.
    ///
    /// A single explicit target is a direct delivery (comm gate applies);
    /// role/subtree selections and multi-target lists are broadcast-style
    /// (broadcast policy applies, excluded roles filtered for subtrees).
    pub async fn intent(
        &self,
        as_target: Option<&str>,
        kind: IntentKind,
        selection: &TargetSelection,
        message: &str,
        notify: bool,
        include_excluded: bool,
    ) -> Result<String, TeamError> {
        let reg = self.load_registry()?;
        let actor = self.resolve_actor(&reg, as_target).await?.clone();
        let now = self.now();

        let message = message.trim();
        if message.is_empty() {
            return Err(TeamError::InvalidInput("empty message".into()));
        }

        let (targets, is_broadcast) =
            self.resolve_intent_targets(&reg, &actor.full, selection, include_excluded)?;
        if targets.is_empty() {
            return Err(TeamError::NotFound("no targets matched".into()));
        }

        if is_broadcast {
            if !self
                .policy()
                .broadcast_allowed_roles
                .contains(actor.role_name())
            {
                let allowed: Vec<&str> = self
                    .policy()
                    .broadcast_allowed_roles
                    .iter()
                    .map(String::as_str)
                    .collect();
                return Err(TeamError::PolicyDenied(format!(
                    "broadcast not permitted by policy.\n   actor: {} (role={})\n   allowed_roles: {}",
                    actor.full,
                    if actor.role_name().is_empty() { "?" } else { actor.role_name() },
                    if allowed.is_empty() { "(none)".to_string() } else { allowed.join(", ") }
                )));
            }
        } else {
            require_comm_allowed(self.policy(), &reg, &actor.full, &targets[0], now)?;
        }

        // One id shared by every recipient copy of this delivery.
        let msg_id = msg_seq::next_msg_id(self.team(), now)?;

        {
            let _lock = self.team().lock_team()?;
            self.team().ensure_layout()?;
            for full in &targets {
                let m = reg.resolve(full).cloned().unwrap_or_default_member(full);
                inbox::write_message_unlocked(
                    self.team(),
                    &WriteMessage {
                        msg_id: &msg_id,
                        kind: kind.as_str(),
                        from_full: &actor.full,
                        from_base: actor.base_name(),
                        from_role: actor.role_name(),
                        to_full: full,
                        to_base: m.base_name(),
                        to_role: m.role_name(),
                        body: message,
                    },
                    now,
                )?;
                inbox::enforce_unread_limit_unlocked(
                    self.team(),
                    m.base_name(),
                    actor.base_name(),
                    self.settings().max_unread_per_thread,
                )?;
            }
        }

        if notify {
            self.notify_targets(&actor, kind.as_str(), &msg_id, &targets, now)
                .await?;
        }
        Ok(msg_id)
    }

    fn resolve_intent_targets(
        &self,
        reg: &Registry,
        actor_full: &str,
        selection: &TargetSelection,
        include_excluded: bool,
    ) -> Result<(Vec<String>, bool), TeamError> {
        let (mut resolved, is_broadcast) = if let Some(role) =
            selection.role.as_deref().map(str::trim).filter(|r| !r.is_empty())
        {
            (org::members_by_role(reg, role), true)
        } else if let Some(root) = selection
            .subtree
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            let root_full = registry::require_member(reg, root)?.full.clone();
            let mut fulls = org::subtree_fulls(reg, &root_full);
            if !include_excluded && !self.policy().broadcast_exclude_roles.is_empty() {
                fulls.retain(|full| {
                    reg.resolve(full)
                        .map(|m| !self.policy().broadcast_exclude_roles.contains(m.role_name()))
                        .unwrap_or(true)
                });
            }
            (fulls, true)
        } else {
            if selection.targets.is_empty() {
                return Err(TeamError::InvalidInput(
                    "targets are required (or use --role/--subtree)".into(),
                ));
            }
            let mut out = Vec::new();
            for raw in &selection.targets {
                out.push(registry::require_member(reg, raw)?.full.clone());
            }
            let unique: std::collections::BTreeSet<&String> = out.iter().collect();
            let broadcast = unique.len() > 1;
            (out, broadcast)
        };

        // De-dupe + drop self for broadcast-style deliveries.
        let mut uniq = Vec::new();
        let mut seen = std::collections::BTreeSet::new();
        for full in resolved.drain(..) {
            if full.is_empty() {
                continue;
            }
            if is_broadcast && full == actor_full {
                continue;
            }
            if seen.insert(full.clone()) {
                uniq.push(full);
            }
        }
        Ok((uniq, is_broadcast))
    }

    /// Inject the inbox notice into each target session, bounded-parallel.
    async fn notify_targets(
        &self,
        actor: &atwf_core::Member,
        kind: &str,
        msg_id: &str,
        targets: &[String],
        now: chrono::NaiveDateTime,
    ) -> Result<(), TeamError> {
        let notice = envelope::inbox_notice(msg_id);
        let ts = format_iso(now);
        let role = Some(actor.role_name()).filter(|r| !r.is_empty());

        if let [only] = targets {
            let wrapped =
                envelope::wrap_team_message(msg_id, kind, &actor.full, role, only, &ts, &notice);
            return Ok(self.ctl().send(only, &wrapped).await?);
        }

        let mut failures = 0usize;
        for chunk in targets.chunks(NOTIFY_FANOUT) {
            let mut joins = Vec::with_capacity(chunk.len());
            for full in chunk {
                let wrapped = envelope::wrap_team_message(
                    msg_id, kind, &actor.full, role, full, &ts, &notice,
                );
                let ctl = self.ctl().clone();
                let full = full.clone();
                joins.push(tokio::spawn(async move { ctl.send(&full, &wrapped).await }));
            }
            for join in joins {
                match join.await {
                    Ok(Ok(())) => {}
                    Ok(Err(err)) => {
                        tracing::warn!(error = %err, "notify injection failed");
                        failures += 1;
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "notify task panicked");
                        failures += 1;
                    }
                }
            }
        }
        if failures > 0 {
            return Err(TeamError::Io(std::io::Error::other(format!(
                "notify failures: {} targets",
                failures
            ))));
        }
        Ok(())
    }

    /// Read-receipt rows for a message across recipients.
    pub fn receipts(
        &self,
        msg_id: &str,
        selection: &TargetSelection,
    ) -> Result<Vec<ReceiptRow>, TeamError> {
        let msg_id = msg_id.trim();
        if msg_id.is_empty() {
            return Err(TeamError::InvalidInput("msg_id is required".into()));
        }
        let reg = self.load_registry()?;
        let targets = org::select_targets(
            &reg,
            &selection.targets,
            selection.role.as_deref(),
            selection.subtree.as_deref(),
        )?;

        let mut rows = Vec::new();
        for full in targets {
            let m = reg.resolve(&full).cloned().unwrap_or_default_member(&full);
            let status = match inbox::find_message(self.team(), m.base_name(), msg_id) {
                Some((state, _from, _path)) => state.dir_name().to_string(),
                None => "missing".to_string(),
            };
            rows.push(ReceiptRow {
                status,
                role: if m.role_name().is_empty() {
                    "?".to_string()
                } else {
                    m.role_name().to_string()
                },
                base: m.base_name().to_string(),
                full,
            });
        }
        let order = |status: &str| match status {
            "unread" => 0,
            "overflow" => 1,
            "read" => 2,
            _ => 3,
        };
        rows.sort_by(|a, b| {
            order(&a.status)
                .cmp(&order(&b.status))
                .then_with(|| a.role.cmp(&b.role))
                .then_with(|| a.base.cmp(&b.base))
                .then_with(|| a.full.cmp(&b.full))
        });
        Ok(rows)
    }
}

/// Fallback member for fulls that vanished from the registry mid-operation.
trait MemberFallback {
    fn unwrap_or_default_member(self, full: &str) -> atwf_core::Member;
}

impl MemberFallback for Option<atwf_core::Member> {
    fn unwrap_or_default_member(self, full: &str) -> atwf_core::Member {
        self.unwrap_or_else(|| atwf_core::Member {
            full: full.to_string(),
            base: String::new(),
            role: String::new(),
            scope: String::new(),
            parent: None,
            children: Vec::new(),
            state_file: String::new(),
            created_at: String::new(),
            updated_at: String::new(),
        })
    }
}

#[cfg(test)]
#[path = "messaging_tests.rs"]
mod tests;
