// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker state commands: show, self transitions, operator overrides.

use super::Engine;
use atwf_adapters::{Mux, WorkerCtl};
use atwf_core::time::format_iso;
use atwf_core::{AgentStatus, Clock, TeamError};
use atwf_storage::{agent_state, inbox, registry};

/// One row of `atwf state` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateRow {
    pub full: String,
    pub role: String,
    pub base: String,
    pub status: AgentStatus,
    pub updated_at: String,
    pub wakeup_due_at: String,
}

impl<M: Mux, W: WorkerCtl, C: Clock> Engine<M, W, C> {
    /// State rows: one member, or the whole team sorted by (role,
    /// updated_at, full).
    pub fn state_rows(&self, target: Option<&str>) -> Result<Vec<StateRow>, TeamError> {
        let reg = self.load_registry()?;
        let mut members: Vec<_> = match target.map(str::trim).filter(|t| !t.is_empty()) {
            Some(name) => vec![registry::require_member(&reg, name)?.clone()],
            None => reg.members.clone(),
        };
        members.retain(|m| !m.full.trim().is_empty());

        let mut rows: Vec<StateRow> = members
            .into_iter()
            .map(|m| {
                let record = agent_state::read(self.team(), &m.full).ok().flatten();
                let (status, updated_at, due_at) = match record {
                    Some(r) => (r.status, r.updated_at, r.wakeup_due_at),
                    None => (AgentStatus::Working, String::new(), String::new()),
                };
                StateRow {
                    full: m.full.clone(),
                    role: m.role_name().to_string(),
                    base: m.base_name().to_string(),
                    status,
                    updated_at,
                    wakeup_due_at: due_at,
                }
            })
            .collect();
        rows.sort_by(|a, b| {
            a.role
                .cmp(&b.role)
                .then_with(|| a.updated_at.cmp(&b.updated_at))
                .then_with(|| a.full.cmp(&b.full))
        });
        Ok(rows)
    }

    /// A worker declaring its own state.
    ///
    /// `working -> draining` is always allowed; `draining -> idle` only
    /// with an empty inbox; `idle` is never reachable except through
    /// `draining`. Any transition clears the wake schedule.
    pub async fn state_set_self(
        &self,
        as_target: Option<&str>,
        desired: AgentStatus,
    ) -> Result<AgentStatus, TeamError> {
        let reg = self.load_registry()?;
        let actor = self.resolve_actor(&reg, as_target).await?.clone();
        let now = self.now();
        let team = self.team();
        let base = actor.base_name().to_string();

        let record = agent_state::update(
            team,
            &actor.full,
            &base,
            actor.role_name(),
            now,
            |record| {
                match desired {
                    AgentStatus::Idle => {
                        if record.status != AgentStatus::Draining {
                            return Err(TeamError::StateConflict(
                                "must set state to 'draining' before 'idle'".into(),
                            ));
                        }
                        let (unread, overflow, ids) = inbox::unread_stats(team, &base);
                        if unread > 0 || overflow > 0 {
                            let preview: Vec<&str> =
                                ids.iter().take(10).map(String::as_str).collect();
                            let hint = if preview.is_empty() {
                                String::new()
                            } else {
                                format!(" ids: {}", preview.join(", "))
                            };
                            return Err(TeamError::StateConflict(format!(
                                "inbox not empty (unread={} overflow={}){} (run: atwf inbox)",
                                unread, overflow, hint
                            )));
                        }
                        record.idle_since = format_iso(now);
                        record.idle_inbox_empty_at = format_iso(now);
                    }
                    AgentStatus::Draining | AgentStatus::Working => {
                        record.idle_since.clear();
                        record.idle_inbox_empty_at.clear();
                    }
                }
                record.clear_wake_schedule();
                record.status = desired;
                record.status_source = "self".into();
                Ok(())
            },
        )?;
        Ok(record.status)
    }

    /// Operator override of another worker's state.
    ///
    /// `draining`/`idle` are worker-owned; forcing them requires `--force`.
    pub fn state_set(
        &self,
        target: &str,
        desired: AgentStatus,
        force: bool,
    ) -> Result<AgentStatus, TeamError> {
        let reg = self.load_registry()?;
        let m = registry::require_member(&reg, target)?.clone();
        if matches!(desired, AgentStatus::Idle | AgentStatus::Draining) && !force {
            return Err(TeamError::StateConflict(
                "only the worker can set draining/idle (use --force for operator override)".into(),
            ));
        }
        let record = agent_state::update(
            self.team(),
            &m.full,
            m.base_name(),
            m.role_name(),
            self.now(),
            |record| {
                record.status = desired;
                record.status_source = "operator".into();
                Ok(())
            },
        )?;
        Ok(record.status)
    }
}

#[cfg(test)]
#[path = "state_ops_tests.rs"]
mod tests;
