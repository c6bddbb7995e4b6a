// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-worker state records (`state/<slug(full)>.json`).
//!
//! Written only under the state lock, via load-mutate-save closures. Loads
//! are self-healing: a missing file materializes with defaults, unknown
//! status strings coerce to `working`.

use crate::io;
use crate::layout::TeamDir;
use atwf_core::time::format_iso;
use atwf_core::{AgentStatus, TeamError};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

fn default_version() -> u32 {
    1
}

/// One worker's observed/declared state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentStateRecord {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub full: String,
    #[serde(default)]
    pub base: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub status: AgentStatus,
    #[serde(default)]
    pub status_source: String,

    #[serde(default)]
    pub last_inbox_check_at: String,
    #[serde(default)]
    pub last_inbox_unread: u32,
    #[serde(default)]
    pub last_inbox_overflow: u32,

    #[serde(default)]
    pub last_output_hash: String,
    #[serde(default)]
    pub last_output_capture_at: String,
    #[serde(default)]
    pub last_output_change_at: String,

    #[serde(default)]
    pub auto_enter_last_sent_at: String,
    #[serde(default)]
    pub auto_enter_last_reason: String,
    #[serde(default)]
    pub auto_enter_count: u32,

    #[serde(default)]
    pub idle_since: String,
    #[serde(default)]
    pub idle_inbox_empty_at: String,
    #[serde(default)]
    pub wakeup_scheduled_at: String,
    #[serde(default)]
    pub wakeup_due_at: String,
    #[serde(default)]
    pub wakeup_sent_at: String,
    #[serde(default)]
    pub wakeup_reason: String,

    #[serde(default)]
    pub stale_alert_sent_at: String,
    #[serde(default)]
    pub stale_alert_msg_id: String,
    #[serde(default)]
    pub stale_alert_reason: String,
}

impl AgentStateRecord {
    fn new(full: &str, base: &str, role: &str, now: NaiveDateTime) -> Self {
        let now_iso = format_iso(now);
        Self {
            version: 1,
            created_at: now_iso.clone(),
            updated_at: now_iso,
            full: full.to_string(),
            base: base.to_string(),
            role: role.to_string(),
            status: AgentStatus::Working,
            status_source: "init".to_string(),
            last_inbox_check_at: String::new(),
            last_inbox_unread: 0,
            last_inbox_overflow: 0,
            last_output_hash: String::new(),
            last_output_capture_at: String::new(),
            last_output_change_at: String::new(),
            auto_enter_last_sent_at: String::new(),
            auto_enter_last_reason: String::new(),
            auto_enter_count: 0,
            idle_since: String::new(),
            idle_inbox_empty_at: String::new(),
            wakeup_scheduled_at: String::new(),
            wakeup_due_at: String::new(),
            wakeup_sent_at: String::new(),
            wakeup_reason: String::new(),
            stale_alert_sent_at: String::new(),
            stale_alert_msg_id: String::new(),
            stale_alert_reason: String::new(),
        }
    }

    /// Clear the wake schedule (not `wakeup_sent_at`, which is history).
    pub fn clear_wake_schedule(&mut self) {
        self.wakeup_scheduled_at.clear();
        self.wakeup_due_at.clear();
        self.wakeup_reason.clear();
    }
}

/// Read a worker's state without the lock (observers only).
pub fn read(team: &TeamDir, full: &str) -> Result<Option<AgentStateRecord>, TeamError> {
    io::read_json(&team.agent_state_path(full))
}

/// Load (defaulting missing fields) for a caller already inside the state
/// lock. Writes the default file when none exists.
pub fn load_unlocked(
    team: &TeamDir,
    full: &str,
    base: &str,
    role: &str,
    now: NaiveDateTime,
) -> Result<AgentStateRecord, TeamError> {
    let path = team.agent_state_path(full);
    match io::read_json::<AgentStateRecord>(&path)? {
        Some(mut record) => {
            if record.full.trim().is_empty() {
                record.full = full.to_string();
            }
            if record.base.trim().is_empty() {
                record.base = base.to_string();
            }
            if record.role.trim().is_empty() {
                record.role = role.to_string();
            }
            if record.created_at.trim().is_empty() {
                record.created_at = format_iso(now);
            }
            Ok(record)
        }
        None => {
            let record = AgentStateRecord::new(full, base, role, now);
            io::write_json_atomic(&path, &record)?;
            Ok(record)
        }
    }
}

/// Load-mutate-save under the state lock.
pub fn update<F>(
    team: &TeamDir,
    full: &str,
    base: &str,
    role: &str,
    now: NaiveDateTime,
    mutate: F,
) -> Result<AgentStateRecord, TeamError>
where
    F: FnOnce(&mut AgentStateRecord) -> Result<(), TeamError>,
{
    let _lock = team.lock_state()?;
    team.ensure_layout()?;
    let mut record = load_unlocked(team, full, base, role, now)?;
    mutate(&mut record)?;
    record.updated_at = format_iso(now);
    io::write_json_atomic(&team.agent_state_path(full), &record)?;
    Ok(record)
}

#[cfg(test)]
#[path = "agent_state_tests.rs"]
mod tests;
