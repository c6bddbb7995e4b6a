// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Drive controller state: whole-team, per-subtree, and reply-drive.
//!
//! All three documents live under `state/` and are written under the state
//! lock. The drive mode itself is NOT stored here authoritatively; config
//! owns it and the watcher re-reads it each tick. The stored `mode` field
//! mirrors the last observed value for operator introspection.

use crate::io;
use crate::layout::TeamDir;
use atwf_core::time::format_iso;
use atwf_core::{DriveMode, SubtreeStatus, TeamError};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

fn default_version() -> u32 {
    1
}

/// `state/drive.json` — legacy whole-team drive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriveState {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub mode: DriveMode,
    #[serde(default)]
    pub last_triggered_at: String,
    #[serde(default)]
    pub last_msg_id: String,
    #[serde(default)]
    pub last_reason: String,
    #[serde(default)]
    pub last_driver_full: String,
}

impl DriveState {
    fn new(mode: DriveMode, now: NaiveDateTime) -> Self {
        let now_iso = format_iso(now);
        Self {
            version: 1,
            created_at: now_iso.clone(),
            updated_at: now_iso,
            mode,
            last_triggered_at: String::new(),
            last_msg_id: String::new(),
            last_reason: String::new(),
            last_driver_full: String::new(),
        }
    }
}

/// One subtree's drive accounting entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriveSubtreeEntry {
    #[serde(default)]
    pub base: String,
    #[serde(default)]
    pub status: SubtreeStatus,
    #[serde(default)]
    pub stopped_at: String,
    #[serde(default)]
    pub stopped_reason: String,
    #[serde(default)]
    pub last_triggered_at: String,
    #[serde(default)]
    pub last_msg_id: String,
    #[serde(default)]
    pub last_reason: String,
}

/// `state/drive_subtree.json` — per-subtree drive entries keyed by root base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriveSubtreeState {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub mode: DriveMode,
    #[serde(default)]
    pub subtrees: BTreeMap<String, DriveSubtreeEntry>,
}

impl DriveSubtreeState {
    fn new(mode: DriveMode, now: NaiveDateTime) -> Self {
        let now_iso = format_iso(now);
        Self {
            version: 1,
            created_at: now_iso.clone(),
            updated_at: now_iso,
            mode,
            subtrees: BTreeMap::new(),
        }
    }

    /// Fetch-or-create the entry for a subtree root base.
    pub fn entry(&mut self, base: &str) -> &mut DriveSubtreeEntry {
        let base = base.trim().to_string();
        let entry = self.subtrees.entry(base.clone()).or_default();
        if entry.base.trim().is_empty() {
            entry.base = base;
        }
        entry
    }
}

/// `state/reply_drive.json` — the reply-drive branch's audit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyDriveState {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub last_triggered_at: String,
    #[serde(default)]
    pub last_reason: String,
    #[serde(default)]
    pub last_request_id: String,
    #[serde(default)]
    pub last_target_base: String,
    #[serde(default)]
    pub last_target_full: String,
}

impl ReplyDriveState {
    fn new(now: NaiveDateTime) -> Self {
        let now_iso = format_iso(now);
        Self {
            version: 1,
            created_at: now_iso.clone(),
            updated_at: now_iso,
            last_triggered_at: String::new(),
            last_reason: String::new(),
            last_request_id: String::new(),
            last_target_base: String::new(),
            last_target_full: String::new(),
        }
    }
}

/// Load drive state for a caller inside the state lock; `mode` mirrors the
/// hot config value for this tick.
pub fn load_drive_unlocked(
    team: &TeamDir,
    mode: DriveMode,
    now: NaiveDateTime,
) -> Result<DriveState, TeamError> {
    let path = team.drive_state_path();
    match io::read_json::<DriveState>(&path)? {
        Some(mut state) => {
            state.mode = mode;
            Ok(state)
        }
        None => {
            let state = DriveState::new(mode, now);
            io::write_json_atomic(&path, &state)?;
            Ok(state)
        }
    }
}

/// Load-mutate-save `drive.json` under the state lock.
pub fn update_drive<F>(
    team: &TeamDir,
    mode: DriveMode,
    now: NaiveDateTime,
    mutate: F,
) -> Result<DriveState, TeamError>
where
    F: FnOnce(&mut DriveState),
{
    let _lock = team.lock_state()?;
    team.ensure_layout()?;
    let mut state = load_drive_unlocked(team, mode, now)?;
    mutate(&mut state);
    state.updated_at = format_iso(now);
    io::write_json_atomic(&team.drive_state_path(), &state)?;
    Ok(state)
}

/// Load subtree drive state for a caller inside the state lock.
pub fn load_subtree_unlocked(
    team: &TeamDir,
    mode: DriveMode,
    now: NaiveDateTime,
) -> Result<DriveSubtreeState, TeamError> {
    let path = team.drive_subtree_state_path();
    match io::read_json::<DriveSubtreeState>(&path)? {
        Some(mut state) => {
            state.mode = mode;
            state.subtrees.retain(|k, _| !k.trim().is_empty());
            Ok(state)
        }
        None => {
            let state = DriveSubtreeState::new(mode, now);
            io::write_json_atomic(&path, &state)?;
            Ok(state)
        }
    }
}

/// Load-mutate-save `drive_subtree.json` under the state lock.
pub fn update_subtree<F>(
    team: &TeamDir,
    mode: DriveMode,
    now: NaiveDateTime,
    mutate: F,
) -> Result<DriveSubtreeState, TeamError>
where
    F: FnOnce(&mut DriveSubtreeState),
{
    let _lock = team.lock_state()?;
    team.ensure_layout()?;
    let mut state = load_subtree_unlocked(team, mode, now)?;
    mutate(&mut state);
    state.updated_at = format_iso(now);
    io::write_json_atomic(&team.drive_subtree_state_path(), &state)?;
    Ok(state)
}

/// Mark a subtree stopped/active for drive accounting.
pub fn set_subtree_status(
    team: &TeamDir,
    mode: DriveMode,
    base: &str,
    status: SubtreeStatus,
    reason: &str,
    now: NaiveDateTime,
) -> Result<(), TeamError> {
    let base = base.trim();
    if base.is_empty() {
        return Ok(());
    }
    update_subtree(team, mode, now, |state| {
        let entry = state.entry(base);
        entry.status = status;
        if status == SubtreeStatus::Stopped {
            entry.stopped_at = format_iso(now);
            entry.stopped_reason = reason.trim().to_string();
        } else {
            entry.stopped_at.clear();
            entry.stopped_reason.clear();
        }
    })?;
    Ok(())
}

/// Remove subtree entries whose roots left the registry.
pub fn remove_subtree_entries(
    team: &TeamDir,
    mode: DriveMode,
    bases: &[String],
    now: NaiveDateTime,
) -> Result<(), TeamError> {
    if bases.is_empty() {
        return Ok(());
    }
    update_subtree(team, mode, now, |state| {
        for base in bases {
            state.subtrees.remove(base.trim());
        }
    })?;
    Ok(())
}

/// Load reply-drive state for a caller inside the state lock.
pub fn load_reply_unlocked(
    team: &TeamDir,
    now: NaiveDateTime,
) -> Result<ReplyDriveState, TeamError> {
    let path = team.reply_drive_state_path();
    match io::read_json::<ReplyDriveState>(&path)? {
        Some(state) => Ok(state),
        None => {
            let state = ReplyDriveState::new(now);
            io::write_json_atomic(&path, &state)?;
            Ok(state)
        }
    }
}

/// Load-mutate-save `reply_drive.json` under the state lock.
pub fn update_reply<F>(
    team: &TeamDir,
    now: NaiveDateTime,
    mutate: F,
) -> Result<ReplyDriveState, TeamError>
where
    F: FnOnce(&mut ReplyDriveState),
{
    let _lock = team.lock_state()?;
    team.ensure_layout()?;
    let mut state = load_reply_unlocked(team, now)?;
    mutate(&mut state);
    state.updated_at = format_iso(now);
    io::write_json_atomic(&team.reply_drive_state_path(), &state)?;
    Ok(state)
}

#[cfg(test)]
#[path = "drive_state_tests.rs"]
mod tests;
