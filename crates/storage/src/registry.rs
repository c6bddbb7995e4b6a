// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registry store: load/save plus the member upsert operations.
//!
//! `ensure_member` deliberately does NOT validate policy; hire checks are
//! the caller's job. The registry is operator-repairable, so loads are
//! self-healing rather than strict.

use crate::io;
use crate::layout::TeamDir;
use atwf_core::time::format_iso;
use atwf_core::{Member, Registry, TeamError};
use chrono::NaiveDateTime;

/// Load the registry, defaulting a missing or empty file.
pub fn load(team: &TeamDir, now: NaiveDateTime) -> Result<Registry, TeamError> {
    let path = team.registry_path();
    let mut reg: Registry = io::read_json(&path)?.unwrap_or_default();
    if reg.version == 0 {
        reg.version = 1;
    }
    if reg.created_at.trim().is_empty() {
        reg.created_at = format_iso(now);
    }
    Ok(reg)
}

/// Persist the registry. The caller holds the team lock.
pub fn save_unlocked(
    team: &TeamDir,
    reg: &mut Registry,
    now: NaiveDateTime,
) -> Result<(), TeamError> {
    reg.updated_at = format_iso(now);
    io::write_json_atomic(&team.registry_path(), reg)
}

/// Fields accepted by [`ensure_member`]; `None` leaves an existing value
/// untouched.
#[derive(Debug, Default, Clone)]
pub struct MemberSpec<'a> {
    pub base: Option<&'a str>,
    pub role: Option<&'a str>,
    pub scope: Option<&'a str>,
    pub parent: Option<&'a str>,
    pub state_file: Option<&'a str>,
}

/// Upsert a member by full name. Returns the member index.
pub fn ensure_member(
    reg: &mut Registry,
    full: &str,
    spec: MemberSpec<'_>,
    now: NaiveDateTime,
) -> usize {
    let now_iso = format_iso(now);
    if let Some(idx) = reg.members.iter().position(|m| m.full == full) {
        let m = &mut reg.members[idx];
        if let Some(base) = spec.base {
            m.base = base.trim().to_string();
        }
        if let Some(role) = spec.role {
            m.role = role.trim().to_string();
        }
        if let Some(scope) = spec.scope {
            m.scope = scope.to_string();
        }
        if let Some(parent) = spec.parent {
            m.parent = Some(parent.trim().to_string());
        }
        if let Some(state_file) = spec.state_file {
            m.state_file = state_file.to_string();
        }
        m.updated_at = now_iso;
        return idx;
    }
    reg.members.push(Member {
        full: full.to_string(),
        base: spec.base.unwrap_or("").trim().to_string(),
        role: spec.role.unwrap_or("").trim().to_string(),
        scope: spec.scope.unwrap_or("").to_string(),
        parent: spec.parent.map(|p| p.trim().to_string()),
        children: Vec::new(),
        state_file: spec.state_file.unwrap_or("").to_string(),
        created_at: now_iso.clone(),
        updated_at: now_iso,
    });
    reg.members.len() - 1
}

/// Append `child_full` to the parent's children list. Idempotent; creates
/// the parent record when missing.
pub fn add_child(reg: &mut Registry, parent_full: &str, child_full: &str, now: NaiveDateTime) {
    let idx = ensure_member(reg, parent_full, MemberSpec::default(), now);
    let parent = &mut reg.members[idx];
    parent.children.retain(|c| !c.trim().is_empty());
    if !parent.children.iter().any(|c| c == child_full) {
        parent.children.push(child_full.to_string());
    }
    parent.updated_at = format_iso(now);
}

/// Drop all members of a (role, base) pair except `keep_full`.
pub fn prune_by(reg: &mut Registry, role: &str, base: &str, keep_full: Option<&str>) {
    let role = role.trim();
    let base = base.trim();
    let keep = keep_full.map(str::trim).filter(|k| !k.is_empty());
    reg.members.retain(|m| {
        if m.role_name() == role && m.base_name() == base {
            keep.is_some_and(|k| m.full == k)
        } else {
            true
        }
    });
}

/// Resolve a name to a member, raising a typed error when required.
pub fn require_member<'r>(reg: &'r Registry, name: &str) -> Result<&'r Member, TeamError> {
    reg.resolve(name)
        .ok_or_else(|| TeamError::NotFound(format!("member not found in registry: {}", name)))
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
