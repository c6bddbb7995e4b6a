// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registry document model: members, parent/child edges, handoff permits.
//!
//! A member's `full` is the unique tmux session name
//! (`<base>-YYYYmmdd-HHMMSS-<pid>`); `base` is the stable human-facing
//! handle. Permits grant bidirectional comm between two bases and expire
//! lazily (evaluation ignores them, nothing deletes them).

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

fn full_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(build_full_name_re)
}

#[allow(clippy::expect_used)] // static pattern, cannot fail
fn build_full_name_re() -> Regex {
    Regex::new(r"^[A-Za-z][A-Za-z0-9_-]*-\d{8}-\d{6}-\d+$").expect("static pattern")
}

/// Whether `name` is a well-formed full session name.
pub fn is_valid_full(name: &str) -> bool {
    full_name_re().is_match(name.trim())
}

/// One worker instance in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub full: String,
    #[serde(default)]
    pub base: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub scope: String,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub children: Vec<String>,
    #[serde(default)]
    pub state_file: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

impl Member {
    /// The display handle, falling back to `full` for legacy records.
    pub fn base_name(&self) -> &str {
        if self.base.trim().is_empty() {
            &self.full
        } else {
            self.base.trim()
        }
    }

    /// Normalized role tag (may be empty for unregistered roles).
    pub fn role_name(&self) -> &str {
        self.role.trim()
    }

    /// Parent full name, empty for roots.
    pub fn parent_full(&self) -> &str {
        self.parent.as_deref().map(str::trim).unwrap_or("")
    }
}

/// A handoff permit pairing two bases for direct comm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permit {
    pub id: String,
    pub a: String,
    pub b: String,
    #[serde(default)]
    pub created_by: String,
    #[serde(default)]
    pub created_by_role: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub expires_at: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reason: String,
}

fn default_version() -> u32 {
    1
}

/// The registry document (`registry.json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Registry {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(default)]
    pub permits: Vec<Permit>,
}

impl Registry {
    /// Find a member by exact full name.
    pub fn member(&self, full: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.full == full)
    }

    pub fn member_mut(&mut self, full: &str) -> Option<&mut Member> {
        self.members.iter_mut().find(|m| m.full == full)
    }

    /// Exact-full match wins; otherwise the newest-updated base match.
    pub fn resolve(&self, name: &str) -> Option<&Member> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        if let Some(m) = self.member(name) {
            return Some(m);
        }
        self.members
            .iter()
            .filter(|m| m.base_name() == name)
            .max_by(|a, b| a.updated_at.cmp(&b.updated_at))
    }

    /// Newest-updated member carrying `role`.
    pub fn resolve_latest_by_role(&self, role: &str) -> Option<&Member> {
        let role = role.trim();
        self.members
            .iter()
            .filter(|m| m.role_name() == role)
            .max_by(|a, b| a.updated_at.cmp(&b.updated_at))
    }
}

#[cfg(test)]
#[path = "member_tests.rs"]
mod tests;
