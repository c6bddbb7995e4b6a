// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Team policy: a pure derivation from config.
//!
//! Policy answers "who may hire whom" and "who may talk to whom" at the role
//! level. It holds no registry state; the comm gate combines it with the
//! registry and handoff permits at evaluation time.

use crate::config::Config;
use crate::error::TeamError;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

pub const DEFAULT_ROOT_ROLE: &str = "coord";
pub const DEFAULT_ROLES: &[&str] = &["coord", "admin", "dev"];

/// Derived team policy. All role names are lower-case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamPolicy {
    pub root_role: String,
    pub enabled_roles: BTreeSet<String>,
    pub can_hire: BTreeMap<String, BTreeSet<String>>,
    pub broadcast_allowed_roles: BTreeSet<String>,
    pub broadcast_exclude_roles: BTreeSet<String>,
    pub comm_allow_parent_child: bool,
    pub comm_require_handoff: bool,
    pub comm_handoff_creators: BTreeSet<String>,
    pub comm_direct_allow: BTreeMap<String, BTreeSet<String>>,
}

fn norm_role(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}

fn role_set(value: Option<&Value>) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    match value {
        Some(Value::String(s)) => {
            for part in s.split(',') {
                let r = norm_role(part);
                if !r.is_empty() {
                    out.insert(r);
                }
            }
        }
        Some(Value::Array(items)) => {
            for item in items {
                if let Some(s) = item.as_str() {
                    let r = norm_role(s);
                    if !r.is_empty() {
                        out.insert(r);
                    }
                }
            }
        }
        _ => {}
    }
    out
}

fn role_map(value: Option<&Value>) -> BTreeMap<String, BTreeSet<String>> {
    let mut out = BTreeMap::new();
    if let Some(Value::Object(map)) = value {
        for (k, v) in map {
            let key = norm_role(k);
            if key.is_empty() {
                continue;
            }
            out.insert(key, role_set(Some(v)));
        }
    }
    out
}

impl TeamPolicy {
    /// Derive the policy from config. Fails only when `root_role` names a
    /// role outside `enabled_roles`.
    pub fn from_config(cfg: &Config) -> Result<Self, TeamError> {
        let mut enabled = role_set(cfg.get(&["team", "policy", "enabled_roles"]));
        if enabled.is_empty() {
            enabled = DEFAULT_ROLES.iter().map(|r| r.to_string()).collect();
        }

        let root_role = {
            let raw = cfg.get_str(&["team", "policy", "root_role"], DEFAULT_ROOT_ROLE);
            let r = norm_role(&raw);
            if r.is_empty() {
                DEFAULT_ROOT_ROLE.to_string()
            } else {
                r
            }
        };
        if !enabled.contains(&root_role) {
            return Err(TeamError::PolicyDenied(format!(
                "policy.root_role={:?} is not in enabled_roles",
                root_role
            )));
        }

        let mut can_hire: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        let raw_can_hire = role_map(cfg.get(&["team", "policy", "can_hire"]));
        if raw_can_hire.is_empty() {
            // Default chart: the root hires admins, admins hire devs.
            for (parent, children) in [("coord", vec!["admin"]), ("admin", vec!["dev"])] {
                if !enabled.contains(parent) {
                    continue;
                }
                let filtered: BTreeSet<String> = children
                    .into_iter()
                    .filter(|c| enabled.contains(*c))
                    .map(str::to_string)
                    .collect();
                can_hire.insert(parent.to_string(), filtered);
            }
        } else {
            for (parent, children) in raw_can_hire {
                if !enabled.contains(&parent) {
                    continue;
                }
                let filtered: BTreeSet<String> =
                    children.into_iter().filter(|c| enabled.contains(c)).collect();
                can_hire.insert(parent, filtered);
            }
        }

        let mut broadcast_allowed =
            role_set(cfg.get(&["team", "policy", "broadcast", "allowed_roles"]));
        if broadcast_allowed.is_empty() {
            broadcast_allowed.insert(root_role.clone());
        }
        broadcast_allowed.retain(|r| enabled.contains(r));

        let mut broadcast_exclude =
            role_set(cfg.get(&["team", "policy", "broadcast", "exclude_roles"]));
        broadcast_exclude.retain(|r| enabled.contains(r));

        let comm_allow_parent_child =
            cfg.get_bool(&["team", "policy", "comm", "allow_parent_child"], true);
        let comm_require_handoff =
            cfg.get_bool(&["team", "policy", "comm", "require_handoff"], true);

        let mut handoff_creators =
            role_set(cfg.get(&["team", "policy", "comm", "handoff_creators"]));
        if handoff_creators.is_empty() {
            handoff_creators.insert(root_role.clone());
        }
        handoff_creators.retain(|r| enabled.contains(r));

        // Symmetric closure of the direct-allow map plus the pairs list;
        // every enabled role gets an entry, possibly empty.
        let mut direct_allow: BTreeMap<String, BTreeSet<String>> = enabled
            .iter()
            .map(|r| (r.clone(), BTreeSet::new()))
            .collect();
        for (a, bs) in role_map(cfg.get(&["team", "policy", "comm", "direct_allow"])) {
            if !enabled.contains(&a) {
                continue;
            }
            for b in bs {
                if !enabled.contains(&b) {
                    continue;
                }
                direct_allow.entry(a.clone()).or_default().insert(b.clone());
                direct_allow.entry(b).or_default().insert(a.clone());
            }
        }
        if let Some(Value::Array(pairs)) =
            cfg.get(&["team", "policy", "comm", "direct_allow_pairs"])
        {
            for pair in pairs {
                let Some(items) = pair.as_array() else { continue };
                if items.len() != 2 {
                    continue;
                }
                let (Some(a), Some(b)) = (items[0].as_str(), items[1].as_str()) else {
                    continue;
                };
                let (a, b) = (norm_role(a), norm_role(b));
                if a.is_empty() || b.is_empty() || !enabled.contains(&a) || !enabled.contains(&b)
                {
                    continue;
                }
                direct_allow.entry(a.clone()).or_default().insert(b.clone());
                direct_allow.entry(b).or_default().insert(a);
            }
        }

        Ok(Self {
            root_role,
            enabled_roles: enabled,
            can_hire,
            broadcast_allowed_roles: broadcast_allowed,
            broadcast_exclude_roles: broadcast_exclude,
            comm_allow_parent_child,
            comm_require_handoff,
            comm_handoff_creators: handoff_creators,
            comm_direct_allow: direct_allow,
        })
    }

    /// Normalize and validate a role against `enabled_roles`.
    pub fn require_role(&self, role: &str) -> Result<String, TeamError> {
        let r = norm_role(role);
        if self.enabled_roles.contains(&r) {
            Ok(r)
        } else {
            let enabled: Vec<&str> = self.enabled_roles.iter().map(String::as_str).collect();
            Err(TeamError::InvalidInput(format!(
                "unsupported role: {} (enabled: {})",
                role,
                enabled.join(", ")
            )))
        }
    }

    /// Whether `parent_role` may hire `child_role`.
    pub fn can_hire(&self, parent_role: &str, child_role: &str) -> bool {
        self.can_hire
            .get(&norm_role(parent_role))
            .is_some_and(|children| children.contains(&norm_role(child_role)))
    }
}

#[cfg(test)]
#[path = "policy_tests.rs"]
mod tests;
