// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Org-chart walks over the registry.
//!
//! The adjacency map is the union of parent back-edges and explicit
//! `children` lists, deduped and sorted. When the two disagree the union
//! wins; nothing here reconciles them. Cycles are possible after a forced
//! re-register and every walk tolerates them with a visited set.

use atwf_core::{Registry, TeamError};
use std::collections::{BTreeMap, BTreeSet};

/// Canonical child adjacency: parent full -> sorted child fulls.
pub fn tree_children(reg: &Registry) -> BTreeMap<String, Vec<String>> {
    let mut out: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    for m in &reg.members {
        if m.full.trim().is_empty() {
            continue;
        }
        let parent = m.parent_full();
        if !parent.is_empty() {
            out.entry(parent.to_string())
                .or_default()
                .insert(m.full.clone());
        }
    }
    for m in &reg.members {
        if m.full.trim().is_empty() {
            continue;
        }
        for child in &m.children {
            let child = child.trim();
            if !child.is_empty() {
                out.entry(m.full.clone())
                    .or_default()
                    .insert(child.to_string());
            }
        }
    }

    out.into_iter()
        .map(|(k, v)| (k, v.into_iter().collect()))
        .collect()
}

/// Members whose parent is empty or unknown, newest-updated first.
pub fn tree_roots(reg: &Registry) -> Vec<String> {
    let known: BTreeSet<&str> = reg
        .members
        .iter()
        .map(|m| m.full.as_str())
        .filter(|f| !f.trim().is_empty())
        .collect();
    let mut roots: Vec<&atwf_core::Member> = reg
        .members
        .iter()
        .filter(|m| !m.full.trim().is_empty())
        .filter(|m| {
            let parent = m.parent_full();
            parent.is_empty() || !known.contains(parent)
        })
        .collect();
    roots.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    roots.into_iter().map(|m| m.full.clone()).collect()
}

/// DFS from `root_full` over the canonical adjacency; includes the root.
pub fn subtree_fulls(reg: &Registry, root_full: &str) -> Vec<String> {
    let root = root_full.trim();
    if root.is_empty() {
        return Vec::new();
    }
    let children = tree_children(reg);
    let mut out = Vec::new();
    let mut seen = BTreeSet::new();
    let mut stack = vec![root.to_string()];
    while let Some(cur) = stack.pop() {
        if !seen.insert(cur.clone()) {
            continue;
        }
        out.push(cur.clone());
        if let Some(kids) = children.get(&cur) {
            for child in kids {
                if !seen.contains(child) {
                    stack.push(child.clone());
                }
            }
        }
    }
    out
}

/// Full names of all members carrying `role`, sorted and deduped.
pub fn members_by_role(reg: &Registry, role: &str) -> Vec<String> {
    let role = role.trim();
    let set: BTreeSet<String> = reg
        .members
        .iter()
        .filter(|m| m.role_name() == role)
        .map(|m| m.full.clone())
        .filter(|f| !f.trim().is_empty())
        .collect();
    set.into_iter().collect()
}

/// Every member full, in registry order, deduped.
pub fn all_member_fulls(reg: &Registry) -> Vec<String> {
    let mut out = Vec::new();
    let mut seen = BTreeSet::new();
    for m in &reg.members {
        let full = m.full.trim();
        if !full.is_empty() && seen.insert(full.to_string()) {
            out.push(full.to_string());
        }
    }
    out
}

/// Target selection for team-wide operations (receipts, broadcasts).
///
/// Precedence: role filter, then subtree, then an explicit list; with none
/// of those, the whole team.
pub fn select_targets(
    reg: &Registry,
    targets: &[String],
    role: Option<&str>,
    subtree: Option<&str>,
) -> Result<Vec<String>, TeamError> {
    if let Some(role) = role.map(str::trim).filter(|r| !r.is_empty()) {
        return Ok(members_by_role(reg, role));
    }
    if let Some(root) = subtree.map(str::trim).filter(|s| !s.is_empty()) {
        let root_full = reg
            .resolve(root)
            .map(|m| m.full.clone())
            .ok_or_else(|| TeamError::NotFound(format!("subtree root not found in registry: {}", root)))?;
        return Ok(subtree_fulls(reg, &root_full));
    }
    if !targets.is_empty() {
        let mut out = Vec::new();
        let mut seen = BTreeSet::new();
        for raw in targets {
            let m = reg
                .resolve(raw)
                .ok_or_else(|| TeamError::NotFound(format!("target not found in registry: {}", raw)))?;
            if seen.insert(m.full.clone()) {
                out.push(m.full.clone());
            }
        }
        return Ok(out);
    }
    Ok(all_member_fulls(reg))
}

#[cfg(test)]
#[path = "org_tests.rs"]
mod tests;
