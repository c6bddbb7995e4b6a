// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The comm gate: who may send to whom.
//!
//! A pure predicate over policy + registry + handoff permits. Evaluation
//! order matters and is part of the contract: self, registration/role
//! checks, parent-child, direct-allow, wide-open mode, then permits.
//! Broadcast deliveries bypass this gate entirely (they check
//! `broadcast_allowed_roles` instead).

use atwf_core::time::{format_iso, parse_iso};
use atwf_core::{Permit, Registry, TeamError, TeamPolicy};
use chrono::NaiveDateTime;

/// Whether a non-expired permit pairs the two bases (in either direction).
pub fn permit_allows(reg: &Registry, a_base: &str, b_base: &str, now: NaiveDateTime) -> bool {
    let a_base = a_base.trim();
    let b_base = b_base.trim();
    if a_base.is_empty() || b_base.is_empty() {
        return false;
    }
    reg.permits.iter().any(|p| {
        let a = p.a.trim();
        let b = p.b.trim();
        if a.is_empty() || b.is_empty() {
            return false;
        }
        if !((a == a_base && b == b_base) || (a == b_base && b == a_base)) {
            return false;
        }
        // Expired permits are ignored, never deleted; an unparseable
        // expiry is treated as still valid.
        match parse_iso(&p.expires_at) {
            Some(expires) => expires > now,
            None => true,
        }
    })
}

/// Whether one member is the direct parent of the other.
pub fn is_direct_parent_child(reg: &Registry, a_full: &str, b_full: &str) -> bool {
    let (Some(a), Some(b)) = (reg.resolve(a_full), reg.resolve(b_full)) else {
        return false;
    };
    a.parent_full() == b_full || b.parent_full() == a_full
}

/// Evaluate the gate. `Ok` carries the rule that allowed the message;
/// `Err` carries the denial reason (no hint).
pub fn comm_allowed(
    policy: &TeamPolicy,
    reg: &Registry,
    actor_full: &str,
    target_full: &str,
    now: NaiveDateTime,
) -> Result<&'static str, String> {
    if actor_full == target_full {
        return Ok("self");
    }

    let Some(actor) = reg.resolve(actor_full) else {
        return Err(format!("actor not registered: {}", actor_full));
    };
    let Some(target) = reg.resolve(target_full) else {
        return Err(format!("target not registered: {}", target_full));
    };

    let actor_role = actor.role_name();
    let target_role = target.role_name();
    if !policy.enabled_roles.contains(actor_role) {
        return Err(format!(
            "actor role not enabled: {}",
            if actor_role.is_empty() { "(missing)" } else { actor_role }
        ));
    }
    if !policy.enabled_roles.contains(target_role) {
        return Err(format!(
            "target role not enabled: {}",
            if target_role.is_empty() { "(missing)" } else { target_role }
        ));
    }

    if policy.comm_allow_parent_child && is_direct_parent_child(reg, actor_full, target_full) {
        return Ok("parent-child");
    }

    if policy
        .comm_direct_allow
        .get(actor_role)
        .is_some_and(|allowed| allowed.contains(target_role))
    {
        return Ok("direct-allow");
    }

    if !policy.comm_require_handoff {
        return Ok("handoff-not-required");
    }

    if permit_allows(reg, actor.base_name(), target.base_name(), now) {
        return Ok("handoff-permit");
    }

    Err(format!(
        "handoff required for {}->{} (no permit)",
        actor_role, target_role
    ))
}

/// Gate wrapper that raises `PolicyDenied` with the would-heal hint.
pub fn require_comm_allowed(
    policy: &TeamPolicy,
    reg: &Registry,
    actor_full: &str,
    target_full: &str,
    now: NaiveDateTime,
) -> Result<(), TeamError> {
    match comm_allowed(policy, reg, actor_full, target_full, now) {
        Ok(_rule) => Ok(()),
        Err(reason) => Err(TeamError::PolicyDenied(format!(
            "communication not permitted by policy.\n   actor:  {}\n   target: {}\n   reason: {}\n   hint: request a handoff via `{}` (or run: atwf handoff --as {} {} {} --reason \"...\")",
            actor_full, target_full, reason, policy.root_role, policy.root_role, actor_full, target_full
        ))),
    }
}

/// Append a handoff permit pairing two bases. The caller has verified the
/// creator's role and holds the team lock for the registry write.
pub fn add_handoff_permit(
    reg: &mut Registry,
    a_base: &str,
    b_base: &str,
    created_by: &str,
    created_by_role: &str,
    reason: &str,
    ttl_seconds: Option<i64>,
    now: NaiveDateTime,
    pid: u32,
) -> Result<Permit, TeamError> {
    let a_base = a_base.trim();
    let b_base = b_base.trim();
    if a_base.is_empty() || b_base.is_empty() {
        return Err(TeamError::InvalidInput(
            "invalid handoff endpoints (missing base)".into(),
        ));
    }
    if a_base == b_base {
        return Err(TeamError::InvalidInput(
            "handoff endpoints must be different".into(),
        ));
    }

    let expires_at = match ttl_seconds {
        Some(ttl) if ttl > 0 => format_iso(now + chrono::Duration::seconds(ttl)),
        _ => String::new(),
    };
    let permit = Permit {
        id: format!(
            "handoff-{}-{}-{}",
            now.format("%Y%m%d-%H%M%S"),
            pid,
            reg.permits.len() + 1
        ),
        a: a_base.to_string(),
        b: b_base.to_string(),
        created_by: created_by.to_string(),
        created_by_role: created_by_role.to_string(),
        created_at: format_iso(now),
        expires_at,
        reason: reason.trim().to_string(),
    };
    reg.permits.push(permit.clone());
    Ok(permit)
}

#[cfg(test)]
#[path = "comm_tests.rs"]
mod tests;
