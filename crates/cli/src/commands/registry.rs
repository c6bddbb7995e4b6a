// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `atwf init/register/prune/list/tree/resolve/policy`

use crate::context::Context;
use crate::output::{print_row, read_message};
use anyhow::Result;
use atwf_core::{is_valid_full, TeamError};
use atwf_storage::registry::{add_child, ensure_member, load, prune_by, save_unlocked, MemberSpec};
use atwf_storage::{io, org};
use clap::Args;
use std::collections::BTreeSet;

#[derive(Args)]
pub struct InitArgs {
    /// Task body (`-` reads stdin); existing task.md is kept when omitted
    #[arg(long)]
    pub task: Option<String>,
}

pub fn init(ctx: &Context, args: InitArgs) -> Result<()> {
    let now = ctx.now();
    ctx.team.ensure_layout()?;
    {
        let _lock = ctx.team.lock_team()?;
        let mut reg = load(&ctx.team, now)?;
        save_unlocked(&ctx.team, &mut reg, now)?;
    }
    if let Some(task) = args.task {
        let body = read_message(Some(task))?;
        io::write_text_atomic(&ctx.team.task_path(), &body)?;
    }
    eprintln!("\u{2705} team ready: {}", ctx.team.root().display());
    Ok(())
}

#[derive(Args)]
pub struct RegisterArgs {
    /// Full session name (<base>-YYYYmmdd-HHMMSS-<pid>)
    pub full: String,
    #[arg(long)]
    pub role: String,
    #[arg(long)]
    pub base: Option<String>,
    #[arg(long)]
    pub scope: Option<String>,
    /// Parent full name (required for non-root roles unless --force)
    #[arg(long)]
    pub parent: Option<String>,
    #[arg(long)]
    pub state_file: Option<String>,
    /// Skip name/parent validation (operator repair door)
    #[arg(long)]
    pub force: bool,
}

pub fn register(ctx: &Context, args: RegisterArgs) -> Result<()> {
    let full = args.full.trim().to_string();
    if !args.force && !is_valid_full(&full) {
        return Err(TeamError::InvalidInput(format!(
            "malformed full name: {} (expected <base>-YYYYmmdd-HHMMSS-<pid>)",
            full
        ))
        .into());
    }
    let role = ctx.policy.require_role(&args.role)?;
    let now = ctx.now();

    let _lock = ctx.team.lock_team()?;
    let mut reg = load(&ctx.team, now)?;

    let parent = match args.parent.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
        Some(name) => {
            let (parent_full, parent_role) = reg
                .resolve(name)
                .map(|m| (m.full.clone(), m.role_name().to_string()))
                .ok_or_else(|| TeamError::NotFound(format!("parent not found in registry: {}", name)))?;
            if !args.force && !ctx.policy.can_hire(&parent_role, &role) {
                return Err(TeamError::PolicyDenied(format!(
                    "policy.can_hire: {} cannot hire {}",
                    if parent_role.is_empty() { "?" } else { &parent_role },
                    role
                ))
                .into());
            }
            Some(parent_full)
        }
        None => {
            if role != ctx.policy.root_role && !args.force {
                return Err(TeamError::InvalidInput(format!(
                    "--parent is required for role {} (only {} may be a root)",
                    role, ctx.policy.root_role
                ))
                .into());
            }
            None
        }
    };

    let default_base = full
        .rsplitn(4, '-')
        .nth(3)
        .unwrap_or(full.as_str())
        .to_string();
    ensure_member(
        &mut reg,
        &full,
        MemberSpec {
            base: Some(args.base.as_deref().unwrap_or(&default_base)),
            role: Some(&role),
            scope: args.scope.as_deref(),
            parent: parent.as_deref(),
            state_file: args.state_file.as_deref(),
        },
        now,
    );
    if let Some(parent_full) = &parent {
        add_child(&mut reg, parent_full, &full, now);
    }
    save_unlocked(&ctx.team, &mut reg, now)?;
    println!("{}", full);
    Ok(())
}

#[derive(Args)]
pub struct PruneArgs {
    pub role: String,
    pub base: String,
    /// Keep this full name; everything else of the pair is removed
    #[arg(long)]
    pub keep: Option<String>,
}

pub fn prune(ctx: &Context, args: PruneArgs) -> Result<()> {
    let now = ctx.now();
    let _lock = ctx.team.lock_team()?;
    let mut reg = load(&ctx.team, now)?;
    let before = reg.members.len();
    prune_by(&mut reg, &args.role, &args.base, args.keep.as_deref());
    let removed = before - reg.members.len();
    save_unlocked(&ctx.team, &mut reg, now)?;
    println!("{}", removed);
    Ok(())
}

pub fn list(ctx: &Context) -> Result<()> {
    let reg = load(&ctx.team, ctx.now())?;
    print_row(&["full", "role", "base", "parent", "scope"]);
    for m in &reg.members {
        print_row(&[
            &m.full,
            m.role_name(),
            m.base_name(),
            m.parent_full(),
            m.scope.trim(),
        ]);
    }
    Ok(())
}

#[derive(Args)]
pub struct TreeArgs {
    /// Limit to the subtree rooted at this member
    #[arg(long)]
    pub root: Option<String>,
}

pub fn tree(ctx: &Context, args: TreeArgs) -> Result<()> {
    let reg = load(&ctx.team, ctx.now())?;
    let children = org::tree_children(&reg);
    let roots = match args.root.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
        Some(name) => {
            let full = reg
                .resolve(name)
                .map(|m| m.full.clone())
                .ok_or_else(|| TeamError::NotFound(format!("root not found in registry: {}", name)))?;
            vec![full]
        }
        None => org::tree_roots(&reg),
    };

    fn walk(
        reg: &atwf_core::Registry,
        children: &std::collections::BTreeMap<String, Vec<String>>,
        full: &str,
        depth: usize,
        seen: &mut BTreeSet<String>,
    ) {
        let label = reg
            .resolve(full)
            .map(|m| format!("{} [{}] {}", m.base_name(), m.role_name(), m.full))
            .unwrap_or_else(|| format!("{} (unregistered)", full));
        let cycle = !seen.insert(full.to_string());
        println!(
            "{}{}{}",
            "  ".repeat(depth),
            label,
            if cycle { " (cycle)" } else { "" }
        );
        if cycle {
            return;
        }
        if let Some(kids) = children.get(full) {
            for child in kids {
                walk(reg, children, child, depth + 1, seen);
            }
        }
    }

    let mut seen = BTreeSet::new();
    for root in roots {
        walk(&reg, &children, &root, 0, &mut seen);
    }
    Ok(())
}

#[derive(Args)]
pub struct ResolveArgs {
    pub name: String,
}

pub fn resolve(ctx: &Context, args: ResolveArgs) -> Result<()> {
    let reg = load(&ctx.team, ctx.now())?;
    let m = atwf_storage::registry::require_member(&reg, &args.name)?;
    print_row(&[&m.full, m.role_name(), m.base_name()]);
    Ok(())
}

pub fn policy(ctx: &Context) -> Result<()> {
    let p = &ctx.policy;
    let joined = |set: &BTreeSet<String>| {
        let v: Vec<&str> = set.iter().map(String::as_str).collect();
        v.join(",")
    };
    print_row(&["root_role", &p.root_role]);
    print_row(&["enabled_roles", &joined(&p.enabled_roles)]);
    for (parent, kids) in &p.can_hire {
        print_row(&[&format!("can_hire.{}", parent), &joined(kids)]);
    }
    print_row(&["broadcast.allowed_roles", &joined(&p.broadcast_allowed_roles)]);
    print_row(&["broadcast.exclude_roles", &joined(&p.broadcast_exclude_roles)]);
    print_row(&[
        "comm.allow_parent_child",
        if p.comm_allow_parent_child { "true" } else { "false" },
    ]);
    print_row(&[
        "comm.require_handoff",
        if p.comm_require_handoff { "true" } else { "false" },
    ]);
    print_row(&["comm.handoff_creators", &joined(&p.comm_handoff_creators)]);
    for (role, allowed) in &p.comm_direct_allow {
        print_row(&[&format!("comm.direct_allow.{}", role), &joined(allowed)]);
    }
    Ok(())
}
