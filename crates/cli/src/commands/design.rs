// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `atwf design-init/design-path` - per-member design stubs.

use crate::context::Context;
use anyhow::Result;
use atwf_storage::{io, registry};
use clap::Args;

#[derive(Args)]
pub struct DesignInitArgs {
    pub target: String,
}

pub fn design_init(ctx: &Context, args: DesignInitArgs) -> Result<()> {
    let reg = registry::load(&ctx.team, ctx.now())?;
    let m = registry::require_member(&reg, &args.target)?;
    let path = ctx.team.design_member_path(&m.full)?;
    if !path.is_file() {
        let stub = format!(
            "# Design - {base}\n\n- full: `{full}`\n- role: {role}\n- scope: {scope}\n\n## Plan\n\n(to be filled by the worker)\n",
            base = m.base_name(),
            full = m.full,
            role = m.role_name(),
            scope = if m.scope.trim().is_empty() { "(none)" } else { m.scope.trim() },
        );
        io::write_text_atomic(&path, &stub)?;
    }
    println!("{}", path.display());
    Ok(())
}

#[derive(Args)]
pub struct DesignPathArgs {
    pub target: String,
}

pub fn design_path(ctx: &Context, args: DesignPathArgs) -> Result<()> {
    let reg = registry::load(&ctx.team, ctx.now())?;
    let m = registry::require_member(&reg, &args.target)?;
    println!("{}", ctx.team.design_member_path(&m.full)?.display());
    Ok(())
}
