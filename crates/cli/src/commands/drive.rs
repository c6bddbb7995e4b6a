// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `atwf drive/pause/unpause`
//!
//! Config is authoritative for the drive mode; setting it rewrites the
//! `team.drive.mode` line in the config file in place (comments and
//! surrounding keys untouched) so the watcher's hot reload picks it up on
//! the next tick.

use crate::context::Context;
use crate::output::print_row;
use anyhow::Result;
use atwf_core::settings::drive_mode_hot;
use atwf_core::time::format_iso;
use atwf_core::{DriveMode, TeamError};
use atwf_storage::{drive_state, io};
use clap::Args;

#[derive(Args)]
pub struct DriveArgs {
    /// running|standby; omit to show the current mode
    pub mode: Option<String>,
}

pub async fn drive(ctx: &Context, args: DriveArgs) -> Result<()> {
    let Some(raw) = args.mode.as_deref().map(str::trim).filter(|m| !m.is_empty()) else {
        let mode = drive_mode_hot(&ctx.config_path);
        let state = {
            let _lock = ctx.team.lock_state()?;
            ctx.team.ensure_layout()?;
            drive_state::load_drive_unlocked(&ctx.team, mode, ctx.now())?
        };
        print_row(&[mode.as_str(), &state.last_triggered_at, &state.last_msg_id]);
        return Ok(());
    };

    let mode = DriveMode::parse(raw).ok_or_else(|| {
        TeamError::InvalidInput(format!(
            "invalid drive mode: {:?} (allowed: running|standby)",
            raw
        ))
    })?;

    // Workers must not flip the drive mode from inside their sessions.
    let engine = ctx.engine();
    let reg = engine.load_registry()?;
    if engine.inside_worker_session(&reg).await {
        return Err(TeamError::PolicyDenied(format!(
            "drive mode is user/operator-only.\n   workers must NOT edit: {}\n   workers must NOT change drive mode.",
            ctx.config_path.display()
        ))
        .into());
    }

    set_drive_mode_config(&ctx.config_path, mode)?;
    println!("{}", mode);
    Ok(())
}

/// Line-based rewrite of `team.drive.mode` in the YAML config, preserving
/// indentation and trailing comments.
fn set_drive_mode_config(path: &std::path::Path, mode: DriveMode) -> Result<()> {
    let raw = std::fs::read_to_string(path)
        .map_err(|_| TeamError::NotFound(format!("config file missing: {}", path.display())))?;

    let leading_spaces = |s: &str| s.len() - s.trim_start_matches(' ').len();

    let mut lines: Vec<String> = raw.lines().map(str::to_string).collect();
    let mut in_team = false;
    let mut team_indent = 0usize;
    let mut in_drive = false;
    let mut drive_indent = 0usize;
    let mut changed = false;

    for line in lines.iter_mut() {
        let stripped = line.trim_start_matches(' ');
        if stripped.trim().is_empty() || stripped.starts_with('#') {
            continue;
        }
        let indent = leading_spaces(line);
        let key = stripped.split(':').next().unwrap_or("").trim();

        if !in_team {
            if key == "team" && stripped.starts_with("team:") {
                in_team = true;
                team_indent = indent;
                in_drive = false;
            }
            continue;
        }
        if indent <= team_indent && !stripped.starts_with('-') {
            in_team = false;
            in_drive = false;
            continue;
        }
        if !in_drive {
            if key == "drive" && stripped.starts_with("drive:") {
                in_drive = true;
                drive_indent = indent;
            }
            continue;
        }
        if indent <= drive_indent && !stripped.starts_with('-') {
            in_drive = false;
            continue;
        }
        if key != "mode" || !stripped.starts_with("mode:") {
            continue;
        }

        let suffix = match stripped.find('#') {
            Some(idx) => format!(" {}", stripped[idx..].trim_end()),
            None => String::new(),
        };
        *line = format!("{}mode: {}{}", " ".repeat(indent), mode, suffix);
        changed = true;
        break;
    }

    if !changed {
        return Err(TeamError::NotFound(format!(
            "failed to locate `team.drive.mode` in config: {}",
            path.display()
        ))
        .into());
    }
    io::write_text_atomic(path, &(lines.join("\n") + "\n"))?;
    Ok(())
}

pub fn pause(ctx: &Context) -> Result<()> {
    ctx.team.ensure_layout()?;
    ctx.team.pause(&format_iso(ctx.now()))?;
    eprintln!("\u{23f8}\u{fe0f} paused: {}", ctx.team.paused_marker_path().display());
    Ok(())
}

pub fn unpause(ctx: &Context) -> Result<()> {
    if ctx.team.unpause()? {
        eprintln!("\u{25b6}\u{fe0f} resumed");
    } else {
        eprintln!("\u{26a0}\u{fe0f} was not paused");
    }
    Ok(())
}

#[cfg(test)]
#[path = "drive_tests.rs"]
mod tests;
