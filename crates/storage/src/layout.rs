// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Team directory layout.
//!
//! Everything lives under one `team_dir`:
//!
//! ```text
//! registry.json  msg_seq.json  task.md  config.yaml
//! design/<full>.md
//! inbox/<slug(base)>/{unread,overflow,read}/from-<slug(sender)>/<id>.md
//! requests/<req-id>/{meta.json, responses/<slug(base)>.md}
//! state/<slug(full)>.json  state/drive.json  state/drive_subtree.json  state/reply_drive.json
//! .paused  .lock  state/.lock
//! ```

use crate::io::{self, FileLock};
use atwf_core::{slugify, TeamError};
use std::path::{Path, PathBuf};

pub const TEAM_DIR_ENV: &str = "ATWF_DIR";
pub const CONFIG_ENV: &str = "ATWF_CONFIG";
const DEFAULT_TEAM_DIR: &str = ".atwf";

/// Path schema over one team directory.
#[derive(Debug, Clone)]
pub struct TeamDir {
    root: PathBuf,
}

impl TeamDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve from `$ATWF_DIR`, else `./.atwf`.
    pub fn from_env() -> Self {
        match std::env::var(TEAM_DIR_ENV) {
            Ok(raw) if !raw.trim().is_empty() => Self::new(raw.trim()),
            _ => Self::new(DEFAULT_TEAM_DIR),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Config file: `$ATWF_CONFIG`, else `config.yaml`, else `config.json`.
    pub fn config_path(&self) -> PathBuf {
        if let Ok(raw) = std::env::var(CONFIG_ENV) {
            if !raw.trim().is_empty() {
                return PathBuf::from(raw.trim());
            }
        }
        let yaml = self.root.join("config.yaml");
        if yaml.is_file() {
            return yaml;
        }
        let json = self.root.join("config.json");
        if json.is_file() {
            return json;
        }
        yaml
    }

    pub fn registry_path(&self) -> PathBuf {
        self.root.join("registry.json")
    }

    pub fn msg_seq_path(&self) -> PathBuf {
        self.root.join("msg_seq.json")
    }

    pub fn task_path(&self) -> PathBuf {
        self.root.join("task.md")
    }

    pub fn design_dir(&self) -> PathBuf {
        self.root.join("design")
    }

    pub fn design_member_path(&self, full: &str) -> Result<PathBuf, TeamError> {
        let name = full.trim();
        if name.is_empty() {
            return Err(TeamError::InvalidInput("full name is required".into()));
        }
        Ok(self.design_dir().join(format!("{}.md", name)))
    }

    pub fn inbox_root(&self) -> PathBuf {
        self.root.join("inbox")
    }

    pub fn inbox_member_dir(&self, base: &str) -> PathBuf {
        self.inbox_root().join(slugify(base))
    }

    pub fn requests_root(&self) -> PathBuf {
        self.root.join("requests")
    }

    pub fn state_root(&self) -> PathBuf {
        self.root.join("state")
    }

    pub fn agent_state_path(&self, full: &str) -> PathBuf {
        self.state_root().join(format!("{}.json", slugify(full)))
    }

    pub fn drive_state_path(&self) -> PathBuf {
        self.state_root().join("drive.json")
    }

    pub fn drive_subtree_state_path(&self) -> PathBuf {
        self.state_root().join("drive_subtree.json")
    }

    pub fn reply_drive_state_path(&self) -> PathBuf {
        self.state_root().join("reply_drive.json")
    }

    pub fn paused_marker_path(&self) -> PathBuf {
        self.root.join(".paused")
    }

    pub fn is_paused(&self) -> bool {
        self.paused_marker_path().is_file()
    }

    pub fn team_lock_path(&self) -> PathBuf {
        self.root.join(".lock")
    }

    pub fn state_lock_path(&self) -> PathBuf {
        self.state_root().join(".lock")
    }

    /// Acquire the team-wide lock (registry, inbox, counter, request meta).
    pub fn lock_team(&self) -> Result<FileLock, TeamError> {
        FileLock::acquire(&self.team_lock_path())
    }

    /// Acquire the state-subtree lock (agent + drive state).
    ///
    /// Lock order: team before state, never the reverse.
    pub fn lock_state(&self) -> Result<FileLock, TeamError> {
        FileLock::acquire(&self.state_lock_path())
    }

    /// Create the directory skeleton. Idempotent.
    pub fn ensure_layout(&self) -> Result<(), TeamError> {
        std::fs::create_dir_all(&self.root)?;
        std::fs::create_dir_all(self.design_dir())?;
        std::fs::create_dir_all(self.inbox_root())?;
        std::fs::create_dir_all(self.requests_root())?;
        std::fs::create_dir_all(self.state_root())?;
        Ok(())
    }

    pub fn pause(&self, now_iso: &str) -> Result<(), TeamError> {
        io::write_text_atomic(&self.paused_marker_path(), &format!("paused_at: {}", now_iso))
    }

    pub fn unpause(&self) -> Result<bool, TeamError> {
        match std::fs::remove_file(self.paused_marker_path()) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
#[path = "layout_tests.rs"]
mod tests;
