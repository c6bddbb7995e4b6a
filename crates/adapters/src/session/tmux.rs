// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tmux mux adapter.

use super::{Mux, SessionError};
use crate::subprocess::{run_with_timeout, SubprocessError, TMUX_TIMEOUT};
use async_trait::async_trait;
use tokio::process::Command;

/// Tmux-backed [`Mux`] implementation.
#[derive(Clone, Default)]
pub struct TmuxMux;

impl TmuxMux {
    pub fn new() -> Self {
        Self
    }

    async fn run(args: &[&str], description: &str) -> Result<std::process::Output, SessionError> {
        let mut cmd = Command::new("tmux");
        cmd.args(args);
        run_with_timeout(cmd, TMUX_TIMEOUT, description)
            .await
            .map_err(|err| match err {
                SubprocessError::TimedOut(msg) => SessionError::Timeout(msg),
                SubprocessError::Failed(msg) => SessionError::CommandFailed(msg),
            })
    }
}

#[async_trait]
impl Mux for TmuxMux {
    async fn alive(&self, session: &str) -> Result<bool, SessionError> {
        if session.trim().is_empty() {
            return Ok(false);
        }
        let output = Self::run(&["has-session", "-t", session], "tmux has-session").await?;
        Ok(output.status.success())
    }

    async fn capture_tail(
        &self,
        session: &str,
        lines: u32,
    ) -> Result<Option<String>, SessionError> {
        if session.trim().is_empty() {
            return Ok(None);
        }
        let lines = if lines == 0 { 200 } else { lines };
        let start = format!("-{}", lines);
        let output = Self::run(
            &["capture-pane", "-p", "-t", session, "-S", &start],
            "tmux capture-pane",
        )
        .await?;
        if !output.status.success() {
            return Ok(None);
        }
        Ok(Some(String::from_utf8_lossy(&output.stdout).to_string()))
    }

    async fn send_text(&self, session: &str, text: &str) -> Result<(), SessionError> {
        // -l = literal mode (no key name interpretation)
        // -- = end of options (handles text starting with -)
        let output = Self::run(
            &["send-keys", "-t", session, "-l", "--", text],
            "tmux send-keys",
        )
        .await?;
        if !output.status.success() {
            return Err(SessionError::NotFound(session.to_string()));
        }
        // Submit the pasted text.
        self.press_enter(session).await
    }

    async fn press_enter(&self, session: &str) -> Result<(), SessionError> {
        let output = Self::run(&["send-keys", "-t", session, "Enter"], "tmux send-keys").await?;
        if !output.status.success() {
            return Err(SessionError::NotFound(session.to_string()));
        }
        Ok(())
    }

    async fn self_session(&self) -> Option<String> {
        // Prefer the pane env var so nested invocations resolve correctly.
        let pane = std::env::var("TMUX_PANE").unwrap_or_default();
        let args: Vec<&str> = if pane.trim().is_empty() {
            vec!["display-message", "-p", "#S"]
        } else {
            vec!["display-message", "-p", "-t", pane.trim(), "#S"]
        };
        let output = Self::run(&args, "tmux display-message").await.ok()?;
        if !output.status.success() {
            return None;
        }
        let name = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if name.is_empty() {
            None
        } else {
            Some(name)
        }
    }
}

#[cfg(test)]
#[path = "tmux_tests.rs"]
mod tests;
