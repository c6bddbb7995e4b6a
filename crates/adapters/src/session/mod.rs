// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Terminal-multiplexer adapters.

mod tmux;

pub use tmux::TmuxMux;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeMux;

use async_trait::async_trait;
use thiserror::Error;

/// Errors from mux operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session not found: {0}")]
    NotFound(String),
    #[error("mux command failed: {0}")]
    CommandFailed(String),
    #[error("mux command timed out: {0}")]
    Timeout(String),
}

impl From<SessionError> for atwf_core::TeamError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Timeout(msg) => atwf_core::TeamError::ExternalTimeout(msg),
            SessionError::NotFound(name) => {
                atwf_core::TeamError::NotFound(format!("mux session not found: {}", name))
            }
            SessionError::CommandFailed(msg) => {
                atwf_core::TeamError::Io(std::io::Error::other(msg))
            }
        }
    }
}

/// Session introspection + key injection (spec contract `Mux`).
#[async_trait]
pub trait Mux: Clone + Send + Sync + 'static {
    /// Whether the named session is alive.
    async fn alive(&self, session: &str) -> Result<bool, SessionError>;

    /// Capture the last `lines` of the session's pane, or `None` when the
    /// session cannot be sampled.
    async fn capture_tail(&self, session: &str, lines: u32) -> Result<Option<String>, SessionError>;

    /// Send literal text to a session (no key-name interpretation).
    async fn send_text(&self, session: &str, text: &str) -> Result<(), SessionError>;

    /// Send the Enter key to a session.
    async fn press_enter(&self, session: &str) -> Result<(), SessionError>;

    /// Name of the session this process runs inside, if any.
    async fn self_session(&self) -> Option<String>;
}
