// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error kinds shared across the orchestrator.
//!
//! Callers match on variants, never on message text. The watcher is the one
//! consumer allowed to swallow these (it logs and moves to the next member).

use thiserror::Error;

/// Errors surfaced by registry, inbox, request, and state operations.
#[derive(Debug, Error)]
pub enum TeamError {
    /// A registry lookup failed; carries the input that missed.
    #[error("not found: {0}")]
    NotFound(String),
    /// Comm gate, broadcast, or hire policy rejected the operation.
    #[error("policy denied: {0}")]
    PolicyDenied(String),
    /// Malformed name, empty message, bad status value, and similar.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// A state transition that the current state forbids.
    #[error("state conflict: {0}")]
    StateConflict(String),
    /// A mux/worker-ctl subprocess exceeded its timeout.
    #[error("external timeout: {0}")]
    ExternalTimeout(String),
    /// Filesystem failure. On-disk state stays valid (writes are atomic).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// A stored JSON document could not be parsed.
    #[error("invalid json: {path}: {message}")]
    Json { path: String, message: String },
    /// Mutation attempted after a request's `final_msg_id` was set.
    #[error("request already finalized: {0}")]
    AlreadyFinalized(String),
}

impl TeamError {
    /// Process exit code for the CLI surface: 2 for external timeouts,
    /// 1 for everything else.
    pub fn exit_code(&self) -> i32 {
        match self {
            TeamError::ExternalTimeout(_) => 2,
            _ => 1,
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
