// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subprocess execution helpers.

use std::process::Output;
use std::time::Duration;
use tokio::process::Command;

/// Default timeout for tmux commands.
pub const TMUX_TIMEOUT: Duration = Duration::from_secs(10);

/// Default timeout for worker-ctl commands (start may clone templates).
pub const WORKER_CTL_TIMEOUT: Duration = Duration::from_secs(60);

/// Timeout or spawn failure from [`run_with_timeout`].
#[derive(Debug)]
pub enum SubprocessError {
    Failed(String),
    TimedOut(String),
}

/// Run a subprocess command with a timeout.
///
/// Wraps `Command::output()` with `tokio::time::timeout`; the child is
/// killed on expiry via the tokio `Child` drop implementation. The caller
/// inspects `Output.status` itself.
pub async fn run_with_timeout(
    mut cmd: Command,
    timeout: Duration,
    description: &str,
) -> Result<Output, SubprocessError> {
    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(io_err)) => Err(SubprocessError::Failed(format!(
            "{} failed: {}",
            description, io_err
        ))),
        Err(_elapsed) => Err(SubprocessError::TimedOut(format!(
            "{} timed out after {}s",
            description,
            timeout.as_secs()
        ))),
    }
}

#[cfg(test)]
#[path = "subprocess_tests.rs"]
mod tests;
