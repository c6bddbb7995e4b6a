// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker lifecycle tool adapter.
//!
//! The actual start/stop/resume of worker sessions belongs to an external
//! tool (configured via `$ATWF_WORKER_CMD` or `team.worker.cmd`); the
//! orchestrator only shells out to it. `send` is the hot path: it delivers
//! wrapped envelopes and wake messages into a worker's CLI.

use crate::subprocess::{run_with_timeout, SubprocessError, WORKER_CTL_TIMEOUT};
use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;
use tokio::process::Command;

/// Errors from worker-ctl operations.
#[derive(Debug, Error)]
pub enum CtlError {
    #[error("worker-ctl failed: {0}")]
    Failed(String),
    #[error("worker-ctl timed out: {0}")]
    Timeout(String),
    #[error("worker-ctl not configured (set ATWF_WORKER_CMD or team.worker.cmd)")]
    NotConfigured,
}

impl From<CtlError> for atwf_core::TeamError {
    fn from(err: CtlError) -> Self {
        match err {
            CtlError::Timeout(msg) => atwf_core::TeamError::ExternalTimeout(msg),
            CtlError::Failed(msg) => atwf_core::TeamError::Io(std::io::Error::other(msg)),
            CtlError::NotConfigured => atwf_core::TeamError::InvalidInput(
                "worker-ctl not configured (set ATWF_WORKER_CMD or team.worker.cmd)".into(),
            ),
        }
    }
}

/// Worker start/stop/resume + text delivery (spec contract `WorkerCtl`).
#[async_trait]
pub trait WorkerCtl: Clone + Send + Sync + 'static {
    /// Start a new root worker; returns `(full, state_file)`.
    async fn start(&self, base: &str, role: &str) -> Result<(String, String), CtlError>;

    /// Spawn a child worker under `parent_full`; returns `(full, state_file)`.
    async fn spawn(
        &self,
        parent_full: &str,
        child_base: &str,
        role: &str,
    ) -> Result<(String, String), CtlError>;

    /// Stop a worker session.
    async fn stop(&self, full: &str) -> Result<(), CtlError>;

    /// Resume a stopped worker session.
    async fn resume(&self, full: &str) -> Result<(), CtlError>;

    /// Deliver text into a worker's CLI.
    async fn send(&self, full: &str, text: &str) -> Result<(), CtlError>;
}

/// Shells out to the configured lifecycle tool.
#[derive(Clone, Debug)]
pub struct ProcessCtl {
    cmd: PathBuf,
}

impl ProcessCtl {
    pub fn new(cmd: impl Into<PathBuf>) -> Self {
        Self { cmd: cmd.into() }
    }

    async fn run(&self, args: &[&str]) -> Result<std::process::Output, CtlError> {
        let mut cmd = Command::new(&self.cmd);
        cmd.args(args);
        let description = format!("worker-ctl {}", args.first().copied().unwrap_or(""));
        let output = run_with_timeout(cmd, WORKER_CTL_TIMEOUT, &description)
            .await
            .map_err(|err| match err {
                SubprocessError::TimedOut(msg) => CtlError::Timeout(msg),
                SubprocessError::Failed(msg) => CtlError::Failed(msg),
            })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CtlError::Failed(format!(
                "{} exited {}: {}",
                description,
                output.status.code().unwrap_or(-1),
                stderr.trim()
            )));
        }
        Ok(output)
    }

    /// Lifecycle tool replies with `<full>\t<state_file>` on stdout.
    fn parse_start_output(stdout: &[u8]) -> Result<(String, String), CtlError> {
        let text = String::from_utf8_lossy(stdout);
        let line = text.lines().next().unwrap_or("").trim();
        let mut parts = line.splitn(2, '\t');
        let full = parts.next().unwrap_or("").trim().to_string();
        let state_file = parts.next().unwrap_or("").trim().to_string();
        if full.is_empty() {
            return Err(CtlError::Failed(format!(
                "worker-ctl returned no session name: {:?}",
                line
            )));
        }
        Ok((full, state_file))
    }
}

#[async_trait]
impl WorkerCtl for ProcessCtl {
    async fn start(&self, base: &str, role: &str) -> Result<(String, String), CtlError> {
        let output = self.run(&["start", base, "--role", role]).await?;
        Self::parse_start_output(&output.stdout)
    }

    async fn spawn(
        &self,
        parent_full: &str,
        child_base: &str,
        role: &str,
    ) -> Result<(String, String), CtlError> {
        let output = self
            .run(&["spawn", parent_full, child_base, "--role", role])
            .await?;
        Self::parse_start_output(&output.stdout)
    }

    async fn stop(&self, full: &str) -> Result<(), CtlError> {
        self.run(&["stop", full]).await.map(|_| ())
    }

    async fn resume(&self, full: &str) -> Result<(), CtlError> {
        self.run(&["resume", full]).await.map(|_| ())
    }

    async fn send(&self, full: &str, text: &str) -> Result<(), CtlError> {
        self.run(&["send", full, text]).await.map(|_| ())
    }
}

/// Routes to the configured tool, or reports `NotConfigured` on use.
///
/// Lets commands that never touch a worker session run without the
/// lifecycle tool installed; only `--notify`/wake paths need it.
#[derive(Clone, Debug)]
pub enum CtlRouter {
    Process(ProcessCtl),
    Unconfigured,
}

impl CtlRouter {
    /// `$ATWF_WORKER_CMD`, else the given config value, else unconfigured.
    pub fn resolve(config_cmd: &str) -> Self {
        if let Ok(raw) = std::env::var("ATWF_WORKER_CMD") {
            if !raw.trim().is_empty() {
                return Self::Process(ProcessCtl::new(raw.trim()));
            }
        }
        let cmd = config_cmd.trim();
        if cmd.is_empty() {
            Self::Unconfigured
        } else {
            Self::Process(ProcessCtl::new(cmd))
        }
    }

    fn inner(&self) -> Result<&ProcessCtl, CtlError> {
        match self {
            Self::Process(ctl) => Ok(ctl),
            Self::Unconfigured => Err(CtlError::NotConfigured),
        }
    }
}

#[async_trait]
impl WorkerCtl for CtlRouter {
    async fn start(&self, base: &str, role: &str) -> Result<(String, String), CtlError> {
        self.inner()?.start(base, role).await
    }

    async fn spawn(
        &self,
        parent_full: &str,
        child_base: &str,
        role: &str,
    ) -> Result<(String, String), CtlError> {
        self.inner()?.spawn(parent_full, child_base, role).await
    }

    async fn stop(&self, full: &str) -> Result<(), CtlError> {
        self.inner()?.stop(full).await
    }

    async fn resume(&self, full: &str) -> Result<(), CtlError> {
        self.inner()?.resume(full).await
    }

    async fn send(&self, full: &str, text: &str) -> Result<(), CtlError> {
        self.inner()?.send(full, text).await
    }
}

/// Recording fake for tests.
#[cfg(any(test, feature = "test-support"))]
#[derive(Clone, Default)]
pub struct FakeCtl {
    inner: std::sync::Arc<parking_lot::Mutex<FakeCtlInner>>,
}

#[cfg(any(test, feature = "test-support"))]
#[derive(Default)]
struct FakeCtlInner {
    sent: Vec<(String, String)>,
    stopped: Vec<String>,
    resumed: Vec<String>,
    fail_sends: bool,
}

#[cfg(any(test, feature = "test-support"))]
impl FakeCtl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.inner.lock().sent.clone()
    }

    pub fn stopped(&self) -> Vec<String> {
        self.inner.lock().stopped.clone()
    }

    pub fn fail_sends(&self, fail: bool) {
        self.inner.lock().fail_sends = fail;
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.sent.clear();
        inner.stopped.clear();
        inner.resumed.clear();
    }
}

#[cfg(any(test, feature = "test-support"))]
#[async_trait]
impl WorkerCtl for FakeCtl {
    async fn start(&self, base: &str, _role: &str) -> Result<(String, String), CtlError> {
        Ok((format!("{}-20260301-120000-1", base), String::new()))
    }

    async fn spawn(
        &self,
        _parent_full: &str,
        child_base: &str,
        _role: &str,
    ) -> Result<(String, String), CtlError> {
        Ok((format!("{}-20260301-120000-2", child_base), String::new()))
    }

    async fn stop(&self, full: &str) -> Result<(), CtlError> {
        self.inner.lock().stopped.push(full.to_string());
        Ok(())
    }

    async fn resume(&self, full: &str) -> Result<(), CtlError> {
        self.inner.lock().resumed.push(full.to_string());
        Ok(())
    }

    async fn send(&self, full: &str, text: &str) -> Result<(), CtlError> {
        let mut inner = self.inner.lock();
        if inner.fail_sends {
            return Err(CtlError::Failed(format!("send rejected: {}", full)));
        }
        inner.sent.push((full.to_string(), text.to_string()));
        Ok(())
    }
}

#[cfg(test)]
#[path = "ctl_tests.rs"]
mod tests;
