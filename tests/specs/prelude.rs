//! Test helpers for behavioral specifications.
//!
//! Provides a high-level DSL for testing atwf CLI behavior against a
//! tempdir team directory.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

pub const COORD: &str = "coord-20260301-110000-1";
pub const ADMIN: &str = "admin-b-20260301-110100-2";
pub const DEV_C: &str = "dev-c-20260301-110200-3";
pub const DEV_D: &str = "dev-d-20260301-110300-4";

/// Returns the path to the atwf binary, checking the llvm-cov target
/// directory first so coverage runs pick up the instrumented build.
fn atwf_binary() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));

    let llvm_cov_path = manifest_dir.join("target/llvm-cov-target/debug/atwf");
    if llvm_cov_path.exists() {
        return llvm_cov_path;
    }

    let standard = manifest_dir.join("target/debug/atwf");
    if standard.exists() {
        return standard;
    }

    // Fallback: resolve relative to the test binary itself. The test binary
    // lives at target/debug/deps/specs-<hash>, so its grandparent is
    // target/debug/ where atwf is built.
    if let Ok(exe) = std::env::current_exe() {
        if let Some(debug_dir) = exe.parent().and_then(|d| d.parent()) {
            let fallback = debug_dir.join("atwf");
            if fallback.exists() {
                return fallback;
            }
        }
    }

    standard
}

/// A team directory plus a fluent runner for atwf invocations against it.
pub struct Team {
    _dir: tempfile::TempDir,
    root: PathBuf,
}

impl Team {
    /// A fresh, initialized team directory.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path().join("share");
        let team = Self { _dir: dir, root };
        team.atwf().args(&["init"]).passes();
        team
    }

    /// The standard org chart: coord -> admin-b -> {dev-c, dev-d}.
    pub fn seeded() -> Self {
        let team = Self::new();
        team.register(COORD, "coord", None);
        team.register(ADMIN, "admin", Some(COORD));
        team.register(DEV_C, "dev", Some(ADMIN));
        team.register(DEV_D, "dev", Some(ADMIN));
        team
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn atwf(&self) -> CliBuilder {
        CliBuilder {
            args: Vec::new(),
            team_dir: self.root.clone(),
        }
    }

    pub fn register(&self, full: &str, role: &str, parent: Option<&str>) {
        let mut args = vec!["register", full, "--role", role];
        if let Some(parent) = parent {
            args.push("--parent");
            args.push(parent);
        }
        self.atwf().args(&args).passes();
    }

    /// Run a command and return its trimmed stdout.
    pub fn stdout(&self, args: &[&str]) -> String {
        self.atwf().args(args).passes().stdout_trimmed()
    }

    pub fn write_config(&self, content: &str) {
        std::fs::write(self.root.join("config.yaml"), content).expect("write config");
    }

    pub fn read_file(&self, rel: &str) -> String {
        std::fs::read_to_string(self.root.join(rel)).expect("read file")
    }

    pub fn has_file(&self, rel: &str) -> bool {
        self.root.join(rel).is_file()
    }
}

/// Fluent builder for one atwf invocation.
pub struct CliBuilder {
    args: Vec<String>,
    team_dir: PathBuf,
}

impl CliBuilder {
    pub fn args(mut self, args: &[&str]) -> Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    fn run(self) -> Output {
        Command::new(atwf_binary())
            .args(&self.args)
            .env("ATWF_DIR", &self.team_dir)
            .env_remove("ATWF_CONFIG")
            .env_remove("ATWF_WORKER_CMD")
            .env_remove("TMUX_PANE")
            .output()
            .expect("run atwf")
    }

    pub fn passes(self) -> RunAssert {
        let args = self.args.clone();
        let output = self.run();
        assert!(
            output.status.success(),
            "expected success for atwf {:?}\nstdout: {}\nstderr: {}",
            args,
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
        RunAssert { output }
    }

    pub fn fails(self) -> RunAssert {
        let args = self.args.clone();
        let output = self.run();
        assert!(
            !output.status.success(),
            "expected failure for atwf {:?}\nstdout: {}",
            args,
            String::from_utf8_lossy(&output.stdout),
        );
        RunAssert { output }
    }
}

/// Assertions over a finished run.
pub struct RunAssert {
    output: Output,
}

impl RunAssert {
    pub fn stdout_trimmed(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout)
            .trim_end()
            .to_string()
    }

    pub fn stderr_string(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).to_string()
    }

    pub fn code(self, expected: i32) -> Self {
        assert_eq!(
            self.output.status.code(),
            Some(expected),
            "exit code mismatch; stderr: {}",
            self.stderr_string(),
        );
        self
    }

    pub fn stdout_has(self, expected: &str) -> Self {
        let stdout = String::from_utf8_lossy(&self.output.stdout).to_string();
        assert!(
            stdout.contains(expected),
            "stdout missing {:?}:\n{}",
            expected,
            stdout
        );
        self
    }

    pub fn stderr_has(self, expected: &str) -> Self {
        let stderr = self.stderr_string();
        assert!(
            stderr.contains(expected),
            "stderr missing {:?}:\n{}",
            expected,
            stderr
        );
        self
    }
}
