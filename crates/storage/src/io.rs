// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Atomic file IO and advisory locks.
//!
//! Writes go through a same-directory `.tmp` file and a rename, so a crash
//! mid-write leaves the previous version intact. Locks are exclusive
//! `flock`-style advisory locks held by an RAII guard; they are per open
//! file description, so a process must not re-acquire a lock it already
//! holds (callers pre-allocate ids for exactly this reason).

use atwf_core::TeamError;
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Exclusive advisory lock on a lock file, released on drop.
#[derive(Debug)]
pub struct FileLock {
    file: File,
    path: PathBuf,
}

impl FileLock {
    /// Block until the exclusive lock on `path` is held.
    pub fn acquire(path: &Path) -> Result<Self, TeamError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        file.lock_exclusive()?;
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        if let Err(err) = fs2::FileExt::unlock(&self.file) {
            tracing::warn!(path = %self.path.display(), error = %err, "failed to release file lock");
        }
    }
}

/// Read a JSON document, returning `None` when the file does not exist.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, TeamError> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|err| TeamError::Json {
            path: path.display().to_string(),
            message: err.to_string(),
        })
}

/// Write a JSON document atomically: 2-space indent, trailing newline.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), TeamError> {
    let body = serde_json::to_string_pretty(value).map_err(|err| TeamError::Json {
        path: path.display().to_string(),
        message: err.to_string(),
    })?;
    write_text_atomic(path, &body)
}

/// Write text atomically, ensuring a trailing newline.
pub fn write_text_atomic(path: &Path, text: &str) -> Result<(), TeamError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = tmp_path(path);
    let payload = if text.ends_with('\n') {
        text.to_string()
    } else {
        format!("{}\n", text)
    };
    std::fs::write(&tmp, payload)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Rename within the same filesystem; the unit of inbox state transitions.
pub fn rename_file(src: &Path, dst: &Path) -> Result<(), TeamError> {
    if let Some(parent) = dst.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::rename(src, dst)?;
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "file".to_string());
    name.push_str(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
#[path = "io_tests.rs"]
mod tests;
