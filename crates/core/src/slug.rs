// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Filesystem-safe slugs and pane-output digests.

use sha1::{Digest, Sha1};

/// Reduce an arbitrary name to a filesystem-safe slug.
///
/// Runs of characters outside `[A-Za-z0-9_-]` collapse into single dashes;
/// empty input yields `unknown`.
pub fn slugify(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_dash = false;
    for c in raw.trim().chars() {
        if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
            if c == '-' {
                pending_dash = true;
                continue;
            }
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(c);
        } else {
            pending_dash = true;
        }
    }
    if out.is_empty() {
        "unknown".to_string()
    } else {
        out
    }
}

/// SHA-1 hex digest of CRLF-normalized text.
///
/// Used to detect pane-output changes; tmux capture output may flip between
/// `\r\n` and `\n` depending on terminal state, so both normalize to `\n`.
pub fn text_digest(raw: &str) -> String {
    let normalized = raw.replace("\r\n", "\n").replace('\r', "\n");
    let mut hasher = Sha1::new();
    hasher.update(normalized.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(40);
    for byte in digest {
        use std::fmt::Write;
        let _ = write!(out, "{:02x}", byte);
    }
    out
}

#[cfg(test)]
#[path = "slug_tests.rs"]
mod tests;
