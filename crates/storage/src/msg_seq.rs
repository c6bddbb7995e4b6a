// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The team-wide message counter.
//!
//! One counter for every message and request id in the team. Monotonicity
//! across the whole team is assumed by receipts tooling and by the ordering
//! of finalization messages relative to their triggers; do not shard it.
//!
//! Allocation takes the team lock on its own file descriptor, so callers
//! must NOT already hold the team lock (flock would deadlock against
//! ourselves). Composite operations pre-allocate every id they need before
//! entering their critical section.

use crate::io;
use crate::layout::TeamDir;
use atwf_core::time::format_iso;
use atwf_core::TeamError;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub const MSG_ID_WIDTH: usize = 6;

#[derive(Debug, Serialize, Deserialize)]
struct MsgSeq {
    #[serde(default = "default_next_id")]
    next_id: u64,
    #[serde(default)]
    created_at: String,
    #[serde(default)]
    updated_at: String,
}

fn default_next_id() -> u64 {
    1
}

/// Render an id as the zero-padded filename stem.
pub fn format_msg_id(n: u64) -> String {
    format!("{:0width$}", n, width = MSG_ID_WIDTH)
}

/// Parse a filename stem back to its numeric id.
pub fn parse_msg_id(stem: &str) -> Option<u64> {
    let s = stem.trim();
    if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Allocate the next message id under the team lock.
pub fn next_msg_id(team: &TeamDir, now: NaiveDateTime) -> Result<String, TeamError> {
    let _lock = team.lock_team()?;
    let path = team.msg_seq_path();
    let mut seq: MsgSeq = io::read_json(&path)?.unwrap_or(MsgSeq {
        next_id: 1,
        created_at: String::new(),
        updated_at: String::new(),
    });
    if seq.next_id < 1 {
        seq.next_id = 1;
    }
    let allocated = seq.next_id;
    seq.next_id += 1;
    if seq.created_at.trim().is_empty() {
        seq.created_at = format_iso(now);
    }
    seq.updated_at = format_iso(now);
    io::write_json_atomic(&path, &seq)?;
    Ok(format_msg_id(allocated))
}

#[cfg(test)]
#[path = "msg_seq_tests.rs"]
mod tests;
