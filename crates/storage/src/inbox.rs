// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable per-recipient inboxes.
//!
//! A thread is the pair (recipient base, sender base); each message is one
//! Markdown file named by its zero-padded id, so directory listings sort in
//! delivery order. Messages move between the `unread`, `overflow`, and
//! `read` directories by rename only; the file content never changes after
//! the initial write.

use crate::io;
use crate::layout::TeamDir;
use crate::msg_seq::parse_msg_id;
use atwf_core::time::{format_iso, parse_iso};
use atwf_core::{slugify, TeamError};
use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};

/// Which lifecycle directory a message currently sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboxState {
    Unread,
    Overflow,
    Read,
}

impl InboxState {
    pub fn dir_name(&self) -> &'static str {
        match self {
            InboxState::Unread => "unread",
            InboxState::Overflow => "overflow",
            InboxState::Read => "read",
        }
    }
}

/// One message delivery.
#[derive(Debug, Clone)]
pub struct WriteMessage<'a> {
    pub msg_id: &'a str,
    pub kind: &'a str,
    pub from_full: &'a str,
    pub from_base: &'a str,
    pub from_role: &'a str,
    pub to_full: &'a str,
    pub to_base: &'a str,
    pub to_role: &'a str,
    pub body: &'a str,
}

/// Header fields parsed back out of a message file.
#[derive(Debug, Clone, Default)]
pub struct MessageMeta {
    pub kind: String,
    pub summary: String,
    pub created_at: Option<NaiveDateTime>,
}

fn thread_dir(team: &TeamDir, to_base: &str, from_base: &str, state: InboxState) -> PathBuf {
    team.inbox_member_dir(to_base)
        .join(state.dir_name())
        .join(format!("from-{}", slugify(from_base)))
}

fn message_path(
    team: &TeamDir,
    to_base: &str,
    from_base: &str,
    state: InboxState,
    msg_id: &str,
) -> PathBuf {
    thread_dir(team, to_base, from_base, state).join(format!("{}.md", msg_id))
}

/// First non-empty body line, truncated to 160 chars.
pub fn summary_line(body: &str) -> String {
    for line in body.lines() {
        let s = line.trim();
        if s.is_empty() {
            continue;
        }
        if s.chars().count() > 160 {
            let head: String = s.chars().take(157).collect();
            return format!("{}...", head);
        }
        return s.to_string();
    }
    String::new()
}

/// Numeric-stem messages in a thread directory, ordered by id.
pub fn list_thread_msgs(dir: &Path) -> Vec<(u64, String, PathBuf)> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("md") {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if let Some(n) = parse_msg_id(stem) {
            out.push((n, stem.to_string(), path));
        }
    }
    out.sort_by_key(|(n, _, _)| *n);
    out
}

fn thread_dirs(team: &TeamDir, to_base: &str, state: InboxState) -> Vec<PathBuf> {
    let root = team.inbox_member_dir(to_base).join(state.dir_name());
    let Ok(entries) = std::fs::read_dir(&root) else {
        return Vec::new();
    };
    let mut out: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| {
            p.is_dir()
                && p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with("from-"))
        })
        .collect();
    out.sort();
    out
}

/// Write the message file into the recipient's unread thread.
///
/// The caller holds the team lock and has already allocated `msg_id`.
pub fn write_message_unlocked(
    team: &TeamDir,
    msg: &WriteMessage<'_>,
    now: NaiveDateTime,
) -> Result<PathBuf, TeamError> {
    let msg_id = msg.msg_id.trim();
    if msg_id.is_empty() {
        return Err(TeamError::InvalidInput("inbox message id missing".into()));
    }

    let kind = non_empty(msg.kind, "send");
    let from_full = non_empty(msg.from_full, "unknown");
    let from_base = non_empty(msg.from_base, from_full);
    let from_role = non_empty(msg.from_role, "?");
    let to_full = non_empty(msg.to_full, "unknown");
    let to_base = non_empty(msg.to_base, to_full);
    let to_role = non_empty(msg.to_role, "?");

    let path = message_path(team, to_base, from_base, InboxState::Unread, msg_id);

    let summary = summary_line(msg.body);
    let mut lines = vec![
        format!("# ATWF Inbox Message {}", msg_id),
        String::new(),
        format!("- id: `{}`", msg_id),
        format!("- kind: `{}`", kind),
        format!("- created_at: {}", format_iso(now)),
        format!("- from: `{}` (base `{}` role `{}`)", from_full, from_base, from_role),
        format!("- to: `{}` (base `{}` role `{}`)", to_full, to_base, to_role),
    ];
    if !summary.is_empty() {
        lines.push(format!("- summary: {}", summary));
    }
    lines.push(String::new());
    lines.push("---".to_string());
    lines.push(String::new());

    let body = msg.body.trim_end();
    let payload = if body.is_empty() {
        lines.join("\n")
    } else {
        format!("{}{}\n", lines.join("\n"), body)
    };
    io::write_text_atomic(&path, &payload)?;
    Ok(path)
}

/// Move the oldest surplus unread messages of one thread into overflow.
///
/// The caller holds the team lock. `max_unread` is already clamped.
pub fn enforce_unread_limit_unlocked(
    team: &TeamDir,
    to_base: &str,
    from_base: &str,
    max_unread: usize,
) -> Result<(), TeamError> {
    let max_unread = max_unread.max(1);
    let unread_dir = thread_dir(team, to_base, from_base, InboxState::Unread);
    let entries = list_thread_msgs(&unread_dir);
    if entries.len() <= max_unread {
        return Ok(());
    }
    let surplus = entries.len() - max_unread;
    for (_n, stem, path) in entries.into_iter().take(surplus) {
        let dst = message_path(team, to_base, from_base, InboxState::Overflow, &stem);
        io::rename_file(&path, &dst)?;
    }
    Ok(())
}

/// Deliver one message under the team lock, then apply thread backpressure.
pub fn write_message(
    team: &TeamDir,
    msg: &WriteMessage<'_>,
    max_unread: usize,
    now: NaiveDateTime,
) -> Result<PathBuf, TeamError> {
    let _lock = team.lock_team()?;
    team.ensure_layout()?;
    let path = write_message_unlocked(team, msg, now)?;
    let from_base = non_empty(msg.from_base, non_empty(msg.from_full, "unknown"));
    let to_base = non_empty(msg.to_base, non_empty(msg.to_full, "unknown"));
    enforce_unread_limit_unlocked(team, to_base, from_base, max_unread)?;
    Ok(path)
}

/// (unread count, overflow count, pending ids ordered by numeric id).
pub fn unread_stats(team: &TeamDir, to_base: &str) -> (usize, usize, Vec<String>) {
    let mut unread = 0;
    let mut overflow = 0;
    let mut ids: Vec<(u64, String)> = Vec::new();

    for dir in thread_dirs(team, to_base, InboxState::Unread) {
        for (n, stem, _p) in list_thread_msgs(&dir) {
            unread += 1;
            ids.push((n, stem));
        }
    }
    for dir in thread_dirs(team, to_base, InboxState::Overflow) {
        overflow += list_thread_msgs(&dir).len();
    }

    ids.sort();
    (unread, overflow, ids.into_iter().map(|(_n, s)| s).collect())
}

/// Minimum pending id across unread + overflow.
pub fn pending_min_id(team: &TeamDir, to_base: &str) -> Option<(u64, String)> {
    let mut min: Option<(u64, String)> = None;
    for state in [InboxState::Unread, InboxState::Overflow] {
        for dir in thread_dirs(team, to_base, state) {
            for (n, stem, _p) in list_thread_msgs(&dir) {
                let smaller = match &min {
                    Some((m, _)) => n < *m,
                    None => true,
                };
                if smaller {
                    min = Some((n, stem));
                }
            }
        }
    }
    min
}

/// Locate a message across the three state directories.
pub fn find_message(
    team: &TeamDir,
    to_base: &str,
    msg_id: &str,
) -> Option<(InboxState, String, PathBuf)> {
    let msg_id = msg_id.trim();
    if msg_id.is_empty() {
        return None;
    }
    for state in [InboxState::Unread, InboxState::Overflow, InboxState::Read] {
        for dir in thread_dirs(team, to_base, state) {
            let path = dir.join(format!("{}.md", msg_id));
            if path.is_file() {
                let from_base = dir
                    .file_name()
                    .and_then(|n| n.to_str())
                    .and_then(|n| n.strip_prefix("from-"))
                    .unwrap_or("")
                    .to_string();
                return Some((state, from_base, path));
            }
        }
    }
    None
}

/// Move a message to `read/`. Idempotent: an already-read message returns
/// its current path; an unknown id returns `None`.
pub fn mark_read(
    team: &TeamDir,
    to_base: &str,
    msg_id: &str,
) -> Result<Option<PathBuf>, TeamError> {
    let to_base = to_base.trim();
    let msg_id = msg_id.trim();
    if to_base.is_empty() || msg_id.is_empty() {
        return Ok(None);
    }
    let _lock = team.lock_team()?;
    let Some((state, from_base, src)) = find_message(team, to_base, msg_id) else {
        return Ok(None);
    };
    if state == InboxState::Read {
        return Ok(Some(src));
    }
    let dst = message_path(team, to_base, &from_base, InboxState::Read, msg_id);
    io::rename_file(&src, &dst)?;
    Ok(Some(dst))
}

/// Parse `kind`, `summary`, and `created_at` out of a message header.
pub fn parse_header(path: &Path) -> MessageMeta {
    let Ok(raw) = std::fs::read_to_string(path) else {
        return MessageMeta::default();
    };
    let mut meta = MessageMeta::default();
    for line in raw.lines().take(40) {
        let s = line.trim();
        if let Some(rest) = s.strip_prefix("- kind:") {
            meta.kind = rest.trim().trim_matches('`').to_string();
        } else if let Some(rest) = s.strip_prefix("- summary:") {
            meta.summary = rest.trim().to_string();
        } else if let Some(rest) = s.strip_prefix("- created_at:") {
            meta.created_at = parse_iso(rest.trim());
        }
    }
    meta
}

/// Creation time of a message, read from its header.
pub fn message_created_at(team: &TeamDir, to_base: &str, msg_id: &str) -> Option<NaiveDateTime> {
    let (_state, _from, path) = find_message(team, to_base, msg_id)?;
    parse_header(&path).created_at
}

fn non_empty<'a>(raw: &'a str, fallback: &'a str) -> &'a str {
    let s = raw.trim();
    if s.is_empty() {
        fallback
    } else {
        s
    }
}

#[cfg(test)]
#[path = "inbox_tests.rs"]
mod tests;
