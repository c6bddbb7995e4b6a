// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reply-needed request store.
//!
//! Each request is a directory `requests/req-NNNNNN/` holding `meta.json`
//! and one response file per replied target. Meta becomes immutable once
//! `final_msg_id` is set; the first writer to set it wins and later writers
//! observe it and skip. Finalization is colocated with the status change
//! that triggered it, so exactly one process delivers the consolidated
//! result message.

use crate::inbox::{self, WriteMessage};
use crate::layout::TeamDir;
use crate::{io, msg_seq};
use atwf_core::time::{format_iso, parse_iso};
use atwf_core::{slugify, Registry, RequestStatus, TargetStatus, TeamError};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

pub const META_FILE: &str = "meta.json";
pub const RESPONSES_DIR: &str = "responses";

/// The system sender used for finalization deliveries.
pub const REPLY_SENDER: &str = "atwf-reply";

/// Who opened the request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    #[serde(default)]
    pub full: String,
    #[serde(default)]
    pub base: String,
    #[serde(default)]
    pub role: String,
}

/// Per-target status machine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestTarget {
    #[serde(default)]
    pub full: String,
    #[serde(default)]
    pub base: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub status: TargetStatus,
    #[serde(default)]
    pub requested_at: String,
    #[serde(default)]
    pub notify_msg_id: String,
    #[serde(default)]
    pub blocked_until: String,
    #[serde(default)]
    pub blocked_reason: String,
    #[serde(default)]
    pub waiting_on: String,
    #[serde(default)]
    pub responded_at: String,
    #[serde(default)]
    pub response_file: String,
}

fn default_version() -> u32 {
    1
}

/// `meta.json` for one request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestMeta {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub status: RequestStatus,
    #[serde(default)]
    pub topic: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub deadline_s: f64,
    #[serde(default)]
    pub deadline_at: String,
    #[serde(default)]
    pub from: Party,
    #[serde(default)]
    pub targets: BTreeMap<String, RequestTarget>,
    #[serde(default)]
    pub finalized_at: String,
    #[serde(default)]
    pub final_msg_id: String,
}

impl RequestMeta {
    /// Every target replied (vacuously false with no targets).
    pub fn all_replied(&self) -> bool {
        !self.targets.is_empty()
            && self
                .targets
                .values()
                .all(|t| t.status == TargetStatus::Replied)
    }

    pub fn is_finalized(&self) -> bool {
        !self.final_msg_id.trim().is_empty()
    }
}

pub fn request_dir(team: &TeamDir, request_id: &str) -> PathBuf {
    team.requests_root().join(request_id.trim())
}

pub fn meta_path(team: &TeamDir, request_id: &str) -> PathBuf {
    request_dir(team, request_id).join(META_FILE)
}

pub fn responses_dir(team: &TeamDir, request_id: &str) -> PathBuf {
    request_dir(team, request_id).join(RESPONSES_DIR)
}

pub fn response_path(team: &TeamDir, request_id: &str, target_base: &str) -> PathBuf {
    responses_dir(team, request_id).join(format!("{}.md", slugify(target_base)))
}

/// Accept `req-000017`, `000017`, and `17` spellings.
pub fn resolve_request_id(team: &TeamDir, raw: &str) -> Result<String, TeamError> {
    let s = raw.trim();
    if s.is_empty() {
        return Err(TeamError::InvalidInput("request id missing".into()));
    }
    if request_dir(team, s).is_dir() {
        return Ok(s.to_string());
    }
    if s.chars().all(|c| c.is_ascii_digit()) {
        if let Some(n) = msg_seq::parse_msg_id(s) {
            let alt = format!("req-{}", msg_seq::format_msg_id(n));
            if request_dir(team, &alt).is_dir() {
                return Ok(alt);
            }
        }
    }
    if let Some(tail) = s.strip_prefix("req-") {
        if tail.chars().all(|c| c.is_ascii_digit()) && request_dir(team, tail).is_dir() {
            return Ok(tail.to_string());
        }
    }
    Ok(s.to_string())
}

/// Sorted ids of all request directories.
pub fn list_request_ids(team: &TeamDir) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(team.requests_root()) else {
        return Vec::new();
    };
    let mut out: Vec<String> = entries
        .flatten()
        .filter(|e| e.path().is_dir())
        .filter_map(|e| e.file_name().to_str().map(str::to_string))
        .filter(|n| !n.trim().is_empty())
        .collect();
    out.sort();
    out
}

/// Load a request's meta, raising `NotFound` for unknown ids.
pub fn load_meta(team: &TeamDir, request_id: &str) -> Result<RequestMeta, TeamError> {
    let request_id = resolve_request_id(team, request_id)?;
    let path = meta_path(team, &request_id);
    let mut meta: RequestMeta = io::read_json(&path)?
        .ok_or_else(|| TeamError::NotFound(format!("request not found: {}", request_id)))?;
    if meta.id.trim().is_empty() {
        meta.id = request_id;
    }
    Ok(meta)
}

/// Persist meta. The caller holds the team lock.
pub fn save_meta_unlocked(
    team: &TeamDir,
    meta: &mut RequestMeta,
    now: NaiveDateTime,
) -> Result<(), TeamError> {
    meta.updated_at = format_iso(now);
    io::write_json_atomic(&meta_path(team, &meta.id), meta)
}

/// Render the consolidated `[REPLY-NEEDED RESULT]` body.
pub fn render_result(team: &TeamDir, meta: &RequestMeta, final_status: RequestStatus) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut header = "[REPLY-NEEDED RESULT]".to_string();
    if final_status == RequestStatus::TimedOut {
        header.push_str(" timed_out");
    }
    lines.push(header);
    if !meta.id.trim().is_empty() {
        lines.push(format!("- request_id: {}", meta.id.trim()));
    }
    if !meta.topic.trim().is_empty() {
        lines.push(format!("- topic: {}", meta.topic.trim()));
    }
    let from_name = if meta.from.base.trim().is_empty() {
        meta.from.full.trim()
    } else {
        meta.from.base.trim()
    };
    if !from_name.is_empty() {
        let role = if meta.from.role.trim().is_empty() {
            "?"
        } else {
            meta.from.role.trim()
        };
        lines.push(format!("- from: {} (role={})", from_name, role));
    }
    if !meta.created_at.trim().is_empty() {
        lines.push(format!("- created_at: {}", meta.created_at.trim()));
    }
    if !meta.deadline_at.trim().is_empty() {
        lines.push(format!("- deadline_at: {}", meta.deadline_at.trim()));
    }
    lines.push(format!("- meta: `{}`", meta_path(team, &meta.id).display()));
    lines.push(format!(
        "- responses: `{}`",
        responses_dir(team, &meta.id).display()
    ));

    if meta.targets.is_empty() {
        lines.push("- targets: (none)".to_string());
        return lines.join("\n") + "\n";
    }

    let mut replied: Vec<String> = Vec::new();
    let mut pending: Vec<String> = Vec::new();
    for (base, t) in &meta.targets {
        let role = if t.role.trim().is_empty() { "?" } else { t.role.trim() };
        if t.status == TargetStatus::Replied {
            let file_note = if t.response_file.trim().is_empty() {
                String::new()
            } else {
                format!(" file={}", t.response_file.trim())
            };
            replied.push(format!("{} (role={}){}", base, role, file_note));
            continue;
        }
        let mut extra: Vec<String> = Vec::new();
        if !t.blocked_until.trim().is_empty() {
            extra.push(format!("blocked_until={}", t.blocked_until.trim()));
        }
        if !t.waiting_on.trim().is_empty() {
            extra.push(format!("waiting_on={}", t.waiting_on.trim()));
        }
        let extra_s = if extra.is_empty() {
            String::new()
        } else {
            format!(" {}", extra.join(" "))
        };
        pending.push(format!(
            "{} (role={} status={}{})",
            base,
            role,
            t.status.as_str(),
            extra_s
        ));
    }
    if !replied.is_empty() {
        lines.push(String::new());
        lines.push("Replied:".to_string());
        for item in replied {
            lines.push(format!("- {}", item));
        }
    }
    if !pending.is_empty() {
        lines.push(String::new());
        lines.push("Pending:".to_string());
        for item in pending {
            lines.push(format!("- {}", item));
        }
    }
    lines.join("\n") + "\n"
}

/// Deliver the result message and mark the meta final.
///
/// Runs inside its own team-lock acquisition; `msg_id` must be
/// pre-allocated by the caller. Returns `false` without touching anything
/// when the request is already finalized or the claimed status does not
/// hold (another writer won, or the state moved on).
pub fn finalize(
    team: &TeamDir,
    reg: &Registry,
    request_id: &str,
    msg_id: &str,
    final_status: RequestStatus,
    max_unread: usize,
    now: NaiveDateTime,
) -> Result<bool, TeamError> {
    if !final_status.is_final() {
        return Ok(false);
    }
    let _lock = team.lock_team()?;
    finalize_unlocked(team, reg, request_id, msg_id, final_status, max_unread, now)
}

/// Finalization body for callers already inside the team lock.
pub fn finalize_unlocked(
    team: &TeamDir,
    reg: &Registry,
    request_id: &str,
    msg_id: &str,
    final_status: RequestStatus,
    max_unread: usize,
    now: NaiveDateTime,
) -> Result<bool, TeamError> {
    let path = meta_path(team, request_id);
    let Some(mut meta) = io::read_json::<RequestMeta>(&path)? else {
        return Ok(false);
    };
    if !finalize_in_place(team, reg, &mut meta, msg_id, final_status, max_unread, now)? {
        return Ok(false);
    }
    save_meta_unlocked(team, &mut meta, now)?;
    Ok(true)
}

/// In-memory finalization: verify the claimed status actually holds,
/// deliver the result message, and seal the meta fields. The caller holds
/// the team lock and is responsible for saving the meta afterwards.
pub fn finalize_in_place(
    team: &TeamDir,
    reg: &Registry,
    meta: &mut RequestMeta,
    msg_id: &str,
    final_status: RequestStatus,
    max_unread: usize,
    now: NaiveDateTime,
) -> Result<bool, TeamError> {
    if !final_status.is_final() {
        return Ok(false);
    }
    if meta.status != RequestStatus::Open || meta.is_finalized() {
        return Ok(false);
    }

    let all_replied = meta.all_replied();
    let timed_out = parse_iso(&meta.deadline_at)
        .map(|deadline| now >= deadline)
        .unwrap_or(false)
        && !all_replied;
    match final_status {
        RequestStatus::Done if !all_replied => return Ok(false),
        RequestStatus::TimedOut if !timed_out => return Ok(false),
        _ => {}
    }

    let mut to_base = meta.from.base.trim().to_string();
    if to_base.is_empty() {
        to_base = meta.from.full.trim().to_string();
    }
    if to_base.is_empty() {
        return Ok(false);
    }
    let mut to_full = meta.from.full.trim().to_string();
    let mut to_role = {
        let r = meta.from.role.trim();
        if r.is_empty() { "?".to_string() } else { r.to_string() }
    };
    // Prefer the current registry record for the requester, if one exists.
    if let Some(m) = reg.resolve(&to_base) {
        to_full = m.full.clone();
        if !m.role_name().is_empty() {
            to_role = m.role_name().to_string();
        }
    }
    if to_full.is_empty() {
        to_full = to_base.clone();
    }

    let body = render_result(team, meta, final_status);
    inbox::write_message_unlocked(
        team,
        &WriteMessage {
            msg_id,
            kind: "reply-needed-result",
            from_full: REPLY_SENDER,
            from_base: REPLY_SENDER,
            from_role: "system",
            to_full: &to_full,
            to_base: &to_base,
            to_role: &to_role,
            body: &body,
        },
        now,
    )?;
    inbox::enforce_unread_limit_unlocked(team, &to_base, REPLY_SENDER, max_unread)?;

    meta.status = final_status;
    meta.finalized_at = format_iso(now);
    meta.final_msg_id = msg_id.to_string();
    Ok(true)
}

/// A pending target that is due for attention (not snoozed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueTarget {
    pub request_id: String,
    pub base: String,
    pub role: String,
    pub status: TargetStatus,
}

/// One pass over all open requests.
#[derive(Debug, Default)]
pub struct RequestScan {
    /// Requests ready to finalize, with the status they should take.
    pub finalizable: Vec<(String, RequestStatus)>,
    /// Any open request still has a non-replied target.
    pub has_pending: bool,
    /// Non-replied targets whose snooze (if any) has lapsed.
    pub due: Vec<DueTarget>,
    /// base -> number of pending targets waiting on it.
    pub waiters: BTreeMap<String, usize>,
}

/// Classify every open request: finalizable, pending, due, and debtors.
pub fn scan_requests(team: &TeamDir, now: NaiveDateTime) -> RequestScan {
    let mut scan = RequestScan::default();
    for req_id in list_request_ids(team) {
        let Ok(Some(meta)) = io::read_json::<RequestMeta>(&meta_path(team, &req_id)) else {
            continue;
        };
        if meta.status != RequestStatus::Open || meta.targets.is_empty() {
            continue;
        }
        if meta.all_replied() {
            scan.finalizable.push((req_id, RequestStatus::Done));
            continue;
        }
        if parse_iso(&meta.deadline_at).is_some_and(|deadline| now >= deadline) {
            scan.finalizable.push((req_id, RequestStatus::TimedOut));
            continue;
        }
        for (base, t) in &meta.targets {
            if t.status == TargetStatus::Replied {
                continue;
            }
            scan.has_pending = true;
            let waiting_on = t.waiting_on.trim();
            if !waiting_on.is_empty() {
                *scan.waiters.entry(waiting_on.to_string()).or_insert(0) += 1;
            }
            if parse_iso(&t.blocked_until).is_some_and(|until| now < until) {
                continue;
            }
            scan.due.push(DueTarget {
                request_id: req_id.clone(),
                base: base.clone(),
                role: if t.role.trim().is_empty() {
                    "?".to_string()
                } else {
                    t.role.trim().to_string()
                },
                status: t.status,
            });
        }
    }
    scan
}

#[cfg(test)]
#[path = "requests_tests.rs"]
mod tests;
