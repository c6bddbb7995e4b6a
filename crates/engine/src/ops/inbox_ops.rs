// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Inbox queries for the CLI: list, open, ack, pending.

use super::Engine;
use atwf_adapters::{Mux, WorkerCtl};
use atwf_core::time::format_iso;
use atwf_core::{Clock, Member, TeamError};
use atwf_storage::{agent_state, inbox, InboxState};

/// One pending inbox row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboxRow {
    pub msg_id: String,
    pub from_base: String,
    pub kind: String,
    pub summary: String,
    pub state: InboxState,
}

impl<M: Mux, W: WorkerCtl, C: Clock> Engine<M, W, C> {
    /// Pending (unread + overflow) messages for a base, ordered by id.
    pub fn inbox_rows(&self, to_base: &str) -> Vec<InboxRow> {
        let mut rows: Vec<(u64, InboxRow)> = Vec::new();
        for state in [InboxState::Unread, InboxState::Overflow] {
            let root = self
                .team()
                .inbox_member_dir(to_base)
                .join(state.dir_name());
            let Ok(entries) = std::fs::read_dir(&root) else {
                continue;
            };
            let mut dirs: Vec<_> = entries.flatten().map(|e| e.path()).collect();
            dirs.sort();
            for dir in dirs {
                let Some(from_base) = dir
                    .file_name()
                    .and_then(|n| n.to_str())
                    .and_then(|n| n.strip_prefix("from-"))
                    .map(str::to_string)
                else {
                    continue;
                };
                for (n, stem, path) in inbox::list_thread_msgs(&dir) {
                    let meta = inbox::parse_header(&path);
                    rows.push((
                        n,
                        InboxRow {
                            msg_id: stem,
                            from_base: from_base.clone(),
                            kind: if meta.kind.is_empty() {
                                "?".to_string()
                            } else {
                                meta.kind
                            },
                            summary: meta.summary,
                            state,
                        },
                    ));
                }
            }
        }
        rows.sort_by(|a, b| a.0.cmp(&b.0));
        rows.into_iter().map(|(_n, r)| r).collect()
    }

    /// Read a message's full content (any state directory).
    pub fn open_message(&self, to_base: &str, msg_id: &str) -> Result<String, TeamError> {
        let (_state, _from, path) = inbox::find_message(self.team(), to_base, msg_id)
            .ok_or_else(|| TeamError::NotFound(format!("message not found in inbox: {}", msg_id)))?;
        Ok(std::fs::read_to_string(path)?)
    }

    /// Ack a message (rename to `read/`).
    pub fn ack_message(&self, to_base: &str, msg_id: &str) -> Result<(), TeamError> {
        inbox::mark_read(self.team(), to_base, msg_id)?
            .map(|_| ())
            .ok_or_else(|| TeamError::NotFound(format!("message not found: {}", msg_id)))
    }

    /// Per-thread pending counts from one sender to one recipient.
    pub fn pending_between(&self, from_base: &str, to_base: &str) -> (usize, usize) {
        let count = |state: InboxState| {
            let dir = self
                .team()
                .inbox_member_dir(to_base)
                .join(state.dir_name())
                .join(format!("from-{}", atwf_core::slugify(from_base)));
            inbox::list_thread_msgs(&dir).len()
        };
        (count(InboxState::Unread), count(InboxState::Overflow))
    }

    /// Refresh a worker's own inbox bookkeeping after a check.
    pub fn record_inbox_check(&self, member: &Member) -> Result<(), TeamError> {
        let now = self.now();
        let (unread, overflow, _ids) = inbox::unread_stats(self.team(), member.base_name());
        agent_state::update(
            self.team(),
            &member.full,
            member.base_name(),
            member.role_name(),
            now,
            |record| {
                record.last_inbox_check_at = format_iso(now);
                record.last_inbox_unread = unread as u32;
                record.last_inbox_overflow = overflow as u32;
                Ok(())
            },
        )?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "inbox_ops_tests.rs"]
mod tests;
