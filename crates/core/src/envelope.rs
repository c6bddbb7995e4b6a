// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The CLI injection envelope.
//!
//! Recipient templates parse these frames byte-for-byte; the format is a
//! wire contract and must stay stable:
//!
//! ```text
//! [ATWF-MSG id=<id> kind=<kind> from=<full> to=<full> role=<role> ts=<iso>]
//! <body>
//! [ATWF-END id=<id>]
//! ```

/// Frame a message body for injection into a worker's terminal.
///
/// `role` is omitted from the header when the sender has none. An empty body
/// collapses to header + end marker.
pub fn wrap_team_message(
    msg_id: &str,
    kind: &str,
    sender_full: &str,
    sender_role: Option<&str>,
    to_full: &str,
    ts: &str,
    body: &str,
) -> String {
    let id = msg_id.trim();
    let kind = {
        let k = kind.trim();
        if k.is_empty() {
            "send"
        } else {
            k
        }
    };
    let from = {
        let f = sender_full.trim();
        if f.is_empty() {
            "unknown"
        } else {
            f
        }
    };
    let to = {
        let t = to_full.trim();
        if t.is_empty() {
            "unknown"
        } else {
            t
        }
    };
    let role_part = match sender_role.map(str::trim) {
        Some(r) if !r.is_empty() => format!(" role={}", r),
        _ => String::new(),
    };
    let header = format!(
        "[ATWF-MSG id={} kind={} from={} to={}{} ts={}]",
        id, kind, from, to, role_part, ts
    );
    let body = body.trim_end();
    if body.is_empty() {
        format!("{}\n[ATWF-END id={}]\n", header, id)
    } else {
        format!("{}\n{}\n[ATWF-END id={}]\n", header, body, id)
    }
}

/// The short notice injected when a new inbox message lands.
pub fn inbox_notice(msg_id: &str) -> String {
    let id = msg_id.trim();
    format!(
        "[INBOX] id={id}\nopen (auto-read self): atwf inbox-open {id}\nack (optional): atwf inbox-ack {id}\n"
    )
}

#[cfg(test)]
#[path = "envelope_tests.rs"]
mod tests;
