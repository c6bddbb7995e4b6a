// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Timestamp formatting and duration parsing.
//!
//! Every timestamp on disk is a local ISO-8601 string with second precision.
//! Readers parse once into `NaiveDateTime` and compare instants; nothing in
//! the workspace compares unparsed strings.

use chrono::NaiveDateTime;

const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Format a timestamp the way the state tree stores it.
pub fn format_iso(dt: NaiveDateTime) -> String {
    dt.format(ISO_FORMAT).to_string()
}

/// Parse a stored timestamp. Empty or malformed input yields `None`.
pub fn parse_iso(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    NaiveDateTime::parse_from_str(s, ISO_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
}

/// Seconds from `a` to `b` (negative when `b` is earlier).
pub fn secs_between(a: NaiveDateTime, b: NaiveDateTime) -> f64 {
    (b - a).num_milliseconds() as f64 / 1000.0
}

/// Parse a human duration like `90`, `2.5m`, `1h`, `1d` into seconds.
///
/// Unknown units and malformed input fall back to `default_s`.
pub fn parse_duration_secs(raw: &str, default_s: f64) -> f64 {
    let s = raw.trim();
    if s.is_empty() {
        return default_s;
    }
    let split = s
        .char_indices()
        .find(|(_, c)| c.is_ascii_alphabetic())
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    let (num, unit) = s.split_at(split);
    let Ok(n) = num.trim().parse::<f64>() else {
        return default_s;
    };
    match unit.trim().to_ascii_lowercase().as_str() {
        "" | "s" | "sec" | "secs" | "second" | "seconds" => n,
        "m" | "min" | "mins" | "minute" | "minutes" => n * 60.0,
        "h" | "hr" | "hrs" | "hour" | "hours" => n * 3600.0,
        "d" | "day" | "days" => n * 86400.0,
        _ => default_s,
    }
}

#[cfg(test)]
#[path = "time_tests.rs"]
mod tests;
