// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clamped settings snapshot.
//!
//! Everything here is read once (CLI startup or watcher startup) and cached.
//! The single exception is the drive mode: [`drive_mode_hot`] re-reads the
//! config file so an operator can flip `team.drive.mode` under a running
//! watcher. Changing any other key requires a watcher restart.

use crate::config::Config;
use crate::policy::TeamPolicy;
use crate::status::DriveMode;
use std::path::Path;

pub const INBOX_MAX_UNREAD_DEFAULT: i64 = 5;
pub const WATCH_INTERVAL_DEFAULT: f64 = 20.0;
pub const ACTIVITY_WINDOW_DEFAULT: f64 = 90.0;
pub const IDLE_WAKE_DELAY_DEFAULT: f64 = 30.0;
pub const ACTIVE_GRACE_PERIOD_DEFAULT: f64 = 120.0;
pub const CAPTURE_LINES_DEFAULT: i64 = 600;
pub const WORKING_STALE_THRESHOLD_DEFAULT: f64 = 900.0;
pub const WORKING_ALERT_COOLDOWN_DEFAULT: f64 = 1800.0;
pub const AUTO_ENTER_COOLDOWN_DEFAULT: f64 = 45.0;
pub const AUTO_ENTER_TAIL_LINES_DEFAULT: i64 = 80;
pub const DRIVE_COOLDOWN_DEFAULT: f64 = 600.0;
pub const DRIVE_BACKUP_ROLE_DEFAULT: &str = "admin";
pub const DRIVE_UNIT_ROLE_DEFAULT: &str = "admin";
pub const REPLY_DEADLINE_DEFAULT: f64 = 1800.0;
pub const REPLY_SNOOZE_DEFAULT: f64 = 900.0;

pub const WAKE_MESSAGE_DEFAULT: &str = "[WAKE] inbox pending. Run: atwf inbox, then atwf inbox-open <id> for each entry. If you are mid-task, finish the current step first.";
pub const REPLY_WAKE_MESSAGE_DEFAULT: &str = "[WAKE] a reply-needed request is waiting on you. Run: atwf reply-needed, then atwf respond <request-id> \"<answer>\" (or --blocked with a reason).";

const AUTO_ENTER_PATTERNS_DEFAULT: &[&str] = &[
    "Press Enter to continue",
    "press enter to send",
    "Continue? [y/N]",
];

fn clamp(n: f64, lo: f64, hi: f64) -> f64 {
    n.clamp(lo, hi)
}

fn clamp_i(n: i64, lo: i64, hi: i64) -> i64 {
    n.clamp(lo, hi)
}

/// Cached, clamped settings for one process lifetime.
#[derive(Debug, Clone)]
pub struct Settings {
    pub max_unread_per_thread: usize,

    pub watch_interval_s: f64,
    pub activity_window_s: f64,
    pub idle_wake_delay_s: f64,
    pub active_grace_period_s: f64,
    pub capture_lines: u32,
    pub working_stale_threshold_s: f64,
    pub working_alert_cooldown_s: f64,
    pub wake_message: String,
    pub reply_wake_message: String,

    pub auto_enter_enabled: bool,
    pub auto_enter_cooldown_s: f64,
    pub auto_enter_tail_lines: usize,
    pub auto_enter_patterns: Vec<String>,

    pub drive_cooldown_s: f64,
    pub drive_driver_role: String,
    pub drive_backup_role: String,
    /// Empty disables subtree drive (legacy whole-team drive runs instead).
    pub drive_unit_role: String,

    pub reply_deadline_s: f64,
    pub reply_blocked_snooze_s: f64,
}

impl Settings {
    pub fn load(cfg: &Config, policy: &TeamPolicy) -> Self {
        let max_unread = clamp_i(
            cfg.get_i64(
                &["team", "messaging", "inbox", "max_unread_per_thread"],
                INBOX_MAX_UNREAD_DEFAULT,
            ),
            1,
            100,
        ) as usize;

        let norm_enabled_role = |raw: String, fallback: &str| -> String {
            let r = raw.trim().to_ascii_lowercase();
            if !r.is_empty() && policy.enabled_roles.contains(&r) {
                r
            } else {
                fallback.to_string()
            }
        };

        let driver_role = norm_enabled_role(
            cfg.get_str(&["team", "drive", "driver_role"], &policy.root_role),
            &policy.root_role,
        );
        let backup_role = norm_enabled_role(
            cfg.get_str(&["team", "drive", "backup_role"], DRIVE_BACKUP_ROLE_DEFAULT),
            &policy.root_role,
        );
        let unit_role = {
            let raw = cfg
                .get_str(&["team", "drive", "unit_role"], DRIVE_UNIT_ROLE_DEFAULT)
                .trim()
                .to_ascii_lowercase();
            if raw.is_empty() || !policy.enabled_roles.contains(&raw) {
                String::new()
            } else {
                raw
            }
        };

        let patterns: Vec<String> = {
            let raw = cfg.get_str_list(
                &["team", "state", "auto_enter", "patterns"],
                AUTO_ENTER_PATTERNS_DEFAULT,
            );
            let mut out: Vec<String> = Vec::new();
            for p in raw {
                if !p.is_empty() && !out.contains(&p) {
                    out.push(p);
                }
            }
            out
        };

        Self {
            max_unread_per_thread: max_unread,
            watch_interval_s: clamp(
                cfg.get_f64(&["team", "state", "watch_interval"], WATCH_INTERVAL_DEFAULT),
                5.0,
                3600.0,
            ),
            activity_window_s: clamp(
                cfg.get_f64(&["team", "state", "activity_window"], ACTIVITY_WINDOW_DEFAULT),
                10.0,
                3600.0,
            ),
            idle_wake_delay_s: clamp(
                cfg.get_f64(&["team", "state", "idle_wake_delay"], IDLE_WAKE_DELAY_DEFAULT),
                5.0,
                3600.0,
            ),
            active_grace_period_s: clamp(
                cfg.get_f64(
                    &["team", "state", "active_grace_period"],
                    ACTIVE_GRACE_PERIOD_DEFAULT,
                ),
                0.0,
                3600.0,
            ),
            capture_lines: clamp_i(
                cfg.get_i64(
                    &["team", "state", "activity_capture_lines"],
                    CAPTURE_LINES_DEFAULT,
                ),
                20,
                5000,
            ) as u32,
            working_stale_threshold_s: clamp(
                cfg.get_f64(
                    &["team", "state", "working_stale_threshold"],
                    WORKING_STALE_THRESHOLD_DEFAULT,
                ),
                0.0,
                86400.0,
            ),
            working_alert_cooldown_s: clamp(
                cfg.get_f64(
                    &["team", "state", "working_alert_cooldown"],
                    WORKING_ALERT_COOLDOWN_DEFAULT,
                ),
                0.0,
                86400.0,
            ),
            wake_message: {
                let raw = cfg.get_str(&["team", "state", "wake_message"], WAKE_MESSAGE_DEFAULT);
                if raw.is_empty() {
                    WAKE_MESSAGE_DEFAULT.to_string()
                } else {
                    raw
                }
            },
            reply_wake_message: {
                let raw = cfg.get_str(
                    &["team", "state", "reply_wake_message"],
                    REPLY_WAKE_MESSAGE_DEFAULT,
                );
                if raw.is_empty() {
                    REPLY_WAKE_MESSAGE_DEFAULT.to_string()
                } else {
                    raw
                }
            },
            auto_enter_enabled: cfg.get_bool(&["team", "state", "auto_enter", "enabled"], true),
            auto_enter_cooldown_s: clamp(
                cfg.get_f64(
                    &["team", "state", "auto_enter", "cooldown"],
                    AUTO_ENTER_COOLDOWN_DEFAULT,
                ),
                0.0,
                3600.0,
            ),
            auto_enter_tail_lines: clamp_i(
                cfg.get_i64(
                    &["team", "state", "auto_enter", "tail_window_lines"],
                    AUTO_ENTER_TAIL_LINES_DEFAULT,
                ),
                10,
                1000,
            ) as usize,
            auto_enter_patterns: patterns,
            drive_cooldown_s: clamp(
                cfg.get_f64(&["team", "drive", "cooldown"], DRIVE_COOLDOWN_DEFAULT),
                0.0,
                86400.0,
            ),
            drive_driver_role: driver_role,
            drive_backup_role: backup_role,
            drive_unit_role: unit_role,
            reply_deadline_s: clamp(
                cfg.get_f64(&["team", "reply", "deadline"], REPLY_DEADLINE_DEFAULT),
                60.0,
                86400.0,
            ),
            reply_blocked_snooze_s: clamp(
                cfg.get_f64(&["team", "reply", "blocked_snooze"], REPLY_SNOOZE_DEFAULT),
                30.0,
                86400.0,
            ),
        }
    }
}

/// Re-read `team.drive.mode` from the config file.
///
/// This is the only hot config key: the watcher calls it once per tick.
/// A missing key falls back to the boolean `team.drive.enabled`, then to
/// running.
pub fn drive_mode_hot(config_path: &Path) -> DriveMode {
    let cfg = Config::load(config_path);
    let raw = cfg.get_str(&["team", "drive", "mode"], "");
    if !raw.is_empty() {
        if let Some(mode) = DriveMode::parse(&raw) {
            return mode;
        }
    }
    if cfg.get_bool(&["team", "drive", "enabled"], true) {
        DriveMode::Running
    } else {
        DriveMode::Standby
    }
}

#[cfg(test)]
#[path = "settings_tests.rs"]
mod tests;
