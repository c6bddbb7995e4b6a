use super::*;
use serde_json::json;

fn settings_from(value: serde_json::Value) -> Settings {
    let cfg = Config::from_value(value);
    let policy = TeamPolicy::from_config(&cfg).unwrap();
    Settings::load(&cfg, &policy)
}

#[test]
fn defaults() {
    let s = settings_from(json!({}));
    assert_eq!(s.max_unread_per_thread, 5);
    assert_eq!(s.watch_interval_s, 20.0);
    assert_eq!(s.capture_lines, 600);
    assert_eq!(s.drive_driver_role, "coord");
    assert_eq!(s.drive_backup_role, "admin");
    assert_eq!(s.drive_unit_role, "admin");
    assert!(s.auto_enter_enabled);
    assert!(!s.auto_enter_patterns.is_empty());
}

#[test]
fn max_unread_clamps_to_bounds() {
    let low = settings_from(json!({
        "team": {"messaging": {"inbox": {"max_unread_per_thread": 0}}}
    }));
    assert_eq!(low.max_unread_per_thread, 1);
    let high = settings_from(json!({
        "team": {"messaging": {"inbox": {"max_unread_per_thread": 200}}}
    }));
    assert_eq!(high.max_unread_per_thread, 100);
}

#[test]
fn durations_clamp() {
    let s = settings_from(json!({
        "team": {
            "state": {"watch_interval": 1, "activity_window": 99999, "auto_enter": {"cooldown": 0}},
            "reply": {"deadline": 10, "blocked_snooze": 5}
        }
    }));
    assert_eq!(s.watch_interval_s, 5.0);
    assert_eq!(s.activity_window_s, 3600.0);
    // Zero auto-enter cooldown is valid: it disables rate limiting.
    assert_eq!(s.auto_enter_cooldown_s, 0.0);
    assert_eq!(s.reply_deadline_s, 60.0);
    assert_eq!(s.reply_blocked_snooze_s, 30.0);
}

#[test]
fn unknown_roles_fall_back() {
    let s = settings_from(json!({
        "team": {"drive": {"driver_role": "boss", "backup_role": "boss", "unit_role": "boss"}}
    }));
    assert_eq!(s.drive_driver_role, "coord");
    assert_eq!(s.drive_backup_role, "coord");
    assert_eq!(s.drive_unit_role, "");
}

#[test]
fn empty_unit_role_disables_subtree_drive() {
    let s = settings_from(json!({"team": {"drive": {"unit_role": ""}}}));
    assert_eq!(s.drive_unit_role, "");
}

#[test]
fn drive_mode_hot_reads_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "team:\n  drive:\n    mode: standby\n").unwrap();
    assert_eq!(drive_mode_hot(&path), DriveMode::Standby);
    std::fs::write(&path, "team:\n  drive:\n    mode: running\n").unwrap();
    assert_eq!(drive_mode_hot(&path), DriveMode::Running);
}

#[test]
fn drive_mode_hot_falls_back_to_enabled_flag() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "team:\n  drive:\n    enabled: false\n").unwrap();
    assert_eq!(drive_mode_hot(&path), DriveMode::Standby);
    assert_eq!(drive_mode_hot(&dir.path().join("missing.yaml")), DriveMode::Running);
}
