use super::*;
use atwf_core::time::parse_iso;

fn now() -> chrono::NaiveDateTime {
    parse_iso("2026-03-01T12:00:00").unwrap()
}

fn team() -> (tempfile::TempDir, TeamDir) {
    let dir = tempfile::tempdir().unwrap();
    let team = TeamDir::new(dir.path().join("share"));
    team.ensure_layout().unwrap();
    (dir, team)
}

const FULL: &str = "dev-a-20260301-120000-1";

#[test]
fn missing_record_materializes_with_defaults() {
    let (_dir, team) = team();
    let record = update(&team, FULL, "dev-a", "dev", now(), |_r| Ok(())).unwrap();
    assert_eq!(record.status, AgentStatus::Working);
    assert_eq!(record.status_source, "init");
    assert_eq!(record.full, FULL);
    assert_eq!(record.base, "dev-a");
    assert!(team.agent_state_path(FULL).is_file());
}

#[test]
fn update_persists_mutations() {
    let (_dir, team) = team();
    update(&team, FULL, "dev-a", "dev", now(), |r| {
        r.status = AgentStatus::Idle;
        r.status_source = "watch".into();
        r.idle_since = "2026-03-01T12:00:00".into();
        Ok(())
    })
    .unwrap();
    let record = read(&team, FULL).unwrap().unwrap();
    assert_eq!(record.status, AgentStatus::Idle);
    assert_eq!(record.idle_since, "2026-03-01T12:00:00");
    assert_eq!(record.updated_at, "2026-03-01T12:00:00");
}

#[test]
fn legacy_alias_status_reads_back() {
    let (_dir, team) = team();
    update(&team, FULL, "dev-a", "dev", now(), |_r| Ok(())).unwrap();
    // Simulate a hand-edited legacy record.
    let path = team.agent_state_path(FULL);
    let raw = std::fs::read_to_string(&path)
        .unwrap()
        .replace("\"working\"", "\"busy\"");
    std::fs::write(&path, raw).unwrap();
    let record = read(&team, FULL).unwrap().unwrap();
    assert_eq!(record.status, AgentStatus::Working);
}

#[test]
fn mutate_error_leaves_file_untouched() {
    let (_dir, team) = team();
    update(&team, FULL, "dev-a", "dev", now(), |r| {
        r.wakeup_reason = "inbox_pending:1+0".into();
        Ok(())
    })
    .unwrap();
    let before = std::fs::read_to_string(team.agent_state_path(FULL)).unwrap();
    let err = update(&team, FULL, "dev-a", "dev", now(), |_r| {
        Err(atwf_core::TeamError::StateConflict("nope".into()))
    })
    .unwrap_err();
    assert!(matches!(err, atwf_core::TeamError::StateConflict(_)));
    let after = std::fs::read_to_string(team.agent_state_path(FULL)).unwrap();
    assert_eq!(before, after);
}

#[test]
fn clear_wake_schedule_keeps_sent_history() {
    let (_dir, team) = team();
    let record = update(&team, FULL, "dev-a", "dev", now(), |r| {
        r.wakeup_scheduled_at = "2026-03-01T12:00:00".into();
        r.wakeup_due_at = "2026-03-01T12:00:30".into();
        r.wakeup_reason = "inbox_pending:1+0".into();
        r.wakeup_sent_at = "2026-03-01T11:00:00".into();
        r.clear_wake_schedule();
        Ok(())
    })
    .unwrap();
    assert!(record.wakeup_due_at.is_empty());
    assert!(record.wakeup_reason.is_empty());
    assert_eq!(record.wakeup_sent_at, "2026-03-01T11:00:00");
}
