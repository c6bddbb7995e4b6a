use super::*;
use yare::parameterized;

#[parameterized(
    working = { "working", AgentStatus::Working },
    busy_alias = { "busy", AgentStatus::Working },
    work_alias = { "work", AgentStatus::Working },
    draining = { "draining", AgentStatus::Draining },
    drain_alias = { "drain", AgentStatus::Draining },
    idle = { "idle", AgentStatus::Idle },
    standby_alias = { "standby", AgentStatus::Idle },
    mixed_case = { " Working ", AgentStatus::Working },
)]
fn agent_status_aliases(raw: &str, expected: AgentStatus) {
    assert_eq!(AgentStatus::parse(raw), Some(expected));
}

#[test]
fn agent_status_unknown_is_none() {
    assert_eq!(AgentStatus::parse("napping"), None);
}

#[test]
fn agent_status_deserialize_coerces_unknown_to_working() {
    let status: AgentStatus = serde_json::from_str("\"napping\"").unwrap();
    assert_eq!(status, AgentStatus::Working);
}

#[parameterized(
    running = { "running", DriveMode::Running },
    on = { "on", DriveMode::Running },
    one = { "1", DriveMode::Running },
    standby = { "standby", DriveMode::Standby },
    off = { "off", DriveMode::Standby },
    false_word = { "false", DriveMode::Standby },
)]
fn drive_mode_spellings(raw: &str, expected: DriveMode) {
    assert_eq!(DriveMode::parse(raw), Some(expected));
}

#[test]
fn request_status_serializes_snake_case() {
    assert_eq!(
        serde_json::to_string(&RequestStatus::TimedOut).unwrap(),
        "\"timed_out\""
    );
    let back: RequestStatus = serde_json::from_str("\"timed_out\"").unwrap();
    assert_eq!(back, RequestStatus::TimedOut);
}

#[test]
fn request_status_finality() {
    assert!(!RequestStatus::Open.is_final());
    assert!(RequestStatus::Done.is_final());
    assert!(RequestStatus::TimedOut.is_final());
}

#[test]
fn target_status_round_trip() {
    for status in [TargetStatus::Pending, TargetStatus::Replied, TargetStatus::Blocked] {
        let json = serde_json::to_string(&status).unwrap();
        let back: TargetStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, status);
    }
}
