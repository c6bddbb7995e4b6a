use super::*;
use atwf_core::{Config, Member};
use serde_json::json;

fn now() -> NaiveDateTime {
    parse_iso("2026-03-01T12:00:00").unwrap()
}

fn member(full: &str, base: &str, role: &str, parent: Option<&str>) -> Member {
    Member {
        full: full.into(),
        base: base.into(),
        role: role.into(),
        scope: String::new(),
        parent: parent.map(str::to_string),
        children: Vec::new(),
        state_file: String::new(),
        created_at: "2026-03-01T11:00:00".into(),
        updated_at: "2026-03-01T11:00:00".into(),
    }
}

const COORD: &str = "coord-20260301-110000-1";
const ADMIN: &str = "admin-b-20260301-110100-2";
const DEV_C: &str = "dev-c-20260301-110200-3";
const DEV_D: &str = "dev-d-20260301-110300-4";

fn registry() -> Registry {
    Registry {
        members: vec![
            member(COORD, "coord", "coord", None),
            member(ADMIN, "admin-b", "admin", Some(COORD)),
            member(DEV_C, "dev-c", "dev", Some(ADMIN)),
            member(DEV_D, "dev-d", "dev", Some(ADMIN)),
        ],
        ..Registry::default()
    }
}

fn policy(value: serde_json::Value) -> TeamPolicy {
    TeamPolicy::from_config(&Config::from_value(value)).unwrap()
}

fn default_policy() -> TeamPolicy {
    policy(json!({}))
}

#[test]
fn self_is_always_allowed() {
    let reg = registry();
    assert_eq!(
        comm_allowed(&default_policy(), &reg, DEV_C, DEV_C, now()).unwrap(),
        "self"
    );
}

#[test]
fn unregistered_parties_are_denied() {
    let reg = registry();
    let p = default_policy();
    assert!(comm_allowed(&p, &reg, "ghost", DEV_C, now()).is_err());
    assert!(comm_allowed(&p, &reg, DEV_C, "ghost", now()).is_err());
}

#[test]
fn parent_child_is_allowed_both_ways() {
    let reg = registry();
    let p = default_policy();
    assert_eq!(comm_allowed(&p, &reg, ADMIN, DEV_C, now()).unwrap(), "parent-child");
    assert_eq!(comm_allowed(&p, &reg, DEV_C, ADMIN, now()).unwrap(), "parent-child");
}

#[test]
fn sibling_devs_need_a_handoff() {
    let reg = registry();
    let p = default_policy();
    let reason = comm_allowed(&p, &reg, DEV_C, DEV_D, now()).unwrap_err();
    assert!(reason.contains("handoff required for dev->dev"));
}

#[test]
fn denial_carries_heal_hint() {
    let reg = registry();
    let err = require_comm_allowed(&default_policy(), &reg, DEV_C, DEV_D, now()).unwrap_err();
    match err {
        TeamError::PolicyDenied(msg) => {
            assert!(msg.contains("handoff required for dev->dev"));
            assert!(msg.contains("request a handoff via `coord`"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn direct_allow_skips_handoff() {
    let reg = registry();
    let p = policy(json!({
        "team": {"policy": {"comm": {"direct_allow": {"dev": ["dev"]}}}}
    }));
    assert_eq!(comm_allowed(&p, &reg, DEV_C, DEV_D, now()).unwrap(), "direct-allow");
}

#[test]
fn wide_open_mode_allows_everything_registered() {
    let reg = registry();
    let p = policy(json!({
        "team": {"policy": {"comm": {"require_handoff": false}}}
    }));
    assert_eq!(
        comm_allowed(&p, &reg, DEV_C, DEV_D, now()).unwrap(),
        "handoff-not-required"
    );
}

#[test]
fn permit_heals_the_denial() {
    let mut reg = registry();
    let p = default_policy();
    assert!(comm_allowed(&p, &reg, DEV_C, DEV_D, now()).is_err());
    add_handoff_permit(&mut reg, "dev-c", "dev-d", COORD, "coord", "pairing", Some(3600), now(), 42)
        .unwrap();
    assert_eq!(comm_allowed(&p, &reg, DEV_C, DEV_D, now()).unwrap(), "handoff-permit");
    // Bidirectional.
    assert_eq!(comm_allowed(&p, &reg, DEV_D, DEV_C, now()).unwrap(), "handoff-permit");
}

#[test]
fn expired_permits_are_ignored_not_deleted() {
    let mut reg = registry();
    add_handoff_permit(&mut reg, "dev-c", "dev-d", COORD, "coord", "", Some(60), now(), 42)
        .unwrap();
    let later = parse_iso("2026-03-01T12:02:00").unwrap();
    assert!(!permit_allows(&reg, "dev-c", "dev-d", later));
    assert_eq!(reg.permits.len(), 1);
}

#[test]
fn permit_without_ttl_never_expires() {
    let mut reg = registry();
    add_handoff_permit(&mut reg, "dev-c", "dev-d", COORD, "coord", "", None, now(), 42).unwrap();
    let much_later = parse_iso("2027-01-01T00:00:00").unwrap();
    assert!(permit_allows(&reg, "dev-c", "dev-d", much_later));
}

#[test]
fn permit_endpoints_must_differ() {
    let mut reg = registry();
    assert!(matches!(
        add_handoff_permit(&mut reg, "dev-c", "dev-c", COORD, "coord", "", None, now(), 42),
        Err(TeamError::InvalidInput(_))
    ));
}

#[test]
fn disabled_role_is_denied_even_for_parent_child() {
    let mut reg = registry();
    reg.member_mut(DEV_C).unwrap().role = "qa".into();
    let reason = comm_allowed(&default_policy(), &reg, ADMIN, DEV_C, now()).unwrap_err();
    assert!(reason.contains("target role not enabled"));
}
