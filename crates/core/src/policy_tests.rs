use super::*;
use serde_json::json;

fn policy_from(json: serde_json::Value) -> TeamPolicy {
    TeamPolicy::from_config(&Config::from_value(json)).unwrap()
}

#[test]
fn defaults_when_config_empty() {
    let p = policy_from(json!({}));
    assert_eq!(p.root_role, "coord");
    assert_eq!(
        p.enabled_roles.iter().cloned().collect::<Vec<_>>(),
        vec!["admin", "coord", "dev"]
    );
    assert!(p.comm_allow_parent_child);
    assert!(p.comm_require_handoff);
    assert!(p.broadcast_allowed_roles.contains("coord"));
    assert!(p.comm_handoff_creators.contains("coord"));
    assert!(p.can_hire("coord", "admin"));
    assert!(p.can_hire("admin", "dev"));
    assert!(!p.can_hire("dev", "admin"));
    // Every enabled role has a (possibly empty) direct-allow entry.
    for role in &p.enabled_roles {
        assert!(p.comm_direct_allow.contains_key(role));
    }
}

#[test]
fn root_role_must_be_enabled() {
    let err = TeamPolicy::from_config(&Config::from_value(json!({
        "team": {"policy": {"root_role": "boss", "enabled_roles": ["coord", "dev"]}}
    })))
    .unwrap_err();
    assert!(matches!(err, TeamError::PolicyDenied(_)));
}

#[test]
fn direct_allow_is_symmetric() {
    let p = policy_from(json!({
        "team": {"policy": {"comm": {"direct_allow": {"admin": ["dev"]}}}}
    }));
    assert!(p.comm_direct_allow["admin"].contains("dev"));
    assert!(p.comm_direct_allow["dev"].contains("admin"));
}

#[test]
fn direct_allow_pairs_merge_into_closure() {
    let p = policy_from(json!({
        "team": {"policy": {"comm": {"direct_allow_pairs": [["dev", "dev"], ["coord", "admin"]]}}}
    }));
    assert!(p.comm_direct_allow["dev"].contains("dev"));
    assert!(p.comm_direct_allow["admin"].contains("coord"));
}

#[test]
fn disabled_roles_are_filtered_everywhere() {
    let p = policy_from(json!({
        "team": {"policy": {
            "enabled_roles": ["coord", "dev"],
            "can_hire": {"coord": ["admin", "dev"], "admin": ["dev"]},
            "broadcast": {"allowed_roles": ["coord", "admin"]},
            "comm": {"direct_allow": {"admin": ["dev"]}}
        }}
    }));
    assert!(!p.enabled_roles.contains("admin"));
    assert_eq!(
        p.can_hire["coord"].iter().cloned().collect::<Vec<_>>(),
        vec!["dev"]
    );
    assert!(!p.can_hire.contains_key("admin"));
    assert!(!p.broadcast_allowed_roles.contains("admin"));
    assert!(p.comm_direct_allow["dev"].is_empty());
}

#[test]
fn roles_accept_comma_separated_strings() {
    let p = policy_from(json!({
        "team": {"policy": {"enabled_roles": "coord, dev"}}
    }));
    assert_eq!(p.enabled_roles.len(), 2);
    assert!(p.enabled_roles.contains("dev"));
}

#[test]
fn require_role_normalizes_case() {
    let p = policy_from(json!({}));
    assert_eq!(p.require_role(" Dev ").unwrap(), "dev");
    assert!(matches!(
        p.require_role("qa"),
        Err(TeamError::InvalidInput(_))
    ));
}
