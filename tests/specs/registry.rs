//! Registry surface: init, register, prune, list, tree, resolve, policy.

use crate::prelude::*;
use serde_json::Value;

#[test]
fn init_creates_the_share_layout() {
    let team = Team::new();
    assert!(team.has_file("registry.json"));
    assert!(team.root().join("inbox").is_dir());
    assert!(team.root().join("requests").is_dir());
    assert!(team.root().join("state").is_dir());
    // Idempotent.
    team.atwf().args(&["init"]).passes();
}

#[test]
fn init_writes_task_body() {
    let team = Team::new();
    team.atwf()
        .args(&["init", "--task", "Build the widget"])
        .passes();
    assert_eq!(team.read_file("task.md"), "Build the widget\n");
}

#[test]
fn register_validates_full_name() {
    let team = Team::new();
    team.atwf()
        .args(&["register", "not-a-session-name", "--role", "coord"])
        .fails()
        .code(1)
        .stderr_has("\u{274c}")
        .stderr_has("malformed full name");
}

#[test]
fn register_requires_parent_for_non_root() {
    let team = Team::new();
    team.register(COORD, "coord", None);
    team.atwf()
        .args(&["register", DEV_C, "--role", "dev"])
        .fails()
        .stderr_has("--parent is required");
    team.register(ADMIN, "admin", Some(COORD));
    team.atwf()
        .args(&["register", DEV_C, "--role", "dev", "--parent", ADMIN])
        .passes();
}

#[test]
fn register_enforces_hire_policy() {
    let team = Team::new();
    team.register(COORD, "coord", None);
    // The default chart is coord->admin->dev: coord may not hire a dev.
    team.atwf()
        .args(&["register", DEV_C, "--role", "dev", "--parent", COORD])
        .fails()
        .stderr_has("policy.can_hire: coord cannot hire dev");
    // --force is the operator repair door.
    team.atwf()
        .args(&["register", DEV_C, "--role", "dev", "--parent", COORD, "--force"])
        .passes();
}

#[test]
fn register_rejects_unknown_roles() {
    let team = Team::new();
    team.atwf()
        .args(&["register", COORD, "--role", "boss"])
        .fails()
        .stderr_has("unsupported role");
}

#[test]
fn registry_json_has_parent_back_edges() {
    let team = Team::seeded();
    let reg: Value = serde_json::from_str(&team.read_file("registry.json")).unwrap();
    let members = reg["members"].as_array().unwrap();
    assert_eq!(members.len(), 4);
    let coord = members.iter().find(|m| m["full"] == COORD).unwrap();
    assert_eq!(
        coord["children"].as_array().unwrap(),
        &vec![Value::String(ADMIN.to_string())]
    );
    let dev = members.iter().find(|m| m["full"] == DEV_C).unwrap();
    assert_eq!(dev["parent"], ADMIN);
}

#[test]
fn list_is_tab_separated() {
    let team = Team::seeded();
    let out = team.stdout(&["list"]);
    let mut lines = out.lines();
    assert_eq!(lines.next().unwrap(), "full\trole\tbase\tparent\tscope");
    assert!(out.contains(&format!("{}\tdev\tdev-c\t{}", DEV_C, ADMIN)));
}

#[test]
fn tree_shows_the_org_chart() {
    let team = Team::seeded();
    let out = team.stdout(&["tree"]);
    assert!(out.contains(&format!("coord [coord] {}", COORD)));
    assert!(out.contains(&format!("  admin-b [admin] {}", ADMIN)));
    assert!(out.contains(&format!("    dev-c [dev] {}", DEV_C)));
}

#[test]
fn resolve_prefers_newest_base_match() {
    let team = Team::seeded();
    let newer = "dev-c-20260302-110200-9";
    team.register(newer, "dev", Some(ADMIN));
    let out = team.stdout(&["resolve", "dev-c"]);
    assert!(out.starts_with(newer));
    team.atwf()
        .args(&["resolve", "ghost"])
        .fails()
        .stderr_has("not found");
}

#[test]
fn prune_removes_duplicates_keeping_named_full() {
    let team = Team::seeded();
    let newer = "dev-c-20260302-110200-9";
    team.register(newer, "dev", Some(ADMIN));
    let removed = team.stdout(&["prune", "dev", "dev-c", "--keep", newer]);
    assert_eq!(removed, "1");
    let out = team.stdout(&["list"]);
    assert!(out.contains(newer));
    assert!(!out.contains(DEV_C));
}

#[test]
fn policy_reports_derived_rules() {
    let team = Team::new();
    let out = team.stdout(&["policy"]);
    assert!(out.contains("root_role\tcoord"));
    assert!(out.contains("enabled_roles\tadmin,coord,dev"));
    assert!(out.contains("comm.require_handoff\ttrue"));
    assert!(out.contains("can_hire.admin\tdev"));
}

#[test]
fn design_stub_round_trip() {
    let team = Team::seeded();
    let path = team.stdout(&["design-init", "dev-c"]);
    assert!(path.ends_with(&format!("design/{}.md", DEV_C)));
    assert!(team.read_file(&format!("design/{}.md", DEV_C)).contains("# Design - dev-c"));
    assert_eq!(team.stdout(&["design-path", "dev-c"]), path);
}
