//! Messaging surface: send, comm gate, handoff, intents, receipts, inbox.

use crate::prelude::*;

#[test]
fn send_denied_between_siblings_then_healed_by_handoff() {
    let team = Team::seeded();
    team.atwf()
        .args(&["send", "dev-d", "hi", "--as", "dev-c"])
        .fails()
        .code(1)
        .stderr_has("handoff required for dev->dev")
        .stderr_has("request a handoff via `coord`");

    team.atwf()
        .args(&[
            "handoff", "dev-c", "dev-d", "--as", "coord", "--ttl", "1h", "--reason", "pairing",
        ])
        .passes()
        .stdout_has("handoff-");

    let msg_id = team.stdout(&["send", "dev-d", "hi", "--as", "dev-c"]);
    assert!(team.has_file(&format!("inbox/dev-d/unread/from-dev-c/{}.md", msg_id)));
}

#[test]
fn parent_child_send_lands_in_unread() {
    let team = Team::seeded();
    let msg_id = team.stdout(&["send", "dev-c", "please review", "--as", "admin-b"]);
    assert_eq!(msg_id, "000001");
    let body = team.read_file("inbox/dev-c/unread/from-admin-b/000001.md");
    assert!(body.contains("- kind: `send`"));
    assert!(body.contains("- summary: please review"));
    assert!(body.ends_with("please review\n"));
}

#[test]
fn empty_message_is_rejected() {
    let team = Team::seeded();
    team.atwf()
        .args(&["send", "dev-c", "   ", "--as", "admin-b"])
        .fails()
        .stderr_has("empty message");
}

#[test]
fn handoff_dry_run_writes_nothing() {
    let team = Team::seeded();
    team.atwf()
        .args(&["handoff", "dev-c", "dev-d", "--as", "coord", "--dry-run"])
        .passes()
        .stdout_has("permit_exists: false")
        .stdout_has("permit_id: (would-create)");
    assert!(!team.read_file("registry.json").contains("handoff-"));
}

#[test]
fn handoff_requires_creator_role() {
    let team = Team::seeded();
    team.atwf()
        .args(&["handoff", "dev-c", "dev-d", "--as", "admin-b"])
        .fails()
        .stderr_has("handoff not permitted");
}

#[test]
fn broadcast_notice_by_role_shares_one_id() {
    let team = Team::seeded();
    let msg_id = team.stdout(&[
        "notice", "--role", "dev", "--message", "all hands", "--as", "coord",
    ]);
    assert!(team.has_file(&format!("inbox/dev-c/unread/from-coord/{}.md", msg_id)));
    assert!(team.has_file(&format!("inbox/dev-d/unread/from-coord/{}.md", msg_id)));
}

#[test]
fn broadcast_denied_for_non_allowed_roles() {
    let team = Team::seeded();
    team.atwf()
        .args(&["notice", "--role", "dev", "--message", "x", "--as", "admin-b"])
        .fails()
        .stderr_has("broadcast not permitted");
}

#[test]
fn thread_backpressure_moves_surplus_to_overflow() {
    let team = Team::seeded();
    team.write_config("team:\n  messaging:\n    inbox:\n      max_unread_per_thread: 2\n");
    for i in 0..4 {
        team.stdout(&["send", "dev-c", &format!("msg {}", i), "--as", "admin-b"]);
    }
    let out = team.stdout(&["inbox", "--target", "dev-c"]);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("000001"));
    assert!(lines[0].ends_with("overflow"));
    assert!(lines[1].ends_with("overflow"));
    assert!(!lines[3].ends_with("overflow"));
    assert!(team.has_file("inbox/dev-c/overflow/from-admin-b/000001.md"));
}

#[test]
fn inbox_open_and_ack_move_to_read() {
    let team = Team::seeded();
    let msg_id = team.stdout(&["send", "dev-c", "read me", "--as", "admin-b"]);
    team.atwf()
        .args(&["inbox-open", &msg_id, "--target", "dev-c"])
        .passes()
        .stdout_has("read me");
    // Open with --target does not ack.
    assert!(team.has_file(&format!("inbox/dev-c/unread/from-admin-b/{}.md", msg_id)));

    team.atwf()
        .args(&["inbox-ack", &msg_id, "--target", "dev-c"])
        .passes()
        .stdout_has("OK");
    assert!(team.has_file(&format!("inbox/dev-c/read/from-admin-b/{}.md", msg_id)));
    // Idempotent.
    team.atwf()
        .args(&["inbox-ack", &msg_id, "--target", "dev-c"])
        .passes();
    assert_eq!(team.stdout(&["inbox", "--target", "dev-c"]), "(empty)");
}

#[test]
fn inbox_pending_counts_one_thread() {
    let team = Team::seeded();
    team.stdout(&["send", "dev-c", "one", "--as", "admin-b"]);
    team.stdout(&["send", "dev-c", "two", "--as", "admin-b"]);
    assert_eq!(
        team.stdout(&["inbox-pending", "dev-c", "--as", "admin-b"]),
        "unread=2 overflow=0"
    );
    assert_eq!(
        team.stdout(&["inbox-pending", "dev-c", "--as", "coord"]),
        "unread=0 overflow=0"
    );
}

#[test]
fn receipts_order_unread_read_missing() {
    let team = Team::seeded();
    let msg_id = team.stdout(&[
        "notice", "--role", "dev", "--message", "fyi", "--as", "coord",
    ]);
    team.atwf()
        .args(&["inbox-ack", &msg_id, "--target", "dev-c"])
        .passes();
    let out = team.stdout(&["receipts", &msg_id]);
    let lines: Vec<&str> = out.lines().collect();
    assert!(lines[0].starts_with("unread\tdev\tdev-d"));
    assert!(lines[1].starts_with("read\tdev\tdev-c"));
    // Non-recipients (coord, admin) report missing.
    assert!(lines[2].starts_with("missing\t"));
    assert!(lines[3].starts_with("missing\t"));
}

#[test]
fn message_ids_are_monotonic_across_sender_threads() {
    let team = Team::seeded();
    let a = team.stdout(&["send", "dev-c", "a", "--as", "admin-b"]);
    let b = team.stdout(&["send", "dev-d", "b", "--as", "admin-b"]);
    let c = team.stdout(&["send", "admin-b", "c", "--as", "coord"]);
    assert!(a < b && b < c);
}
