//! Reply-needed surface: gather, respond, request, reply-needed.

use crate::prelude::*;
use serde_json::Value;

#[test]
fn gather_then_all_replies_finalizes_done() {
    let team = Team::seeded();
    let request_id = team.stdout(&[
        "gather", "dev-c", "dev-d", "--topic", "T", "--message", "M", "--deadline", "600",
        "--as", "admin-b",
    ]);
    assert_eq!(request_id, "req-000001");

    // Notifications consumed one id each, after the request id.
    assert!(team.has_file("inbox/dev-c/unread/from-admin-b/000002.md"));
    assert!(team.has_file("inbox/dev-d/unread/from-admin-b/000003.md"));
    let notify = team.read_file("inbox/dev-c/unread/from-admin-b/000002.md");
    assert!(notify.contains("[REPLY-NEEDED] request_id=req-000001"));
    assert!(notify.contains("atwf respond req-000001"));

    team.atwf()
        .args(&["respond", &request_id, "ok-c", "--as", "dev-c"])
        .passes()
        .stdout_has("req-000001\treplied");
    assert!(team.has_file("requests/req-000001/responses/dev-c.md"));
    // dev-c's notification was acked by responding.
    assert!(team.has_file("inbox/dev-c/read/from-admin-b/000002.md"));

    team.atwf()
        .args(&["respond", &request_id, "ok-d", "--as", "dev-d"])
        .passes()
        .stdout_has("finalized=");

    let meta: Value =
        serde_json::from_str(&team.read_file("requests/req-000001/meta.json")).unwrap();
    assert_eq!(meta["status"], "done");
    let final_id = meta["final_msg_id"].as_str().unwrap().to_string();
    assert_eq!(final_id, "000004");

    let result = team.read_file(&format!(
        "inbox/admin-b/unread/from-atwf-reply/{}.md",
        final_id
    ));
    assert!(result.contains("[REPLY-NEEDED RESULT]"));
    assert!(result.contains("Replied:"));
    assert!(result.contains("dev-c"));
    assert!(result.contains("dev-d"));
    assert!(!result.contains("Pending:"));
}

#[test]
fn respond_after_finalization_is_refused() {
    let team = Team::seeded();
    let request_id = team.stdout(&["gather", "dev-c", "--message", "M", "--as", "admin-b"]);
    team.atwf()
        .args(&["respond", &request_id, "done", "--as", "dev-c"])
        .passes();
    team.atwf()
        .args(&["respond", &request_id, "late", "--as", "dev-c"])
        .fails()
        .stderr_has("already finalized");
}

#[test]
fn blocked_response_snoozes_without_a_reply_file() {
    let team = Team::seeded();
    let request_id = team.stdout(&[
        "gather", "dev-c", "--message", "M", "--as", "admin-b",
    ]);
    team.atwf()
        .args(&[
            "respond",
            &request_id,
            "waiting on infra",
            "--blocked",
            "--snooze",
            "15m",
            "--waiting-on",
            "dev-d",
            "--as",
            "dev-c",
        ])
        .passes()
        .stdout_has("blocked\tuntil=");
    assert!(!team.has_file("requests/req-000001/responses/dev-c.md"));

    let meta: Value =
        serde_json::from_str(&team.read_file("requests/req-000001/meta.json")).unwrap();
    let target = &meta["targets"]["dev-c"];
    assert_eq!(target["status"], "blocked");
    assert_eq!(target["waiting_on"], "dev-d");
    assert_eq!(target["blocked_reason"], "waiting on infra");

    // Snoozed targets are annotated in the listing.
    team.atwf()
        .args(&["reply-needed", "--target", "dev-c"])
        .passes()
        .stdout_has("blocked(snoozed)");
}

#[test]
fn non_target_cannot_respond() {
    let team = Team::seeded();
    let request_id = team.stdout(&["gather", "dev-c", "--message", "M", "--as", "admin-b"]);
    team.atwf()
        .args(&["respond", &request_id, "nope", "--as", "dev-d"])
        .fails()
        .stderr_has("not a target");
}

#[test]
fn respond_accepts_numeric_id_spellings() {
    let team = Team::seeded();
    team.stdout(&["gather", "dev-c", "--message", "M", "--as", "admin-b"]);
    team.atwf()
        .args(&["respond", "1", "ok", "--as", "dev-c"])
        .passes()
        .stdout_has("req-000001");
}

#[test]
fn request_renders_current_status() {
    let team = Team::seeded();
    let request_id = team.stdout(&[
        "gather", "dev-c", "dev-d", "--topic", "T", "--message", "M", "--as", "admin-b",
    ]);
    team.atwf()
        .args(&["respond", &request_id, "ok", "--as", "dev-c"])
        .passes();
    team.atwf()
        .args(&["request", &request_id])
        .passes()
        .stdout_has("- request_id: req-000001")
        .stdout_has("- topic: T")
        .stdout_has("Replied:")
        .stdout_has("Pending:")
        .stdout_has("dev-d (role=dev status=pending)");
}

#[test]
fn gather_deadline_is_clamped_to_floor() {
    let team = Team::seeded();
    team.stdout(&[
        "gather", "dev-c", "--message", "M", "--deadline", "5", "--as", "admin-b",
    ]);
    let meta: Value =
        serde_json::from_str(&team.read_file("requests/req-000001/meta.json")).unwrap();
    assert_eq!(meta["deadline_s"], 60.0);
}

#[test]
fn unknown_request_is_not_found() {
    let team = Team::seeded();
    team.atwf()
        .args(&["request", "req-000042"])
        .fails()
        .stderr_has("request not found: req-000042");
}
