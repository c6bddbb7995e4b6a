use super::*;
use crate::testutil::{Fixture, ADMIN, DEV_C};
use atwf_core::time::parse_iso;
use atwf_storage::{inbox, requests};

#[tokio::test]
async fn gather_allocates_request_then_notify_ids() {
    let fx = Fixture::seeded();
    let engine = fx.engine();
    let request_id = engine
        .gather(
            Some("admin-b"),
            &["dev-c".to_string(), "dev-d".to_string()],
            Some("T"),
            "M",
            Some("600s"),
        )
        .await
        .unwrap();
    assert_eq!(request_id, "req-000001");

    let meta = requests::load_meta(engine.team(), &request_id).unwrap();
    assert_eq!(meta.status, atwf_core::RequestStatus::Open);
    assert_eq!(meta.topic, "T");
    assert_eq!(meta.deadline_s, 600.0);
    assert_eq!(meta.deadline_at, "2026-03-01T12:10:00");
    assert_eq!(meta.from.full, ADMIN);
    assert_eq!(meta.targets.len(), 2);
    assert_eq!(meta.targets["dev-c"].notify_msg_id, "000002");
    assert_eq!(meta.targets["dev-d"].notify_msg_id, "000003");

    // Notification files land in each target's unread thread from admin-b.
    let (_state, from, path) = inbox::find_message(engine.team(), "dev-c", "000002").unwrap();
    assert_eq!(from, "admin-b");
    let raw = std::fs::read_to_string(path).unwrap();
    assert!(raw.contains("[REPLY-NEEDED] request_id=req-000001"));
    assert!(raw.contains("atwf respond req-000001"));
    assert!(inbox::find_message(engine.team(), "dev-d", "000003").is_some());
}

#[tokio::test]
async fn gather_dedupes_and_drops_self() {
    let fx = Fixture::seeded();
    let engine = fx.engine();
    let request_id = engine
        .gather(
            Some("admin-b"),
            &[
                "dev-c".to_string(),
                DEV_C.to_string(),
                "admin-b".to_string(),
            ],
            None,
            "topic line\nbody",
            None,
        )
        .await
        .unwrap();
    let meta = requests::load_meta(engine.team(), &request_id).unwrap();
    assert_eq!(meta.targets.len(), 1);
    assert!(meta.targets.contains_key("dev-c"));
    // Default topic is the first non-empty message line.
    assert_eq!(meta.topic, "topic line");
}

#[tokio::test]
async fn gather_enforces_comm_gate() {
    let fx = Fixture::seeded();
    let err = fx
        .engine()
        .gather(Some("dev-c"), &["dev-d".to_string()], None, "M", None)
        .await
        .unwrap_err();
    assert!(matches!(err, atwf_core::TeamError::PolicyDenied(_)));
}

#[tokio::test]
async fn gather_clamps_deadline() {
    let fx = Fixture::seeded();
    let engine = fx.engine();
    let request_id = engine
        .gather(Some("admin-b"), &["dev-c".to_string()], None, "M", Some("5s"))
        .await
        .unwrap();
    let meta = requests::load_meta(engine.team(), &request_id).unwrap();
    assert_eq!(meta.deadline_s, 60.0);
}

#[tokio::test]
async fn respond_then_final_reply_finalizes_once() {
    let fx = Fixture::seeded();
    let engine = fx.engine();
    let request_id = engine
        .gather(
            Some("admin-b"),
            &["dev-c".to_string(), "dev-d".to_string()],
            Some("T"),
            "M",
            Some("600s"),
        )
        .await
        .unwrap();

    let first = engine
        .respond(Some("dev-c"), &request_id, "ok-c", false, None, "")
        .await
        .unwrap();
    assert!(!first.blocked);
    assert!(first.finalized_msg_id.is_none());

    let meta = requests::load_meta(engine.team(), &request_id).unwrap();
    assert_eq!(meta.targets["dev-c"].status, atwf_core::TargetStatus::Replied);
    assert!(meta.targets["dev-c"].response_file.contains("responses/dev-c.md"));
    // The notify message was acked.
    let (state, _from, _path) = inbox::find_message(engine.team(), "dev-c", "000002").unwrap();
    assert_eq!(state, atwf_storage::InboxState::Read);

    let second = engine
        .respond(Some("dev-d"), &request_id, "ok-d", false, None, "")
        .await
        .unwrap();
    let final_id = second.finalized_msg_id.expect("second reply finalizes");
    // The result takes the very next id after the notifications: the first
    // reply reserves nothing.
    assert_eq!(final_id, "000004");

    let meta = requests::load_meta(engine.team(), &request_id).unwrap();
    assert_eq!(meta.status, atwf_core::RequestStatus::Done);
    assert_eq!(meta.final_msg_id, final_id);

    // Exactly one consolidated result for the requester.
    let (unread, _overflow, ids) = inbox::unread_stats(engine.team(), "admin-b");
    assert_eq!(unread, 1);
    assert_eq!(ids, vec![final_id.clone()]);
    let (_s, from, path) = inbox::find_message(engine.team(), "admin-b", &final_id).unwrap();
    assert_eq!(from, "atwf-reply");
    let raw = std::fs::read_to_string(path).unwrap();
    assert!(raw.contains("[REPLY-NEEDED RESULT]"));
    assert!(raw.contains("Replied:"));
    assert!(!raw.contains("Pending:"));

    // Responding after finalization is refused.
    let err = engine
        .respond(Some("dev-c"), &request_id, "late", false, None, "")
        .await
        .unwrap_err();
    assert!(matches!(err, atwf_core::TeamError::AlreadyFinalized(_)));
}

#[tokio::test]
async fn respond_blocked_snoozes_and_records_debtor() {
    let fx = Fixture::seeded();
    let engine = fx.engine();
    let request_id = engine
        .gather(Some("admin-b"), &["dev-c".to_string()], None, "M", None)
        .await
        .unwrap();

    let outcome = engine
        .respond(
            Some("dev-c"),
            &request_id,
            "waiting on infra",
            true,
            Some("15m"),
            "dev-x",
        )
        .await
        .unwrap();
    assert!(outcome.blocked);
    assert_eq!(outcome.blocked_until, "2026-03-01T12:15:00");

    let meta = requests::load_meta(engine.team(), &request_id).unwrap();
    let target = &meta.targets["dev-c"];
    assert_eq!(target.status, atwf_core::TargetStatus::Blocked);
    assert_eq!(target.waiting_on, "dev-x");
    assert_eq!(target.blocked_reason, "waiting on infra");
    assert!(target.response_file.is_empty());
}

#[tokio::test]
async fn respond_snooze_is_clamped() {
    let fx = Fixture::seeded();
    let engine = fx.engine();
    let request_id = engine
        .gather(Some("admin-b"), &["dev-c".to_string()], None, "M", None)
        .await
        .unwrap();
    let outcome = engine
        .respond(Some("dev-c"), &request_id, "", true, Some("5s"), "")
        .await
        .unwrap();
    // Clamped to the 30s floor.
    assert_eq!(outcome.blocked_until, "2026-03-01T12:00:30");
}

#[tokio::test]
async fn respond_requires_target_membership() {
    let fx = Fixture::seeded();
    let engine = fx.engine();
    let request_id = engine
        .gather(Some("admin-b"), &["dev-c".to_string()], None, "M", None)
        .await
        .unwrap();
    let err = engine
        .respond(Some("dev-d"), &request_id, "not mine", false, None, "")
        .await
        .unwrap_err();
    assert!(matches!(err, atwf_core::TeamError::PolicyDenied(_)));
}

#[tokio::test]
async fn respond_requires_body_unless_blocked() {
    let fx = Fixture::seeded();
    let engine = fx.engine();
    let request_id = engine
        .gather(Some("admin-b"), &["dev-c".to_string()], None, "M", None)
        .await
        .unwrap();
    let err = engine
        .respond(Some("dev-c"), &request_id, "  ", false, None, "")
        .await
        .unwrap_err();
    assert!(matches!(err, atwf_core::TeamError::InvalidInput(_)));
}

#[tokio::test]
async fn respond_accepts_short_id_spellings() {
    let fx = Fixture::seeded();
    let engine = fx.engine();
    engine
        .gather(Some("admin-b"), &["dev-c".to_string()], None, "M", None)
        .await
        .unwrap();
    let outcome = engine
        .respond(Some("dev-c"), "1", "ok", false, None, "")
        .await
        .unwrap();
    assert_eq!(outcome.request_id, "req-000001");
}

#[tokio::test]
async fn reply_needed_rows_annotate_snooze() {
    let fx = Fixture::seeded();
    let engine = fx.engine();
    let request_id = engine
        .gather(
            Some("admin-b"),
            &["dev-c".to_string(), "dev-d".to_string()],
            Some("T"),
            "M",
            None,
        )
        .await
        .unwrap();
    engine
        .respond(Some("dev-c"), &request_id, "", true, Some("15m"), "")
        .await
        .unwrap();

    let rows_c = engine.reply_needed_rows("dev-c").unwrap();
    assert_eq!(rows_c.len(), 1);
    assert_eq!(rows_c[0].1, "blocked(snoozed)");

    // Once the snooze lapses the annotation drops.
    fx.clock.set(parse_iso("2026-03-01T12:20:00").unwrap());
    let rows_c = fx.engine().reply_needed_rows("dev-c").unwrap();
    assert_eq!(rows_c[0].1, "blocked");

    let rows_d = engine.reply_needed_rows("dev-d").unwrap();
    assert_eq!(rows_d[0].1, "pending");
    // Replied targets drop out.
    engine
        .respond(Some("dev-d"), &request_id, "done", false, None, "")
        .await
        .unwrap();
    assert!(engine.reply_needed_rows("dev-d").unwrap().is_empty());
}
