use super::*;

#[test]
fn envelope_is_byte_stable() {
    let wrapped = wrap_team_message(
        "000042",
        "send",
        "coord-20260301-120000-1",
        Some("coord"),
        "dev-a-20260301-120100-2",
        "2026-03-01T12:05:00",
        "hello",
    );
    assert_eq!(
        wrapped,
        "[ATWF-MSG id=000042 kind=send from=coord-20260301-120000-1 to=dev-a-20260301-120100-2 role=coord ts=2026-03-01T12:05:00]\nhello\n[ATWF-END id=000042]\n"
    );
}

#[test]
fn envelope_omits_missing_role() {
    let wrapped = wrap_team_message(
        "000001",
        "drive",
        "atwf-drive",
        None,
        "coord-20260301-120000-1",
        "2026-03-01T12:05:00",
        "body",
    );
    assert!(wrapped.starts_with(
        "[ATWF-MSG id=000001 kind=drive from=atwf-drive to=coord-20260301-120000-1 ts="
    ));
}

#[test]
fn empty_body_collapses() {
    let wrapped = wrap_team_message("000002", "", "", None, "", "2026-03-01T12:05:00", "  \n");
    assert_eq!(
        wrapped,
        "[ATWF-MSG id=000002 kind=send from=unknown to=unknown ts=2026-03-01T12:05:00]\n[ATWF-END id=000002]\n"
    );
}

#[test]
fn body_trailing_whitespace_is_trimmed() {
    let wrapped =
        wrap_team_message("000003", "send", "a", None, "b", "2026-03-01T12:05:00", "x\n\n");
    assert!(wrapped.contains("\nx\n[ATWF-END id=000003]\n"));
}

#[test]
fn inbox_notice_names_both_commands() {
    let notice = inbox_notice("000042");
    assert!(notice.contains("[INBOX] id=000042"));
    assert!(notice.contains("atwf inbox-open 000042"));
    assert!(notice.contains("atwf inbox-ack 000042"));
}
