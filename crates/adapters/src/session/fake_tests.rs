use super::*;

#[tokio::test]
async fn unknown_sessions_are_dead() {
    let mux = FakeMux::new();
    assert!(!mux.alive("ghost").await.unwrap());
    assert!(mux.capture_tail("ghost", 100).await.unwrap().is_none());
}

#[tokio::test]
async fn killed_sessions_reject_sends() {
    let mux = FakeMux::new();
    mux.add_session("dev-a-20260301-120000-1");
    mux.kill_session("dev-a-20260301-120000-1");
    let err = mux.send_text("dev-a-20260301-120000-1", "hi").await.unwrap_err();
    assert!(matches!(err, SessionError::NotFound(_)));
}

#[tokio::test]
async fn records_sends_and_enters() {
    let mux = FakeMux::new();
    mux.add_session("s1");
    mux.set_tail("s1", "prompt>");
    mux.send_text("s1", "hello").await.unwrap();
    mux.press_enter("s1").await.unwrap();
    assert_eq!(mux.sent(), vec![("s1".to_string(), "hello".to_string())]);
    assert_eq!(mux.enters(), vec!["s1".to_string()]);
    assert_eq!(mux.capture_tail("s1", 10).await.unwrap().unwrap(), "prompt>");
}

#[tokio::test]
async fn self_session_is_scriptable() {
    let mux = FakeMux::new();
    assert!(mux.self_session().await.is_none());
    mux.set_self_session("coord-20260301-120000-1");
    assert_eq!(
        mux.self_session().await.as_deref(),
        Some("coord-20260301-120000-1")
    );
}
