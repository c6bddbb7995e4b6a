use super::*;

#[tokio::test]
async fn empty_session_name_is_not_alive() {
    let mux = TmuxMux::new();
    assert!(!mux.alive("").await.unwrap_or(true));
}

#[tokio::test]
async fn empty_session_name_captures_nothing() {
    let mux = TmuxMux::new();
    assert!(mux.capture_tail("  ", 100).await.unwrap().is_none());
}
