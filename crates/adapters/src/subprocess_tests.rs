use super::*;

#[tokio::test]
async fn captures_output() {
    let mut cmd = Command::new("echo");
    cmd.arg("hello");
    let output = run_with_timeout(cmd, Duration::from_secs(5), "echo")
        .await
        .unwrap();
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "hello");
}

#[tokio::test]
async fn times_out_slow_commands() {
    let mut cmd = Command::new("sleep");
    cmd.arg("5");
    let err = run_with_timeout(cmd, Duration::from_millis(50), "sleep")
        .await
        .unwrap_err();
    match err {
        SubprocessError::TimedOut(msg) => assert!(msg.contains("sleep")),
        SubprocessError::Failed(msg) => panic!("expected timeout, got failure: {msg}"),
    }
}

#[tokio::test]
async fn missing_binary_is_failure() {
    let cmd = Command::new("atwf-no-such-binary-here");
    let err = run_with_timeout(cmd, Duration::from_secs(5), "missing")
        .await
        .unwrap_err();
    assert!(matches!(err, SubprocessError::Failed(_)));
}
