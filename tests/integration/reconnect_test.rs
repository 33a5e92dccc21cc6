//! Backoff, reconnect and retry-budget behavior.

use std::time::Duration;

use notify_core::config::RealtimeConfig;
use notify_realtime::ChannelState;
use notify_realtime::connection::mock::ScriptedConnector;

use crate::helpers::{TestClient, settle};

#[tokio::test(start_paused = true)]
async fn test_reconnect_delays_double() {
    let connector = ScriptedConnector::new();
    connector.fail_next(3);
    let _peer = connector.accept_next();

    let app = TestClient::start(connector, Some("token-1"));
    let status = app.wait_status(|s| s.is_connected()).await;
    assert_eq!(status.reconnect_attempts, 0);
    assert!(!status.retry_exhausted);

    let attempts = app.connector.attempts();
    assert_eq!(attempts.len(), 4);
    let gaps: Vec<Duration> = attempts.windows(2).map(|w| w[1].at - w[0].at).collect();
    assert_eq!(
        gaps,
        vec![
            Duration::from_secs(1),
            Duration::from_secs(2),
            Duration::from_secs(4)
        ]
    );
    assert_eq!(app.client.metrics().reconnect_attempts, 3);
    assert_eq!(app.client.metrics().connections_opened, 1);
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_cancels_pending_reconnect() {
    let connector = ScriptedConnector::new();
    connector.fail_next(1);

    let app = TestClient::start(connector, Some("token-1"));
    app.wait_status(|s| s.reconnect_pending).await;

    app.client.disconnect().await.expect("disconnect");
    let status = app.client.status();
    assert_eq!(status.state, ChannelState::Disconnected);
    assert!(!status.reconnect_pending);

    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(app.connector.attempt_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_budget_exhaustion_then_explicit_connect() {
    let mut config = RealtimeConfig::default();
    config.reconnect.max_attempts = 2;

    let connector = ScriptedConnector::new();
    let app = TestClient::start_with(config, connector, Some("token-1"));

    let status = app.wait_status(|s| s.retry_exhausted).await;
    assert_eq!(status.state, ChannelState::Disconnected);
    assert!(!status.reconnect_pending);
    assert_eq!(app.connector.attempt_count(), 3);

    // No further attempts on its own.
    tokio::time::sleep(Duration::from_secs(600)).await;
    assert_eq!(app.connector.attempt_count(), 3);

    let _peer = app.connector.accept_next();
    app.client.connect().await.expect("connect");
    let status = app.wait_status(|s| s.is_connected()).await;
    assert!(!status.retry_exhausted);
    assert_eq!(status.reconnect_attempts, 0);
}

#[tokio::test(start_paused = true)]
async fn test_server_close_triggers_reconnect_and_keeps_store() {
    let connector = ScriptedConnector::new();
    let first = connector.accept_next();
    let _second = connector.accept_next();

    let app = TestClient::start(connector, Some("token-1"));
    app.wait_status(|s| s.is_connected()).await;

    first.push_text(crate::helpers::notification_frame(1));
    app.wait_store(|s| s.unread_count == 1).await;

    first.close();
    app.wait_status(|s| s.reconnect_pending).await;
    app.wait_status(|s| s.is_connected()).await;

    assert_eq!(app.connector.attempt_count(), 2);
    // The store survives reconnects.
    assert_eq!(app.client.store().unread_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_transport_error_is_treated_like_close() {
    let connector = ScriptedConnector::new();
    let first = connector.accept_next();
    let _second = connector.accept_next();

    let app = TestClient::start(connector, Some("token-1"));
    app.wait_status(|s| s.is_connected()).await;

    first.fail("connection reset by peer");
    app.wait_status(|s| !s.is_connected()).await;
    tokio::time::sleep(Duration::from_millis(999)).await;
    assert_eq!(app.connector.attempt_count(), 1);

    settle().await;
    app.wait_status(|s| s.is_connected()).await;
    assert_eq!(app.connector.attempt_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_connect_timeout_counts_as_failure() {
    let mut config = RealtimeConfig::default();
    config.connect_timeout_seconds = 5;

    let connector = ScriptedConnector::new();
    connector.hang_next();
    let _peer = connector.accept_next();

    let app = TestClient::start_with(config, connector, Some("token-1"));
    app.wait_status(|s| s.is_connected()).await;

    let attempts = app.connector.attempts();
    assert_eq!(attempts.len(), 2);
    // 5s timeout, then the first 1s backoff.
    assert_eq!(attempts[1].at - attempts[0].at, Duration::from_secs(6));
}

#[tokio::test(start_paused = true)]
async fn test_idle_timeout_forces_reconnect() {
    let mut config = RealtimeConfig::default();
    config.idle_timeout_seconds = Some(50);

    let connector = ScriptedConnector::new();
    let first = connector.accept_next();
    let _second = connector.accept_next();

    let app = TestClient::start_with(config, connector, Some("token-1"));
    app.wait_status(|s| s.is_connected()).await;

    tokio::time::sleep(Duration::from_secs(40)).await;
    first.push_text(r#"{"type":"pong"}"#);
    settle().await;

    // Inbound traffic pushed the deadline out to t=90s.
    tokio::time::sleep(Duration::from_secs(45)).await;
    assert_eq!(app.connector.attempt_count(), 1);
    assert!(!first.is_closed());

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(first.is_closed());
    app.wait_status(|s| s.is_connected()).await;
    assert_eq!(app.connector.attempt_count(), 2);
}
