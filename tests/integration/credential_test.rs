//! Credential changes: logout, token switch, login.

use std::time::Duration;

use notify_realtime::ChannelState;
use notify_realtime::connection::mock::ScriptedConnector;

use crate::helpers::{TestClient, notification_frame, settle};

#[tokio::test(start_paused = true)]
async fn test_logout_closes_and_clears_without_reconnect() {
    let connector = ScriptedConnector::new();
    let peer = connector.accept_next();
    let app = TestClient::start(connector, Some("token-1"));
    app.wait_status(|s| s.is_connected()).await;

    peer.push_text(notification_frame(1));
    app.wait_store(|s| s.unread_count == 1).await;

    assert!(app.credentials.clear());
    settle().await;

    let status = app.client.status();
    assert_eq!(status.state, ChannelState::Disconnected);
    assert!(!status.reconnect_pending);
    assert!(peer.is_closed());
    assert_eq!(app.client.store().unread_count(), 0);
    assert!(app.client.store().snapshot().recent.is_empty());
    assert!(app.client.alerts().active().is_empty());

    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(app.connector.attempt_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_token_switch_reconnects_with_new_token() {
    let connector = ScriptedConnector::new();
    let first = connector.accept_next();
    let _second = connector.accept_next();
    let app = TestClient::start(connector, Some("alpha"));
    app.wait_status(|s| s.is_connected()).await;

    first.push_text(notification_frame(1));
    app.wait_store(|s| s.unread_count == 1).await;

    assert!(app.credentials.set_token("beta"));
    settle().await;
    app.wait_status(|s| s.is_connected()).await;

    let attempts = app.connector.attempts();
    assert_eq!(attempts.len(), 2);
    assert!(attempts[0].url.ends_with("token=alpha"));
    assert!(attempts[1].url.ends_with("token=beta"));
    assert!(first.is_closed());
    assert_eq!(app.client.store().unread_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_login_after_start_connects() {
    let connector = ScriptedConnector::new();
    let _peer = connector.accept_next();
    let app = TestClient::start(connector, None);

    settle().await;
    assert_eq!(app.connector.attempt_count(), 0);
    assert_eq!(app.client.status().state, ChannelState::Disconnected);

    app.credentials.set_token("late-login");
    app.wait_status(|s| s.is_connected()).await;
    assert_eq!(app.connector.attempt_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_logout_during_backoff_cancels_retry() {
    let connector = ScriptedConnector::new();
    connector.fail_next(1);
    let app = TestClient::start(connector, Some("token-1"));
    app.wait_status(|s| s.reconnect_pending).await;

    app.credentials.clear();
    settle().await;
    assert!(!app.client.status().reconnect_pending);

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(app.connector.attempt_count(), 1);
}
