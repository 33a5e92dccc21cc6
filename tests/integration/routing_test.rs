//! Inbound frame routing through a live client.

use std::time::Duration;

use notify_realtime::connection::mock::ScriptedConnector;

use crate::helpers::{TestClient, announcement_frame, notification_frame, recent_ids, settle};

#[tokio::test(start_paused = true)]
async fn test_malformed_frame_does_not_block_later_frames() {
    let connector = ScriptedConnector::new();
    let peer = connector.accept_next();
    let app = TestClient::start(connector, Some("token-1"));
    app.wait_status(|s| s.is_connected()).await;

    peer.push_text("{\"type\":\"notification\",\"data\":");
    peer.push_text(notification_frame(7));

    let snapshot = app.wait_store(|s| s.unread_count == 1).await;
    assert_eq!(recent_ids(&snapshot), vec![7]);

    let metrics = app.client.metrics();
    assert_eq!(metrics.frames_received, 2);
    assert_eq!(metrics.decode_failures, 1);
    // A bad frame never takes the channel down.
    assert!(app.client.is_connected());
}

#[tokio::test(start_paused = true)]
async fn test_store_keeps_newest_fifty() {
    let connector = ScriptedConnector::new();
    let peer = connector.accept_next();
    let app = TestClient::start(connector, Some("token-1"));
    app.wait_status(|s| s.is_connected()).await;

    for id in 1..=60 {
        peer.push_text(notification_frame(id));
    }

    let snapshot = app.wait_store(|s| s.unread_count == 60).await;
    let expected: Vec<i64> = (11..=60).rev().collect();
    assert_eq!(recent_ids(&snapshot), expected);

    let view = app.client.view();
    assert_eq!(view.unread_count, 60);
    assert_eq!(view.recent.len(), 50);
    assert!(view.is_connected);
}

#[tokio::test(start_paused = true)]
async fn test_announcement_is_forwarded_not_stored() {
    let connector = ScriptedConnector::new();
    let peer = connector.accept_next();
    let app = TestClient::start(connector, Some("token-1"));
    app.wait_status(|s| s.is_connected()).await;

    let mut announcements = app.client.announcements();
    peer.push_text(announcement_frame("Maintenance", "Portal offline at 22:00"));
    peer.push_text(notification_frame(1));

    let announcement = tokio::time::timeout(Duration::from_secs(1), announcements.recv())
        .await
        .expect("announcement in time")
        .expect("announcement channel open");
    assert_eq!(announcement.title, "Maintenance");

    let snapshot = app.wait_store(|s| s.unread_count == 1).await;
    assert_eq!(recent_ids(&snapshot), vec![1]);
    assert_eq!(app.client.metrics().announcements_received, 1);
}

#[tokio::test(start_paused = true)]
async fn test_pong_and_unknown_kinds_change_nothing() {
    let connector = ScriptedConnector::new();
    let peer = connector.accept_next();
    let app = TestClient::start(connector, Some("token-1"));
    app.wait_status(|s| s.is_connected()).await;

    peer.push_text(r#"{"type":"pong","timestamp":"2024-05-01T10:00:00Z"}"#);
    peer.push_text(r#"{"type":"typing","data":{"user":"x"}}"#);
    settle().await;

    assert_eq!(app.client.metrics().frames_received, 2);
    assert_eq!(app.client.metrics().decode_failures, 0);
    assert_eq!(app.client.store().unread_count(), 0);
    assert!(app.client.alerts().active().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_notification_raises_expiring_alert() {
    let connector = ScriptedConnector::new();
    let peer = connector.accept_next();
    let app = TestClient::start(connector, Some("token-1"));
    app.wait_status(|s| s.is_connected()).await;

    peer.push_text(notification_frame(3));
    app.wait_store(|s| s.unread_count == 1).await;

    let alerts = app.client.alerts().active();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].id, 3);

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(app.client.alerts().active().len(), 1);

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(app.client.alerts().active().is_empty());
    // Expiry leaves the store alone.
    assert_eq!(app.client.store().unread_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_redelivered_notification_counts_once() {
    let connector = ScriptedConnector::new();
    let peer = connector.accept_next();
    let app = TestClient::start(connector, Some("token-1"));
    app.wait_status(|s| s.is_connected()).await;

    peer.push_text(notification_frame(4));
    peer.push_text(notification_frame(4));
    peer.push_text(notification_frame(9));

    let snapshot = app.wait_store(|s| s.unread_count == 2).await;
    settle().await;

    assert_eq!(recent_ids(&snapshot), vec![9, 4]);
    assert_eq!(app.client.store().unread_count(), 2);
    assert_eq!(app.client.alerts().active().len(), 2);

    let metrics = app.client.metrics();
    assert_eq!(metrics.frames_received, 3);
    assert_eq!(metrics.notifications_received, 2);
    assert_eq!(metrics.duplicates_discarded, 1);
}
