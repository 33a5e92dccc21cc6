//! Liveness probe cadence.

use std::time::Duration;

use notify_realtime::connection::mock::ScriptedConnector;

use crate::helpers::{TestClient, settle};

#[tokio::test(start_paused = true)]
async fn test_first_probe_one_interval_after_open() {
    let connector = ScriptedConnector::new();
    let mut peer = connector.accept_next();
    let app = TestClient::start(connector, Some("token-1"));
    app.wait_status(|s| s.is_connected()).await;

    tokio::time::sleep(Duration::from_secs(24)).await;
    assert_eq!(peer.try_recv_sent(), None);

    tokio::time::sleep(Duration::from_secs(1)).await;
    settle().await;
    let probe = peer.try_recv_sent().expect("probe at 25s");
    let value: serde_json::Value = serde_json::from_str(&probe).expect("probe is JSON");
    assert_eq!(value, serde_json::json!({"type": "ping"}));

    tokio::time::sleep(Duration::from_secs(25)).await;
    settle().await;
    assert!(peer.try_recv_sent().is_some());
    assert_eq!(app.client.metrics().probes_sent, 2);
}

#[tokio::test(start_paused = true)]
async fn test_no_probes_while_disconnected() {
    let connector = ScriptedConnector::new();
    let mut peer = connector.accept_next();
    let app = TestClient::start(connector, Some("token-1"));
    app.wait_status(|s| s.is_connected()).await;

    app.client.disconnect().await.expect("disconnect");
    tokio::time::sleep(Duration::from_secs(120)).await;

    assert_eq!(peer.try_recv_sent(), None);
    assert_eq!(app.client.metrics().probes_sent, 0);
    assert!(!app.client.connection().send(notify_realtime::message::OutboundMessage::Ping));
}

#[tokio::test(start_paused = true)]
async fn test_cadence_restarts_on_reconnect() {
    let connector = ScriptedConnector::new();
    let first = connector.accept_next();
    let mut second = connector.accept_next();
    let app = TestClient::start(connector, Some("token-1"));
    app.wait_status(|s| s.is_connected()).await;

    // Drop the channel at t=20s; it reopens at t=21s.
    tokio::time::sleep(Duration::from_secs(20)).await;
    first.close();
    app.wait_status(|s| s.reconnect_pending).await;
    app.wait_status(|s| s.is_connected()).await;

    // The old cadence would have fired at t=25s.
    tokio::time::sleep(Duration::from_secs(20)).await;
    assert_eq!(second.try_recv_sent(), None);

    tokio::time::sleep(Duration::from_secs(5)).await;
    settle().await;
    assert!(second.try_recv_sent().is_some());
}
