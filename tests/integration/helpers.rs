//! Shared test helpers for integration tests.

use std::sync::Arc;
use std::time::Duration;

use notify_core::config::RealtimeConfig;
use notify_realtime::connection::mock::ScriptedConnector;
use notify_realtime::{ChannelStatus, CredentialSource, NotificationSnapshot, RealtimeClient};

/// A client wired to a scripted connector.
pub struct TestClient {
    pub client: RealtimeClient,
    pub connector: ScriptedConnector,
    pub credentials: CredentialSource,
}

impl TestClient {
    /// Starts a client with default settings. Script the connector before
    /// calling this when `token` is set, since the first attempt is immediate.
    pub fn start(connector: ScriptedConnector, token: Option<&str>) -> Self {
        Self::start_with(RealtimeConfig::default(), connector, token)
    }

    pub fn start_with(
        config: RealtimeConfig,
        connector: ScriptedConnector,
        token: Option<&str>,
    ) -> Self {
        let credentials = match token {
            Some(token) => CredentialSource::with_token(token),
            None => CredentialSource::new(),
        };
        let client =
            RealtimeClient::start_with_connector(config, &credentials, Arc::new(connector.clone()))
                .expect("Failed to start client");

        Self {
            client,
            connector,
            credentials,
        }
    }

    /// Waits until the channel status satisfies `pred`.
    pub async fn wait_status(&self, pred: impl FnMut(&ChannelStatus) -> bool) -> ChannelStatus {
        let mut rx = self.client.subscribe_status();
        let status = *rx.wait_for(pred).await.expect("manager stopped");
        status
    }

    /// Waits until the store satisfies `pred`.
    pub async fn wait_store(
        &self,
        pred: impl FnMut(&NotificationSnapshot) -> bool,
    ) -> NotificationSnapshot {
        let mut rx = self.client.store().subscribe();
        let snapshot = rx.wait_for(pred).await.expect("store dropped").clone();
        snapshot
    }
}

/// Lets every task run to idle. With paused time this also fires any timer
/// due within the next millisecond.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

/// A `notification` frame as the server sends it.
pub fn notification_frame(id: i64) -> String {
    serde_json::json!({
        "type": "notification",
        "user_id": "42",
        "data": {
            "id": id,
            "type": "rating",
            "title": format!("Rating #{id}"),
            "message": "Your portfolio received a new rating",
            "link": format!("/portfolio/{id}"),
            "created_at": "2024-05-01T10:00:00Z"
        },
        "timestamp": "2024-05-01T10:00:00Z"
    })
    .to_string()
}

/// An `announcement` frame.
pub fn announcement_frame(title: &str, message: &str) -> String {
    serde_json::json!({
        "type": "announcement",
        "data": { "title": title, "message": message },
        "timestamp": "2024-05-01T10:00:00Z"
    })
    .to_string()
}

/// Recent ids, newest first.
pub fn recent_ids(snapshot: &NotificationSnapshot) -> Vec<i64> {
    snapshot.recent.iter().map(|n| n.id).collect()
}
