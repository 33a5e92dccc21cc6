//! Top-level notification client that ties together all subsystems.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;
use tracing::info;

use notify_core::config::RealtimeConfig;
use notify_core::result::AppResult;
use notify_core::types::{Announcement, Notification};

use crate::connection::credential::CredentialSource;
use crate::connection::handle::ConnectionHandle;
use crate::connection::heartbeat::{self, HeartbeatConfig};
use crate::connection::manager::ConnectionManager;
use crate::connection::state::ChannelStatus;
use crate::connection::transport::{Connector, WsConnector};
use crate::message::router::MessageRouter;
use crate::metrics::{ClientMetrics, MetricsSnapshot};
use crate::notification::alerts::AlertQueue;
use crate::notification::store::NotificationStore;

/// The combined state a UI renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientView {
    pub unread_count: u64,
    /// Newest first.
    pub recent: Vec<Notification>,
    pub is_connected: bool,
}

/// Real-time notification client.
///
/// Cloning is cheap and every clone drives the same channel and store.
#[derive(Clone)]
pub struct RealtimeClient {
    connection: ConnectionHandle,
    router: MessageRouter,
    metrics: Arc<ClientMetrics>,
    shutdown: CancellationToken,
}

impl std::fmt::Debug for RealtimeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeClient")
            .field("status", &self.connection.status())
            .finish()
    }
}

impl RealtimeClient {
    /// Starts a client over real WebSockets.
    pub fn start(config: RealtimeConfig, credentials: &CredentialSource) -> AppResult<Self> {
        Self::start_with_connector(config, credentials, Arc::new(WsConnector))
    }

    /// Starts a client over `connector`.
    ///
    /// Must be called inside a tokio runtime. The client connects as soon as
    /// `credentials` holds a credential and follows every later change.
    pub fn start_with_connector(
        config: RealtimeConfig,
        credentials: &CredentialSource,
        connector: Arc<dyn Connector>,
    ) -> AppResult<Self> {
        config.validate()?;

        let metrics = Arc::new(ClientMetrics::new());
        let router = MessageRouter::new(
            NotificationStore::new(config.notifications.recent_capacity),
            AlertQueue::new(config.notifications.alert_display()),
            config.notifications.announcement_buffer,
            config.max_frame_bytes,
            Arc::clone(&metrics),
        );
        let heartbeat_config = HeartbeatConfig {
            interval: config.probe_interval(),
        };

        let (connection, _manager) = ConnectionManager::spawn(
            config,
            connector,
            credentials,
            router.clone(),
            Arc::clone(&metrics),
        );

        let shutdown = CancellationToken::new();
        tokio::spawn(heartbeat::run_heartbeat(
            connection.clone(),
            heartbeat_config,
            shutdown.clone(),
        ));

        info!("Notification client started");

        Ok(Self {
            connection,
            router,
            metrics,
            shutdown,
        })
    }

    /// Requests a (re)connect; also recovers from an exhausted retry budget.
    pub async fn connect(&self) -> AppResult<()> {
        self.connection.connect().await
    }

    /// Closes the channel and cancels any pending reconnect.
    pub async fn disconnect(&self) -> AppResult<()> {
        self.connection.disconnect().await
    }

    pub fn status(&self) -> ChannelStatus {
        self.connection.status()
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    /// A receiver notified on every connectivity change.
    pub fn subscribe_status(&self) -> watch::Receiver<ChannelStatus> {
        self.connection.subscribe_status()
    }

    pub fn store(&self) -> &NotificationStore {
        self.router.store()
    }

    pub fn alerts(&self) -> &AlertQueue {
        self.router.alerts()
    }

    /// Announcements received from now on.
    pub fn announcements(&self) -> broadcast::Receiver<Announcement> {
        self.router.announcements()
    }

    pub fn connection(&self) -> &ConnectionHandle {
        &self.connection
    }

    /// Snapshot of what a UI renders.
    pub fn view(&self) -> ClientView {
        let snapshot = self.store().snapshot();
        ClientView {
            unread_count: snapshot.unread_count,
            recent: snapshot.recent.into_iter().collect(),
            is_connected: self.is_connected(),
        }
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Closes the channel and stops the background tasks.
    pub async fn shutdown(&self) {
        info!("Shutting down notification client");
        self.shutdown.cancel();
        self.connection.shutdown().await;
    }
}
