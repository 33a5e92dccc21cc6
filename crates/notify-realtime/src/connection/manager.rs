//! Connection manager. Owns the transport and drives the channel state
//! machine through connect, backoff, teardown and credential changes.
//!
//! Everything runs on one task. Inbound frames, timers, commands and
//! credential changes are handled one at a time, so frames are routed in
//! delivery order and no two transitions interleave.

use std::future;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use notify_core::config::RealtimeConfig;
use notify_core::result::AppResult;
use notify_core::types::Credential;

use crate::message::router::MessageRouter;
use crate::message::serializer;
use crate::message::types::OutboundMessage;
use crate::metrics::ClientMetrics;

use super::backoff::BackoffPolicy;
use super::credential::CredentialSource;
use super::handle::{Command, ConnectionHandle};
use super::state::{ChannelState, ChannelStatus};
use super::transport::{self, Connector, Transport};

/// Work picked up while a connect was in flight, handled once it is abandoned.
#[derive(Debug)]
enum Deferred {
    /// A command, or `None` when every handle is gone.
    Command(Option<Command>),
    /// A credential change; `false` when the source itself was dropped.
    Credential(bool),
}

/// The single owner of the notification channel.
pub struct ConnectionManager {
    config: RealtimeConfig,
    backoff: BackoffPolicy,
    connector: Arc<dyn Connector>,
    credentials: watch::Receiver<Option<Credential>>,
    credentials_closed: bool,
    router: MessageRouter,
    metrics: Arc<ClientMetrics>,
    commands: mpsc::Receiver<Command>,
    status: watch::Sender<ChannelStatus>,
    state: ChannelState,
    transport: Option<Box<dyn Transport>>,
    conn_id: Option<Uuid>,
    attempts: u32,
    exhausted: bool,
    generation: u64,
    reconnect_at: Option<Instant>,
    last_inbound: Instant,
    deferred: Option<Deferred>,
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("state", &self.state)
            .field("conn_id", &self.conn_id)
            .field("attempts", &self.attempts)
            .finish()
    }
}

impl ConnectionManager {
    /// Spawns the manager task.
    ///
    /// The manager connects immediately if `credentials` already holds a
    /// credential, and follows every later change.
    pub fn spawn(
        config: RealtimeConfig,
        connector: Arc<dyn Connector>,
        credentials: &CredentialSource,
        router: MessageRouter,
        metrics: Arc<ClientMetrics>,
    ) -> (ConnectionHandle, JoinHandle<()>) {
        let (cmd_tx, cmd_rx) = mpsc::channel(config.command_buffer_size.max(1));
        let (status_tx, status_rx) = watch::channel(ChannelStatus::default());

        let manager = Self {
            backoff: BackoffPolicy::from_config(&config.reconnect),
            config,
            connector,
            credentials: credentials.watch(),
            credentials_closed: false,
            router,
            metrics,
            commands: cmd_rx,
            status: status_tx,
            state: ChannelState::Disconnected,
            transport: None,
            conn_id: None,
            attempts: 0,
            exhausted: false,
            generation: 0,
            reconnect_at: None,
            last_inbound: Instant::now(),
            deferred: None,
        };

        let task = tokio::spawn(manager.run());
        (ConnectionHandle::new(cmd_tx, status_rx), task)
    }

    async fn run(mut self) {
        info!(url = %self.config.server_url, "Connection manager started");

        if self.credentials.borrow_and_update().is_some() {
            self.open_channel().await;
        }

        loop {
            if let Some(deferred) = self.deferred.take() {
                let keep_running = match deferred {
                    Deferred::Command(cmd) => self.on_command(cmd).await,
                    Deferred::Credential(alive) => {
                        self.on_credential_change(alive).await;
                        true
                    }
                };
                if !keep_running {
                    break;
                }
                continue;
            }

            let idle_deadline = self.idle_deadline();

            tokio::select! {
                cmd = self.commands.recv() => {
                    if !self.on_command(cmd).await {
                        break;
                    }
                }
                frame = next_frame(&mut self.transport) => {
                    self.on_frame(frame).await;
                }
                _ = sleep_until(self.reconnect_at) => {
                    self.fire_reconnect().await;
                }
                _ = sleep_until(idle_deadline) => {
                    warn!(
                        conn_id = ?self.conn_id,
                        "No inbound frames within idle timeout, forcing reconnect"
                    );
                    self.close_transport("idle timeout").await;
                    self.schedule_reconnect();
                }
                changed = self.credentials.changed(), if !self.credentials_closed => {
                    self.on_credential_change(changed.is_ok()).await;
                }
            }
        }

        info!("Connection manager stopped");
    }

    /// Returns `false` when the manager should stop.
    async fn on_command(&mut self, cmd: Option<Command>) -> bool {
        match cmd {
            Some(Command::Connect) => {
                info!("Explicit connect requested");
                self.attempts = 0;
                self.exhausted = false;
                self.cancel_reconnect();
                self.open_channel().await;
                true
            }
            Some(Command::Disconnect { ack }) => {
                self.cancel_reconnect();
                self.close_transport("disconnect requested").await;
                let _ = ack.send(());
                true
            }
            Some(Command::Send(msg)) => {
                self.send_outbound(msg).await;
                true
            }
            Some(Command::Shutdown { ack }) => {
                self.cancel_reconnect();
                self.close_transport("shutdown").await;
                let _ = ack.send(());
                false
            }
            None => {
                debug!("All connection handles dropped");
                self.cancel_reconnect();
                self.close_transport("handles dropped").await;
                false
            }
        }
    }

    /// Identity change: close, cancel, clear, then connect if logged in.
    async fn on_credential_change(&mut self, source_alive: bool) {
        let present = if source_alive {
            self.credentials.borrow_and_update().is_some()
        } else {
            warn!("Credential source dropped, treating as logged out");
            self.credentials_closed = true;
            false
        };

        info!(present, "Credential changed");
        self.cancel_reconnect();
        self.close_transport("credential changed").await;
        self.router.reset();
        self.attempts = 0;
        self.exhausted = false;
        self.publish();

        if present {
            self.open_channel().await;
        }
    }

    async fn open_channel(&mut self) {
        if self.transport.is_some() {
            self.close_transport("replaced by new connection").await;
        }

        let credential = if self.credentials_closed {
            None
        } else {
            self.credentials.borrow().clone()
        };
        let Some(credential) = credential else {
            debug!("No credential available, staying disconnected");
            self.publish();
            return;
        };

        self.transition(ChannelState::Connecting);
        let url = transport::handshake_url(
            &self.config.server_url,
            &self.config.token_param,
            &credential,
        );
        let connector = Arc::clone(&self.connector);
        let connect = time::timeout(self.config.connect_timeout(), connector.connect(&url));
        tokio::pin!(connect);

        let outcome = loop {
            tokio::select! {
                result = &mut connect => break Some(result),
                cmd = self.commands.recv() => match cmd {
                    Some(Command::Send(msg)) => {
                        self.metrics.probe_dropped();
                        debug!(?msg, "Dropping outbound message while connecting");
                    }
                    other => {
                        self.deferred = Some(Deferred::Command(other));
                        break None;
                    }
                },
                changed = self.credentials.changed(), if !self.credentials_closed => {
                    self.deferred = Some(Deferred::Credential(changed.is_ok()));
                    break None;
                }
            }
        };

        match outcome {
            Some(Ok(Ok(transport))) => {
                let conn_id = Uuid::new_v4();
                self.transport = Some(transport);
                self.conn_id = Some(conn_id);
                self.attempts = 0;
                self.exhausted = false;
                self.generation = self.generation.wrapping_add(1);
                self.last_inbound = Instant::now();
                self.metrics.connection_opened();
                self.transition(ChannelState::Open);
                info!(conn_id = %conn_id, "Notification channel open");
            }
            Some(Ok(Err(e))) => {
                warn!(error = %e, attempt = self.attempts, "Connection attempt failed");
                self.transition(ChannelState::Disconnected);
                self.schedule_reconnect();
            }
            Some(Err(_)) => {
                warn!(
                    timeout_secs = self.config.connect_timeout_seconds,
                    attempt = self.attempts,
                    "Connection attempt timed out"
                );
                self.transition(ChannelState::Disconnected);
                self.schedule_reconnect();
            }
            None => {
                info!("Connection attempt abandoned");
                self.transition(ChannelState::Disconnected);
            }
        }
    }

    async fn on_frame(&mut self, frame: Option<AppResult<String>>) {
        match frame {
            Some(Ok(text)) => {
                self.last_inbound = Instant::now();
                self.router.route(&text);
            }
            Some(Err(e)) => {
                warn!(conn_id = ?self.conn_id, error = %e, "Transport error");
                self.transport_lost();
            }
            None => {
                info!(conn_id = ?self.conn_id, "Server closed the notification channel");
                self.transport_lost();
            }
        }
    }

    async fn send_outbound(&mut self, msg: OutboundMessage) {
        let Some(transport) = self.transport.as_mut() else {
            self.metrics.probe_dropped();
            debug!(?msg, "Channel not open, dropping outbound message");
            return;
        };

        let text = match serializer::encode_outbound(&msg) {
            Ok(text) => text,
            Err(e) => {
                error!(error = %e, "Failed to encode outbound message");
                return;
            }
        };

        match transport.send_text(text).await {
            Ok(()) => self.metrics.probe_sent(),
            Err(e) => {
                warn!(conn_id = ?self.conn_id, error = %e, "Write failed");
                self.transport_lost();
            }
        }
    }

    /// Abnormal end of an open transport. Same path for errors and closes.
    fn transport_lost(&mut self) {
        self.transport = None;
        self.conn_id = None;
        self.transition(ChannelState::Disconnected);
        self.schedule_reconnect();
    }

    async fn close_transport(&mut self, reason: &str) {
        let Some(mut transport) = self.transport.take() else {
            self.transition(ChannelState::Disconnected);
            self.publish();
            return;
        };

        self.transition(ChannelState::Closing);
        if time::timeout(self.config.connect_timeout(), transport.close())
            .await
            .is_err()
        {
            debug!("Transport close timed out");
        }
        drop(transport);

        info!(conn_id = ?self.conn_id, reason, "Notification channel closed");
        self.conn_id = None;
        self.transition(ChannelState::Disconnected);
    }

    fn schedule_reconnect(&mut self) {
        if self.credentials_closed || self.credentials.borrow().is_none() {
            debug!("No credential, not scheduling reconnect");
            self.publish();
            return;
        }

        if !self.backoff.allows(self.attempts) {
            warn!(
                attempts = self.attempts,
                "Reconnect budget exhausted, waiting for an explicit connect"
            );
            self.exhausted = true;
            self.publish();
            return;
        }

        let delay = self.backoff.delay_for(self.attempts);
        info!(
            attempt = self.attempts + 1,
            delay_ms = delay.as_millis() as u64,
            "Scheduling reconnect"
        );
        let Some(at) = Instant::now().checked_add(delay) else {
            warn!(
                delay_ms = delay.as_millis() as u64,
                "Reconnect delay out of range, waiting for an explicit connect"
            );
            self.exhausted = true;
            self.publish();
            return;
        };
        self.reconnect_at = Some(at);
        self.publish();
    }

    fn cancel_reconnect(&mut self) {
        if self.reconnect_at.take().is_some() {
            debug!("Cancelled pending reconnect");
            self.publish();
        }
    }

    async fn fire_reconnect(&mut self) {
        self.reconnect_at = None;
        self.attempts += 1;
        self.metrics.reconnect_attempt();
        self.open_channel().await;
    }

    /// `None` when idle detection is off, no transport is open, or the
    /// timeout reaches past what `Instant` can represent.
    fn idle_deadline(&self) -> Option<Instant> {
        let timeout = self.config.idle_timeout()?;
        self.transport
            .as_ref()
            .and_then(|_| self.last_inbound.checked_add(timeout))
    }

    fn transition(&mut self, next: ChannelState) {
        if self.state == next {
            return;
        }
        if !self.state.can_transition_to(next) {
            error!(from = %self.state, to = %next, "Rejected illegal channel transition");
            return;
        }
        debug!(from = %self.state, to = %next, "Channel state transition");
        self.state = next;
        self.publish();
    }

    fn publish(&self) {
        let next = ChannelStatus {
            state: self.state,
            reconnect_attempts: self.attempts,
            reconnect_pending: self.reconnect_at.is_some(),
            retry_exhausted: self.exhausted,
            connection_generation: self.generation,
        };
        self.status.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }
}

async fn next_frame(transport: &mut Option<Box<dyn Transport>>) -> Option<AppResult<String>> {
    match transport {
        Some(transport) => transport.next_text().await,
        None => future::pending().await,
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => time::sleep_until(deadline).await,
        None => future::pending().await,
    }
}
