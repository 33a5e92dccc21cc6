//! Cloneable handle for driving the connection manager.

use tokio::sync::{mpsc, oneshot, watch};
use tracing::debug;

use notify_core::error::AppError;
use notify_core::result::AppResult;

use crate::message::types::OutboundMessage;

use super::state::ChannelStatus;

/// Requests processed, in order, by the connection manager task.
#[derive(Debug)]
pub(crate) enum Command {
    /// Explicit (re)connect; resets the attempt budget.
    Connect,
    /// Deliberate teardown; acknowledged once applied.
    Disconnect { ack: oneshot::Sender<()> },
    /// Best-effort outbound frame.
    Send(OutboundMessage),
    /// Tear down and stop the manager task.
    Shutdown { ack: oneshot::Sender<()> },
}

/// A handle to the single notification channel.
///
/// Holds no transport; every operation is a request to the manager task.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    commands: mpsc::Sender<Command>,
    status: watch::Receiver<ChannelStatus>,
}

impl ConnectionHandle {
    pub(crate) fn new(
        commands: mpsc::Sender<Command>,
        status: watch::Receiver<ChannelStatus>,
    ) -> Self {
        Self { commands, status }
    }

    /// Requests a (re)connect with the current credential.
    ///
    /// Tears down any existing channel first and resets an exhausted retry
    /// budget.
    pub async fn connect(&self) -> AppResult<()> {
        self.commands
            .send(Command::Connect)
            .await
            .map_err(|_| AppError::internal("Connection manager is not running"))
    }

    /// Closes the channel and cancels any pending reconnect. Idempotent.
    ///
    /// Returns once the manager has applied the request.
    pub async fn disconnect(&self) -> AppResult<()> {
        let (ack, done) = oneshot::channel();
        self.commands
            .send(Command::Disconnect { ack })
            .await
            .map_err(|_| AppError::internal("Connection manager is not running"))?;
        done.await
            .map_err(|_| AppError::internal("Connection manager stopped before disconnecting"))
    }

    /// Sends a frame if the channel is open. Never queues for later.
    ///
    /// Returns `false` when the frame was dropped.
    pub fn send(&self, msg: OutboundMessage) -> bool {
        if !self.is_connected() {
            return false;
        }
        match self.commands.try_send(Command::Send(msg)) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                debug!("Command queue full, dropping outbound message");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }

    /// Current status snapshot.
    pub fn status(&self) -> ChannelStatus {
        *self.status.borrow()
    }

    /// Whether the channel is open.
    pub fn is_connected(&self) -> bool {
        self.status.borrow().is_connected()
    }

    /// A receiver notified on every status change.
    pub fn subscribe_status(&self) -> watch::Receiver<ChannelStatus> {
        self.status.clone()
    }

    /// Stops the manager task. Safe to call more than once.
    pub(crate) async fn shutdown(&self) {
        let (ack, done) = oneshot::channel();
        if self.commands.send(Command::Shutdown { ack }).await.is_ok() {
            let _ = done.await;
        }
    }
}
