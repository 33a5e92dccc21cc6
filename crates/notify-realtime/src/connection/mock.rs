//! Scripted in-memory connector for tests.
//!
//! Each connect attempt consumes one scripted step; an empty script refuses
//! the connection. Accepted connections hand back a [`MockPeer`] playing the
//! server side.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::Instant;

use notify_core::error::AppError;
use notify_core::result::AppResult;

use super::transport::{Connector, Transport};

/// One recorded connect attempt.
#[derive(Debug, Clone)]
pub struct ConnectAttempt {
    /// Handshake URL, including the credential.
    pub url: String,
    /// When the attempt started.
    pub at: Instant,
}

#[derive(Debug)]
enum Step {
    Fail,
    Accept(MockTransport),
    Hang,
}

#[derive(Debug, Default)]
struct ScriptState {
    steps: VecDeque<Step>,
    attempts: Vec<ConnectAttempt>,
}

/// Connector replaying a script of outcomes.
#[derive(Debug, Clone, Default)]
pub struct ScriptedConnector {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedConnector {
    /// Creates a connector that refuses everything until scripted otherwise.
    pub fn new() -> Self {
        Self::default()
    }

    /// The next `count` attempts fail.
    pub fn fail_next(&self, count: usize) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.steps.extend((0..count).map(|_| Step::Fail));
    }

    /// The next attempt succeeds; the returned peer is the server side.
    pub fn accept_next(&self) -> MockPeer {
        let (to_client, inbound) = mpsc::unbounded_channel();
        let (outbound, from_client) = mpsc::unbounded_channel();
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.steps.push_back(Step::Accept(MockTransport { inbound, outbound }));
        MockPeer {
            to_client,
            from_client,
        }
    }

    /// The next attempt never completes.
    pub fn hang_next(&self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.steps.push_back(Step::Hang);
    }

    /// Every attempt made so far.
    pub fn attempts(&self) -> Vec<ConnectAttempt> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.attempts.clone()
    }

    /// Number of attempts made so far.
    pub fn attempt_count(&self) -> usize {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.attempts.len()
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn connect(&self, url: &str) -> AppResult<Box<dyn Transport>> {
        let step = {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            state.attempts.push(ConnectAttempt {
                url: url.to_string(),
                at: Instant::now(),
            });
            state.steps.pop_front().unwrap_or(Step::Fail)
        };

        match step {
            Step::Fail => Err(AppError::transport("connection refused (scripted)")),
            Step::Accept(transport) => Ok(Box::new(transport)),
            Step::Hang => std::future::pending().await,
        }
    }
}

#[derive(Debug)]
enum PeerFrame {
    Text(String),
    Error(String),
    Close,
}

/// Client side of a scripted connection.
#[derive(Debug)]
pub struct MockTransport {
    inbound: mpsc::UnboundedReceiver<PeerFrame>,
    outbound: mpsc::UnboundedSender<String>,
}

#[async_trait]
impl Transport for MockTransport {
    async fn send_text(&mut self, text: String) -> AppResult<()> {
        self.outbound
            .send(text)
            .map_err(|_| AppError::transport("peer went away"))
    }

    async fn next_text(&mut self) -> Option<AppResult<String>> {
        match self.inbound.recv().await? {
            PeerFrame::Text(text) => Some(Ok(text)),
            PeerFrame::Error(message) => Some(Err(AppError::transport(message))),
            PeerFrame::Close => None,
        }
    }

    async fn close(&mut self) {
        self.inbound.close();
    }
}

/// Server side of a scripted connection.
#[derive(Debug)]
pub struct MockPeer {
    to_client: mpsc::UnboundedSender<PeerFrame>,
    from_client: mpsc::UnboundedReceiver<String>,
}

impl MockPeer {
    /// Delivers a text frame to the client.
    pub fn push_text(&self, text: impl Into<String>) {
        let _ = self.to_client.send(PeerFrame::Text(text.into()));
    }

    /// Simulates a network failure.
    pub fn fail(&self, message: impl Into<String>) {
        let _ = self.to_client.send(PeerFrame::Error(message.into()));
    }

    /// Closes the connection from the server side.
    pub fn close(&self) {
        let _ = self.to_client.send(PeerFrame::Close);
    }

    /// Whether the client has closed or dropped its end.
    pub fn is_closed(&self) -> bool {
        self.to_client.is_closed()
    }

    /// Waits for the next frame written by the client.
    pub async fn recv_sent(&mut self) -> Option<String> {
        self.from_client.recv().await
    }

    /// Next frame written by the client, if one is already queued.
    pub fn try_recv_sent(&mut self) -> Option<String> {
        self.from_client.try_recv().ok()
    }
}
