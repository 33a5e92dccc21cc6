//! Channel state machine and the status published to consumers.

use std::fmt;

use serde::Serialize;

/// Lifecycle state of the single notification channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelState {
    /// No transport. Initial state.
    Disconnected,
    /// A transport open is in flight.
    Connecting,
    /// The transport is open and frames are flowing.
    Open,
    /// Deliberate teardown in progress.
    Closing,
}

impl ChannelState {
    /// Transition table. Anything not listed is illegal.
    pub fn can_transition_to(self, next: ChannelState) -> bool {
        use ChannelState::*;

        matches!(
            (self, next),
            (Disconnected, Connecting)
                | (Connecting, Open)
                | (Connecting, Disconnected)
                | (Open, Disconnected)
                | (Open, Closing)
                | (Closing, Disconnected)
        )
    }

    /// Lowercase name used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closing => "closing",
        }
    }
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of the connection manager, published on every change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChannelStatus {
    /// Current channel state.
    pub state: ChannelState,
    /// Scheduled reconnects fired since the last successful open.
    pub reconnect_attempts: u32,
    /// Whether a reconnect timer is armed.
    pub reconnect_pending: bool,
    /// Whether the attempt budget ran out. Cleared by an explicit connect.
    pub retry_exhausted: bool,
    /// Bumped on every successful open. Tells a quick close and reopen apart
    /// from an unchanged open channel.
    pub connection_generation: u64,
}

impl ChannelStatus {
    /// The `isConnected` flag shown to the user.
    pub fn is_connected(&self) -> bool {
        self.state == ChannelState::Open
    }
}

impl Default for ChannelStatus {
    fn default() -> Self {
        Self {
            state: ChannelState::Disconnected,
            reconnect_attempts: 0,
            reconnect_pending: false,
            retry_exhausted: false,
            connection_generation: 0,
        }
    }
}
