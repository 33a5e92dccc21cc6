//! Wire-level message types for the notification channel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use notify_core::types::{Announcement, Notification};

/// A decoded server event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// A personal notification; stored and counted as unread.
    Notification(Notification),
    /// A broadcast announcement; shown, never stored.
    Announcement(Announcement),
    /// Reply to a liveness probe.
    Pong,
    /// A kind this client does not know. Ignored.
    Unknown {
        /// The `type` the server sent.
        kind: String,
    },
}

impl InboundEvent {
    /// The wire `type` of this event.
    pub fn kind(&self) -> &str {
        match self {
            Self::Notification(_) => "notification",
            Self::Announcement(_) => "announcement",
            Self::Pong => "pong",
            Self::Unknown { kind } => kind,
        }
    }
}

/// One inbound frame: the event plus its envelope metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundFrame {
    pub event: InboundEvent,
    /// Recipient, when the server includes it.
    pub user_id: Option<String>,
    /// Server send time.
    pub timestamp: Option<DateTime<Utc>>,
}

/// Raw envelope, before the payload is interpreted.
#[derive(Debug, Deserialize)]
pub(crate) struct WireEnvelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Messages the client sends to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    /// Liveness probe.
    Ping,
}
