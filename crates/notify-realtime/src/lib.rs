//! # notify-realtime
//!
//! Real-time notification client for the campus portfolio portal. Provides:
//!
//! - A single reconnecting WebSocket channel with an explicit state machine
//!   and exponential backoff
//! - Best-effort liveness probing while the channel is open
//! - Decoding and routing of inbound push events
//! - A bounded recent-notification store with an unread counter
//! - Snapshot fan-out to any number of UI consumers
//! - Auto-expiring ephemeral alerts

pub mod client;
pub mod connection;
pub mod message;
pub mod metrics;
pub mod notification;

pub use client::{ClientView, RealtimeClient};
pub use connection::credential::CredentialSource;
pub use connection::handle::ConnectionHandle;
pub use connection::state::{ChannelState, ChannelStatus};
pub use notification::alerts::{AlertQueue, EphemeralAlert};
pub use notification::store::{NotificationSnapshot, NotificationStore};
