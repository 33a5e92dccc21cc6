//! Channel management — state machine, backoff, transport, credential, heartbeat.

pub mod backoff;
pub mod credential;
pub mod handle;
pub mod heartbeat;
pub mod manager;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod state;
pub mod transport;

pub use handle::ConnectionHandle;
pub use manager::ConnectionManager;
pub use state::{ChannelState, ChannelStatus};
pub use transport::{Connector, Transport, WsConnector};
