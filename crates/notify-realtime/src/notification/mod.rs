//! Notification state: the recent store, ephemeral alerts, and REST sync.

pub mod alerts;
pub mod history;
pub mod store;

pub use alerts::{AlertQueue, EphemeralAlert};
pub use history::{mark_all_read, mark_read, sync_history};
pub use store::{NotificationSnapshot, NotificationStore};
