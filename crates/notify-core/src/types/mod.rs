//! Shared domain types.

pub mod credential;
pub mod notification;

pub use credential::Credential;
pub use notification::{
    Announcement, GlobalNotification, HistoricalNotifications, Notification, NotificationId,
};
