//! Notification records as delivered by the push channel and the REST API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Server-assigned notification identifier.
pub type NotificationId = i64;

/// A personal notification. Immutable once created; read state is tracked
/// by the client's unread counter, not on the record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Identity of the notification.
    pub id: NotificationId,
    /// Category, e.g. `"rating"` or `"comment"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Short title.
    pub title: String,
    /// Body text.
    pub message: String,
    /// Optional in-app link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    /// Optional opaque metadata string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
    /// Creation time on the server.
    pub created_at: DateTime<Utc>,
}

/// A broadcast announcement. Not stored and never counted as unread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Announcement {
    /// Announcement title.
    pub title: String,
    /// Announcement body.
    pub message: String,
}

/// A role-targeted broadcast notice from the history endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalNotification {
    /// Notice identifier.
    pub id: String,
    /// Title.
    pub title: String,
    /// Body.
    pub message: String,
    /// Category.
    #[serde(rename = "type")]
    pub kind: String,
    /// Role the notice targets; `None` means everyone.
    #[serde(default)]
    pub target_role: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Whether the current user has read it.
    #[serde(default)]
    pub is_read: bool,
}

/// Server view of a user's notifications, used to seed the client after login.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricalNotifications {
    /// Personal notifications, newest first.
    #[serde(default)]
    pub personal: Vec<Notification>,
    /// Broadcast notices, newest first.
    #[serde(default)]
    pub global: Vec<GlobalNotification>,
    /// Server-side unread count of personal notifications.
    #[serde(default)]
    pub unread_count: u64,
}
