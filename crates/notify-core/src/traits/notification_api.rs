//! REST collaborator for historical notifications and read acknowledgements.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::notification::{HistoricalNotifications, NotificationId};

/// Access to the notification REST endpoints.
///
/// The client never owns this transport; it only reacts to the outcome of
/// these calls by adjusting its unread counter.
#[async_trait]
pub trait NotificationApi: Send + Sync + 'static {
    /// Fetch personal and global notifications plus the server unread count.
    async fn fetch_historical(&self) -> AppResult<HistoricalNotifications>;

    /// Mark a single personal notification as read.
    async fn acknowledge(&self, id: NotificationId) -> AppResult<()>;

    /// Mark every personal notification as read.
    async fn acknowledge_all(&self) -> AppResult<()>;
}
