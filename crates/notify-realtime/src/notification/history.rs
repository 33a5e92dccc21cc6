//! Seeding and acknowledging notifications through the REST collaborator.

use tracing::{debug, info};

use notify_core::result::AppResult;
use notify_core::traits::NotificationApi;
use notify_core::types::{GlobalNotification, NotificationId};

use super::store::NotificationStore;

/// Fetches the server's view and seeds the store with it.
///
/// Returns the broadcast notices, which the store does not hold.
pub async fn sync_history<A>(api: &A, store: &NotificationStore) -> AppResult<Vec<GlobalNotification>>
where
    A: NotificationApi + ?Sized,
{
    let history = api.fetch_historical().await?;
    info!(
        personal = history.personal.len(),
        global = history.global.len(),
        unread = history.unread_count,
        "Seeding notification store from history"
    );
    store.seed(history.personal, history.unread_count);
    Ok(history.global)
}

/// Marks one notification read on the server, then decrements the counter.
///
/// The counter is untouched if the request fails.
pub async fn mark_read<A>(api: &A, store: &NotificationStore, id: NotificationId) -> AppResult<u64>
where
    A: NotificationApi + ?Sized,
{
    api.acknowledge(id).await?;
    let remaining = store.update_unread_count(|n| n.saturating_sub(1));
    debug!(id, remaining, "Notification marked read");
    Ok(remaining)
}

/// Marks everything read on the server.
///
/// Only the notifications counted when the request was made are subtracted,
/// so pushes that arrive while it is in flight stay unread.
pub async fn mark_all_read<A>(api: &A, store: &NotificationStore) -> AppResult<u64>
where
    A: NotificationApi + ?Sized,
{
    let acknowledged = store.unread_count();
    api.acknowledge_all().await?;
    let remaining = store.acknowledge(acknowledged);
    debug!(acknowledged, remaining, "All notifications marked read");
    Ok(remaining)
}
