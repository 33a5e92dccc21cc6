//! Short-lived alerts shown when a notification arrives.
//!
//! Each alert removes itself after the display duration. Expired alerts are
//! filtered on read as well, so an alert past its deadline is never
//! observable even if the expiry task has not run yet.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::time::{self, Instant};
use tracing::{trace, warn};

use notify_core::types::{Notification, NotificationId};

/// An alert wrapping a newly arrived notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EphemeralAlert {
    pub id: NotificationId,
    pub notification: Notification,
    pub display_until: Instant,
}

impl EphemeralAlert {
    /// Whether the alert is still displayable at `now`.
    pub fn is_live_at(&self, now: Instant) -> bool {
        now < self.display_until
    }
}

/// Queue of active alerts. Cloning shares the same queue.
#[derive(Debug, Clone)]
pub struct AlertQueue {
    alerts: Arc<watch::Sender<Vec<EphemeralAlert>>>,
    display: Duration,
}

impl AlertQueue {
    pub fn new(display: Duration) -> Self {
        let (tx, _rx) = watch::channel(Vec::new());
        Self {
            alerts: Arc::new(tx),
            display,
        }
    }

    /// Shows an alert for `notification` and schedules its removal.
    ///
    /// A notification already on screen is replaced and its timer restarts.
    pub fn show(&self, notification: Notification) {
        let id = notification.id;
        let display_until = Instant::now() + self.display;
        self.alerts.send_modify(|alerts| {
            alerts.retain(|a| a.id != id);
            alerts.push(EphemeralAlert {
                id,
                notification,
                display_until,
            });
        });

        let Ok(runtime) = Handle::try_current() else {
            warn!(id, "No runtime for alert expiry; alert expires on read only");
            return;
        };

        let alerts = Arc::clone(&self.alerts);
        runtime.spawn(async move {
            time::sleep_until(display_until).await;
            alerts.send_if_modified(|alerts| {
                let before = alerts.len();
                // Only this alert's own instance; a re-shown alert has a later deadline.
                alerts.retain(|a| !(a.id == id && a.display_until <= display_until));
                alerts.len() != before
            });
            trace!(id, "Alert expired");
        });
    }

    /// Removes the alert for `id` now. Returns whether one was showing.
    pub fn dismiss(&self, id: NotificationId) -> bool {
        self.alerts.send_if_modified(|alerts| {
            let before = alerts.len();
            alerts.retain(|a| a.id != id);
            alerts.len() != before
        })
    }

    /// Removes every alert.
    pub fn clear(&self) {
        self.alerts.send_if_modified(|alerts| {
            let had_any = !alerts.is_empty();
            alerts.clear();
            had_any
        });
    }

    /// Alerts currently displayable, oldest first.
    pub fn active(&self) -> Vec<EphemeralAlert> {
        let now = Instant::now();
        self.alerts
            .borrow()
            .iter()
            .filter(|a| a.is_live_at(now))
            .cloned()
            .collect()
    }

    /// A receiver notified whenever alerts appear or disappear.
    ///
    /// Receivers see the raw list; filter with [`EphemeralAlert::is_live_at`].
    pub fn subscribe(&self) -> watch::Receiver<Vec<EphemeralAlert>> {
        self.alerts.subscribe()
    }

    pub fn display_duration(&self) -> Duration {
        self.display
    }
}
