//! Routes decoded frames to the store, the alert queue and announcement
//! subscribers.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, trace, warn};

use notify_core::types::{Announcement, NotificationId};

use crate::metrics::ClientMetrics;
use crate::notification::alerts::AlertQueue;
use crate::notification::store::NotificationStore;

use super::serializer;
use super::types::InboundEvent;
use super::validator;

/// What a routed frame turned into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Routed {
    /// Stored and alerted.
    Notification(NotificationId),
    /// Already in the recent window; dropped.
    Duplicate(NotificationId),
    /// Forwarded to announcement subscribers.
    Announcement,
    /// Probe reply, no effect.
    Pong,
    /// Well-formed but of an unknown kind.
    Ignored(String),
    /// Malformed and dropped.
    Discarded,
}

/// Dispatches inbound frames. Cloning shares every destination.
#[derive(Debug, Clone)]
pub struct MessageRouter {
    store: NotificationStore,
    alerts: AlertQueue,
    announcements: broadcast::Sender<Announcement>,
    metrics: Arc<ClientMetrics>,
    max_frame_bytes: usize,
}

impl MessageRouter {
    pub fn new(
        store: NotificationStore,
        alerts: AlertQueue,
        announcement_buffer: usize,
        max_frame_bytes: usize,
        metrics: Arc<ClientMetrics>,
    ) -> Self {
        let (announcements, _) = broadcast::channel(announcement_buffer.max(1));
        Self {
            store,
            alerts,
            announcements,
            metrics,
            max_frame_bytes,
        }
    }

    /// Decodes and dispatches one raw frame. Never fails: malformed frames
    /// are logged and dropped so later frames still get through.
    pub fn route(&self, raw: &str) -> Routed {
        self.metrics.frame_received();

        let frame = match validator::validate_inbound(raw, self.max_frame_bytes)
            .and_then(|()| serializer::decode_inbound(raw))
        {
            Ok(frame) => frame,
            Err(e) => {
                self.metrics.decode_failed();
                warn!(error = %e, len = raw.len(), "Discarding malformed frame");
                return Routed::Discarded;
            }
        };

        match frame.event {
            InboundEvent::Notification(notification) => {
                let id = notification.id;
                if !self.store.insert_if_new(notification.clone()) {
                    self.metrics.duplicate_discarded();
                    debug!(id, "Dropping redelivered notification");
                    return Routed::Duplicate(id);
                }
                debug!(id, kind = %notification.kind, "Notification received");
                self.metrics.notification_received();
                self.alerts.show(notification);
                Routed::Notification(id)
            }
            InboundEvent::Announcement(announcement) => {
                debug!(title = %announcement.title, "Announcement received");
                self.metrics.announcement_received();
                // No receivers is fine; nobody is displaying announcements.
                let _ = self.announcements.send(announcement);
                Routed::Announcement
            }
            InboundEvent::Pong => {
                trace!("Pong received");
                Routed::Pong
            }
            InboundEvent::Unknown { kind } => {
                debug!(kind = %kind, "Ignoring unknown event kind");
                Routed::Ignored(kind)
            }
        }
    }

    /// Clears stored notifications and alerts on an identity change.
    pub fn reset(&self) {
        self.store.clear();
        self.alerts.clear();
    }

    /// Subscribes to announcements from now on.
    pub fn announcements(&self) -> broadcast::Receiver<Announcement> {
        self.announcements.subscribe()
    }

    pub fn store(&self) -> &NotificationStore {
        &self.store
    }

    pub fn alerts(&self) -> &AlertQueue {
        &self.alerts
    }
}
