//! Client metrics counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Monotonic counters for the notification client.
#[derive(Debug, Default)]
pub struct ClientMetrics {
    /// Inbound text frames read from the transport
    pub frames_received: AtomicU64,
    /// Frames discarded as malformed
    pub decode_failures: AtomicU64,
    /// Personal notifications stored
    pub notifications_received: AtomicU64,
    /// Notifications dropped because their id was already stored
    pub duplicates_discarded: AtomicU64,
    /// Announcements forwarded
    pub announcements_received: AtomicU64,
    /// Probes written to the transport
    pub probes_sent: AtomicU64,
    /// Outbound frames dropped because the channel was not open
    pub probes_dropped: AtomicU64,
    /// Channels successfully opened
    pub connections_opened: AtomicU64,
    /// Scheduled reconnects that fired
    pub reconnect_attempts: AtomicU64,
}

impl ClientMetrics {
    /// Create new zeroed metrics
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frame_received(&self) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn decode_failed(&self) {
        self.decode_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn notification_received(&self) {
        self.notifications_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn duplicate_discarded(&self) {
        self.duplicates_discarded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn announcement_received(&self) {
        self.announcements_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn probe_sent(&self) {
        self.probes_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn probe_dropped(&self) {
        self.probes_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_opened(&self) {
        self.connections_opened.fetch_add(1, Ordering::Relaxed);
    }

    pub fn reconnect_attempt(&self) {
        self.reconnect_attempts.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            frames_received: self.frames_received.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            notifications_received: self.notifications_received.load(Ordering::Relaxed),
            duplicates_discarded: self.duplicates_discarded.load(Ordering::Relaxed),
            announcements_received: self.announcements_received.load(Ordering::Relaxed),
            probes_sent: self.probes_sent.load(Ordering::Relaxed),
            probes_dropped: self.probes_dropped.load(Ordering::Relaxed),
            connections_opened: self.connections_opened.load(Ordering::Relaxed),
            reconnect_attempts: self.reconnect_attempts.load(Ordering::Relaxed),
        }
    }
}

/// Serializable metrics snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub frames_received: u64,
    pub decode_failures: u64,
    pub notifications_received: u64,
    pub duplicates_discarded: u64,
    pub announcements_received: u64,
    pub probes_sent: u64,
    pub probes_dropped: u64,
    pub connections_opened: u64,
    pub reconnect_attempts: u64,
}
