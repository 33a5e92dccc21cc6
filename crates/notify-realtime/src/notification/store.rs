//! Bounded recent-notification store with an unread counter.
//!
//! State lives in a `watch` channel: every mutation is a single
//! read-modify-publish under the channel's lock, and subscribers always see
//! a complete snapshot.

use std::collections::VecDeque;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tracing::debug;

use notify_core::types::{Notification, NotificationId};

/// Immutable view of the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NotificationSnapshot {
    /// Newest first, by arrival order.
    pub recent: VecDeque<Notification>,
    /// Unread personal notifications. Independent of `recent`.
    pub unread_count: u64,
}

/// The notification store. Cloning shares the same state.
#[derive(Debug, Clone)]
pub struct NotificationStore {
    state: Arc<watch::Sender<NotificationSnapshot>>,
    capacity: usize,
}

impl NotificationStore {
    /// Creates an empty store holding at most `capacity` recent entries.
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = watch::channel(NotificationSnapshot::default());
        Self {
            state: Arc::new(tx),
            capacity: capacity.max(1),
        }
    }

    /// Records a pushed notification: prepends it, evicts past capacity and
    /// counts it as unread.
    pub fn insert(&self, notification: Notification) {
        let capacity = self.capacity;
        self.state.send_modify(|state| {
            state.recent.push_front(notification);
            state.recent.truncate(capacity);
            state.unread_count = state.unread_count.saturating_add(1);
        });
    }

    /// Like [`insert`](Self::insert), unless a notification with the same id
    /// is already in the recent window. Returns whether it was inserted.
    ///
    /// The check and the insert happen under one lock.
    pub fn insert_if_new(&self, notification: Notification) -> bool {
        let capacity = self.capacity;
        self.state.send_if_modified(|state| {
            if state.recent.iter().any(|n| n.id == notification.id) {
                return false;
            }
            state.recent.push_front(notification);
            state.recent.truncate(capacity);
            state.unread_count = state.unread_count.saturating_add(1);
            true
        })
    }

    /// Whether a notification with `id` is in the recent window.
    pub fn contains(&self, id: NotificationId) -> bool {
        self.state.borrow().recent.iter().any(|n| n.id == id)
    }

    /// Sets the unread counter to an absolute value.
    pub fn set_unread_count(&self, count: u64) {
        self.update_unread_count(|_| count);
    }

    /// Applies `updater` to the current unread count atomically with respect
    /// to [`insert`](Self::insert). Returns the new count.
    ///
    /// Decrements must go through here, e.g. `|n| n.saturating_sub(1)`.
    pub fn update_unread_count(&self, updater: impl FnOnce(u64) -> u64) -> u64 {
        let mut updated = 0;
        self.state.send_if_modified(|state| {
            let next = updater(state.unread_count);
            updated = next;
            if next == state.unread_count {
                false
            } else {
                state.unread_count = next;
                true
            }
        });
        updated
    }

    /// Subtracts `count` acknowledged notifications, saturating at zero.
    pub fn acknowledge(&self, count: u64) -> u64 {
        self.update_unread_count(|n| n.saturating_sub(count))
    }

    /// Empties the store.
    pub fn clear(&self) {
        self.state.send_if_modified(|state| {
            if state.recent.is_empty() && state.unread_count == 0 {
                return false;
            }
            *state = NotificationSnapshot::default();
            true
        });
        debug!("Notification store cleared");
    }

    /// Replaces the state with the server's view.
    ///
    /// `personal` is newest first. Pushed notifications newer than anything
    /// in `personal` (all of them, when `personal` is empty) were missed by
    /// the server's snapshot; they stay at the front and stay counted as
    /// unread.
    pub fn seed(&self, personal: Vec<Notification>, unread_count: u64) {
        let capacity = self.capacity;
        self.state.send_modify(|state| {
            let newest_known = personal.iter().map(|n| n.id).max();
            let pushed: Vec<Notification> = state
                .recent
                .drain(..)
                .filter(|n| newest_known.is_none_or(|max| n.id > max))
                .collect();

            let kept = pushed.len() as u64;
            state.recent = pushed.into_iter().chain(personal).take(capacity).collect();
            state.unread_count = unread_count.saturating_add(kept);
        });
    }

    /// Current state.
    pub fn snapshot(&self) -> NotificationSnapshot {
        self.state.borrow().clone()
    }

    /// Current unread count.
    pub fn unread_count(&self) -> u64 {
        self.state.borrow().unread_count
    }

    /// A receiver notified on every change. Dropping it unsubscribes.
    pub fn subscribe(&self) -> watch::Receiver<NotificationSnapshot> {
        self.state.subscribe()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.state.receiver_count()
    }

    /// Maximum number of recent entries kept.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
