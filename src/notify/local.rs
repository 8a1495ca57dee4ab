//! In-process notifier and directory
//!
//! `LocalNotifier` keeps one `tokio::sync::broadcast` channel per room group;
//! connection tasks call [`LocalNotifier::join`] and forward whatever they
//! receive to their socket. `LocalDirectory` tracks which connection ids are
//! currently open.

use std::collections::{HashMap, HashSet};
use std::sync::{PoisonError, RwLock as StdRwLock};

use tokio::sync::{broadcast, RwLock};

use crate::error::DeliveryError;
use crate::room::{ListenerId, RoomId};

use super::notification::Notification;
use super::notifier::{ListenerDirectory, Notifier};

/// Default per-group channel capacity
pub const DEFAULT_GROUP_CAPACITY: usize = 256;

/// Group broadcast over in-process channels
///
/// Slow receivers that fall more than `capacity` notifications behind see
/// `RecvError::Lagged` and skip ahead; delivery is best effort.
pub struct LocalNotifier {
    groups: RwLock<HashMap<RoomId, broadcast::Sender<Notification>>>,
    capacity: usize,
}

impl LocalNotifier {
    /// Create a notifier with the default group capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_GROUP_CAPACITY)
    }

    /// Create a notifier with a custom group capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            groups: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Subscribe a connection to a room's group
    pub async fn join(&self, room_id: &str) -> broadcast::Receiver<Notification> {
        if let Some(tx) = self.groups.read().await.get(room_id) {
            return tx.subscribe();
        }

        let mut groups = self.groups.write().await;
        groups
            .entry(room_id.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Number of receivers currently subscribed to a group
    pub async fn group_size(&self, room_id: &str) -> usize {
        self.groups
            .read()
            .await
            .get(room_id)
            .map(|tx| tx.receiver_count())
            .unwrap_or(0)
    }

    /// Drop groups that no longer have any receivers
    ///
    /// Returns the number of groups removed.
    pub async fn prune(&self) -> usize {
        let mut groups = self.groups.write().await;
        let before = groups.len();
        groups.retain(|_, tx| tx.receiver_count() > 0);
        before - groups.len()
    }
}

impl Default for LocalNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for LocalNotifier {
    async fn broadcast_to_group(
        &self,
        room_id: &str,
        notification: Notification,
    ) -> Result<(), DeliveryError> {
        let groups = self.groups.read().await;
        let tx = groups
            .get(room_id)
            .ok_or_else(|| DeliveryError::GroupClosed(room_id.to_string()))?;

        // send() only fails when every receiver has been dropped
        tx.send(notification)
            .map(|_| ())
            .map_err(|_| DeliveryError::GroupClosed(room_id.to_string()))
    }
}

/// Set of currently connected listener ids
#[derive(Default)]
pub struct LocalDirectory {
    live: StdRwLock<HashSet<ListenerId>>,
}

impl LocalDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a connection as live
    pub fn connect(&self, listener_id: impl Into<ListenerId>) {
        self.live
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(listener_id.into());
    }

    /// Mark a connection as gone
    pub fn disconnect(&self, listener_id: &str) -> bool {
        self.live
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(listener_id)
    }

    /// Number of live connections
    pub fn len(&self) -> usize {
        self.live
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ListenerDirectory for LocalDirectory {
    fn is_live(&self, listener_id: &str) -> bool {
        self.live
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(listener_id)
    }
}
