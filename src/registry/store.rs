//! Room registry implementation
//!
//! The process-wide map from room id to the single `Room` instance for that
//! id. Creating a room also starts its dispatcher task.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::RwLock;

use crate::notify::dispatcher::Dispatcher;
use crate::notify::{ListenerDirectory, Notifier};
use crate::room::{Room, RoomId};
use crate::stats::{DispatchSnapshot, DispatchStats};

use super::config::RegistryConfig;

/// Central registry for all live rooms
///
/// The registry lock only guards the map. Room state has its own lock, so
/// operations on different rooms never contend beyond a brief map lookup.
pub struct RoomRegistry<N, D> {
    /// Map of room id to room
    rooms: RwLock<HashMap<RoomId, Arc<Room>>>,

    notifier: Arc<N>,
    directory: Arc<D>,

    /// Counters shared by every room's dispatcher
    stats: Arc<DispatchStats>,

    config: RegistryConfig,
}

impl<N: Notifier, D: ListenerDirectory> RoomRegistry<N, D> {
    /// Create a registry with default configuration
    pub fn new(notifier: Arc<N>, directory: Arc<D>) -> Self {
        Self::with_config(notifier, directory, RegistryConfig::default())
    }

    /// Create a registry with custom configuration
    pub fn with_config(notifier: Arc<N>, directory: Arc<D>, config: RegistryConfig) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            notifier,
            directory,
            stats: Arc::new(DispatchStats::new()),
            config,
        }
    }

    /// Get the registry configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// The notifier rooms deliver through
    pub fn notifier(&self) -> &Arc<N> {
        &self.notifier
    }

    /// The directory used for liveness checks
    pub fn directory(&self) -> &Arc<D> {
        &self.directory
    }

    /// Dispatch counters across all rooms
    pub fn dispatch_stats(&self) -> DispatchSnapshot {
        self.stats.snapshot()
    }

    /// Get a room, creating it if it doesn't exist
    ///
    /// Must be called from within a Tokio runtime: a new room spawns its
    /// dispatcher task.
    pub async fn get_or_create(&self, room_id: &str) -> Arc<Room> {
        if let Some(room) = self.rooms.read().await.get(room_id) {
            return Arc::clone(room);
        }

        let mut rooms = self.rooms.write().await;

        // Another task may have created it between the two locks
        if let Some(room) = rooms.get(room_id) {
            return Arc::clone(room);
        }

        let dispatch = Dispatcher::new(
            room_id.to_string(),
            Arc::clone(&self.notifier),
            Arc::clone(&self.directory),
            self.config.delivery_timeout,
            Arc::clone(&self.stats),
        )
        .spawn();
        let room = Arc::new(Room::new(
            room_id.to_string(),
            dispatch,
            Arc::clone(&self.stats),
        ));
        rooms.insert(room_id.to_string(), Arc::clone(&room));

        tracing::info!(room = %room_id, rooms = rooms.len(), "Room created");
        room
    }

    /// Get a room if it exists
    pub async fn get(&self, room_id: &str) -> Option<Arc<Room>> {
        self.rooms.read().await.get(room_id).cloned()
    }

    /// Whether `room` is still the registered instance for its id
    ///
    /// False once the room has been evicted or replaced.
    pub async fn is_registered(&self, room: &Arc<Room>) -> bool {
        self.rooms
            .read()
            .await
            .get(room.id())
            .is_some_and(|current| Arc::ptr_eq(current, room))
    }

    /// Remove a room unconditionally
    ///
    /// Its dispatcher drains the remaining queue and stops once the last
    /// handle to the room is dropped.
    pub async fn remove(&self, room_id: &str) -> Option<Arc<Room>> {
        let removed = self.rooms.write().await.remove(room_id);
        if removed.is_some() {
            tracing::info!(room = %room_id, "Room removed");
        }
        removed
    }

    /// Ids of all registered rooms
    pub async fn room_ids(&self) -> Vec<RoomId> {
        self.rooms.read().await.keys().cloned().collect()
    }

    /// Get total number of rooms
    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }

    /// Run cleanup once
    ///
    /// Evicts rooms that have had no listeners, no broadcasters and no live
    /// broadcast for longer than `idle_room_timeout`. Returns how many were
    /// evicted.
    pub async fn cleanup(&self) -> usize {
        let mut rooms = self.rooms.write().await;
        let now = Instant::now();

        let ids_to_remove: Vec<RoomId> = rooms
            .iter()
            .filter_map(|(id, room)| {
                // Rooms whose lock is held right now are busy, not idle
                let idle = room.idle_for(now)?;
                (idle > self.config.idle_room_timeout).then(|| id.clone())
            })
            .collect();

        for id in &ids_to_remove {
            rooms.remove(id);
            tracing::info!(room = %id, "Room evicted by cleanup");
        }

        ids_to_remove.len()
    }

    /// Spawn background cleanup task
    ///
    /// Returns a handle that can be used to abort the task.
    pub fn spawn_cleanup_task(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let registry = Arc::clone(self);
        let interval = registry.config.cleanup_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                registry.cleanup().await;
            }
        })
    }
}
