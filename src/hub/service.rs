//! Inbound room operations
//!
//! The connection layer calls these with a room id. Session and broadcast
//! operations require the room to exist; membership operations create it.

use std::future::Future;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::notify::{ListenerDirectory, Notifier};
use crate::registry::{RegistryConfig, RoomRegistry};
use crate::room::{Room, RoomStats, SessionContent, SessionInfo};

/// Room service
pub struct RoomHub<N, D> {
    registry: Arc<RoomRegistry<N, D>>,
}

impl<N: Notifier, D: ListenerDirectory> RoomHub<N, D> {
    /// Create a hub with default registry configuration
    pub fn new(notifier: Arc<N>, directory: Arc<D>) -> Self {
        Self::with_config(notifier, directory, RegistryConfig::default())
    }

    /// Create a hub with custom registry configuration
    pub fn with_config(notifier: Arc<N>, directory: Arc<D>, config: RegistryConfig) -> Self {
        Self {
            registry: Arc::new(RoomRegistry::with_config(notifier, directory, config)),
        }
    }

    /// Get a reference to the room registry
    pub fn registry(&self) -> &Arc<RoomRegistry<N, D>> {
        &self.registry
    }

    async fn room(&self, room_id: &str) -> Result<Arc<Room>> {
        self.registry
            .get(room_id)
            .await
            .ok_or_else(|| Error::RoomNotFound(room_id.to_string()))
    }

    /// Resolve a room for a join, retrying if cleanup evicted it mid-join
    async fn join<F, Fut>(&self, room_id: &str, join: F) -> bool
    where
        F: Fn(Arc<Room>) -> Fut,
        Fut: Future<Output = bool>,
    {
        loop {
            let room = self.registry.get_or_create(room_id).await;
            let added = join(Arc::clone(&room)).await;

            // The join made the room active, so once it is still registered
            // here it can no longer be evicted from under us.
            if self.registry.is_registered(&room).await {
                return added;
            }
            tracing::debug!(room = %room_id, "Room evicted during join, retrying");
        }
    }

    // ---------------------------------------------------------------------
    // Broadcast lifecycle
    // ---------------------------------------------------------------------

    pub async fn start_broadcast(&self, room_id: &str) -> Result<()> {
        self.room(room_id).await?.start_broadcast().await;
        Ok(())
    }

    pub async fn stop_broadcast(&self, room_id: &str) -> Result<()> {
        self.room(room_id).await?.stop_broadcast().await;
        Ok(())
    }

    /// Publish the room's view and visitor counters
    pub async fn update_broadcast_status(&self, room_id: &str) -> Result<()> {
        self.room(room_id).await?.update_broadcast_status().await;
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Sessions
    //
    // `Ok(false)` means the room exists but the precondition did not hold,
    // so nothing changed and nothing was sent.
    // ---------------------------------------------------------------------

    pub async fn append_session(
        &self,
        room_id: &str,
        session_id: &str,
        content_type: &str,
        file_name: &str,
    ) -> Result<bool> {
        let room = self.room(room_id).await?;
        Ok(room.append_session(session_id, content_type, file_name).await)
    }

    pub async fn remove_session(&self, room_id: &str, session_id: &str) -> Result<bool> {
        let room = self.room(room_id).await?;
        Ok(room.remove_session(session_id).await)
    }

    pub async fn switch_active_session(&self, room_id: &str, session_id: &str) -> Result<bool> {
        let room = self.room(room_id).await?;
        Ok(room.switch_active_session(session_id).await)
    }

    pub async fn update_session(
        &self,
        room_id: &str,
        session_id: &str,
        content_type: &str,
        file_name: &str,
    ) -> Result<bool> {
        let room = self.room(room_id).await?;
        Ok(room.update_session(session_id, content_type, file_name).await)
    }

    pub async fn update_session_content(
        &self,
        room_id: &str,
        session_id: &str,
        content: SessionContent,
    ) -> Result<bool> {
        let room = self.room(room_id).await?;
        Ok(room.update_session_content(session_id, content).await)
    }

    pub async fn get_session(&self, room_id: &str, session_id: &str) -> Result<Option<SessionInfo>> {
        Ok(self.room(room_id).await?.get_session(session_id).await)
    }

    pub async fn current_session(&self, room_id: &str) -> Result<Option<SessionInfo>> {
        Ok(self.room(room_id).await?.current_session().await)
    }

    // ---------------------------------------------------------------------
    // Membership and counters
    // ---------------------------------------------------------------------

    /// Subscribe a listener, creating the room on first reference
    pub async fn join_listener(&self, room_id: &str, listener_id: &str) -> bool {
        self.join(room_id, |room| async move { room.add_listener(listener_id).await })
            .await
    }

    pub async fn leave_listener(&self, room_id: &str, listener_id: &str) -> Result<bool> {
        Ok(self.room(room_id).await?.remove_listener(listener_id).await)
    }

    /// Register a broadcaster, creating the room on first reference
    pub async fn join_broadcaster(&self, room_id: &str, broadcaster_id: &str) -> bool {
        self.join(room_id, |room| async move {
            room.add_broadcaster(broadcaster_id).await
        })
        .await
    }

    pub async fn leave_broadcaster(&self, room_id: &str, broadcaster_id: &str) -> Result<bool> {
        Ok(self
            .room(room_id)
            .await?
            .remove_broadcaster(broadcaster_id)
            .await)
    }

    /// Count a view; returns the new total
    pub async fn record_view(&self, room_id: &str) -> Result<u64> {
        Ok(self.room(room_id).await?.record_view().await)
    }

    /// Count a visitor; returns the new total
    pub async fn record_visit(&self, room_id: &str) -> Result<u64> {
        Ok(self.room(room_id).await?.record_visit().await)
    }

    pub async fn room_stats(&self, room_id: &str) -> Result<RoomStats> {
        Ok(self.room(room_id).await?.stats().await)
    }

    /// Run the room cleanup task until `shutdown` resolves
    pub async fn run_until<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let cleanup_handle = self.registry.spawn_cleanup_task();
        tracing::info!(
            idle_room_timeout_secs = self.registry.config().idle_room_timeout.as_secs(),
            "Room hub running"
        );

        shutdown.await;
        tracing::info!("Shutdown signal received");

        cleanup_handle.abort();
    }
}
