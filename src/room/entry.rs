//! Room state and mutation operations
//!
//! All state sits behind one lock per room. Every mutation applies its change
//! and queues the resulting notification inside the same critical section,
//! which gives per-room delivery order equal to commit order. Session
//! mutations whose precondition fails are no-ops: no state change and no
//! notification. Broadcast start/stop always notify.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use crate::notify::dispatcher::{Dispatch, DispatchSender};
use crate::notify::Notification;
use crate::stats::DispatchStats;

use super::session::{Session, SessionContent, SessionInfo};
use super::{BroadcasterId, ListenerId, RoomId, RoomState, RoomStats, SessionId};

/// Mutable room state, guarded by `Room::inner`
struct RoomInner {
    sessions: HashMap<SessionId, Session>,

    /// Id of the current session; always a key of `sessions` when set
    current_session: Option<SessionId>,

    listeners: HashSet<ListenerId>,
    broadcasters: HashSet<BroadcasterId>,
    is_broadcasting: bool,
    view_count: u64,
    visitor_count: u64,

    /// Next session insertion sequence
    next_seq: u64,

    /// When the room last became idle (None while active)
    idle_since: Option<Instant>,
}

impl RoomInner {
    fn new() -> Self {
        Self {
            sessions: HashMap::new(),
            current_session: None,
            listeners: HashSet::new(),
            broadcasters: HashSet::new(),
            is_broadcasting: false,
            view_count: 0,
            visitor_count: 0,
            next_seq: 0,
            idle_since: Some(Instant::now()),
        }
    }

    fn state(&self) -> RoomState {
        if self.listeners.is_empty() && self.broadcasters.is_empty() && !self.is_broadcasting {
            RoomState::Idle
        } else {
            RoomState::Active
        }
    }

    /// Keep `idle_since` in step with membership and broadcast changes
    fn refresh_idle(&mut self) {
        match (self.state(), self.idle_since) {
            (RoomState::Idle, None) => self.idle_since = Some(Instant::now()),
            (RoomState::Active, Some(_)) => self.idle_since = None,
            _ => {}
        }
    }
}

/// A live broadcast room
pub struct Room {
    id: RoomId,
    inner: Mutex<RoomInner>,
    dispatch: DispatchSender,
    stats: Arc<DispatchStats>,
    created_at: Instant,
}

impl Room {
    pub(crate) fn new(id: RoomId, dispatch: DispatchSender, stats: Arc<DispatchStats>) -> Self {
        Self {
            id,
            inner: Mutex::new(RoomInner::new()),
            dispatch,
            stats,
            created_at: Instant::now(),
        }
    }

    /// Room id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Queue a notification for the dispatcher
    ///
    /// Must be called with the state lock held so the listener snapshot and
    /// the queue position both match the mutation just applied.
    fn publish(&self, inner: &RoomInner, notification: Notification) {
        let kind = notification.kind();
        let dispatch = Dispatch {
            notification,
            listeners: inner.listeners.iter().cloned().collect(),
        };

        self.stats.record_enqueued();
        if self.dispatch.send(dispatch).is_err() {
            self.stats.record_failed();
            tracing::warn!(room = %self.id, kind = %kind, "Dispatcher gone, notification dropped");
        }
    }

    // ---------------------------------------------------------------------
    // Broadcast lifecycle
    // ---------------------------------------------------------------------

    /// Mark the room as broadcasting
    ///
    /// Idempotent on state, but every call notifies.
    pub async fn start_broadcast(&self) {
        let mut inner = self.inner.lock().await;
        inner.is_broadcasting = true;
        inner.refresh_idle();

        tracing::info!(room = %self.id, listeners = inner.listeners.len(), "Broadcast started");
        self.publish(&inner, Notification::StartBroadcast);
    }

    /// Mark the room as not broadcasting
    ///
    /// Idempotent on state, but every call notifies.
    pub async fn stop_broadcast(&self) {
        let mut inner = self.inner.lock().await;
        inner.is_broadcasting = false;
        inner.refresh_idle();

        tracing::info!(room = %self.id, "Broadcast stopped");
        self.publish(&inner, Notification::StopBroadcast);
    }

    /// Publish the current audience counters
    pub async fn update_broadcast_status(&self) {
        let inner = self.inner.lock().await;
        let notification = Notification::UpdateBroadcastStatus {
            view_count: inner.view_count,
            visitor_count: inner.visitor_count,
        };
        self.publish(&inner, notification);
    }

    pub async fn is_broadcasting(&self) -> bool {
        self.inner.lock().await.is_broadcasting
    }

    // ---------------------------------------------------------------------
    // Sessions
    // ---------------------------------------------------------------------

    /// Add a session
    ///
    /// Returns `false` (and changes nothing) if the id is already taken.
    pub async fn append_session(
        &self,
        session_id: impl Into<SessionId>,
        content_type: impl Into<String>,
        file_name: impl Into<String>,
    ) -> bool {
        let session_id = session_id.into();
        let mut inner = self.inner.lock().await;

        if inner.sessions.contains_key(&session_id) {
            tracing::debug!(room = %self.id, session_id = %session_id, "Session already exists");
            return false;
        }

        let seq = inner.next_seq;
        inner.next_seq += 1;

        let session = Session::new(session_id.clone(), content_type.into(), file_name.into(), seq);
        let notification = Notification::AppendSession {
            session_id: session_id.clone(),
            content_type: session.content_type().to_string(),
            file_name: session.file_name().to_string(),
        };
        inner.sessions.insert(session_id.clone(), session);

        tracing::debug!(room = %self.id, session_id = %session_id, "Session appended");
        self.publish(&inner, notification);
        true
    }

    /// Remove a session, clearing the current session if it pointed there
    pub async fn remove_session(&self, session_id: &str) -> bool {
        let mut inner = self.inner.lock().await;

        if inner.sessions.remove(session_id).is_none() {
            return false;
        }
        if inner.current_session.as_deref() == Some(session_id) {
            inner.current_session = None;
        }

        tracing::debug!(room = %self.id, session_id = %session_id, "Session removed");
        self.publish(
            &inner,
            Notification::RemoveSession {
                session_id: session_id.to_string(),
            },
        );
        true
    }

    /// Make an existing session the current one
    pub async fn switch_active_session(&self, session_id: &str) -> bool {
        let mut inner = self.inner.lock().await;

        if !inner.sessions.contains_key(session_id) {
            return false;
        }
        inner.current_session = Some(session_id.to_string());

        tracing::debug!(room = %self.id, session_id = %session_id, "Active session switched");
        self.publish(
            &inner,
            Notification::SwitchActiveSession {
                session_id: session_id.to_string(),
            },
        );
        true
    }

    /// Replace a session's content type and file name
    pub async fn update_session(
        &self,
        session_id: &str,
        content_type: impl Into<String>,
        file_name: impl Into<String>,
    ) -> bool {
        let mut inner = self.inner.lock().await;

        let Some(session) = inner.sessions.get_mut(session_id) else {
            return false;
        };
        session.update_descriptor(content_type.into(), file_name.into());

        let notification = Notification::UpdateSession {
            session_id: session_id.to_string(),
            content_type: session.content_type().to_string(),
            file_name: session.file_name().to_string(),
        };

        tracing::debug!(room = %self.id, session_id = %session_id, "Session updated");
        self.publish(&inner, notification);
        true
    }

    /// Replace a session's content
    pub async fn update_session_content(&self, session_id: &str, content: SessionContent) -> bool {
        let mut inner = self.inner.lock().await;

        let Some(session) = inner.sessions.get_mut(session_id) else {
            return false;
        };
        session.update_content(content.clone());

        tracing::debug!(
            room = %self.id,
            session_id = %session_id,
            bytes = content.payload.len(),
            "Session content updated"
        );
        self.publish(
            &inner,
            Notification::UpdateSessionContent {
                session_id: session_id.to_string(),
                content,
            },
        );
        true
    }

    /// Look up a session
    pub async fn get_session(&self, session_id: &str) -> Option<SessionInfo> {
        self.inner.lock().await.sessions.get(session_id).map(Session::info)
    }

    /// The current session, if one is set
    pub async fn current_session(&self) -> Option<SessionInfo> {
        let inner = self.inner.lock().await;
        inner
            .current_session
            .as_deref()
            .and_then(|id| inner.sessions.get(id))
            .map(Session::info)
    }

    /// All sessions in insertion order
    pub async fn sessions(&self) -> Vec<SessionInfo> {
        let inner = self.inner.lock().await;
        let mut sessions: Vec<&Session> = inner.sessions.values().collect();
        sessions.sort_by_key(|s| s.seq());
        sessions.into_iter().map(Session::info).collect()
    }

    // ---------------------------------------------------------------------
    // Membership and counters
    // ---------------------------------------------------------------------

    /// Subscribe a listener; returns `false` if already subscribed
    pub async fn add_listener(&self, listener_id: impl Into<ListenerId>) -> bool {
        let mut inner = self.inner.lock().await;
        let added = inner.listeners.insert(listener_id.into());
        inner.refresh_idle();
        added
    }

    /// Unsubscribe a listener; returns `false` if it was not subscribed
    pub async fn remove_listener(&self, listener_id: &str) -> bool {
        let mut inner = self.inner.lock().await;
        let removed = inner.listeners.remove(listener_id);
        inner.refresh_idle();
        removed
    }

    /// Listener ids currently subscribed
    pub async fn listeners(&self) -> Vec<ListenerId> {
        self.inner.lock().await.listeners.iter().cloned().collect()
    }

    /// Register a broadcaster; returns `false` if already registered
    pub async fn add_broadcaster(&self, broadcaster_id: impl Into<BroadcasterId>) -> bool {
        let mut inner = self.inner.lock().await;
        let added = inner.broadcasters.insert(broadcaster_id.into());
        inner.refresh_idle();
        added
    }

    /// Unregister a broadcaster; returns `false` if it was not registered
    pub async fn remove_broadcaster(&self, broadcaster_id: &str) -> bool {
        let mut inner = self.inner.lock().await;
        let removed = inner.broadcasters.remove(broadcaster_id);
        inner.refresh_idle();
        removed
    }

    /// Whether this id may mutate the room's sessions
    pub async fn is_broadcaster(&self, broadcaster_id: &str) -> bool {
        self.inner.lock().await.broadcasters.contains(broadcaster_id)
    }

    /// Count one more view
    pub async fn record_view(&self) -> u64 {
        let mut inner = self.inner.lock().await;
        inner.view_count += 1;
        inner.view_count
    }

    /// Count one more visitor
    pub async fn record_visit(&self) -> u64 {
        let mut inner = self.inner.lock().await;
        inner.visitor_count += 1;
        inner.visitor_count
    }

    /// Overwrite both counters
    pub async fn set_counts(&self, view_count: u64, visitor_count: u64) {
        let mut inner = self.inner.lock().await;
        inner.view_count = view_count;
        inner.visitor_count = visitor_count;
    }

    /// Snapshot of the room
    pub async fn stats(&self) -> RoomStats {
        let inner = self.inner.lock().await;
        RoomStats {
            session_count: inner.sessions.len(),
            current_session: inner.current_session.clone(),
            listener_count: inner.listeners.len(),
            broadcaster_count: inner.broadcasters.len(),
            is_broadcasting: inner.is_broadcasting,
            view_count: inner.view_count,
            visitor_count: inner.visitor_count,
            state: inner.state(),
            age: self.created_at.elapsed(),
        }
    }

    /// How long the room has been idle
    ///
    /// Returns `None` if the room is active or its lock is currently held;
    /// a busy room is never a candidate for eviction.
    pub(crate) fn idle_for(&self, now: Instant) -> Option<Duration> {
        let inner = self.inner.try_lock().ok()?;
        inner.idle_since.map(|since| now.saturating_duration_since(since))
    }
}

impl std::fmt::Debug for Room {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Room").field("id", &self.id).finish_non_exhaustive()
    }
}
