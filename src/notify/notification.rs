//! Outbound notification kinds
//!
//! One variant per state change a room publishes to its broadcast group.
//! Payloads use `Bytes`, so cloning a notification for a group channel only
//! bumps a reference count.

use crate::room::{SessionContent, SessionId};

/// Event delivered to every connection subscribed to a room's group
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// The broadcaster went live
    StartBroadcast,
    /// The broadcaster stopped
    StopBroadcast,
    /// Audience counters
    UpdateBroadcastStatus { view_count: u64, visitor_count: u64 },
    /// A session was added
    AppendSession {
        session_id: SessionId,
        content_type: String,
        file_name: String,
    },
    /// A session was removed
    RemoveSession { session_id: SessionId },
    /// The current session changed
    SwitchActiveSession { session_id: SessionId },
    /// A session's descriptive fields changed
    UpdateSession {
        session_id: SessionId,
        content_type: String,
        file_name: String,
    },
    /// A session's content changed
    UpdateSessionContent {
        session_id: SessionId,
        content: SessionContent,
    },
}

/// Discriminant of a [`Notification`], handy for logging and assertions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    StartBroadcast,
    StopBroadcast,
    UpdateBroadcastStatus,
    AppendSession,
    RemoveSession,
    SwitchActiveSession,
    UpdateSession,
    UpdateSessionContent,
}

impl Notification {
    /// Kind of this notification
    pub fn kind(&self) -> NotificationKind {
        match self {
            Notification::StartBroadcast => NotificationKind::StartBroadcast,
            Notification::StopBroadcast => NotificationKind::StopBroadcast,
            Notification::UpdateBroadcastStatus { .. } => NotificationKind::UpdateBroadcastStatus,
            Notification::AppendSession { .. } => NotificationKind::AppendSession,
            Notification::RemoveSession { .. } => NotificationKind::RemoveSession,
            Notification::SwitchActiveSession { .. } => NotificationKind::SwitchActiveSession,
            Notification::UpdateSession { .. } => NotificationKind::UpdateSession,
            Notification::UpdateSessionContent { .. } => NotificationKind::UpdateSessionContent,
        }
    }

    /// Session the notification refers to, if any
    pub fn session_id(&self) -> Option<&str> {
        match self {
            Notification::AppendSession { session_id, .. }
            | Notification::RemoveSession { session_id }
            | Notification::SwitchActiveSession { session_id }
            | Notification::UpdateSession { session_id, .. }
            | Notification::UpdateSessionContent { session_id, .. } => Some(session_id),
            Notification::StartBroadcast
            | Notification::StopBroadcast
            | Notification::UpdateBroadcastStatus { .. } => None,
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            NotificationKind::StartBroadcast => "StartBroadcast",
            NotificationKind::StopBroadcast => "StopBroadcast",
            NotificationKind::UpdateBroadcastStatus => "UpdateBroadcastStatus",
            NotificationKind::AppendSession => "AppendSession",
            NotificationKind::RemoveSession => "RemoveSession",
            NotificationKind::SwitchActiveSession => "SwitchActiveSession",
            NotificationKind::UpdateSession => "UpdateSession",
            NotificationKind::UpdateSessionContent => "UpdateSessionContent",
        };
        f.write_str(name)
    }
}
