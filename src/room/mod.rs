//! Rooms and their content sessions
//!
//! A [`Room`] is the live state of one broadcast channel: the broadcaster's
//! sessions, which one is current, who is listening, and whether the
//! broadcast is on air.

pub mod entry;
pub mod session;

use std::time::Duration;

pub use entry::Room;
pub use session::{Session, SessionContent, SessionInfo};

/// Room identifier
pub type RoomId = String;

/// Session identifier, unique within a room
pub type SessionId = String;

/// Listener connection identifier
pub type ListenerId = String;

/// Broadcaster connection identifier
pub type BroadcasterId = String;

/// Lifecycle state of a room
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomState {
    /// Has listeners or broadcasters, or is on air
    Active,
    /// Nobody attached and not broadcasting; eligible for eviction
    Idle,
}

/// Statistics for a room
#[derive(Debug, Clone)]
pub struct RoomStats {
    /// Number of sessions
    pub session_count: usize,
    /// Id of the current session
    pub current_session: Option<SessionId>,
    /// Number of subscribed listeners
    pub listener_count: usize,
    /// Number of registered broadcasters
    pub broadcaster_count: usize,
    /// Whether a broadcast is on air
    pub is_broadcasting: bool,
    pub view_count: u64,
    pub visitor_count: u64,
    /// Current lifecycle state
    pub state: RoomState,
    /// Time since the room was created
    pub age: Duration,
}
