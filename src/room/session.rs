//! Content sessions
//!
//! A session is one content stream inside a room (a shared document, a video
//! feed). Its id is fixed at creation; everything else changes only through
//! the explicit update operations.

use bytes::Bytes;

use super::SessionId;

/// Content update applied to a session
///
/// Carries the descriptive fields together with the payload, since a content
/// change usually changes the file as well.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContent {
    /// MIME type of the content (e.g., "video/mp4")
    pub content_type: String,
    /// Display file name
    pub file_name: String,
    /// Content payload (reference counted, cheap to clone into notifications)
    pub payload: Bytes,
}

impl SessionContent {
    /// Create a content update
    pub fn new(
        content_type: impl Into<String>,
        file_name: impl Into<String>,
        payload: impl Into<Bytes>,
    ) -> Self {
        Self {
            content_type: content_type.into(),
            file_name: file_name.into(),
            payload: payload.into(),
        }
    }
}

/// A content session owned by a room
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    content_type: String,
    file_name: String,
    payload: Bytes,
    /// Insertion sequence within the owning room, used for UI ordering
    seq: u64,
}

impl Session {
    pub(crate) fn new(id: SessionId, content_type: String, file_name: String, seq: u64) -> Self {
        Self {
            id,
            content_type,
            file_name,
            payload: Bytes::new(),
            seq,
        }
    }

    /// Session id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current content type
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Current file name
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Current payload
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    pub(crate) fn seq(&self) -> u64 {
        self.seq
    }

    /// Replace the descriptive fields, keeping the payload
    pub(crate) fn update_descriptor(&mut self, content_type: String, file_name: String) {
        self.content_type = content_type;
        self.file_name = file_name;
    }

    /// Replace descriptive fields and payload unconditionally
    ///
    /// Purely local; the owning room publishes the change.
    pub fn update_content(&mut self, content: SessionContent) {
        self.content_type = content.content_type;
        self.file_name = content.file_name;
        self.payload = content.payload;
    }

    /// Snapshot of this session
    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            id: self.id.clone(),
            content_type: self.content_type.clone(),
            file_name: self.file_name.clone(),
            payload: self.payload.clone(),
        }
    }
}

/// Point-in-time copy of a session, safe to hold outside the room lock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub id: SessionId,
    pub content_type: String,
    pub file_name: String,
    pub payload: Bytes,
}
