//! Live broadcast rooms
//!
//! Each room tracks a broadcaster's content sessions and a set of listeners,
//! and pushes every state change to the room's broadcast group.
//!
//! - [`room`]: the per-room state machine (sessions, current session,
//!   membership, broadcast flag, counters)
//! - [`registry`]: one `Room` per room id, plus idle-room eviction
//! - [`notify`]: notification kinds, the transport seams ([`Notifier`],
//!   [`ListenerDirectory`]) and in-process implementations
//! - [`hub`]: inbound operations keyed by room id
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use roomcast::notify::{LocalDirectory, LocalNotifier};
//! use roomcast::RoomHub;
//!
//! # async fn example() -> roomcast::Result<()> {
//! let notifier = Arc::new(LocalNotifier::new());
//! let directory = Arc::new(LocalDirectory::new());
//! let hub = RoomHub::new(Arc::clone(&notifier), Arc::clone(&directory));
//!
//! directory.connect("viewer-1");
//! let mut events = notifier.join("room-1").await;
//! hub.join_listener("room-1", "viewer-1").await;
//!
//! hub.append_session("room-1", "s1", "video/mp4", "intro.mp4").await?;
//! let event = events.recv().await;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod hub;
pub mod notify;
pub mod registry;
pub mod room;
pub mod stats;

pub use error::{DeliveryError, Error, Result};
pub use hub::RoomHub;
pub use notify::{ListenerDirectory, Notification, NotificationKind, Notifier};
pub use registry::{RegistryConfig, RoomRegistry};
pub use room::{Room, RoomId, RoomState, RoomStats, SessionContent, SessionInfo};
