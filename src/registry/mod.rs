//! Room registry
//!
//! The registry owns every live room and guarantees at most one `Room`
//! instance per room id. Each room has its own state lock and its own
//! dispatcher task, so rooms never wait on each other.
//!
//! # Architecture
//!
//! ```text
//!                        Arc<RoomRegistry>
//!                 ┌──────────────────────────────┐
//!                 │ rooms: HashMap<RoomId,       │
//!                 │   Arc<Room> {                │
//!                 │     inner: Mutex<..>,        │
//!                 │     dispatch: mpsc::Tx,      │
//!                 │   }                          │
//!                 │ >                            │
//!                 └──────────────┬───────────────┘
//!                                │
//!        ┌───────────────────────┼───────────────────────┐
//!        ▼                       ▼                       ▼
//!   [Broadcaster]          [dispatcher]            [dispatcher]
//!   append_session()       room "a"                room "b"
//!        │                       │                       │
//!        └──► Room::publish() ──►└──► Notifier::broadcast_to_group()
//! ```
//!
//! # Eviction
//!
//! A room with no listeners, no broadcasters and no live broadcast is idle.
//! Once it has been idle longer than `idle_room_timeout`, the cleanup task
//! drops it from the map.

pub mod config;
pub mod store;

pub use config::RegistryConfig;
pub use store::RoomRegistry;
