//! Notification fan-out
//!
//! Rooms describe *what* changed as a [`Notification`]; this module decides
//! *whether* and *how* it leaves the process.
//!
//! # Architecture
//!
//! ```text
//!      Room (state lock)                      transport layer
//!   ┌────────────────────┐               ┌──────────────────────┐
//!   │ mutate             │               │ Notifier             │
//!   │ push Dispatch ─────┼──► queue ──►  │   broadcast_to_group │──► group
//!   └────────────────────┘   dispatcher  │ ListenerDirectory    │
//!                            task/room   │   is_live            │
//!                                        └──────────────────────┘
//! ```
//!
//! Delivery is fire-and-forget. A room never waits on the notifier, and a
//! stalled group only delays later events for that same room, up to the
//! configured delivery timeout.

pub(crate) mod dispatcher;
pub mod local;
pub mod notification;
pub mod notifier;

pub use local::{LocalDirectory, LocalNotifier};
pub use notification::{Notification, NotificationKind};
pub use notifier::{ListenerDirectory, Notifier};
