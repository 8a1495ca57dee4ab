//! Error types
//!
//! Mutations that fail their precondition are reported as `Ok(false)`, not as
//! errors. Errors here cover unknown rooms and notification delivery.

use std::time::Duration;

use crate::room::RoomId;

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// No room is registered under this id
    #[error("Room not found: {0}")]
    RoomNotFound(RoomId),

    /// A notification could not be delivered
    #[error("Delivery failed: {0}")]
    Delivery(#[from] DeliveryError),
}

/// Failure of a single `Notifier` call
///
/// Observed and counted by the dispatcher, never surfaced to the caller of
/// the mutation that produced the notification.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    /// The notifier did not complete within the configured bound
    #[error("delivery timed out after {0:?}")]
    Timeout(Duration),

    /// The room's broadcast group has no subscribed connections
    #[error("broadcast group closed: {0}")]
    GroupClosed(RoomId),

    /// Transport-specific failure
    #[error("transport error: {0}")]
    Transport(String),
}
