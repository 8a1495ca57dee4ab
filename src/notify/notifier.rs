//! Delivery seams
//!
//! The transport layer plugs in here. Rooms never touch connections directly:
//! they hand notifications to a dispatcher, which asks the
//! [`ListenerDirectory`] whether anyone is still connected and then makes a
//! single group broadcast through the [`Notifier`].

use std::future::Future;

use crate::error::DeliveryError;

use super::notification::Notification;

/// Group-broadcast primitive of the transport layer
///
/// # Example
///
/// ```no_run
/// use roomcast::error::DeliveryError;
/// use roomcast::notify::{Notification, Notifier};
///
/// struct LogNotifier;
///
/// impl Notifier for LogNotifier {
///     async fn broadcast_to_group(
///         &self,
///         room_id: &str,
///         notification: Notification,
///     ) -> Result<(), DeliveryError> {
///         println!("{room_id}: {:?}", notification.kind());
///         Ok(())
///     }
/// }
/// ```
pub trait Notifier: Send + Sync + 'static {
    /// Deliver `notification` to every connection in the room's group
    ///
    /// Called once per event, never once per listener. The dispatcher bounds
    /// the call with a timeout and drops the event on error.
    fn broadcast_to_group(
        &self,
        room_id: &str,
        notification: Notification,
    ) -> impl Future<Output = Result<(), DeliveryError>> + Send;
}

/// Connection liveness lookup
pub trait ListenerDirectory: Send + Sync + 'static {
    /// Whether the listener currently has a live connection
    fn is_live(&self, listener_id: &str) -> bool;
}
