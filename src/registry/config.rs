//! Registry configuration

use std::time::Duration;

/// Room registry configuration options
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Upper bound on a single `Notifier` call
    pub delivery_timeout: Duration,

    /// How long a room may stay idle before it is evicted
    pub idle_room_timeout: Duration,

    /// How often the cleanup task runs
    pub cleanup_interval: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            delivery_timeout: Duration::from_secs(5),
            idle_room_timeout: Duration::from_secs(30),
            cleanup_interval: Duration::from_secs(10),
        }
    }
}

impl RegistryConfig {
    /// Set the delivery timeout
    pub fn delivery_timeout(mut self, timeout: Duration) -> Self {
        self.delivery_timeout = timeout;
        self
    }

    /// Set the idle grace period before eviction
    pub fn idle_room_timeout(mut self, timeout: Duration) -> Self {
        self.idle_room_timeout = timeout;
        self
    }

    /// Set the cleanup interval
    ///
    /// Clamped to at least one millisecond; `tokio::time::interval` rejects zero.
    pub fn cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval.max(Duration::from_millis(1));
        self
    }
}
