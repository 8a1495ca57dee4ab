//! Per-room ordered dispatch
//!
//! Every room owns one queue and one dispatcher task. Rooms push onto the
//! queue while still holding their state lock, so the task sees events in
//! commit order. The task does the slow part (liveness checks and the network
//! call) without any room lock held.
//!
//! ```text
//!   Room::append_session()            dispatcher task
//!   ┌──────────────────────┐          ┌──────────────────────────────┐
//!   │ lock state           │          │ recv()                       │
//!   │ mutate               │  mpsc    │ any listener live?  ── no ──►│ skip
//!   │ send(Dispatch) ──────┼─────────►│ timeout(broadcast_to_group)  │
//!   │ unlock               │          │ log outcome                  │
//!   └──────────────────────┘          └──────────────────────────────┘
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::error::DeliveryError;
use crate::room::{ListenerId, RoomId};
use crate::stats::DispatchStats;

use super::notification::Notification;
use super::notifier::{ListenerDirectory, Notifier};

/// A notification plus the listener set captured with it
#[derive(Debug)]
pub(crate) struct Dispatch {
    pub(crate) notification: Notification,
    pub(crate) listeners: Vec<ListenerId>,
}

pub(crate) type DispatchSender = mpsc::UnboundedSender<Dispatch>;
pub(crate) type DispatchReceiver = mpsc::UnboundedReceiver<Dispatch>;

/// What happened to one queued notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    Delivered,
    /// No listener had a live connection
    Skipped,
    TimedOut,
    Failed,
}

/// Drains one room's queue into the notifier
pub(crate) struct Dispatcher<N, D> {
    room_id: RoomId,
    notifier: Arc<N>,
    directory: Arc<D>,
    timeout: Duration,
    stats: Arc<DispatchStats>,
}

impl<N: Notifier, D: ListenerDirectory> Dispatcher<N, D> {
    pub(crate) fn new(
        room_id: RoomId,
        notifier: Arc<N>,
        directory: Arc<D>,
        timeout: Duration,
        stats: Arc<DispatchStats>,
    ) -> Self {
        Self {
            room_id,
            notifier,
            directory,
            timeout,
            stats,
        }
    }

    /// Start the dispatcher task
    ///
    /// The task exits once every sender is dropped and the queue is drained.
    pub(crate) fn spawn(self) -> DispatchSender {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(self.run(rx));
        tx
    }

    async fn run(self, mut rx: DispatchReceiver) {
        while let Some(dispatch) = rx.recv().await {
            self.deliver(dispatch).await;
        }

        tracing::debug!(room = %self.room_id, "Dispatcher stopped");
    }

    /// Deliver a single notification
    pub(crate) async fn deliver(&self, dispatch: Dispatch) -> Outcome {
        let kind = dispatch.notification.kind();

        // One live listener is enough: the group broadcast reaches them all.
        if !dispatch
            .listeners
            .iter()
            .any(|id| self.directory.is_live(id))
        {
            self.stats.record_skipped();
            tracing::trace!(
                room = %self.room_id,
                kind = %kind,
                listeners = dispatch.listeners.len(),
                "No live listeners, notification skipped"
            );
            return Outcome::Skipped;
        }

        let send = self
            .notifier
            .broadcast_to_group(&self.room_id, dispatch.notification);

        match tokio::time::timeout(self.timeout, send).await {
            Ok(Ok(())) => {
                self.stats.record_delivered();
                tracing::debug!(room = %self.room_id, kind = %kind, "Notification delivered");
                Outcome::Delivered
            }
            Ok(Err(e)) => {
                self.stats.record_failed();
                tracing::warn!(
                    room = %self.room_id,
                    kind = %kind,
                    error = %e,
                    "Notification delivery failed"
                );
                Outcome::Failed
            }
            Err(_) => {
                self.stats.record_timed_out();
                tracing::warn!(
                    room = %self.room_id,
                    kind = %kind,
                    error = %DeliveryError::Timeout(self.timeout),
                    "Notification dropped"
                );
                Outcome::TimedOut
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        sent: Mutex<Vec<(String, Notification)>>,
    }

    impl Notifier for Recorder {
        async fn broadcast_to_group(
            &self,
            room_id: &str,
            notification: Notification,
        ) -> Result<(), DeliveryError> {
            self.sent
                .lock()
                .unwrap()
                .push((room_id.to_string(), notification));
            Ok(())
        }
    }

    struct Stalled;

    impl Notifier for Stalled {
        async fn broadcast_to_group(
            &self,
            _room_id: &str,
            _notification: Notification,
        ) -> Result<(), DeliveryError> {
            std::future::pending().await
        }
    }

    struct Rejecting;

    impl Notifier for Rejecting {
        async fn broadcast_to_group(
            &self,
            room_id: &str,
            _notification: Notification,
        ) -> Result<(), DeliveryError> {
            Err(DeliveryError::GroupClosed(room_id.to_string()))
        }
    }

    struct Live(HashSet<String>);

    impl ListenerDirectory for Live {
        fn is_live(&self, listener_id: &str) -> bool {
            self.0.contains(listener_id)
        }
    }

    fn live(ids: &[&str]) -> Arc<Live> {
        Arc::new(Live(ids.iter().map(|s| s.to_string()).collect()))
    }

    fn dispatch(listeners: &[&str]) -> Dispatch {
        Dispatch {
            notification: Notification::StartBroadcast,
            listeners: listeners.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn test_single_group_broadcast_for_many_listeners() {
        let notifier = Arc::new(Recorder::default());
        let stats = Arc::new(DispatchStats::new());
        let dispatcher = Dispatcher::new(
            "r1".into(),
            Arc::clone(&notifier),
            live(&["a", "b", "c"]),
            Duration::from_secs(1),
            Arc::clone(&stats),
        );

        let outcome = dispatcher.deliver(dispatch(&["a", "b", "c"])).await;

        assert_eq!(outcome, Outcome::Delivered);
        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "r1");
        assert_eq!(stats.snapshot().delivered, 1);
    }

    #[tokio::test]
    async fn test_skipped_when_no_listener_live() {
        let notifier = Arc::new(Recorder::default());
        let stats = Arc::new(DispatchStats::new());
        let dispatcher = Dispatcher::new(
            "r1".into(),
            Arc::clone(&notifier),
            live(&["someone-else"]),
            Duration::from_secs(1),
            Arc::clone(&stats),
        );

        assert_eq!(dispatcher.deliver(dispatch(&["a", "b"])).await, Outcome::Skipped);
        assert_eq!(dispatcher.deliver(dispatch(&[])).await, Outcome::Skipped);

        assert!(notifier.sent.lock().unwrap().is_empty());
        assert_eq!(stats.snapshot().skipped, 2);
    }

    #[tokio::test]
    async fn test_partial_liveness_still_broadcasts() {
        let notifier = Arc::new(Recorder::default());
        let dispatcher = Dispatcher::new(
            "r1".into(),
            Arc::clone(&notifier),
            live(&["b"]),
            Duration::from_secs(1),
            Arc::new(DispatchStats::new()),
        );

        assert_eq!(
            dispatcher.deliver(dispatch(&["a", "b"])).await,
            Outcome::Delivered
        );
        assert_eq!(notifier.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_stalled_notifier_times_out() {
        let stats = Arc::new(DispatchStats::new());
        let dispatcher = Dispatcher::new(
            "r1".into(),
            Arc::new(Stalled),
            live(&["a"]),
            Duration::from_millis(20),
            Arc::clone(&stats),
        );

        assert_eq!(dispatcher.deliver(dispatch(&["a"])).await, Outcome::TimedOut);
        assert_eq!(stats.snapshot().timed_out, 1);
    }

    #[tokio::test]
    async fn test_notifier_error_is_counted_not_raised() {
        let stats = Arc::new(DispatchStats::new());
        let dispatcher = Dispatcher::new(
            "r1".into(),
            Arc::new(Rejecting),
            live(&["a"]),
            Duration::from_secs(1),
            Arc::clone(&stats),
        );

        assert_eq!(dispatcher.deliver(dispatch(&["a"])).await, Outcome::Failed);
        assert_eq!(stats.snapshot().failed, 1);
    }

    #[tokio::test]
    async fn test_spawned_dispatcher_preserves_order() {
        let notifier = Arc::new(Recorder::default());
        let stats = Arc::new(DispatchStats::new());
        let tx = Dispatcher::new(
            "r1".into(),
            Arc::clone(&notifier),
            live(&["a"]),
            Duration::from_secs(1),
            Arc::clone(&stats),
        )
        .spawn();

        for i in 0..10 {
            tx.send(Dispatch {
                notification: Notification::SwitchActiveSession {
                    session_id: format!("s{i}"),
                },
                listeners: vec!["a".to_string()],
            })
            .unwrap();
        }

        while stats.snapshot().delivered < 10 {
            tokio::task::yield_now().await;
        }

        let sent = notifier.sent.lock().unwrap();
        let ids: Vec<_> = sent
            .iter()
            .map(|(_, n)| n.session_id().unwrap().to_string())
            .collect();
        let expected: Vec<_> = (0..10).map(|i| format!("s{i}")).collect();
        assert_eq!(ids, expected);
    }
}
