//! End-to-end fan-out through `RoomHub`, with a notifier that records what
//! it was asked to deliver.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use roomcast::notify::LocalDirectory;
use roomcast::{
    DeliveryError, Notification, NotificationKind, Notifier, RegistryConfig, RoomHub,
    SessionContent,
};
use tokio_test::assert_ok;

/// Records every group broadcast; rooms listed in `stalled` never complete
#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<(String, Notification)>>,
    stalled: HashSet<String>,
}

impl RecordingNotifier {
    fn stalling(rooms: &[&str]) -> Self {
        Self {
            sent: Mutex::default(),
            stalled: rooms.iter().map(|r| r.to_string()).collect(),
        }
    }

    fn kinds_for(&self, room_id: &str) -> Vec<NotificationKind> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(room, _)| room == room_id)
            .map(|(_, n)| n.kind())
            .collect()
    }

    fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

impl Notifier for RecordingNotifier {
    async fn broadcast_to_group(
        &self,
        room_id: &str,
        notification: Notification,
    ) -> Result<(), DeliveryError> {
        if self.stalled.contains(room_id) {
            std::future::pending::<()>().await;
        }
        self.sent
            .lock()
            .unwrap()
            .push((room_id.to_string(), notification));
        Ok(())
    }
}

type Hub = RoomHub<RecordingNotifier, LocalDirectory>;

fn setup(
    notifier: RecordingNotifier,
    config: RegistryConfig,
) -> (Hub, Arc<RecordingNotifier>, Arc<LocalDirectory>) {
    let notifier = Arc::new(notifier);
    let directory = Arc::new(LocalDirectory::new());
    let hub = RoomHub::with_config(Arc::clone(&notifier), Arc::clone(&directory), config);
    (hub, notifier, directory)
}

/// Wait until every queued notification has left its room's queue
async fn settle(hub: &Hub) {
    for _ in 0..200 {
        if hub.registry().dispatch_stats().pending() == 0 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("dispatch queues did not drain");
}

#[tokio::test]
async fn test_one_notification_per_effective_mutation() {
    let (hub, notifier, directory) = setup(RecordingNotifier::default(), RegistryConfig::default());
    directory.connect("l1");
    hub.join_listener("R1", "l1").await;

    assert!(assert_ok!(hub.append_session("R1", "s1", "video/mp4", "a.mp4").await));
    assert!(!assert_ok!(hub.append_session("R1", "s1", "video/webm", "x.webm").await));
    assert!(assert_ok!(hub.switch_active_session("R1", "s1").await));
    assert!(!assert_ok!(hub.switch_active_session("R1", "missing").await));
    assert!(assert_ok!(hub.update_session("R1", "s1", "video/webm", "b.webm").await));
    assert!(!assert_ok!(hub.update_session("R1", "missing", "a", "b").await));
    assert!(assert_ok!(
        hub.update_session_content("R1", "s1", SessionContent::new("video/webm", "b.webm", "frame"))
            .await
    ));
    assert!(assert_ok!(hub.remove_session("R1", "s1").await));
    assert!(!assert_ok!(hub.remove_session("R1", "s1").await));

    settle(&hub).await;

    assert_eq!(
        notifier.kinds_for("R1"),
        vec![
            NotificationKind::AppendSession,
            NotificationKind::SwitchActiveSession,
            NotificationKind::UpdateSession,
            NotificationKind::UpdateSessionContent,
            NotificationKind::RemoveSession,
        ]
    );
    assert!(assert_ok!(hub.current_session("R1").await).is_none());
    assert!(assert_ok!(hub.get_session("R1", "s1").await).is_none());
}

#[tokio::test]
async fn test_repeated_start_broadcast_notifies_each_time() {
    let (hub, notifier, directory) = setup(RecordingNotifier::default(), RegistryConfig::default());
    directory.connect("l1");
    hub.join_listener("R1", "l1").await;

    for _ in 0..3 {
        assert_ok!(hub.start_broadcast("R1").await);
    }
    assert_ok!(hub.stop_broadcast("R1").await);
    settle(&hub).await;

    assert_eq!(
        notifier.kinds_for("R1"),
        vec![
            NotificationKind::StartBroadcast,
            NotificationKind::StartBroadcast,
            NotificationKind::StartBroadcast,
            NotificationKind::StopBroadcast,
        ]
    );
    assert!(!assert_ok!(hub.room_stats("R1").await).is_broadcasting);
}

#[tokio::test]
async fn test_no_live_listener_means_no_delivery() {
    let (hub, notifier, directory) = setup(RecordingNotifier::default(), RegistryConfig::default());
    hub.join_listener("R1", "offline").await;
    hub.join_broadcaster("R1", "host").await;

    assert_ok!(hub.append_session("R1", "s1", "video/mp4", "a.mp4").await);
    settle(&hub).await;
    assert_eq!(notifier.count(), 0);
    assert_eq!(hub.registry().dispatch_stats().skipped, 1);

    // The listener set is captured per event, so a reconnect only affects
    // events committed afterwards.
    directory.connect("offline");
    assert_ok!(hub.switch_active_session("R1", "s1").await);
    settle(&hub).await;
    assert_eq!(notifier.kinds_for("R1"), vec![NotificationKind::SwitchActiveSession]);
}

#[tokio::test]
async fn test_stalled_room_does_not_block_other_rooms() {
    let config = RegistryConfig::default().delivery_timeout(Duration::from_millis(50));
    let (hub, notifier, directory) = setup(RecordingNotifier::stalling(&["slow"]), config);
    directory.connect("l1");
    hub.join_listener("slow", "l1").await;
    hub.join_listener("fast", "l1").await;

    assert_ok!(hub.start_broadcast("slow").await);
    assert_ok!(hub.append_session("slow", "s1", "video/mp4", "a.mp4").await);
    assert_ok!(hub.start_broadcast("fast").await);

    // The fast room's event goes out while the slow room is still stuck
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(notifier.kinds_for("fast"), vec![NotificationKind::StartBroadcast]);

    // Mutations on the stalled room still complete immediately
    let started = tokio::time::Instant::now();
    assert_ok!(hub.switch_active_session("slow", "s1").await);
    assert!(started.elapsed() < Duration::from_millis(50));

    settle(&hub).await;
    let stats = hub.registry().dispatch_stats();
    assert_eq!(stats.timed_out, 3);
    assert_eq!(stats.delivered, 1);
    assert!(notifier.kinds_for("slow").is_empty());
}

#[tokio::test]
async fn test_per_room_order_matches_commit_order() {
    let (hub, notifier, directory) = setup(RecordingNotifier::default(), RegistryConfig::default());
    directory.connect("l1");
    hub.join_listener("R1", "l1").await;

    for i in 0..50 {
        let id = format!("s{i}");
        assert_ok!(hub.append_session("R1", &id, "text/plain", "f.txt").await);
        assert_ok!(hub.switch_active_session("R1", &id).await);
    }
    settle(&hub).await;

    let sent = notifier.sent.lock().unwrap();
    let ids: Vec<&str> = sent.iter().filter_map(|(_, n)| n.session_id()).collect();
    let expected: Vec<String> = (0..50)
        .flat_map(|i| [format!("s{i}"), format!("s{i}")])
        .collect();
    assert_eq!(ids, expected);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_duplicate_appends_through_hub() {
    let (hub, notifier, directory) = setup(RecordingNotifier::default(), RegistryConfig::default());
    directory.connect("l1");
    hub.join_listener("R1", "l1").await;
    let hub = Arc::new(hub);

    let handles: Vec<_> = (0..2)
        .map(|i| {
            let hub = Arc::clone(&hub);
            tokio::spawn(async move {
                hub.append_session("R1", "same", "video/mp4", &format!("{i}.mp4"))
                    .await
            })
        })
        .collect();

    let mut applied = 0;
    for handle in handles {
        if assert_ok!(handle.await.unwrap()) {
            applied += 1;
        }
    }

    settle(&hub).await;
    assert_eq!(applied, 1);
    assert_eq!(notifier.kinds_for("R1"), vec![NotificationKind::AppendSession]);
}
