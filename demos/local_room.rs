//! In-process room demo
//!
//! Run with: cargo run --example local_room [ROOM_ID]
//!
//! Wires a `RoomHub` to the in-process notifier, attaches two viewers (one of
//! which never connects), then plays a short broadcaster script against the
//! room. Every notification the live viewer receives is printed.
//!
//! Set `RUST_LOG=roomcast=trace` to also see skipped deliveries.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use roomcast::notify::{LocalDirectory, LocalNotifier, Notification};
use roomcast::{RegistryConfig, RoomHub, SessionContent};
use tokio::sync::broadcast::error::RecvError;

fn describe(notification: &Notification) -> String {
    match notification {
        Notification::StartBroadcast => "broadcast started".to_string(),
        Notification::StopBroadcast => "broadcast stopped".to_string(),
        Notification::UpdateBroadcastStatus {
            view_count,
            visitor_count,
        } => format!("status: {view_count} views, {visitor_count} visitors"),
        Notification::AppendSession {
            session_id,
            content_type,
            file_name,
        } => format!("session {session_id} added ({file_name}, {content_type})"),
        Notification::RemoveSession { session_id } => format!("session {session_id} removed"),
        Notification::SwitchActiveSession { session_id } => {
            format!("now showing {session_id}")
        }
        Notification::UpdateSession {
            session_id,
            file_name,
            ..
        } => format!("session {session_id} renamed to {file_name}"),
        Notification::UpdateSessionContent {
            session_id,
            content,
        } => format!(
            "session {session_id} content: {} bytes of {}",
            content.payload.len(),
            content.content_type
        ),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let room_id = std::env::args().nth(1).unwrap_or_else(|| "lobby".to_string());

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("roomcast=debug".parse()?)
                .add_directive("local_room=debug".parse()?),
        )
        .init();

    let notifier = Arc::new(LocalNotifier::new());
    let directory = Arc::new(LocalDirectory::new());
    let config = RegistryConfig::default()
        .delivery_timeout(Duration::from_secs(1))
        .idle_room_timeout(Duration::from_secs(5));
    let hub = RoomHub::with_config(Arc::clone(&notifier), Arc::clone(&directory), config);

    // Viewer task: forwards group events to stdout
    directory.connect("viewer-1");
    let mut events = notifier.join(&room_id).await;
    let viewer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(notification) => println!("[viewer-1] {}", describe(&notification)),
                Err(RecvError::Lagged(n)) => println!("[viewer-1] skipped {n} events"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    hub.join_listener(&room_id, "viewer-1").await;
    hub.join_listener(&room_id, "viewer-2").await;
    hub.join_broadcaster(&room_id, "host").await;

    hub.start_broadcast(&room_id).await?;
    hub.append_session(&room_id, "intro", "video/mp4", "intro.mp4").await?;
    hub.append_session(&room_id, "slides", "application/pdf", "deck.pdf").await?;
    hub.switch_active_session(&room_id, "intro").await?;

    // Duplicate append: no state change, no notification
    let applied = hub
        .append_session(&room_id, "intro", "text/plain", "ignored.txt")
        .await?;
    println!("[host] duplicate append applied: {applied}");

    hub.switch_active_session(&room_id, "slides").await?;
    hub.update_session_content(
        &room_id,
        "slides",
        SessionContent::new("application/pdf", "deck.pdf", Bytes::from_static(b"%PDF-1.7")),
    )
    .await?;
    hub.record_view(&room_id).await?;
    hub.record_visit(&room_id).await?;
    hub.update_broadcast_status(&room_id).await?;
    hub.remove_session(&room_id, "slides").await?;
    hub.stop_broadcast(&room_id).await?;

    tokio::time::sleep(Duration::from_millis(100)).await;
    println!("dispatch: {:?}", hub.registry().dispatch_stats());
    println!("room: {:?}", hub.room_stats(&room_id).await?);

    println!("Press Ctrl+C to exit");
    hub.run_until(async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await;

    viewer.abort();
    Ok(())
}
