//! Integration tests for the real-time WebSocket channel.
//!
//! Tests cover:
//! - Immediate state on connect
//! - One event per refresh cycle, cached or live

use futures_util::StreamExt;
use shared::publish::{UpdateEvent, UPDATE_EVENT};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use super::common::{spawn_server, test_app};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn next_event(client: &mut Client) -> UpdateEvent {
    let message = tokio::time::timeout(Duration::from_secs(5), client.next())
        .await
        .expect("timed out waiting for an update")
        .expect("connection closed")
        .expect("websocket error");
    serde_json::from_str(message.to_text().unwrap()).unwrap()
}

#[tokio::test]
async fn test_client_receives_current_state_on_connect() {
    let mut app = test_app();
    app.orchestrator.run_cycle().await;
    let addr = spawn_server(app.router).await;

    let (mut client, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    let event = next_event(&mut client).await;

    assert_eq!(event.event, UPDATE_EVENT);
    assert_eq!(event.data, *app.publisher.snapshot());
    assert_eq!(event.data.births.count, 703_500);
}

#[tokio::test]
async fn test_client_receives_every_cycle() {
    let mut app = test_app();
    let addr = spawn_server(app.router.clone()).await;

    let (mut client, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    let initial = next_event(&mut client).await;
    assert_eq!(initial.data.over65.count, 0);

    // First cycle fetches live, the next two are served from cache.
    for _ in 0..3 {
        app.orchestrator.run_cycle().await;
    }

    let first = next_event(&mut client).await;
    assert_eq!(first.data.over65.count, 12_000_000);
    let second = next_event(&mut client).await;
    let third = next_event(&mut client).await;
    assert_eq!(third.data.over65.count, 12_000_000);
    assert!(third.data.over65.last_update >= second.data.over65.last_update);
    assert_eq!(app.publisher.broadcast_count(), 3);
}

#[tokio::test]
async fn test_disconnect_drops_subscription() {
    let app = test_app();
    let addr = spawn_server(app.router.clone()).await;

    let (mut client, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    next_event(&mut client).await;
    assert_eq!(app.publisher.subscriber_count(), 1);

    client.close(None).await.unwrap();
    drop(client);

    let mut remaining = app.publisher.subscriber_count();
    for _ in 0..50 {
        if remaining == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
        remaining = app.publisher.subscriber_count();
    }
    assert_eq!(remaining, 0);
}
