//! End-to-end tests for the relay.
//!
//! These tests start a real server on an ephemeral port and talk to it
//! over WebSocket.

#![allow(clippy::panic)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use position_relay::config::RelayConfig;
use position_relay::service::RelayService;
use position_relay::{build_app, build_state};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Starts a relay on a random port. Returns the WebSocket URL and the
/// relay service so tests can observe registrations.
async fn start_test_server() -> (String, Arc<RelayService>) {
    let state = build_state(&RelayConfig::default());
    let relay = Arc::clone(&state.relay_service);

    let Ok(listener) = TcpListener::bind("127.0.0.1:0").await else {
        panic!("bind failed");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("no local addr");
    };

    let app = build_app(state);
    tokio::spawn(async move {
        let _ = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await;
    });

    (format!("ws://{addr}/ws"), relay)
}

async fn connect(url: &str) -> Client {
    let Ok((ws, _)) = connect_async(url).await else {
        panic!("failed to connect to {url}");
    };
    ws
}

/// Waits until the server has registered `expected` connections.
async fn wait_for_connections(relay: &RelayService, expected: usize) {
    for _ in 0..200 {
        if relay.connection_count().await == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("server never reached {expected} connections");
}

async fn send(ws: &mut Client, text: &str) {
    if ws.send(Message::text(text)).await.is_err() {
        panic!("send failed");
    }
}

/// Reads the next text frame as JSON, skipping control frames.
async fn recv_json(ws: &mut Client) -> serde_json::Value {
    let next = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => {
                    return serde_json::from_str(text.as_str()).unwrap_or_default();
                }
                Some(Ok(_)) => continue,
                Some(Err(e)) => panic!("websocket error: {e}"),
                None => panic!("websocket closed unexpectedly"),
            }
        }
    })
    .await;
    let Ok(value) = next else {
        panic!("no message within two seconds");
    };
    value
}

/// Returns `true` if no text frame arrives within `wait`.
async fn stays_quiet(ws: &mut Client, wait: Duration) -> bool {
    tokio::time::timeout(wait, recv_json(ws)).await.is_err()
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_update_is_echoed_and_relayed_then_disconnect_announced() {
    let (url, relay) = start_test_server().await;
    let mut client1 = connect(&url).await;
    let mut client2 = connect(&url).await;
    wait_for_connections(&relay, 2).await;

    send(&mut client1, r#"{"Username":"alice","X":1,"Y":2,"Z":3}"#).await;

    let alice = serde_json::json!({"Username": "alice", "X": 1, "Y": 2, "Z": 3});
    assert_eq!(recv_json(&mut client1).await, alice);
    assert_eq!(recv_json(&mut client2).await, alice);

    let _ = client1.close(None).await;
    drop(client1);

    assert_eq!(
        recv_json(&mut client2).await,
        serde_json::json!({"action": "disconnect", "username": "alice"})
    );
    wait_for_connections(&relay, 1).await;
    assert_eq!(relay.entity_count().await, 1);
}

#[tokio::test]
async fn test_invalid_messages_are_ignored_without_closing() {
    let (url, relay) = start_test_server().await;
    let mut client = connect(&url).await;
    wait_for_connections(&relay, 1).await;

    send(&mut client, "{}").await;
    send(&mut client, r#"{"Username":""}"#).await;
    send(&mut client, "definitely not json").await;
    send(&mut client, r#"{"Username":"bob","X":-4.5}"#).await;

    // The first frame back is the echo of the only valid message.
    assert_eq!(
        recv_json(&mut client).await,
        serde_json::json!({"Username": "bob", "X": -4.5, "Y": 0, "Z": 0})
    );
    assert_eq!(relay.connection_count().await, 1);
    assert_eq!(relay.entity_count().await, 1);
}

#[tokio::test]
async fn test_rejected_message_produces_no_broadcast() {
    let (url, relay) = start_test_server().await;
    let mut sender = connect(&url).await;
    let mut watcher = connect(&url).await;
    wait_for_connections(&relay, 2).await;

    send(&mut sender, r#"{"Username":""}"#).await;

    assert!(stays_quiet(&mut watcher, Duration::from_millis(200)).await);
    assert!(relay.registry().is_empty().await);
}

#[tokio::test]
async fn test_silent_client_disconnect_has_empty_username() {
    let (url, relay) = start_test_server().await;
    let silent = connect(&url).await;
    let mut watcher = connect(&url).await;
    wait_for_connections(&relay, 2).await;

    drop(silent);

    assert_eq!(
        recv_json(&mut watcher).await,
        serde_json::json!({"action": "disconnect", "username": ""})
    );
}

#[tokio::test]
async fn test_each_disconnect_is_announced_once() {
    let (url, relay) = start_test_server().await;
    let mut leaving = connect(&url).await;
    let mut watcher = connect(&url).await;
    wait_for_connections(&relay, 2).await;

    send(&mut leaving, r#"{"Username":"carol","X":1,"Y":1,"Z":1}"#).await;
    let _ = recv_json(&mut watcher).await;

    let _ = leaving.close(None).await;
    drop(leaving);

    assert_eq!(
        recv_json(&mut watcher).await,
        serde_json::json!({"action": "disconnect", "username": "carol"})
    );
    assert!(stays_quiet(&mut watcher, Duration::from_millis(200)).await);
    assert_eq!(relay.connection_count().await, 1);
}

#[tokio::test]
async fn test_latest_update_wins_in_registry() {
    let (url, relay) = start_test_server().await;
    let mut client = connect(&url).await;
    wait_for_connections(&relay, 1).await;

    for x in 1..=5 {
        send(&mut client, &format!(r#"{{"Username":"dave","X":{x}}}"#)).await;
        let _ = recv_json(&mut client).await;
    }

    let snapshot = relay.registry().snapshot().await;
    assert_eq!(snapshot.len(), 1);
    let Some(dave) = snapshot.first() else {
        panic!("dave missing");
    };
    assert!((dave.x - 5.0).abs() < f64::EPSILON);
}
