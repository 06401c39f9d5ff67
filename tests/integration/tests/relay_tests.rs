//! Relay Integration Tests
//!
//! Run a relay on a loopback port and talk to it over real WebSockets.
//!
//! Run with: cargo test -p integration-tests --test relay_tests

use futures_util::SinkExt;
use integration_tests::{expect_close, next_message, test_config, TestServer};
use reqwest::StatusCode;
use tokio_tungstenite::tungstenite::Message;

// ============================================================================
// HTTP Endpoint Tests
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let server = TestServer::start().await.expect("Failed to start server");
    let response = server.get("/health").await.expect("Request failed");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_stats_start_empty() {
    let server = TestServer::start().await.expect("Failed to start server");
    let stats = server.stats().await.expect("Request failed");

    assert_eq!(stats["connected"], 0);
    assert_eq!(stats["registered_total"], 0);
    assert_eq!(stats["broadcasts_total"], 0);
}

#[tokio::test]
async fn test_plain_get_on_relay_path_is_rejected() {
    let server = TestServer::start().await.expect("Failed to start server");
    let response = server.get("/ws").await.expect("Request failed");

    assert!(response.status().is_client_error());
    assert_eq!(server.stats().await.unwrap()["connected"], 0);
}

// ============================================================================
// Broadcast Tests
// ============================================================================

#[tokio::test]
async fn test_broadcast_reaches_every_client() {
    let server = TestServer::start().await.expect("Failed to start server");
    let mut a = server.connect().await.unwrap();
    let mut b = server.connect().await.unwrap();
    let mut c = server.connect().await.unwrap();
    server.wait_for_connected(3).await.unwrap();

    a.send(Message::Text("hello".to_string().into())).await.unwrap();

    for ws in [&mut b, &mut c, &mut a] {
        assert_eq!(
            next_message(ws).await.unwrap(),
            Message::Text("hello".to_string().into())
        );
    }

    server.wait_for_stat("deliveries_total", 3).await.unwrap();
}

#[tokio::test]
async fn test_broadcast_without_echo() {
    let mut config = test_config().unwrap();
    config.hub.echo_to_sender = false;
    let server = TestServer::start_with_config(config)
        .await
        .expect("Failed to start server");

    let mut a = server.connect().await.unwrap();
    let mut b = server.connect().await.unwrap();
    server.wait_for_connected(2).await.unwrap();

    a.send(Message::Text("ping".to_string().into())).await.unwrap();
    assert_eq!(
        next_message(&mut b).await.unwrap(),
        Message::Text("ping".to_string().into())
    );

    b.send(Message::Text("pong".to_string().into())).await.unwrap();
    assert_eq!(
        next_message(&mut a).await.unwrap(),
        Message::Text("pong".to_string().into())
    );
}

#[tokio::test]
async fn test_binary_frames_stay_binary() {
    let server = TestServer::start().await.expect("Failed to start server");
    let mut a = server.connect().await.unwrap();
    let mut b = server.connect().await.unwrap();
    server.wait_for_connected(2).await.unwrap();

    let bytes = vec![0u8, 159, 146, 150, 255];
    a.send(Message::Binary(bytes.clone().into())).await.unwrap();

    assert_eq!(next_message(&mut b).await.unwrap(), Message::Binary(bytes.into()));
}

// ============================================================================
// Lifecycle Tests
// ============================================================================

#[tokio::test]
async fn test_client_close_deregisters() {
    let server = TestServer::start().await.expect("Failed to start server");
    let mut a = server.connect().await.unwrap();
    let mut b = server.connect().await.unwrap();
    server.wait_for_connected(2).await.unwrap();

    a.close(None).await.unwrap();
    server.wait_for_connected(1).await.unwrap();
    server.wait_for_stat("deregistered_total", 1).await.unwrap();

    // The remaining client still relays
    b.send(Message::Text("still here".to_string().into())).await.unwrap();
    assert_eq!(
        next_message(&mut b).await.unwrap(),
        Message::Text("still here".to_string().into())
    );
}

#[tokio::test]
async fn test_connection_cap_closes_with_try_again_later() {
    let mut config = test_config().unwrap();
    config.hub.max_connections = 1;
    let server = TestServer::start_with_config(config)
        .await
        .expect("Failed to start server");

    let _first = server.connect().await.unwrap();
    server.wait_for_connected(1).await.unwrap();

    let mut second = server.connect().await.unwrap();
    assert_eq!(expect_close(&mut second).await.unwrap(), Some(1013));

    let stats = server.stats().await.unwrap();
    assert_eq!(stats["connected"], 1);
    assert_eq!(stats["rejected_total"], 1);
}

#[tokio::test]
async fn test_custom_relay_path() {
    let mut config = test_config().unwrap();
    config.server.path = "/relay".to_string();
    let server = TestServer::start_with_config(config)
        .await
        .expect("Failed to start server");

    let _ws = server.connect().await.unwrap();
    server.wait_for_connected(1).await.unwrap();

    let response = server.get("/ws").await.expect("Request failed");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Transport Limit Tests
// ============================================================================

#[tokio::test]
async fn test_small_socket_buffers_still_relay_large_messages() {
    let mut config = test_config().unwrap();
    config.transport.read_buffer_size = 64;
    config.transport.write_buffer_size = 64;
    let server = TestServer::start_with_config(config)
        .await
        .expect("Failed to start server");

    let mut a = server.connect().await.unwrap();
    let mut b = server.connect().await.unwrap();
    server.wait_for_connected(2).await.unwrap();

    let large = "x".repeat(16 * 1024);
    a.send(Message::Text(large.clone().into())).await.unwrap();

    assert_eq!(next_message(&mut b).await.unwrap(), Message::Text(large.into()));
}

#[tokio::test]
async fn test_oversized_message_disconnects_sender() {
    let mut config = test_config().unwrap();
    config.transport.max_message_size = Some(1024);
    let server = TestServer::start_with_config(config)
        .await
        .expect("Failed to start server");

    let mut a = server.connect().await.unwrap();
    let mut b = server.connect().await.unwrap();
    server.wait_for_connected(2).await.unwrap();

    a.send(Message::Binary(vec![7u8; 4096].into())).await.unwrap();
    server.wait_for_stat("deregistered_total", 1).await.unwrap();
    server.wait_for_connected(1).await.unwrap();

    // The oversized message was never broadcast
    b.send(Message::Text("small".to_string().into())).await.unwrap();
    assert_eq!(
        next_message(&mut b).await.unwrap(),
        Message::Text("small".to_string().into())
    );
    assert_eq!(server.stats().await.unwrap()["broadcasts_total"], 1);
}
