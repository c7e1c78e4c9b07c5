//! WebSocket relay integration tests
//!
//! Real clients over a real listener: binding, fan-out, error frames,
//! disconnect cleanup and heartbeat expiry.

#![allow(dead_code)]

mod common;

use std::net::SocketAddr;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio_tungstenite::tungstenite::Message;
use tower::ServiceExt;

use aurora_conversations::SessionSettings;
use common::{json_request, TestApp, STUB_REPLY};

type WsClient =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

async fn connect(addr: SocketAddr) -> WsClient {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{}/ws", addr))
        .await
        .expect("websocket handshake");
    ws
}

async fn send_json(ws: &mut WsClient, frame: Value) {
    ws.send(Message::text(frame.to_string())).await.unwrap();
}

/// Next JSON frame, skipping control frames
async fn next_json(ws: &mut WsClient) -> Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("frame within timeout")
            .expect("stream open")
            .expect("valid frame");
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

async fn assert_silent(ws: &mut WsClient) {
    let next = tokio::time::timeout(Duration::from_millis(200), ws.next()).await;
    assert!(next.is_err(), "unexpected frame: {:?}", next);
}

fn contents(frame: &Value) -> Vec<String> {
    frame
        .as_array()
        .expect("message batch")
        .iter()
        .map(|m| m["content"].as_str().unwrap().to_string())
        .collect()
}

#[test_log::test(tokio::test)]
async fn test_turn_fans_out_to_conversation_only() {
    let app = TestApp::new();
    let conv = app.create_conversation("Friends", true).await;
    let other = app.create_conversation("Elsewhere", true).await;
    let addr = app.spawn_server().await.unwrap();

    let mut alice = connect(addr).await;
    let mut bob = connect(addr).await;
    let mut dana = connect(addr).await;

    send_json(&mut bob, json!({"type": "typing", "conversationId": conv.id})).await;
    send_json(&mut dana, json!({"type": "typing", "conversationId": other.id})).await;
    app.wait_for_subscribers(conv.id, 1).await;
    app.wait_for_subscribers(other.id, 1).await;

    send_json(
        &mut alice,
        json!({"type": "message", "conversationId": conv.id, "content": "hi"}),
    )
    .await;

    let to_alice = next_json(&mut alice).await;
    let to_bob = next_json(&mut bob).await;
    assert_eq!(contents(&to_alice), vec!["hi", STUB_REPLY]);
    assert_eq!(to_alice, to_bob);
    assert_eq!(to_bob[0]["role"], "user");
    assert_eq!(to_bob[1]["role"], "companion");

    assert_silent(&mut dana).await;
}

#[tokio::test]
async fn test_http_turn_reaches_websocket_subscribers() {
    let app = TestApp::new();
    let conv = app.create_conversation("Friends", true).await;
    let addr = app.spawn_server().await.unwrap();

    let mut client = connect(addr).await;
    send_json(&mut client, json!({"type": "message", "conversationId": conv.id})).await;
    app.wait_for_subscribers(conv.id, 1).await;

    let resp = app
        .router()
        .oneshot(json_request(
            "POST",
            "/api/messages",
            Some(json!({"conversationId": conv.id, "content": "from http"})),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), axum::http::StatusCode::CREATED);

    assert_eq!(contents(&next_json(&mut client).await), vec!["from http", STUB_REPLY]);
}

#[tokio::test]
async fn test_turns_arrive_in_order() {
    let app = TestApp::new();
    let conv = app.create_conversation("Friends", true).await;
    let addr = app.spawn_server().await.unwrap();

    let mut client = connect(addr).await;
    for content in ["one", "two", "three"] {
        send_json(
            &mut client,
            json!({"type": "message", "conversationId": conv.id, "content": content}),
        )
        .await;
        assert_eq!(contents(&next_json(&mut client).await)[0], content);
    }
}

#[tokio::test]
async fn test_generator_failure_still_broadcasts_reply() {
    let app = TestApp::new();
    let conv = app.create_conversation("Friends", true).await;
    app.generator.set_failing(true);
    let addr = app.spawn_server().await.unwrap();

    let mut client = connect(addr).await;
    send_json(
        &mut client,
        json!({"type": "message", "conversationId": conv.id, "content": "hello"}),
    )
    .await;

    let frame = next_json(&mut client).await;
    assert_eq!(
        contents(&frame),
        vec!["hello", aurora_conversations::relay::FALLBACK_REPLY]
    );
}

#[tokio::test]
async fn test_malformed_frame_gets_error_and_connection_survives() {
    let app = TestApp::new();
    let conv = app.create_conversation("Friends", true).await;
    let addr = app.spawn_server().await.unwrap();

    let mut client = connect(addr).await;
    client.send(Message::text("{definitely not json")).await.unwrap();
    assert_eq!(
        next_json(&mut client).await,
        json!({"error": "Failed to process message"})
    );

    // Binary frames carrying UTF-8 JSON are accepted
    let frame = json!({"type": "message", "conversationId": conv.id, "content": "still here"});
    client
        .send(Message::binary(frame.to_string().into_bytes()))
        .await
        .unwrap();
    assert_eq!(
        contents(&next_json(&mut client).await),
        vec!["still here", STUB_REPLY]
    );
}

#[tokio::test]
async fn test_unknown_conversation_error_goes_to_sender() {
    let app = TestApp::new();
    let addr = app.spawn_server().await.unwrap();

    let mut client = connect(addr).await;
    send_json(
        &mut client,
        json!({"type": "message", "conversationId": 31337, "content": "hello?"}),
    )
    .await;

    assert_eq!(
        next_json(&mut client).await,
        json!({"error": "Conversation not found"})
    );
}

#[tokio::test]
async fn test_disconnect_deregisters() {
    let app = TestApp::new();
    let conv = app.create_conversation("Friends", true).await;
    let addr = app.spawn_server().await.unwrap();

    let mut first = connect(addr).await;
    let mut second = connect(addr).await;
    for client in [&mut first, &mut second] {
        send_json(client, json!({"type": "typing", "conversationId": conv.id})).await;
    }
    app.wait_for_subscribers(conv.id, 2).await;

    first.close(None).await.unwrap();
    app.wait_for_subscribers(conv.id, 1).await;

    drop(second);
    app.wait_for_subscribers(conv.id, 0).await;
    assert_eq!(app.state.registry().conversation_count().await, 0);
}

#[tokio::test]
async fn test_silent_client_is_dropped_by_heartbeat() {
    let app = TestApp::with_session(SessionSettings {
        ping_interval: Duration::from_millis(300),
        ..Default::default()
    });
    let conv = app.create_conversation("Friends", true).await;
    let addr = app.spawn_server().await.unwrap();

    let mut client = connect(addr).await;
    send_json(&mut client, json!({"type": "typing", "conversationId": conv.id})).await;
    app.wait_for_subscribers(conv.id, 1).await;

    // Never read again, so Pings go unanswered
    app.wait_for_subscribers(conv.id, 0).await;
    drop(client);
}
