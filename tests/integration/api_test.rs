//! API endpoint integration tests
//!
//! HTTP surface of the relay: conversations, messages, analysis, and the
//! Postgres-backed store.

#![allow(dead_code)]

mod common;
mod conversations;
mod messages;
mod store;

use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

use aurora_common::Config;
use common::{json_request, parse_body};

#[tokio::test]
async fn test_health_check() {
    let app = common::TestApp::new();
    let resp = app
        .router()
        .oneshot(json_request("GET", "/health", None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[test_log::test(tokio::test)]
async fn test_mock_provider_end_to_end() {
    let config = Config {
        llm_provider: "mock".to_string(),
        ..Default::default()
    };
    let router = aurora_app::create_app(&config).await.unwrap();

    let created = parse_body(
        router
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/conversations",
                Some(json!({"name": "Mock"})),
            ))
            .await
            .unwrap(),
    )
    .await;
    let id = created["id"].as_i64().unwrap();

    let turn = parse_body(
        router
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/messages",
                Some(json!({"conversationId": id, "content": "hi"})),
            ))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(turn[1]["content"], "Mock response to: hi");

    let score = parse_body(
        router
            .oneshot(json_request(
                "POST",
                "/api/analyze",
                Some(json!({"message": "You did great", "conversationId": id})),
            ))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(score["score"], 7);
}
