//! Conversation and analysis endpoint integration tests

use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

use crate::common::{json_request, parse_body, TestApp};

mod test_create_conversation {
    use super::*;

    #[tokio::test]
    async fn test_create_conversation_returns_201_with_companion_default() {
        let app = TestApp::new();

        let req = json_request("POST", "/api/conversations", Some(json!({"name": "Grandma"})));
        let resp = app.router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);

        let body = parse_body(resp).await;
        assert!(body["id"].as_i64().unwrap() >= 1);
        assert_eq!(body["name"], "Grandma");
        assert_eq!(body["isAiCompanion"], true);
        assert!(body["createdAt"].is_string());
        assert!(body.get("continuationToken").is_none());
    }

    #[tokio::test]
    async fn test_create_conversation_respects_companion_flag() {
        let app = TestApp::new();

        let req = json_request(
            "POST",
            "/api/conversations",
            Some(json!({"name": "Homework", "isAiCompanion": false})),
        );
        let body = parse_body(app.router().oneshot(req).await.unwrap()).await;
        assert_eq!(body["isAiCompanion"], false);
    }

    #[tokio::test]
    async fn test_create_conversation_rejects_blank_name() {
        let app = TestApp::new();

        for name in ["", "   "] {
            let req = json_request("POST", "/api/conversations", Some(json!({"name": name})));
            let resp = app.router().oneshot(req).await.unwrap();
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

            let body = parse_body(resp).await;
            assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        }
    }

    #[tokio::test]
    async fn test_create_conversation_rejects_missing_name() {
        let app = TestApp::new();
        let req = json_request("POST", "/api/conversations", Some(json!({"isAiCompanion": true})));
        let resp = app.router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}

mod test_get_conversation {
    use super::*;

    #[tokio::test]
    async fn test_get_conversation_by_id() {
        let app = TestApp::new();
        let conv = app.create_conversation("Friends", true).await;

        let req = json_request("GET", &format!("/api/conversations/{}", conv.id), None);
        let resp = app.router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(parse_body(resp).await["name"], "Friends");
    }

    #[tokio::test]
    async fn test_get_unknown_conversation_returns_404() {
        let app = TestApp::new();

        let resp = app
            .router()
            .oneshot(json_request("GET", "/api/conversations/999", None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(parse_body(resp).await["error"]["code"], "NOT_FOUND");
    }
}

mod test_analyze {
    use super::*;

    #[tokio::test]
    async fn test_analyze_returns_score_and_feedback() {
        let app = TestApp::new();

        let req = json_request(
            "POST",
            "/api/analyze",
            Some(json!({
                "message": "Thanks for helping me today",
                "subject": {"name": "Sam", "age": 14, "relationship": "friend"}
            })),
        );
        let resp = app.router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = parse_body(resp).await;
        assert_eq!(body["score"], 9);
        assert_eq!(body["feedback"], "Kind words: Thanks for helping me today");
    }

    #[tokio::test]
    async fn test_analyze_in_conversation_context() {
        let app = TestApp::new();
        let conv = app.create_conversation("Friends", true).await;

        let req = json_request(
            "POST",
            "/api/analyze",
            Some(json!({"message": "See you soon", "conversationId": conv.id})),
        );
        let resp = app.router().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_analyze_rejects_blank_message_and_unknown_conversation() {
        let app = TestApp::new();

        let blank = json_request("POST", "/api/analyze", Some(json!({"message": "  "})));
        let resp = app.router().oneshot(blank).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let unknown = json_request(
            "POST",
            "/api/analyze",
            Some(json!({"message": "hi", "conversationId": 4040})),
        );
        let resp = app.router().oneshot(unknown).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
