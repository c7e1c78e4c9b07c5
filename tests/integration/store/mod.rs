//! Postgres store integration tests
//!
//! Require a database at `TEST_DATABASE_URL`; run with `cargo test -- --ignored`.

use aurora_conversations::{
    ConversationStore, ConversationsRepositories, MessageRole, NewConversation, NewMessage,
};

use crate::common::TestConfig;

async fn repositories() -> ConversationsRepositories {
    let config = TestConfig::from_env();
    let pool = sqlx::PgPool::connect(&config.database_url)
        .await
        .expect("test database reachable");
    let repos = ConversationsRepositories::new(pool);
    repos.migrate().await.expect("migrations apply");
    repos
}

#[tokio::test]
#[ignore = "requires Postgres"]
async fn test_postgres_messages_are_ordered() {
    let repos = repositories().await;
    let conv = repos
        .create_conversation(NewConversation::new("Ordering".to_string(), None).unwrap())
        .await
        .unwrap();

    for (role, content) in [
        (MessageRole::User, "hi"),
        (MessageRole::Companion, "hello back"),
        (MessageRole::User, "how are you?"),
    ] {
        repos
            .create_message(NewMessage::new(conv.id, role, content.to_string()).unwrap())
            .await
            .unwrap();
    }

    let messages = repos.get_messages(conv.id).await.unwrap();
    let contents: Vec<_> = messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["hi", "hello back", "how are you?"]);
    assert!(messages.windows(2).all(|w| w[0].created_at <= w[1].created_at));
}

#[tokio::test]
#[ignore = "requires Postgres"]
async fn test_postgres_continuation_token_first_write_wins() {
    let repos = repositories().await;
    let conv = repos
        .create_conversation(NewConversation::new("Tokens".to_string(), Some(false)).unwrap())
        .await
        .unwrap();
    assert!(!conv.is_ai_companion);

    assert!(repos.update_continuation_token(conv.id, "t1").await.unwrap());
    assert!(!repos.update_continuation_token(conv.id, "t2").await.unwrap());

    let stored = repos.get_conversation(conv.id).await.unwrap().unwrap();
    assert_eq!(stored.continuation_token.as_deref(), Some("t1"));
}

#[tokio::test]
#[ignore = "requires Postgres"]
async fn test_postgres_unknown_conversation() {
    let repos = repositories().await;
    assert!(repos.get_conversation(i64::MAX).await.unwrap().is_none());
    assert!(repos.get_messages(i64::MAX).await.unwrap().is_empty());
}
