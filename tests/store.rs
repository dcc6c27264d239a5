//! Conversation store integration tests
//!
//! Tests session persistence and the assistant's use of stored history
//! with a mock LLM provider

use std::sync::Arc;

use async_trait::async_trait;
use aria_gateway::assistant::Assistant;
use aria_gateway::config::LlmConfig;
use aria_gateway::db::{MessageRole, SessionRepo};
use aria_gateway::llm::{ChatMessage, ChatProvider, CompletionParams, Role};
use tokio::sync::Mutex;

mod common;
use common::{create_test_session, setup_test_db};

/// Mock provider that records the messages it was given
struct MockProvider {
    reply: String,
    seen: Arc<Mutex<Vec<Vec<ChatMessage>>>>,
}

impl MockProvider {
    fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

#[async_trait]
impl ChatProvider for MockProvider {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        _params: &CompletionParams,
    ) -> aria_gateway::Result<String> {
        self.seen.lock().await.push(messages.to_vec());
        Ok(self.reply.clone())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

#[test]
fn sessions_are_stable_per_transport_and_peer() {
    let db = setup_test_db();

    let tcp = create_test_session(&db, "tcp", "192.168.1.10");
    let tcp_again = create_test_session(&db, "tcp", "192.168.1.10");
    let ws = create_test_session(&db, "websocket", "192.168.1.10");

    assert_eq!(tcp.id, tcp_again.id);
    assert_ne!(tcp.id, ws.id);
}

#[test]
fn exchanges_persist_in_order() {
    let db = setup_test_db();
    let repo = SessionRepo::new(db.clone());
    let session = create_test_session(&db, "tcp", "10.0.0.1");

    repo.add_message(&session.id, MessageRole::User, "What is Rust?")
        .unwrap();
    repo.add_message(&session.id, MessageRole::Assistant, "A systems language.")
        .unwrap();
    repo.add_message(&session.id, MessageRole::User, "Who made it?")
        .unwrap();

    let messages = repo.get_messages(&session.id, 20).unwrap();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[0].content, "What is Rust?");
    assert_eq!(messages[1].role, MessageRole::Assistant);
    assert_eq!(messages[2].content, "Who made it?");
}

#[tokio::test]
async fn assistant_threads_history_through_requests() {
    let db = setup_test_db();
    let repo = SessionRepo::new(db.clone());
    let session = create_test_session(&db, "websocket", "10.0.0.2");

    let provider = MockProvider::new("the answer");
    let seen = Arc::clone(&provider.seen);

    let config = LlmConfig::default();
    let assistant = Assistant::with_provider(Box::new(provider), config, repo.clone());

    let first = assistant.assist(&session.id, "first question").await.unwrap();
    assert_eq!(first, "the answer");

    assistant.assist(&session.id, "second question").await.unwrap();

    let requests = seen.lock().await;
    assert_eq!(requests.len(), 2);

    // First request: system prompt plus the question
    assert_eq!(requests[0].len(), 2);
    assert_eq!(requests[0][0].role, Role::System);
    assert_eq!(requests[0][1].content, "first question");

    // Second request carries the stored exchange before the new question
    assert_eq!(requests[1].len(), 4);
    assert_eq!(requests[1][1].content, "first question");
    assert_eq!(requests[1][2].role, Role::Assistant);
    assert_eq!(requests[1][2].content, "the answer");
    assert_eq!(requests[1][3].content, "second question");
}

#[tokio::test]
async fn assistant_without_context_sends_bare_prompt() {
    let db = setup_test_db();
    let repo = SessionRepo::new(db.clone());
    let session = create_test_session(&db, "tcp", "10.0.0.3");

    // Pre-existing history that must not be included
    repo.add_message(&session.id, MessageRole::User, "old question")
        .unwrap();
    repo.add_message(&session.id, MessageRole::Assistant, "old answer")
        .unwrap();

    let provider = MockProvider::new("fresh");
    let seen = Arc::clone(&provider.seen);

    let config = LlmConfig {
        with_context: false,
        ..LlmConfig::default()
    };
    let assistant = Assistant::with_provider(Box::new(provider), config, repo);

    assistant.assist(&session.id, "new question").await.unwrap();

    let requests = seen.lock().await;
    assert_eq!(requests[0].len(), 2);
    assert_eq!(requests[0][1].content, "new question");
}

#[tokio::test]
async fn assistant_stores_both_sides_of_the_exchange() {
    let db = setup_test_db();
    let repo = SessionRepo::new(db.clone());
    let session = create_test_session(&db, "websocket", "10.0.0.4");

    let provider = MockProvider::new("42");
    let assistant = Assistant::with_provider(Box::new(provider), LlmConfig::default(), repo.clone());

    assistant.assist(&session.id, "meaning of life?").await.unwrap();

    let messages = repo.get_messages(&session.id, 20).unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, MessageRole::User);
    assert_eq!(messages[0].content, "meaning of life?");
    assert_eq!(messages[1].role, MessageRole::Assistant);
    assert_eq!(messages[1].content, "42");
}
