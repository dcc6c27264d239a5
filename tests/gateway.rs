//! Gateway request-path integration tests
//!
//! Exercises the question → answer → audio pipeline with mock LLM and
//! synthesis backends

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use aria_gateway::assistant::Assistant;
use aria_gateway::config::{LlmConfig, ServerConfig, Transport};
use aria_gateway::db::SessionRepo;
use aria_gateway::llm::{ChatMessage, ChatProvider, CompletionParams};
use aria_gateway::transcript::{InteractionRecord, Transcript};
use aria_gateway::{Gateway, SpeechSynthesizer};

mod common;
use common::setup_test_db;

/// Provider that answers with a fixed reply, failing the first N calls
struct FlakyProvider {
    reply: String,
    failures: AtomicUsize,
}

impl FlakyProvider {
    fn reliable(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            failures: AtomicUsize::new(0),
        }
    }

    fn failing_first(reply: &str, failures: usize) -> Self {
        Self {
            reply: reply.to_string(),
            failures: AtomicUsize::new(failures),
        }
    }
}

#[async_trait]
impl ChatProvider for FlakyProvider {
    async fn complete(
        &self,
        _messages: &[ChatMessage],
        _params: &CompletionParams,
    ) -> aria_gateway::Result<String> {
        if self.failures.load(Ordering::SeqCst) > 0 {
            self.failures.fetch_sub(1, Ordering::SeqCst);
            return Err(aria_gateway::Error::Llm("upstream unavailable".to_string()));
        }
        Ok(self.reply.clone())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// Synthesizer that returns the answer text as bytes
struct EchoSynthesizer;

#[async_trait]
impl SpeechSynthesizer for EchoSynthesizer {
    async fn synthesize(&self, text: &str) -> aria_gateway::Result<Vec<u8>> {
        Ok(text.as_bytes().to_vec())
    }
}

fn test_gateway(provider: FlakyProvider, transcript: Transcript) -> Gateway {
    let db = setup_test_db();
    let sessions = SessionRepo::new(db);
    let assistant =
        Assistant::with_provider(Box::new(provider), LlmConfig::default(), sessions.clone());

    Gateway::with_parts(
        assistant,
        Box::new(EchoSynthesizer),
        sessions,
        transcript,
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            transport: Transport::WebSocket,
        },
    )
}

fn temp_transcript() -> (tempfile::TempDir, Transcript) {
    let dir = tempfile::tempdir().unwrap();
    let transcript = Transcript::new(dir.path().join("interactions.log"));
    (dir, transcript)
}

#[tokio::test]
async fn empty_question_is_rejected() {
    let (_dir, transcript) = temp_transcript();
    let gateway = test_gateway(FlakyProvider::reliable("hi"), transcript);

    let err = gateway
        .answer(Transport::WebSocket, "10.1.1.1", "")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("empty question"));
}

#[tokio::test]
async fn whitespace_only_question_is_rejected() {
    let (_dir, transcript) = temp_transcript();
    let gateway = test_gateway(FlakyProvider::reliable("hi"), transcript);

    let err = gateway
        .answer(Transport::WebSocket, "10.1.1.1", "  \n\t ")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("empty question"));
}

#[tokio::test]
async fn sequential_questions_share_a_session() {
    let (_dir, transcript) = temp_transcript();
    let gateway = test_gateway(FlakyProvider::reliable("the answer"), transcript.clone());

    let first = gateway
        .answer(Transport::WebSocket, "10.1.1.2", "question one")
        .await
        .unwrap();
    let second = gateway
        .answer(Transport::WebSocket, "10.1.1.2", "question two")
        .await
        .unwrap();

    assert_eq!(first, b"the answer");
    assert_eq!(second, b"the answer");

    // Both exchanges audited against the same session
    let contents = std::fs::read_to_string(transcript.path()).unwrap();
    let records: Vec<InteractionRecord> = contents
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].session_id, records[1].session_id);
    assert_eq!(records[0].question, "question one");
    assert_eq!(records[1].question, "question two");
}

#[tokio::test]
async fn failed_answer_does_not_poison_the_connection() {
    let (_dir, transcript) = temp_transcript();
    let gateway = test_gateway(
        FlakyProvider::failing_first("recovered", 1),
        transcript.clone(),
    );

    let err = gateway
        .answer(Transport::WebSocket, "10.1.1.3", "first try")
        .await
        .unwrap_err();
    assert!(err.to_string().contains("upstream unavailable"));

    let audio = gateway
        .answer(Transport::WebSocket, "10.1.1.3", "second try")
        .await
        .unwrap();
    assert_eq!(audio, b"recovered");

    // Only the successful exchange is audited
    let contents = std::fs::read_to_string(transcript.path()).unwrap();
    assert_eq!(contents.lines().count(), 1);
}

#[tokio::test]
async fn transports_get_separate_sessions() {
    let (_dir, transcript) = temp_transcript();
    let gateway = test_gateway(FlakyProvider::reliable("ok"), transcript.clone());

    gateway
        .answer(Transport::WebSocket, "10.1.1.4", "over websocket")
        .await
        .unwrap();
    gateway
        .answer(Transport::Tcp, "10.1.1.4", "over tcp")
        .await
        .unwrap();

    let contents = std::fs::read_to_string(transcript.path()).unwrap();
    let records: Vec<InteractionRecord> = contents
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(records.len(), 2);
    assert_ne!(records[0].session_id, records[1].session_id);
    assert_eq!(records[0].transport, "websocket");
    assert_eq!(records[1].transport, "tcp");
}
