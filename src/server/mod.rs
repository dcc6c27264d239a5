//! Gateway state and the question → answer → audio pipeline

pub mod tcp;
pub mod websocket;

use std::sync::Arc;

use crate::assistant::Assistant;
use crate::config::{Config, ServerConfig, Transport};
use crate::db::{DbPool, SessionRepo};
use crate::transcript::{InteractionRecord, Transcript};
use crate::tts::{SpeechSynthesizer, TextToSpeech};
use crate::{Error, Result};

/// Shared gateway state: one instance serves all connections
pub struct Gateway {
    assistant: Assistant,
    tts: Box<dyn SpeechSynthesizer>,
    sessions: SessionRepo,
    transcript: Transcript,
    server: ServerConfig,
}

impl Gateway {
    /// Build the gateway from configuration
    ///
    /// # Errors
    ///
    /// Returns error if the LLM provider or TTS client cannot be constructed
    pub fn new(config: &Config, pool: DbPool) -> Result<Self> {
        let sessions = SessionRepo::new(pool);
        let assistant = Assistant::new(config.llm.clone(), &config.api_keys, sessions.clone())?;

        let openai_key = config.api_keys.openai.clone().unwrap_or_default();
        let tts = Box::new(TextToSpeech::new(openai_key, &config.tts)?);

        let transcript = Transcript::new(config.transcript_path());

        Ok(Self {
            assistant,
            tts,
            sessions,
            transcript,
            server: config.server.clone(),
        })
    }

    /// Build a gateway from preconstructed parts
    #[must_use]
    pub fn with_parts(
        assistant: Assistant,
        tts: Box<dyn SpeechSynthesizer>,
        sessions: SessionRepo,
        transcript: Transcript,
        server: ServerConfig,
    ) -> Self {
        Self {
            assistant,
            tts,
            sessions,
            transcript,
            server,
        }
    }

    /// Answer one question: LLM completion, speech synthesis, audit record
    ///
    /// Returns the MP3 bytes to send back to the client.
    ///
    /// # Errors
    ///
    /// Returns error for empty questions or when completion/synthesis fails
    pub async fn answer(&self, transport: Transport, peer: &str, question: &str) -> Result<Vec<u8>> {
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::Transport("empty question".to_string()));
        }

        let session = self
            .sessions
            .find_or_create(transport.as_str(), peer)
            .map_err(|e| Error::Database(e.to_string()))?;

        tracing::info!(
            session_id = %session.id,
            transport = transport.as_str(),
            peer,
            question,
            "processing question"
        );

        let answer = self.assistant.assist(&session.id, question).await?;
        tracing::info!(model = %self.assistant.model(), answer, "answer resolved");

        let audio = self.tts.synthesize(&answer).await?;
        tracing::info!(bytes = audio.len(), "audio synthesized");

        self.transcript.log(&InteractionRecord::new(
            &session.id,
            transport.as_str(),
            question,
            &answer,
            audio.len(),
        ));

        Ok(audio)
    }

    /// Run the configured transport until interrupted
    ///
    /// # Errors
    ///
    /// Returns error if the listener fails to bind or the serve loop dies
    pub async fn run(self) -> Result<()> {
        let server = self.server.clone();
        let gateway = Arc::new(self);

        match server.transport {
            Transport::WebSocket => websocket::serve(gateway, &server.host, server.port).await,
            Transport::Tcp => tcp::serve(gateway, &server.host, server.port).await,
        }
    }
}
