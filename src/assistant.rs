//! Conversation orchestration: system prompt, stored history, LLM call

use crate::config::{ApiKeys, LlmConfig};
use crate::db::{Message, MessageRole, SessionRepo};
use crate::llm::{ChatMessage, ChatProvider, CompletionParams, Role, provider_for_model};
use crate::Result;

/// How many stored messages feed each request when context is enabled
pub const CONTEXT_MESSAGES: usize = 20;

/// Answers questions with the configured LLM, threading stored conversation
/// history through each request
pub struct Assistant {
    provider: Box<dyn ChatProvider>,
    config: LlmConfig,
    repo: SessionRepo,
}

impl Assistant {
    /// Create an assistant for the configured model
    ///
    /// # Errors
    ///
    /// Returns error if the model resolves to no provider or its key is missing
    pub fn new(config: LlmConfig, keys: &ApiKeys, repo: SessionRepo) -> Result<Self> {
        let provider = provider_for_model(&config.model, keys)?;
        tracing::info!(model = %config.model, provider = provider.name(), "assistant initialized");

        Ok(Self {
            provider,
            config,
            repo,
        })
    }

    /// Create an assistant backed by an explicit provider
    #[must_use]
    pub fn with_provider(
        provider: Box<dyn ChatProvider>,
        config: LlmConfig,
        repo: SessionRepo,
    ) -> Self {
        Self {
            provider,
            config,
            repo,
        }
    }

    /// Answer a question within a session
    ///
    /// Builds the prompt from the system prompt, recent session history
    /// (when context is enabled), and the question; stores both sides of
    /// the exchange afterwards.
    ///
    /// # Errors
    ///
    /// Returns error if the completion fails
    pub async fn assist(&self, session_id: &str, question: &str) -> Result<String> {
        let history = if self.config.with_context {
            self.repo
                .get_messages(session_id, CONTEXT_MESSAGES)
                .unwrap_or_else(|e| {
                    tracing::warn!(error = %e, "failed to load history, answering without context");
                    Vec::new()
                })
        } else {
            Vec::new()
        };

        let messages = build_messages(&self.config.system_prompt, &history, question);
        let params = CompletionParams::from(&self.config);

        tracing::info!(
            model = %self.config.model,
            history = history.len(),
            "requesting completion"
        );
        let answer = self.provider.complete(&messages, &params).await?;
        tracing::debug!(chars = answer.len(), "completion received");

        // History storage is best-effort on the response path
        if let Err(e) = self
            .repo
            .add_message(session_id, MessageRole::User, question)
            .and_then(|_| self.repo.add_message(session_id, MessageRole::Assistant, &answer))
        {
            tracing::warn!(error = %e, session_id, "failed to store exchange");
        }

        Ok(answer)
    }

    /// Model identifier in use
    #[must_use]
    pub fn model(&self) -> &str {
        &self.config.model
    }
}

/// Assemble the full message list for one completion request
fn build_messages(system_prompt: &str, history: &[Message], question: &str) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(system_prompt));

    for msg in history {
        let role = match msg.role {
            MessageRole::User => Role::User,
            MessageRole::Assistant => Role::Assistant,
            MessageRole::System => Role::System,
        };
        messages.push(ChatMessage::new(role, msg.content.clone()));
    }

    messages.push(ChatMessage::user(question));
    messages
}
