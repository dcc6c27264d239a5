//! Multi-provider LLM chat completion
//!
//! The provider is inferred from the model name: `gpt*` models go to OpenAI,
//! `qwen*` models to DashScope's OpenAI-compatible endpoint, `claude*` models
//! to Anthropic. All providers speak through the [`ChatProvider`] trait.

mod anthropic;
mod openai;

pub use anthropic::AnthropicChat;
pub use openai::OpenAiChat;

use async_trait::async_trait;

use crate::config::ApiKeys;
use crate::{Error, Result};

/// Message role in a chat exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    /// Role name as used on the wire and in the store
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A single chat message
#[derive(Debug, Clone, serde::Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    /// Create a message with the given role
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// System message shorthand
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// User message shorthand
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Assistant message shorthand
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Sampling parameters for a completion request
#[derive(Debug, Clone, Copy)]
pub struct CompletionParams {
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
    /// Honored by OpenAI-compatible providers, ignored by Anthropic
    pub seed: Option<i64>,
}

impl From<&crate::config::LlmConfig> for CompletionParams {
    fn from(llm: &crate::config::LlmConfig) -> Self {
        Self {
            temperature: llm.temperature,
            max_tokens: llm.max_tokens,
            top_p: llm.top_p,
            seed: llm.seed,
        }
    }
}

/// A chat completion backend
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Run a chat completion over the full message list and return the
    /// assistant's text
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response carries no text
    async fn complete(&self, messages: &[ChatMessage], params: &CompletionParams)
    -> Result<String>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}

impl std::fmt::Debug for dyn ChatProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatProvider")
            .field("name", &self.name())
            .finish()
    }
}

/// Select and construct the provider for a model name
///
/// # Errors
///
/// Returns error if the model name matches no known provider or the matching
/// API key is missing
pub fn provider_for_model(model: &str, keys: &ApiKeys) -> Result<Box<dyn ChatProvider>> {
    let lower = model.to_ascii_lowercase();

    if lower.contains("gpt") || lower.contains("tts") {
        let key = keys.openai.clone().ok_or_else(|| {
            Error::Config("OPENAI_API_KEY required for gpt/tts models".to_string())
        })?;
        return Ok(Box::new(OpenAiChat::openai(key, model.to_string())?));
    }

    if lower.contains("qwen") {
        let key = keys.dashscope.clone().ok_or_else(|| {
            Error::Config("DASHSCOPE_API_KEY required for qwen models".to_string())
        })?;
        return Ok(Box::new(OpenAiChat::dashscope(key, model.to_string())?));
    }

    if lower.contains("claude") {
        let key = keys.anthropic.clone().ok_or_else(|| {
            Error::Config("ANTHROPIC_API_KEY required for claude models".to_string())
        })?;
        return Ok(Box::new(AnthropicChat::new(key, model.to_string())?));
    }

    Err(Error::Config(format!("unrecognized model: {model}")))
}
