//! Anthropic messages API provider
//!
//! The messages API takes the system prompt as a top-level field rather than
//! a message, so system messages are split out and joined before the call.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{ChatMessage, ChatProvider, CompletionParams, Role};
use crate::{Error, Result};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Chat completion client for the Anthropic messages API
pub struct AnthropicChat {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl AnthropicChat {
    /// Create a new Anthropic client
    ///
    /// # Errors
    ///
    /// Returns error if the API key is empty
    pub fn new(api_key: String, model: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config("Anthropic API key is empty".to_string()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model,
        })
    }
}

#[async_trait]
impl ChatProvider for AnthropicChat {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        params: &CompletionParams,
    ) -> Result<String> {
        // Top-level system field; seed is not supported by this API
        let system: String = messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let turns: Vec<&ChatMessage> = messages
            .iter()
            .filter(|m| m.role != Role::System)
            .collect();

        let request = MessagesRequest {
            model: &self.model,
            system: if system.is_empty() {
                None
            } else {
                Some(&system)
            },
            messages: &turns,
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            top_p: params.top_p,
        };

        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Llm(format!("anthropic error {status}: {body}")));
        }

        let result: MessagesResponse = response.json().await?;

        let answer = result
            .content
            .into_iter()
            .find_map(|block| match block {
                ContentBlock::Text { text } => Some(text),
            })
            .ok_or_else(|| Error::Llm("anthropic returned no text content".to_string()))?;

        Ok(answer)
    }

    fn name(&self) -> &'static str {
        "anthropic"
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: &'a [&'a ChatMessage],
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text { text: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_key_is_rejected() {
        assert!(AnthropicChat::new(String::new(), "claude-sonnet-4-20250514".to_string()).is_err());
    }

    #[test]
    fn system_messages_are_lifted_out() {
        let messages = [
            ChatMessage::system("be brief"),
            ChatMessage::system("be kind"),
            ChatMessage::user("hi"),
        ];
        let system: String = messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        assert_eq!(system, "be brief\n\nbe kind");
    }

    #[test]
    fn response_text_block_parses() {
        let json = r#"{"content":[{"type":"text","text":"hello"}]}"#;
        let parsed: MessagesResponse = serde_json::from_str(json).unwrap();
        let ContentBlock::Text { text } = &parsed.content[0];
        assert_eq!(text, "hello");
    }
}
