//! OpenAI-compatible chat completion provider
//!
//! Covers both api.openai.com and DashScope's compatible-mode endpoint
//! (Qwen models); only the base URL and key differ.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{ChatMessage, ChatProvider, CompletionParams};
use crate::{Error, Result};

/// DashScope OpenAI-compatible base URL (international endpoint)
const DASHSCOPE_BASE_URL: &str = "https://dashscope-intl.aliyuncs.com/compatible-mode/v1";

/// Chat completion client for OpenAI-compatible APIs
pub struct OpenAiChat {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    provider_name: &'static str,
}

impl OpenAiChat {
    /// Create a client against api.openai.com
    ///
    /// # Errors
    ///
    /// Returns error if the API key is empty
    pub fn openai(api_key: String, model: String) -> Result<Self> {
        Self::with_base_url(
            api_key,
            model,
            "https://api.openai.com/v1".to_string(),
            "openai",
        )
    }

    /// Create a client against DashScope's OpenAI-compatible endpoint
    ///
    /// # Errors
    ///
    /// Returns error if the API key is empty
    pub fn dashscope(api_key: String, model: String) -> Result<Self> {
        Self::with_base_url(api_key, model, DASHSCOPE_BASE_URL.to_string(), "dashscope")
    }

    fn with_base_url(
        api_key: String,
        model: String,
        base_url: String,
        provider_name: &'static str,
    ) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(format!("{provider_name} API key is empty")));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            base_url,
            model,
            provider_name,
        })
    }
}

#[async_trait]
impl ChatProvider for OpenAiChat {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        params: &CompletionParams,
    ) -> Result<String> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages,
            temperature: params.temperature,
            max_tokens: params.max_tokens,
            top_p: params.top_p,
            seed: params.seed,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Llm(format!(
                "{} chat error {status}: {body}",
                self.provider_name
            )));
        }

        let result: ChatCompletionResponse = response.json().await?;

        let answer = result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::Llm(format!("{} returned no choices", self.provider_name)))?;

        Ok(answer)
    }

    fn name(&self) -> &'static str {
        self.provider_name
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<i64>,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}
