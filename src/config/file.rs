//! TOML configuration file loading
//!
//! Supports `~/.config/aria/gateway/config.toml` as a persistent config source.
//! All fields are optional — the file is a partial overlay on top of defaults.

use std::path::PathBuf;

use serde::Deserialize;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct AriaConfigFile {
    /// Server/transport configuration
    #[serde(default)]
    pub server: ServerFileConfig,

    /// LLM configuration
    #[serde(default)]
    pub llm: LlmFileConfig,

    /// TTS configuration
    #[serde(default)]
    pub tts: TtsFileConfig,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,
}

/// Server/transport configuration
#[derive(Debug, Default, Deserialize)]
pub struct ServerFileConfig {
    /// Host to bind (e.g. "0.0.0.0")
    pub host: Option<String>,

    /// Port to listen on
    pub port: Option<u16>,

    /// Transport: "websocket" or "tcp"
    pub transport: Option<String>,

    /// Data directory (database + interaction log)
    pub data_dir: Option<String>,
}

/// LLM-related configuration
#[derive(Debug, Default, Deserialize)]
pub struct LlmFileConfig {
    /// Model identifier (e.g. "gpt-4.1", "qwen-plus", "claude-sonnet-4-20250514")
    pub model: Option<String>,

    /// System prompt override
    pub system_prompt: Option<String>,

    /// Sampling temperature
    pub temperature: Option<f32>,

    /// Max completion tokens
    pub max_tokens: Option<u32>,

    /// Nucleus sampling cutoff
    pub top_p: Option<f32>,

    /// Sampling seed (OpenAI-compatible providers only)
    pub seed: Option<i64>,

    /// Include stored conversation history in each request
    pub with_context: Option<bool>,
}

/// TTS configuration
#[derive(Debug, Default, Deserialize)]
pub struct TtsFileConfig {
    /// TTS model (e.g. "gpt-4o-mini-tts")
    pub model: Option<String>,

    /// Voice identifier (e.g. "nova", "alloy")
    pub voice: Option<String>,

    /// Speed multiplier
    pub speed: Option<f32>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize)]
pub struct ApiKeysFileConfig {
    pub openai: Option<String>,
    pub dashscope: Option<String>,
    pub anthropic: Option<String>,
}

/// Load the TOML config file from the standard path
///
/// Returns `AriaConfigFile::default()` if the file doesn't exist or can't be parsed.
#[must_use]
pub fn load_config_file() -> AriaConfigFile {
    let Some(path) = config_file_path() else {
        return AriaConfigFile::default();
    };

    if !path.exists() {
        return AriaConfigFile::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                AriaConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            AriaConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/aria/gateway/config.toml`
#[must_use]
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| {
        d.config_dir()
            .join("aria")
            .join("gateway")
            .join("config.toml")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_parses_to_defaults() {
        let parsed: AriaConfigFile = toml::from_str("").unwrap();
        assert!(parsed.server.port.is_none());
        assert!(parsed.llm.model.is_none());
        assert!(parsed.tts.voice.is_none());
    }

    #[test]
    fn partial_file_overlays() {
        let parsed: AriaConfigFile = toml::from_str(
            r#"
            [server]
            transport = "tcp"

            [llm]
            model = "qwen-plus"
            temperature = 0.2

            [api_keys]
            dashscope = "sk-test"
            "#,
        )
        .unwrap();

        assert_eq!(parsed.server.transport.as_deref(), Some("tcp"));
        assert!(parsed.server.port.is_none());
        assert_eq!(parsed.llm.model.as_deref(), Some("qwen-plus"));
        assert_eq!(parsed.llm.temperature, Some(0.2));
        assert_eq!(parsed.api_keys.dashscope.as_deref(), Some("sk-test"));
        assert!(parsed.api_keys.openai.is_none());
    }
}
