//! Configuration management for the Aria gateway

pub mod file;

use std::path::PathBuf;

use crate::{Error, Result};

/// Default listen port (both transports)
pub const DEFAULT_PORT: u16 = 8888;

/// Default chat model
pub const DEFAULT_LLM_MODEL: &str = "gpt-4.1";

/// Default TTS model
pub const DEFAULT_TTS_MODEL: &str = "gpt-4o-mini-tts";

/// Default TTS voice
pub const DEFAULT_TTS_VOICE: &str = "nova";

/// Default assistant system prompt
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful smart and pleasant \
assistant intended to kindly answer any kind of question with versatile \
literature erudition and light futuristic touch.";

/// Aria gateway configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server/transport configuration
    pub server: ServerConfig,

    /// LLM configuration
    pub llm: LlmConfig,

    /// TTS configuration
    pub tts: TtsConfig,

    /// API keys
    pub api_keys: ApiKeys,

    /// Path to data directory (database, interaction log)
    pub data_dir: PathBuf,
}

/// Socket transport carrying the question/audio exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transport {
    /// WebSocket framing (text question in, binary audio out)
    #[default]
    WebSocket,
    /// Raw TCP with an `<END_OF_AUDIO>` trailer on the response
    Tcp,
}

impl Transport {
    /// Parse a transport name ("websocket"/"ws" or "tcp")
    ///
    /// # Errors
    ///
    /// Returns error for unrecognized names
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "websocket" | "ws" => Ok(Self::WebSocket),
            "tcp" => Ok(Self::Tcp),
            other => Err(Error::Config(format!(
                "unknown transport: {other} (expected \"websocket\" or \"tcp\")"
            ))),
        }
    }

    /// Transport name as used in config and session records
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WebSocket => "websocket",
            Self::Tcp => "tcp",
        }
    }
}

/// Server/transport configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Selected transport
    pub transport: Transport,
}

/// LLM chat completion configuration
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Model identifier; also selects the provider (gpt* → OpenAI,
    /// qwen* → DashScope, claude* → Anthropic)
    pub model: String,

    /// System prompt prepended to every request
    pub system_prompt: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Max completion tokens
    pub max_tokens: u32,

    /// Nucleus sampling cutoff
    pub top_p: f32,

    /// Sampling seed (OpenAI-compatible providers only)
    pub seed: Option<i64>,

    /// Include stored conversation history in each request
    pub with_context: bool,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_LLM_MODEL.to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            temperature: 0.5,
            max_tokens: 500,
            top_p: 0.7,
            seed: Some(69),
            with_context: true,
        }
    }
}

/// TTS configuration
#[derive(Debug, Clone)]
pub struct TtsConfig {
    /// TTS model
    pub model: String,

    /// Voice identifier
    pub voice: String,

    /// Speed multiplier (0.25 to 4.0)
    pub speed: f32,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_TTS_MODEL.to_string(),
            voice: DEFAULT_TTS_VOICE.to_string(),
            speed: 1.0,
        }
    }
}

/// API keys for external services
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    /// `OpenAI` API key (chat and TTS)
    pub openai: Option<String>,

    /// `DashScope` API key (Qwen models via the OpenAI-compatible endpoint)
    pub dashscope: Option<String>,

    /// `Anthropic` API key (Claude models)
    pub anthropic: Option<String>,
}

impl Config {
    /// Load configuration with priority env > toml file > defaults
    ///
    /// # Errors
    ///
    /// Returns error if an env/file value cannot be parsed
    pub fn load() -> Result<Self> {
        let fc = file::load_config_file();

        let api_keys = ApiKeys {
            openai: std::env::var("OPENAI_API_KEY").ok().or(fc.api_keys.openai),
            dashscope: std::env::var("DASHSCOPE_API_KEY")
                .ok()
                .or(fc.api_keys.dashscope),
            anthropic: std::env::var("ANTHROPIC_API_KEY")
                .ok()
                .or(fc.api_keys.anthropic),
        };

        let transport = std::env::var("ARIA_TRANSPORT")
            .ok()
            .or(fc.server.transport)
            .map_or(Ok(Transport::default()), |s| Transport::parse(&s))?;

        let server = ServerConfig {
            host: std::env::var("ARIA_HOST")
                .ok()
                .or(fc.server.host)
                .unwrap_or_else(|| "0.0.0.0".to_string()),
            port: std::env::var("ARIA_PORT")
                .or_else(|_| std::env::var("PORT"))
                .ok()
                .and_then(|s| s.parse().ok())
                .or(fc.server.port)
                .unwrap_or(DEFAULT_PORT),
            transport,
        };

        let llm_defaults = LlmConfig::default();
        let llm = LlmConfig {
            model: std::env::var("ARIA_LLM_MODEL")
                .ok()
                .or(fc.llm.model)
                .unwrap_or(llm_defaults.model),
            system_prompt: fc.llm.system_prompt.unwrap_or(llm_defaults.system_prompt),
            temperature: fc.llm.temperature.unwrap_or(llm_defaults.temperature),
            max_tokens: fc.llm.max_tokens.unwrap_or(llm_defaults.max_tokens),
            top_p: fc.llm.top_p.unwrap_or(llm_defaults.top_p),
            seed: fc.llm.seed.or(llm_defaults.seed),
            with_context: fc.llm.with_context.unwrap_or(llm_defaults.with_context),
        };

        let tts_defaults = TtsConfig::default();
        let tts = TtsConfig {
            model: std::env::var("ARIA_TTS_MODEL")
                .ok()
                .or(fc.tts.model)
                .unwrap_or(tts_defaults.model),
            voice: std::env::var("ARIA_TTS_VOICE")
                .ok()
                .or(fc.tts.voice)
                .unwrap_or(tts_defaults.voice),
            speed: fc.tts.speed.unwrap_or(tts_defaults.speed),
        };

        // Data directory (~/.local/share/aria/gateway on Linux)
        let data_dir = std::env::var("ARIA_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| fc.server.data_dir.map_or_else(default_data_dir, PathBuf::from));
        std::fs::create_dir_all(&data_dir).ok();

        Ok(Self {
            server,
            llm,
            tts,
            api_keys,
            data_dir,
        })
    }

    /// Path to the SQLite conversation store
    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("aria.db")
    }

    /// Path to the append-only interaction log
    #[must_use]
    pub fn transcript_path(&self) -> PathBuf {
        self.data_dir.join("interactions.log")
    }
}

/// Default data directory: `~/.local/share/aria/gateway/`
fn default_data_dir() -> PathBuf {
    directories::BaseDirs::new().map_or_else(
        || PathBuf::from(".local/share/aria/gateway"),
        |d| d.data_dir().join("aria").join("gateway"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_parses_known_names() {
        assert_eq!(Transport::parse("websocket").unwrap(), Transport::WebSocket);
        assert_eq!(Transport::parse("WS").unwrap(), Transport::WebSocket);
        assert_eq!(Transport::parse("tcp").unwrap(), Transport::Tcp);
        assert!(Transport::parse("udp").is_err());
    }

    #[test]
    fn transport_round_trips_as_str() {
        for t in [Transport::WebSocket, Transport::Tcp] {
            assert_eq!(Transport::parse(t.as_str()).unwrap(), t);
        }
    }

    #[test]
    fn llm_defaults_match_service_parameters() {
        let llm = LlmConfig::default();
        assert_eq!(llm.model, "gpt-4.1");
        assert!((llm.temperature - 0.5).abs() < f32::EPSILON);
        assert_eq!(llm.max_tokens, 500);
        assert!((llm.top_p - 0.7).abs() < f32::EPSILON);
        assert_eq!(llm.seed, Some(69));
        assert!(llm.with_context);
    }

    #[test]
    fn tts_defaults() {
        let tts = TtsConfig::default();
        assert_eq!(tts.model, "gpt-4o-mini-tts");
        assert_eq!(tts.voice, "nova");
        assert!((tts.speed - 1.0).abs() < f32::EPSILON);
    }
}
