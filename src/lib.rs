//! Aria Gateway - spoken answers to questions via LLM and TTS
//!
//! This library provides the core functionality for the Aria gateway:
//! - Socket transports (WebSocket or raw TCP) carrying question/audio exchanges
//! - Multi-provider LLM chat completion
//! - Speech synthesis and local audio playback
//! - Conversation persistence and an append-only interaction log
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                     Clients                          │
//! │        ask CLI  │  WebSocket  │  raw TCP            │
//! └────────────────────┬────────────────────────────────┘
//!                      │  text question / MP3 answer
//! ┌────────────────────▼────────────────────────────────┐
//! │                  Aria Gateway                        │
//! │   Transports  │  Assistant  │  TTS  │  Store/Log   │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │             External providers                       │
//! │   OpenAI  │  DashScope (Qwen)  │  Anthropic         │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod assistant;
pub mod client;
pub mod config;
pub mod db;
pub mod error;
pub mod llm;
pub mod server;
pub mod transcript;
pub mod tts;
pub mod voice;

pub use assistant::Assistant;
pub use config::Config;
pub use db::{DbConn, DbPool};
pub use error::{Error, Result};
pub use llm::{ChatMessage, ChatProvider, Role, provider_for_model};
pub use server::Gateway;
pub use transcript::Transcript;
pub use tts::{SpeechSynthesizer, TextToSpeech};
