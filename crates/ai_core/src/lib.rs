//! AI Core - Chat completion client
//!
//! Provides the inference engine abstraction used to write the agent's spoken
//! replies, with an OpenAI-compatible chat-completions implementation.

pub mod config;
pub mod error;
pub mod openai;
pub mod ports;

pub use config::InferenceConfig;
pub use error::InferenceError;
pub use openai::OpenAiChatEngine;
pub use ports::{InferenceEngine, InferenceMessage, InferenceRequest, InferenceResponse, TokenUsage};
