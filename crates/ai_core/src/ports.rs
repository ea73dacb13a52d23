//! Port definitions for inference engine
//!
//! Defines the traits (ports) that inference adapters must implement.

use async_trait::async_trait;
use domain::{Speaker, TranscriptEntry};
use serde::{Deserialize, Serialize};

use crate::error::InferenceError;

/// Request for inference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceRequest {
    /// Messages in the conversation
    pub messages: Vec<InferenceMessage>,
    /// Model to use (overrides config default)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Temperature for sampling
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// A message in the inference request (OpenAI-compatible format)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferenceMessage {
    pub role: String,
    pub content: String,
}

impl InferenceMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

impl From<&TranscriptEntry> for InferenceMessage {
    fn from(entry: &TranscriptEntry) -> Self {
        match entry.speaker {
            Speaker::Caller => Self::user(entry.text.clone()),
            Speaker::Agent => Self::assistant(entry.text.clone()),
        }
    }
}

impl InferenceRequest {
    /// Create a simple single-turn request
    pub fn simple(user_message: impl Into<String>) -> Self {
        Self {
            messages: vec![InferenceMessage::user(user_message)],
            model: None,
            max_tokens: None,
            temperature: None,
        }
    }

    /// Create a request with system prompt
    pub fn with_system(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            messages: vec![InferenceMessage::system(system), InferenceMessage::user(user)],
            model: None,
            max_tokens: None,
            temperature: None,
        }
    }

    /// Build a request from an optional system prompt, prior lines and the
    /// current caller utterance
    pub fn conversation(
        system: Option<&str>,
        history: &[TranscriptEntry],
        user: impl Into<String>,
    ) -> Self {
        let mut messages = Vec::with_capacity(history.len() + 2);
        if let Some(system) = system {
            messages.push(InferenceMessage::system(system));
        }
        messages.extend(history.iter().map(InferenceMessage::from));
        messages.push(InferenceMessage::user(user));

        Self {
            messages,
            model: None,
            max_tokens: None,
            temperature: None,
        }
    }

    /// Set the model for this request
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the completion token limit
    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set temperature
    #[must_use]
    pub const fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }
}

/// Response from inference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceResponse {
    /// Generated content
    pub content: String,
    /// Model that generated the response
    pub model: String,
    /// Token usage statistics
    pub usage: Option<TokenUsage>,
    /// Finish reason
    pub finish_reason: Option<String>,
}

impl InferenceResponse {
    /// Whether generation stopped at the token limit
    pub fn was_truncated(&self) -> bool {
        self.finish_reason.as_deref() == Some("length")
    }
}

/// Token usage statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Port for inference engine implementations
#[async_trait]
pub trait InferenceEngine: Send + Sync {
    /// Generate a complete response
    async fn generate(&self, request: InferenceRequest)
    -> Result<InferenceResponse, InferenceError>;

    /// Check if the inference server is healthy
    async fn health_check(&self) -> Result<bool, InferenceError>;

    /// List available models
    async fn list_models(&self) -> Result<Vec<String>, InferenceError>;

    /// Get the current default model
    fn default_model(&self) -> &str;
}
