//! Configuration for speech synthesis

use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::types::OutputFormat;

/// Configuration for the text-to-speech service
#[derive(Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    /// API base URL (for custom endpoints and tests)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// ElevenLabs API key (sensitive - never serialized)
    #[serde(default, skip_serializing)]
    pub api_key: Option<SecretString>,

    /// Voice used when the caller does not pick one
    #[serde(default = "default_voice_id")]
    pub voice_id: String,

    /// Synthesis model
    #[serde(default = "default_model_id")]
    pub model_id: String,

    /// Voice stability (0.0 to 1.0)
    #[serde(default = "default_stability")]
    pub stability: f32,

    /// Similarity boost (0.0 to 1.0)
    #[serde(default = "default_similarity_boost")]
    pub similarity_boost: f32,

    /// Output audio encoding
    #[serde(default)]
    pub output_format: OutputFormat,

    /// Request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_base_url() -> String {
    "https://api.elevenlabs.io/v1".to_string()
}

fn default_voice_id() -> String {
    "WLjZnm4PkNmYtNCyiCq8".to_string()
}

fn default_model_id() -> String {
    "eleven_multilingual_v2".to_string()
}

const fn default_stability() -> f32 {
    0.5
}

const fn default_similarity_boost() -> f32 {
    0.7
}

const fn default_timeout_ms() -> u64 {
    4500
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            voice_id: default_voice_id(),
            model_id: default_model_id(),
            stability: default_stability(),
            similarity_boost: default_similarity_boost(),
            output_format: OutputFormat::default(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl fmt::Debug for SpeechConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpeechConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("voice_id", &self.voice_id)
            .field("model_id", &self.model_id)
            .field("stability", &self.stability)
            .field("similarity_boost", &self.similarity_boost)
            .field("output_format", &self.output_format)
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

impl SpeechConfig {
    /// Create a minimal config for testing
    #[cfg(test)]
    pub fn test() -> Self {
        Self {
            api_key: Some(SecretString::from("test-key")),
            ..Default::default()
        }
    }

    /// Get the API key as a string reference (for request headers)
    #[must_use]
    pub fn api_key_str(&self) -> Option<&str> {
        self.api_key.as_ref().map(ExposeSecret::expose_secret)
    }

    /// Whether a usable API key is configured
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.api_key_str().is_some_and(|key| !key.trim().is_empty())
    }

    /// Validate the configuration
    ///
    /// A missing API key is not an error here: calls then fall back to the
    /// telephony provider's own voice.
    pub fn validate(&self) -> Result<(), String> {
        if self.base_url.trim().is_empty() {
            return Err("Speech base URL must not be empty".to_string());
        }

        if self.voice_id.trim().is_empty() {
            return Err("Voice ID must not be empty".to_string());
        }

        if !(0.0..=1.0).contains(&self.stability) {
            return Err(format!(
                "Stability must be between 0.0 and 1.0, got {}",
                self.stability
            ));
        }

        if !(0.0..=1.0).contains(&self.similarity_boost) {
            return Err(format!(
                "Similarity boost must be between 0.0 and 1.0, got {}",
                self.similarity_boost
            ));
        }

        if self.timeout_ms == 0 {
            return Err("Timeout must be greater than 0".to_string());
        }

        Ok(())
    }
}
