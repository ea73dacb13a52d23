//! Configuration for inference engine

use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// Default instructions for a phone agent
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a friendly phone agent. Your answers are \
    read aloud to a caller, so reply in one or two short, plain sentences without lists, \
    markdown, or links.";

/// Configuration for the inference engine
#[derive(Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Base URL of the chat-completions API, including the version prefix
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer token (sensitive - never serialized)
    #[serde(default, skip_serializing)]
    pub api_key: Option<SecretString>,

    /// Default model to use
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Temperature for sampling (0.0 - 2.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// System prompt sent before the conversation
    #[serde(default = "default_system_prompt")]
    pub system_prompt: Option<String>,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

const fn default_timeout_ms() -> u64 {
    3500
}

const fn default_max_tokens() -> u32 {
    80
}

const fn default_temperature() -> f32 {
    0.4
}

#[allow(clippy::unnecessary_wraps)]
fn default_system_prompt() -> Option<String> {
    Some(DEFAULT_SYSTEM_PROMPT.to_string())
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            default_model: default_model(),
            timeout_ms: default_timeout_ms(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            system_prompt: default_system_prompt(),
        }
    }
}

impl fmt::Debug for InferenceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InferenceConfig")
            .field("base_url", &self.base_url)
            .field(
                "api_key",
                &if self.api_key.is_some() {
                    Some("[REDACTED]")
                } else {
                    None
                },
            )
            .field("default_model", &self.default_model)
            .field("timeout_ms", &self.timeout_ms)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("system_prompt", &self.system_prompt)
            .finish()
    }
}

impl InferenceConfig {
    /// Get the API key as a string reference (for request headers)
    #[must_use]
    pub fn api_key_str(&self) -> Option<&str> {
        self.api_key.as_ref().map(ExposeSecret::expose_secret)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.base_url.trim().is_empty() {
            return Err("Inference base URL must not be empty".to_string());
        }

        if self.timeout_ms == 0 {
            return Err("Inference timeout must be greater than 0".to_string());
        }

        if self.max_tokens == 0 {
            return Err("max_tokens must be greater than 0".to_string());
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(format!(
                "Temperature must be between 0.0 and 2.0, got {}",
                self.temperature
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_targets_short_replies() {
        let config = InferenceConfig::default();
        assert_eq!(config.base_url, "https://api.openai.com/v1");
        assert_eq!(config.default_model, "gpt-4o-mini");
        assert_eq!(config.timeout_ms, 3500);
        assert_eq!(config.max_tokens, 80);
        assert!((config.temperature - 0.4).abs() < 0.01);
        assert!(config.api_key.is_none());
        assert_eq!(config.system_prompt.as_deref(), Some(DEFAULT_SYSTEM_PROMPT));
    }

    #[test]
    fn config_serialization_skips_api_key() {
        let config = InferenceConfig {
            api_key: Some(SecretString::from("sk-test")),
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("base_url"));
        assert!(!json.contains("sk-test"));
        assert!(!json.contains("api_key"));
    }

    #[test]
    fn config_deserialization() {
        let json = r#"{"base_url":"http://custom:8080/v1","api_key":"sk-x","default_model":"my-model"}"#;
        let config: InferenceConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.base_url, "http://custom:8080/v1");
        assert_eq!(config.default_model, "my-model");
        assert_eq!(config.api_key_str(), Some("sk-x"));
    }

    #[test]
    fn config_deserialization_with_defaults() {
        let config: InferenceConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.max_tokens, 80);
        assert_eq!(config.timeout_ms, 3500);
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = InferenceConfig {
            api_key: Some(SecretString::from("sk-secret")),
            ..Default::default()
        };
        let debug = format!("{config:?}");
        assert!(debug.contains("InferenceConfig"));
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("sk-secret"));
    }

    #[test]
    fn validate_rejects_bad_values() {
        assert!(InferenceConfig::default().validate().is_ok());

        let zero_timeout = InferenceConfig {
            timeout_ms: 0,
            ..Default::default()
        };
        assert!(zero_timeout.validate().is_err());

        let hot = InferenceConfig {
            temperature: 3.0,
            ..Default::default()
        };
        assert!(hot.validate().is_err());

        let no_url = InferenceConfig {
            base_url: " ".to_string(),
            ..Default::default()
        };
        assert!(no_url.validate().is_err());
    }
}
