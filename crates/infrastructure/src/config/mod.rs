//! Application configuration
//!
//! Split into focused sub-modules:
//! - `server`: HTTP server and logging settings
//! - `telephony`: webhook secret, public URL, provider credentials
//! - `conversation`: turn limits, deadlines, fixed lines, synthesis cache
//!
//! Inference and speech settings live next to their clients in `ai_core`
//! and `ai_speech`.

mod conversation;
mod server;
mod telephony;

use std::{fmt, path::Path};

use ai_core::InferenceConfig;
use ai_speech::SpeechConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use conversation::{ClipConfig, ConversationConfig};
pub use server::ServerConfig;
pub use telephony::{DEV_WEBHOOK_SECRET, TelephonyConfig};

/// Environment variable prefix, e.g. `CALLTURN_TELEPHONY__WEBHOOK_SECRET`
pub const ENV_PREFIX: &str = "CALLTURN";

/// The provider abandons a webhook that takes longer than this
pub const WEBHOOK_DEADLINE_MS: u64 = 15_000;

/// Application environment (development or production)
///
/// Controls validation strictness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Development environment - the default secret is tolerated
    #[default]
    Development,
    /// Production environment - strict validation
    Production,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            _ => Err(format!(
                "Invalid environment: {s}. Use 'development' or 'production'"
            )),
        }
    }
}

/// Every problem found by [`AppConfig::validate`]
#[derive(Debug, Error)]
#[error("invalid configuration: {}", .0.join("; "))]
pub struct ConfigValidationError(pub Vec<String>);

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub environment: Environment,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub telephony: TelephonyConfig,

    #[serde(default)]
    pub conversation: ConversationConfig,

    /// Synthesis cache
    #[serde(default)]
    pub clips: ClipConfig,

    /// Response generator (chat-completions API)
    #[serde(default)]
    pub inference: InferenceConfig,

    /// Speech synthesizer (ElevenLabs)
    #[serde(default)]
    pub speech: SpeechConfig,
}

impl AppConfig {
    /// Load configuration from `config.toml` (optional) and the environment
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::build(config::File::with_name("config").required(false))
    }

    /// Load configuration from a specific file (optional) and the environment
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, config::ConfigError> {
        Self::build(config::File::from(path.as_ref()).required(false))
    }

    fn build<S>(file: S) -> Result<Self, config::ConfigError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        config::Config::builder()
            .add_source(file)
            // Nested keys use a double underscore: CALLTURN_CONVERSATION__MAX_TURNS
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    pub const fn is_production(&self) -> bool {
        matches!(self.environment, Environment::Production)
    }

    /// Check the configuration for values that would break calls
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        let mut problems = Vec::new();
        let conversation = &self.conversation;

        if conversation.max_turns == 0 {
            problems.push("conversation.max_turns must be at least 1".to_string());
        }

        for (name, value) in [
            ("conversation.generation_timeout_ms", conversation.generation_timeout_ms),
            ("conversation.synthesis_timeout_ms", conversation.synthesis_timeout_ms),
        ] {
            if value == 0 || value >= WEBHOOK_DEADLINE_MS {
                problems.push(format!(
                    "{name} must be between 1 and {} (got {value})",
                    WEBHOOK_DEADLINE_MS - 1
                ));
            }
        }

        if conversation.session_idle_timeout_secs == 0 {
            problems.push("conversation.session_idle_timeout_secs must be positive".to_string());
        }

        if conversation.max_sessions == 0 {
            problems.push("conversation.max_sessions must be positive".to_string());
        }

        if self.clips.ttl_secs == 0 || self.clips.max_clips == 0 || self.clips.max_fetches == 0 {
            problems.push("clips.ttl_secs, max_clips and max_fetches must be positive".to_string());
        }

        let base_url = self.telephony.base_url();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            problems.push(format!(
                "telephony.public_base_url must be an http(s) URL (got '{base_url}')"
            ));
        }

        if self.telephony.gather_timeout_secs == 0 {
            problems.push("telephony.gather_timeout_secs must be positive".to_string());
        }

        if self.telephony.validate_signature && self.telephony.signature_token().is_none() {
            problems.push(
                "telephony.validate_signature requires telephony.auth_token".to_string(),
            );
        }

        if !matches!(self.server.log_format.to_lowercase().as_str(), "text" | "json") {
            problems.push(format!(
                "server.log_format must be 'text' or 'json' (got '{}')",
                self.server.log_format
            ));
        }

        if self.is_production() {
            if self.telephony.uses_dev_secret() {
                problems.push(
                    "telephony.webhook_secret must be changed from the default in production"
                        .to_string(),
                );
            }
            if base_url.contains("localhost") || base_url.contains("127.0.0.1") {
                problems.push(
                    "telephony.public_base_url must be publicly reachable in production"
                        .to_string(),
                );
            }
        }

        if let Err(e) = self.inference.validate() {
            problems.push(format!("inference: {e}"));
        }

        if let Err(e) = self.speech.validate() {
            problems.push(format!("speech: {e}"));
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigValidationError(problems))
        }
    }
}
