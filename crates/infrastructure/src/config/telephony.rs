//! Telephony provider (webhook) configuration.

use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// Secret shipped as the default, only acceptable in development
pub const DEV_WEBHOOK_SECRET: &str = "dev";

/// Telephony provider configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct TelephonyConfig {
    /// Shared secret expected in the `secret` query parameter (never serialized)
    #[serde(default = "default_webhook_secret", skip_serializing)]
    pub webhook_secret: SecretString,

    /// Externally reachable base URL, used in action and audio URLs
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,

    /// Provider account identifier
    #[serde(default)]
    pub account_sid: Option<String>,

    /// Provider auth token for request signatures (never serialized)
    #[serde(default, skip_serializing)]
    pub auth_token: Option<SecretString>,

    /// Verify `X-Twilio-Signature` on webhooks when an auth token is set
    #[serde(default)]
    pub validate_signature: bool,

    /// Seconds the provider waits for the caller to start speaking
    #[serde(default = "default_gather_timeout_secs")]
    pub gather_timeout_secs: u32,

    /// Recognition language for `<Gather>`
    #[serde(default = "default_speech_language")]
    pub speech_language: String,

    /// Provider voice for `<Say>` fallbacks
    #[serde(default)]
    pub say_voice: Option<String>,
}

fn default_webhook_secret() -> SecretString {
    SecretString::from(DEV_WEBHOOK_SECRET)
}

fn default_public_base_url() -> String {
    "http://localhost:8000".to_string()
}

const fn default_gather_timeout_secs() -> u32 {
    15
}

fn default_speech_language() -> String {
    "en-US".to_string()
}

impl Default for TelephonyConfig {
    fn default() -> Self {
        Self {
            webhook_secret: default_webhook_secret(),
            public_base_url: default_public_base_url(),
            account_sid: None,
            auth_token: None,
            validate_signature: false,
            gather_timeout_secs: default_gather_timeout_secs(),
            speech_language: default_speech_language(),
            say_voice: None,
        }
    }
}

impl fmt::Debug for TelephonyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelephonyConfig")
            .field("webhook_secret", &"[REDACTED]")
            .field("public_base_url", &self.public_base_url)
            .field("account_sid", &self.account_sid)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[REDACTED]"))
            .field("validate_signature", &self.validate_signature)
            .field("gather_timeout_secs", &self.gather_timeout_secs)
            .field("speech_language", &self.speech_language)
            .field("say_voice", &self.say_voice)
            .finish()
    }
}

impl TelephonyConfig {
    /// Whether the default development secret is still in place
    pub fn uses_dev_secret(&self) -> bool {
        self.webhook_secret.expose_secret() == DEV_WEBHOOK_SECRET
    }

    /// Auth token to verify signatures with, if verification is enabled
    pub fn signature_token(&self) -> Option<&str> {
        if !self.validate_signature {
            return None;
        }
        self.auth_token
            .as_ref()
            .map(ExposeSecret::expose_secret)
            .filter(|token| !token.is_empty())
    }

    /// Public base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        self.public_base_url.trim_end_matches('/')
    }
}
