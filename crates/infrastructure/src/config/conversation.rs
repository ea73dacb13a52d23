//! Conversation and synthesis-cache configuration.

use std::time::Duration;

use application::TurnControllerConfig;
use serde::{Deserialize, Serialize};

/// Conversation limits, deadlines and fixed lines
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationConfig {
    /// Counted rounds per call, greeting included
    #[serde(default = "default_max_turns")]
    pub max_turns: u32,

    /// Silent exchanges tolerated before hanging up
    #[serde(default = "default_max_reprompts")]
    pub max_reprompts: u32,

    /// Transcript lines passed to the generator
    #[serde(default = "default_history_window")]
    pub history_window: usize,

    /// Transcript lines kept per call
    #[serde(default = "default_max_transcript_entries")]
    pub max_transcript_entries: usize,

    /// Reply length cap in characters (0 = unlimited)
    #[serde(default = "default_max_reply_chars")]
    pub max_reply_chars: usize,

    #[serde(default = "default_generation_timeout_ms")]
    pub generation_timeout_ms: u64,

    #[serde(default = "default_synthesis_timeout_ms")]
    pub synthesis_timeout_ms: u64,

    /// Idle time after which a call's session is dropped
    #[serde(default = "default_session_idle_timeout_secs")]
    pub session_idle_timeout_secs: u64,

    /// Upper bound on concurrently tracked calls
    #[serde(default = "default_max_sessions")]
    pub max_sessions: u64,

    #[serde(default)]
    pub greeting: Option<String>,
    #[serde(default)]
    pub reprompt: Option<String>,
    #[serde(default)]
    pub goodbye: Option<String>,
    #[serde(default)]
    pub closing: Option<String>,
    #[serde(default)]
    pub apology: Option<String>,
    #[serde(default)]
    pub unavailable: Option<String>,
}

const fn default_max_turns() -> u32 {
    3
}

const fn default_max_reprompts() -> u32 {
    2
}

const fn default_history_window() -> usize {
    6
}

const fn default_max_transcript_entries() -> usize {
    20
}

const fn default_max_reply_chars() -> usize {
    320
}

const fn default_generation_timeout_ms() -> u64 {
    4000
}

const fn default_synthesis_timeout_ms() -> u64 {
    5000
}

const fn default_session_idle_timeout_secs() -> u64 {
    900
}

const fn default_max_sessions() -> u64 {
    10_000
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
            max_reprompts: default_max_reprompts(),
            history_window: default_history_window(),
            max_transcript_entries: default_max_transcript_entries(),
            max_reply_chars: default_max_reply_chars(),
            generation_timeout_ms: default_generation_timeout_ms(),
            synthesis_timeout_ms: default_synthesis_timeout_ms(),
            session_idle_timeout_secs: default_session_idle_timeout_secs(),
            max_sessions: default_max_sessions(),
            greeting: None,
            reprompt: None,
            goodbye: None,
            closing: None,
            apology: None,
            unavailable: None,
        }
    }
}

impl ConversationConfig {
    pub const fn session_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.session_idle_timeout_secs)
    }

    /// Controller settings, keeping built-in lines where none are configured
    pub fn controller_config(&self) -> TurnControllerConfig {
        let defaults = TurnControllerConfig::default();
        let line = |configured: Option<&str>, fallback: String| {
            configured
                .map(str::trim)
                .filter(|text| !text.is_empty())
                .map_or(fallback, ToString::to_string)
        };

        TurnControllerConfig {
            max_turns: self.max_turns,
            max_reprompts: self.max_reprompts,
            history_window: self.history_window,
            max_transcript_entries: self.max_transcript_entries,
            max_reply_chars: self.max_reply_chars,
            generation_timeout: Duration::from_millis(self.generation_timeout_ms),
            synthesis_timeout: Duration::from_millis(self.synthesis_timeout_ms),
            greeting: line(self.greeting.as_deref(), defaults.greeting),
            reprompt: line(self.reprompt.as_deref(), defaults.reprompt),
            goodbye: line(self.goodbye.as_deref(), defaults.goodbye),
            closing: line(self.closing.as_deref(), defaults.closing),
            apology: line(self.apology.as_deref(), defaults.apology),
            unavailable: line(self.unavailable.as_deref(), defaults.unavailable),
        }
    }
}

/// Synthesis cache configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ClipConfig {
    /// Seconds a clip stays fetchable
    #[serde(default = "default_clip_ttl_secs")]
    pub ttl_secs: u64,

    /// Clips held at once, oldest evicted first
    #[serde(default = "default_max_clips")]
    pub max_clips: usize,

    /// Successful fetches before a clip is dropped
    #[serde(default = "default_max_fetches")]
    pub max_fetches: u32,
}

const fn default_clip_ttl_secs() -> u64 {
    300
}

const fn default_max_clips() -> usize {
    256
}

const fn default_max_fetches() -> u32 {
    2
}

impl Default for ClipConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_clip_ttl_secs(),
            max_clips: default_max_clips(),
            max_fetches: default_max_fetches(),
        }
    }
}

impl ClipConfig {
    pub const fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}
