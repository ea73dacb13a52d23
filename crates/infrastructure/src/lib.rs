//! Infrastructure layer - Adapters for external systems
//!
//! Implements the ports defined in the application layer: the LLM and TTS
//! adapters, the synthesis cache, the session store, plus configuration
//! loading and logging setup.

pub mod adapters;
pub mod cache;
pub mod config;
pub mod telemetry;

pub use adapters::*;
pub use cache::{InMemoryClipStore, MokaSessionStore};
pub use config::{
    AppConfig, ClipConfig, ConfigValidationError, ConversationConfig, Environment, ServerConfig,
    TelephonyConfig,
};
pub use telemetry::{LogFormat, LoggingConfig, TelemetryError, init_logging};
