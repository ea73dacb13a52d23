//! AI Speech - Text-to-Speech abstractions
//!
//! Provides the `TextToSpeech` trait and the ElevenLabs implementation used
//! to voice agent replies on a phone call.
//!
//! # Architecture
//!
//! This crate follows the ports & adapters pattern:
//! - `ports` module defines the trait (port)
//! - `providers` module contains concrete implementations (adapters)
//!
//! # Example
//!
//! ```ignore
//! use ai_speech::{ElevenLabsProvider, SpeechConfig, TextToSpeech};
//!
//! let provider = ElevenLabsProvider::new(config)?;
//! let audio = provider.synthesize("Thanks for calling!", None).await?;
//! assert_eq!(audio.content_type(), "audio/mpeg");
//! ```

pub mod config;
pub mod error;
pub mod ports;
pub mod providers;
pub mod types;

pub use config::SpeechConfig;
pub use error::SpeechError;
pub use ports::TextToSpeech;
pub use providers::elevenlabs::ElevenLabsProvider;
pub use types::{AudioData, OutputFormat, VoiceInfo};
