//! Infrastructure adapters
//!
//! Adapters connect application ports to the AI clients.

mod llm_response_generator;
mod tts_speech_synthesizer;

pub use llm_response_generator::LlmResponseGenerator;
pub use tts_speech_synthesizer::TtsSpeechSynthesizer;
