//! Port definitions for application layer
//!
//! Ports are interfaces that define how the application interacts with
//! external systems. Adapters in the infrastructure layer implement these ports.

mod clip_store_port;
mod response_generator_port;
mod session_store_port;
mod speech_synthesizer_port;

pub use clip_store_port::{ClipStats, ClipStorePort};
pub use response_generator_port::ResponseGeneratorPort;
#[cfg(test)]
pub use response_generator_port::MockResponseGeneratorPort;
pub use session_store_port::{SessionGuard, SessionStorePort};
pub use speech_synthesizer_port::{SpeechSynthesizerPort, SynthesizedAudio};
#[cfg(test)]
pub use speech_synthesizer_port::MockSpeechSynthesizerPort;
