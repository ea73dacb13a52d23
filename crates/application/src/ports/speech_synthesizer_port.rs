//! Speech synthesizer port - Text-to-speech for replies

use async_trait::async_trait;
use bytes::Bytes;
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// Encoded audio ready to be served to the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedAudio {
    pub data: Bytes,
    /// MIME type, e.g. `audio/mpeg`
    pub content_type: String,
}

impl SynthesizedAudio {
    pub fn new(data: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            content_type: content_type.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Port for text-to-speech synthesis
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SpeechSynthesizerPort: Send + Sync {
    /// Synthesize `text` in the configured voice
    async fn synthesize(&self, text: &str) -> Result<SynthesizedAudio, ApplicationError>;

    /// Check if the speech service is available
    async fn is_available(&self) -> bool;
}
