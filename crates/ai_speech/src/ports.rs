//! Port definitions for speech synthesis

use async_trait::async_trait;

use crate::error::SpeechError;
use crate::types::{AudioData, VoiceInfo};

/// Port for Text-to-Speech (TTS) implementations
///
/// Implementations convert agent replies into audio the telephony provider
/// can play back.
///
/// # Example
///
/// ```ignore
/// use ai_speech::TextToSpeech;
///
/// async fn voice_reply(tts: &impl TextToSpeech, text: &str) -> Result<Bytes, SpeechError> {
///     let audio = tts.synthesize(text, None).await?;
///     Ok(audio.into_data())
/// }
/// ```
#[async_trait]
pub trait TextToSpeech: Send + Sync {
    /// Convert text to speech
    ///
    /// `voice` overrides the configured default voice.
    async fn synthesize(&self, text: &str, voice: Option<&str>) -> Result<AudioData, SpeechError>;

    /// List voices available to the account
    async fn list_voices(&self) -> Result<Vec<VoiceInfo>, SpeechError>;

    /// Check if the TTS service is reachable and accepts our credentials
    async fn is_available(&self) -> bool;

    /// Get the name of the synthesis model
    fn model_name(&self) -> &str;

    /// Get the default voice ID
    fn default_voice(&self) -> &str;
}
