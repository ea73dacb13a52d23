//! Speech synthesizer adapter - Implements SpeechSynthesizerPort using ai_speech

use std::{fmt, sync::Arc};

use ai_speech::{AudioData, ElevenLabsProvider, SpeechConfig, SpeechError, TextToSpeech};
use application::{
    error::ApplicationError,
    ports::{SpeechSynthesizerPort, SynthesizedAudio},
};
use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};

const SERVICE: &str = "speech synthesizer";

/// Turns reply text into playable audio
///
/// Without a configured provider every request fails, so the controller lets
/// the telephony provider speak the text itself.
pub struct TtsSpeechSynthesizer {
    tts: Option<Arc<dyn TextToSpeech>>,
}

impl fmt::Debug for TtsSpeechSynthesizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TtsSpeechSynthesizer")
            .field("model", &self.tts.as_ref().map(|t| t.model_name()))
            .field("voice", &self.tts.as_ref().map(|t| t.default_voice()))
            .finish()
    }
}

impl TtsSpeechSynthesizer {
    pub fn new(tts: Arc<dyn TextToSpeech>) -> Self {
        Self { tts: Some(tts) }
    }

    /// A synthesizer that always defers to provider-native speech
    pub const fn disabled() -> Self {
        Self { tts: None }
    }

    /// Build the ElevenLabs provider, or a disabled synthesizer without an API key
    pub fn from_config(config: SpeechConfig) -> Result<Self, ApplicationError> {
        if !config.is_configured() {
            warn!("No speech API key configured, replies will use provider text-to-speech");
            return Ok(Self::disabled());
        }

        let provider = ElevenLabsProvider::new(config)
            .map_err(|e| ApplicationError::Configuration(e.to_string()))?;
        info!(
            model = %provider.model_name(),
            voice = %provider.default_voice(),
            "Speech synthesis enabled"
        );
        Ok(Self::new(Arc::new(provider)))
    }

    pub const fn is_enabled(&self) -> bool {
        self.tts.is_some()
    }

    fn map_error(e: SpeechError) -> ApplicationError {
        match e {
            SpeechError::Timeout(ms) => ApplicationError::UpstreamTimeout {
                service: SERVICE,
                timeout_ms: ms,
            },
            SpeechError::RateLimited => ApplicationError::RateLimited,
            SpeechError::Configuration(msg) => ApplicationError::Configuration(msg),
            other => ApplicationError::upstream(SERVICE, other.to_string()),
        }
    }

    fn to_clip_audio(audio: AudioData) -> SynthesizedAudio {
        let content_type = audio.content_type();
        SynthesizedAudio::new(audio.into_data(), content_type)
    }
}

#[async_trait]
impl SpeechSynthesizerPort for TtsSpeechSynthesizer {
    #[instrument(skip(self, text), fields(text_len = text.len()))]
    async fn synthesize(&self, text: &str) -> Result<SynthesizedAudio, ApplicationError> {
        let Some(tts) = &self.tts else {
            return Err(ApplicationError::upstream(SERVICE, "speech synthesis is not configured"));
        };

        let audio = tts.synthesize(text, None).await.map_err(|e| {
            warn!(error = %e, "Speech synthesis failed");
            Self::map_error(e)
        })?;

        debug!(bytes = audio.size_bytes(), content_type = audio.content_type(), "Synthesized reply");
        Ok(Self::to_clip_audio(audio))
    }

    async fn is_available(&self) -> bool {
        match &self.tts {
            Some(tts) => tts.is_available().await,
            None => false,
        }
    }
}
