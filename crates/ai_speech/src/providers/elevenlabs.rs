//! ElevenLabs Speech Provider
//!
//! Implements `TextToSpeech` against the ElevenLabs REST API.
//!
//! Audio is requested in either MP3 or 8 kHz mu-law, both of which the
//! telephony provider can `<Play>` directly.

use std::{fmt, time::Duration};

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::config::SpeechConfig;
use crate::error::SpeechError;
use crate::ports::TextToSpeech;
use crate::types::{AudioData, VoiceInfo};

/// Longest text accepted in a single synthesis request
pub const MAX_TEXT_CHARS: usize = 5000;

/// ElevenLabs text-to-speech provider
#[derive(Clone)]
pub struct ElevenLabsProvider {
    client: Client,
    config: SpeechConfig,
}

impl fmt::Debug for ElevenLabsProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElevenLabsProvider")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ElevenLabsProvider {
    /// Create a new ElevenLabs provider
    ///
    /// # Errors
    ///
    /// Returns `SpeechError::Configuration` if the configuration is invalid
    /// or no API key is set.
    pub fn new(config: SpeechConfig) -> Result<Self, SpeechError> {
        config.validate().map_err(SpeechError::Configuration)?;

        if !config.is_configured() {
            return Err(SpeechError::Configuration(
                "ElevenLabs API key is required".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| {
                SpeechError::Configuration(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self { client, config })
    }

    fn api_url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.header("xi-api-key", self.config.api_key_str().unwrap_or_default())
    }
}

/// ElevenLabs TTS request body
#[derive(Debug, Serialize)]
struct TtsRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

#[derive(Debug, Serialize)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
}

#[derive(Debug, Deserialize)]
struct VoicesResponse {
    voices: Vec<VoiceInfo>,
}

/// Pull a readable message out of an ElevenLabs error body
///
/// The API reports errors as `{"detail": {"message": ...}}`, as a plain
/// `{"detail": "..."}`, or as a list of validation errors carrying `msg`.
fn detail_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return body.trim().to_string();
    };

    let detail = &value["detail"];
    if let Some(message) = detail["message"].as_str() {
        return message.to_string();
    }
    if let Some(message) = detail.as_str() {
        return message.to_string();
    }
    if let Some(items) = detail.as_array() {
        let messages: Vec<&str> = items.iter().filter_map(|i| i["msg"].as_str()).collect();
        if !messages.is_empty() {
            return messages.join("; ");
        }
    }
    body.trim().to_string()
}

fn error_for_status(status: StatusCode, message: String, voice: &str) -> SpeechError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SpeechError::Unauthorized(message),
        StatusCode::TOO_MANY_REQUESTS => SpeechError::RateLimited,
        StatusCode::NOT_FOUND => SpeechError::VoiceNotFound(voice.to_string()),
        s if s.is_server_error() => {
            SpeechError::ServiceUnavailable(format!("HTTP {status}: {message}"))
        },
        _ => SpeechError::SynthesisFailed(message),
    }
}

#[async_trait]
impl TextToSpeech for ElevenLabsProvider {
    #[instrument(skip(self, text), fields(text_len = text.len(), format = %self.config.output_format.as_query()))]
    async fn synthesize(&self, text: &str, voice: Option<&str>) -> Result<AudioData, SpeechError> {
        if text.trim().is_empty() {
            return Err(SpeechError::SynthesisFailed(
                "Text cannot be empty".to_string(),
            ));
        }

        let chars = text.chars().count();
        if chars > MAX_TEXT_CHARS {
            return Err(SpeechError::SynthesisFailed(format!(
                "Text too long: {chars} characters exceeds {MAX_TEXT_CHARS} limit"
            )));
        }

        let voice = voice.unwrap_or(&self.config.voice_id);
        let format = self.config.output_format;

        let request = TtsRequest {
            text,
            model_id: &self.config.model_id,
            voice_settings: VoiceSettings {
                stability: self.config.stability,
                similarity_boost: self.config.similarity_boost,
            },
        };

        debug!(voice = %voice, "Synthesizing speech with ElevenLabs");

        let response = self
            .authorize(self.client.post(self.api_url(&format!("text-to-speech/{voice}"))))
            .query(&[("output_format", format.as_query())])
            .header(reqwest::header::ACCEPT, format.mime_type())
            .json(&request)
            .send()
            .await
            .map_err(|e| SpeechError::from_transport(&e, self.config.timeout_ms))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = detail_message(&body);
            warn!(status = %status, error = %message, "Speech synthesis request failed");
            return Err(error_for_status(status, message, voice));
        }

        let audio: Bytes = response
            .bytes()
            .await
            .map_err(|e| SpeechError::InvalidResponse(format!("Failed to read audio: {e}")))?;

        if audio.is_empty() {
            return Err(SpeechError::InvalidResponse(
                "Provider returned no audio".to_string(),
            ));
        }

        debug!(audio_size = audio.len(), "Speech synthesis complete");

        Ok(AudioData::new(audio, format))
    }

    #[instrument(skip(self))]
    async fn list_voices(&self) -> Result<Vec<VoiceInfo>, SpeechError> {
        let response = self
            .authorize(self.client.get(self.api_url("voices")))
            .send()
            .await
            .map_err(|e| SpeechError::from_transport(&e, self.config.timeout_ms))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(error_for_status(
                status,
                detail_message(&body),
                &self.config.voice_id,
            ));
        }

        let voices: VoicesResponse = response
            .json()
            .await
            .map_err(|e| SpeechError::InvalidResponse(e.to_string()))?;

        Ok(voices.voices)
    }

    async fn is_available(&self) -> bool {
        match self
            .authorize(self.client.get(self.api_url("voices")))
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                warn!("ElevenLabs availability check failed: {}", e);
                false
            },
        }
    }

    fn model_name(&self) -> &str {
        &self.config.model_id
    }

    fn default_voice(&self) -> &str {
        &self.config.voice_id
    }
}
