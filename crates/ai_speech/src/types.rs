//! Types for speech synthesis

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Audio encodings the synthesizer can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OutputFormat {
    /// MP3, 44.1 kHz at 128 kbps
    #[default]
    #[serde(rename = "mp3_44100_128")]
    Mp3,
    /// 8 kHz mu-law, the native telephone encoding
    #[serde(rename = "ulaw_8000")]
    Ulaw,
}

impl OutputFormat {
    /// Value of the `output_format` query parameter
    #[must_use]
    pub const fn as_query(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3_44100_128",
            Self::Ulaw => "ulaw_8000",
        }
    }

    /// Get the MIME type for this format
    #[must_use]
    pub const fn mime_type(&self) -> &'static str {
        match self {
            Self::Mp3 => "audio/mpeg",
            Self::Ulaw => "audio/basic",
        }
    }
}

/// Synthesized audio with its encoding
#[derive(Debug, Clone)]
pub struct AudioData {
    data: Bytes,
    format: OutputFormat,
}

impl AudioData {
    #[must_use]
    pub const fn new(data: Bytes, format: OutputFormat) -> Self {
        Self { data, format }
    }

    /// Get the raw audio bytes
    #[must_use]
    pub const fn data(&self) -> &Bytes {
        &self.data
    }

    /// Consume and return the raw audio bytes
    #[must_use]
    pub fn into_data(self) -> Bytes {
        self.data
    }

    #[must_use]
    pub const fn format(&self) -> OutputFormat {
        self.format
    }

    /// Get the MIME type for this audio
    #[must_use]
    pub const fn content_type(&self) -> &'static str {
        self.format.mime_type()
    }

    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// A voice offered by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceInfo {
    pub voice_id: String,
    pub name: String,
    /// Provider category such as "premade" or "cloned"
    #[serde(default)]
    pub category: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_format_query_values() {
        assert_eq!(OutputFormat::Mp3.as_query(), "mp3_44100_128");
        assert_eq!(OutputFormat::Ulaw.as_query(), "ulaw_8000");
    }

    #[test]
    fn output_format_mime_types() {
        assert_eq!(OutputFormat::Mp3.mime_type(), "audio/mpeg");
        assert_eq!(OutputFormat::Ulaw.mime_type(), "audio/basic");
    }

    #[test]
    fn output_format_serde_matches_query() {
        let json = serde_json::to_string(&OutputFormat::Ulaw).unwrap();
        assert_eq!(json, "\"ulaw_8000\"");
        let parsed: OutputFormat = serde_json::from_str("\"mp3_44100_128\"").unwrap();
        assert_eq!(parsed, OutputFormat::Mp3);
    }

    #[test]
    fn audio_data_accessors() {
        let audio = AudioData::new(Bytes::from_static(b"ID3abc"), OutputFormat::Mp3);
        assert_eq!(audio.size_bytes(), 6);
        assert!(!audio.is_empty());
        assert_eq!(audio.content_type(), "audio/mpeg");
        assert_eq!(audio.into_data(), Bytes::from_static(b"ID3abc"));
    }

    #[test]
    fn voice_info_deserializes_without_category() {
        let voice: VoiceInfo =
            serde_json::from_str(r#"{"voice_id":"abc","name":"Rachel"}"#).unwrap();
        assert_eq!(voice.name, "Rachel");
        assert!(voice.category.is_none());
    }
}
