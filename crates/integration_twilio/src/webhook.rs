//! Twilio voice webhook handling
//!
//! Form payloads Twilio posts to the voice routes, plus the two ways a
//! request is authenticated: the shared `secret` query parameter and the
//! optional `X-Twilio-Signature` header.

use std::{fmt, str::FromStr};

use base64::{Engine, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha1::Sha1;
use subtle::ConstantTimeEq;
use tracing::warn;
use url::{Url, form_urlencoded};

use crate::error::TwilioError;

type HmacSha1 = Hmac<Sha1>;

/// Query string on every voice webhook URL we hand to Twilio
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookQuery {
    /// Shared secret
    #[serde(default)]
    pub secret: String,
    /// Sequence of the directive this callback answers, kept raw so the
    /// secret can be checked before anything else is validated
    #[serde(default)]
    pub turn: Option<String>,
}

impl WebhookQuery {
    /// The parsed turn sequence, `None` when the parameter is absent or blank
    pub fn turn_hint(&self) -> Result<Option<u32>, TwilioError> {
        match self.turn.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|_| TwilioError::InvalidTurn(raw.to_string())),
        }
    }
}

/// Form body of a voice webhook (`/voice/incoming`, `/voice/fallback`)
#[derive(Debug, Clone, Default)]
pub struct VoiceWebhookForm {
    pub call_sid: String,
    pub account_sid: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub call_status: Option<String>,
    /// Speech recognized by `<Gather input="speech">`
    pub speech_result: Option<String>,
    /// Transcription delivered by `<Record transcribe="true">`
    pub transcription_text: Option<String>,
    /// Recognition confidence between 0 and 1, sent as text
    pub confidence: Option<String>,
    /// Set on `/voice/fallback` calls
    pub error_code: Option<String>,
}

impl VoiceWebhookForm {
    /// Pick the known fields out of decoded form parameters
    pub fn from_params(params: &[(String, String)]) -> Self {
        let mut form = Self::default();
        for (name, value) in params {
            let slot = match name.as_str() {
                "CallSid" => {
                    form.call_sid.clone_from(value);
                    continue;
                },
                "AccountSid" => &mut form.account_sid,
                "From" => &mut form.from,
                "To" => &mut form.to,
                "CallStatus" => &mut form.call_status,
                "SpeechResult" => &mut form.speech_result,
                "TranscriptionText" => &mut form.transcription_text,
                "Confidence" => &mut form.confidence,
                "ErrorCode" => &mut form.error_code,
                _ => continue,
            };
            *slot = Some(value.clone());
        }
        form
    }

    /// What the caller said: `SpeechResult`, else `TranscriptionText`
    pub fn transcript(&self) -> Option<&str> {
        [&self.speech_result, &self.transcription_text]
            .into_iter()
            .filter_map(Option::as_deref)
            .map(str::trim)
            .find(|text| !text.is_empty())
    }

    pub fn confidence(&self) -> Option<f32> {
        self.confidence.as_deref().and_then(|c| c.trim().parse().ok())
    }
}

/// Lifecycle state reported in `CallStatus`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallStatus {
    Queued,
    Ringing,
    InProgress,
    Completed,
    Busy,
    Failed,
    NoAnswer,
    Canceled,
    Unknown,
}

impl CallStatus {
    /// Whether the call is over and its state can be released
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Busy | Self::Failed | Self::NoAnswer | Self::Canceled
        )
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Ringing => "ringing",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
            Self::Busy => "busy",
            Self::Failed => "failed",
            Self::NoAnswer => "no-answer",
            Self::Canceled => "canceled",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for CallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CallStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "queued" => Self::Queued,
            "ringing" => Self::Ringing,
            "in-progress" => Self::InProgress,
            "completed" => Self::Completed,
            "busy" => Self::Busy,
            "failed" => Self::Failed,
            "no-answer" => Self::NoAnswer,
            "canceled" => Self::Canceled,
            _ => Self::Unknown,
        })
    }
}

/// Form body of the call status callback
#[derive(Debug, Clone)]
pub struct StatusCallbackForm {
    pub call_sid: String,
    pub call_status: CallStatus,
    /// Call length in seconds, only on `completed`
    pub call_duration: Option<u64>,
}

impl StatusCallbackForm {
    pub fn from_params(params: &[(String, String)]) -> Self {
        let value = |name: &str| {
            params
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str())
        };
        Self {
            call_sid: value("CallSid").unwrap_or_default().to_string(),
            call_status: value("CallStatus")
                .and_then(|s| s.parse().ok())
                .unwrap_or(CallStatus::Unknown),
            call_duration: value("CallDuration").and_then(|d| d.trim().parse().ok()),
        }
    }
}

/// Decode an `application/x-www-form-urlencoded` body
pub fn parse_form(body: &[u8]) -> Vec<(String, String)> {
    form_urlencoded::parse(body).into_owned().collect()
}

/// Compare a provided secret with the expected one in constant time
pub fn secrets_match(provided: &str, expected: &str) -> bool {
    provided.as_bytes().ct_eq(expected.as_bytes()).into()
}

/// Compute the `X-Twilio-Signature` value for a request
///
/// The signed data is the full request URL followed by every form parameter
/// name and value, sorted by name.
pub fn compute_signature(
    auth_token: &str,
    url: &str,
    params: &[(String, String)],
) -> Result<String, TwilioError> {
    let mac = signed_mac(auth_token, url, params)?;
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Verify the `X-Twilio-Signature` header of a request
pub fn verify_signature(
    auth_token: &str,
    url: &str,
    params: &[(String, String)],
    signature: Option<&str>,
) -> Result<(), TwilioError> {
    let signature = signature
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(TwilioError::MissingSignature)?;

    let expected = STANDARD
        .decode(signature)
        .map_err(|e| TwilioError::MalformedSignature(e.to_string()))?;

    signed_mac(auth_token, url, params)?
        .verify_slice(&expected)
        .map_err(|_| {
            warn!(url = %url, "Twilio signature mismatch");
            TwilioError::SignatureMismatch
        })
}

fn signed_mac(
    auth_token: &str,
    url: &str,
    params: &[(String, String)],
) -> Result<HmacSha1, TwilioError> {
    let mut mac = HmacSha1::new_from_slice(auth_token.as_bytes())
        .map_err(|e| TwilioError::InvalidKey(e.to_string()))?;

    let mut sorted: Vec<&(String, String)> = params.iter().collect();
    sorted.sort();

    mac.update(url.as_bytes());
    for (name, value) in sorted {
        mac.update(name.as_bytes());
        mac.update(value.as_bytes());
    }
    Ok(mac)
}

/// Build an absolute webhook URL carrying the shared secret and turn sequence
pub fn action_url(
    base_url: &str,
    path: &str,
    secret: &str,
    turn: Option<u32>,
) -> Result<String, TwilioError> {
    let joined = format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    let mut url = Url::parse(&joined).map_err(|e| TwilioError::InvalidUrl(e.to_string()))?;
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("secret", secret);
        if let Some(turn) = turn {
            query.append_pair("turn", &turn.to_string());
        }
    }
    Ok(url.to_string())
}
