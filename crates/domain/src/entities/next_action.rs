//! Directives returned to the telephony provider

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value_objects::ClipId;

/// Something the caller will hear
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Utterance {
    /// Play a synthesized clip served by this process
    Clip(ClipId),
    /// Let the provider speak the text with its own voice
    Text(String),
}

impl Utterance {
    /// The referenced clip, if any
    pub const fn clip(&self) -> Option<ClipId> {
        match self {
            Self::Clip(id) => Some(*id),
            Self::Text(_) => None,
        }
    }
}

/// Why a call was ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// The configured number of turns was used up
    TurnLimitReached,
    /// The caller stayed silent more often than the reprompt cap allows
    NoSpeechDetected,
    /// The provider invoked its fallback route
    ProviderFallback,
    /// The provider reported the call finished
    CallEnded,
}

impl TerminationReason {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TurnLimitReached => "turn_limit_reached",
            Self::NoSpeechDetected => "no_speech_detected",
            Self::ProviderFallback => "provider_fallback",
            Self::CallEnded => "call_ended",
        }
    }
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The directive emitted for one webhook exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NextAction {
    /// Speak the greeting, then listen
    Prompt { text: String },
    /// Ask the caller to repeat, then listen
    Reprompt { text: String },
    /// Play the generated reply, then listen
    Continue { reply: String, utterance: Utterance },
    /// Play the last reply if there is one, then the farewell, hang up
    Terminate {
        reason: TerminationReason,
        #[serde(skip_serializing_if = "Option::is_none")]
        reply: Option<Utterance>,
        farewell: Utterance,
    },
}

impl NextAction {
    /// Whether the provider should capture speech after this directive
    pub const fn listens(&self) -> bool {
        !matches!(self, Self::Terminate { .. })
    }

    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminate { .. })
    }

    /// First clip the caller will hear, if any
    pub fn clip(&self) -> Option<ClipId> {
        self.clips().into_iter().next()
    }

    /// Every clip referenced by the directive, in playback order
    pub fn clips(&self) -> Vec<ClipId> {
        match self {
            Self::Prompt { .. } | Self::Reprompt { .. } => Vec::new(),
            Self::Continue { utterance, .. } => utterance.clip().into_iter().collect(),
            Self::Terminate {
                reply, farewell, ..
            } => reply
                .iter()
                .chain(std::iter::once(farewell))
                .filter_map(Utterance::clip)
                .collect(),
        }
    }

    /// Short label for logs and counters
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Prompt { .. } => "prompt",
            Self::Reprompt { .. } => "reprompt",
            Self::Continue { .. } => "continue",
            Self::Terminate { .. } => "terminate",
        }
    }
}
