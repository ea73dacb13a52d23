//! Turn state machine

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where a call session stands within the current exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnState {
    /// Session created, nothing said yet
    #[default]
    Start,
    /// A prompt was emitted and the provider is listening for the caller
    AwaitingSpeech,
    /// Waiting on the response generator
    Generating,
    /// Waiting on the speech synthesizer
    Synthesizing,
    /// Reply ready, directive being rendered
    Responding,
    /// The call is over; no further turns are processed
    Terminated,
}

impl TurnState {
    /// Whether the state machine allows moving from `self` to `next`
    ///
    /// Every live state may terminate. `Terminated` is final.
    pub const fn can_transition_to(self, next: Self) -> bool {
        match (self, next) {
            (Self::Terminated, _) => false,
            (_, Self::Terminated) => true,
            (Self::Start, Self::AwaitingSpeech)
            | (Self::AwaitingSpeech, Self::AwaitingSpeech | Self::Generating)
            | (Self::Generating, Self::Synthesizing)
            | (Self::Synthesizing, Self::Responding)
            | (Self::Responding, Self::AwaitingSpeech) => true,
            _ => false,
        }
    }

    /// Whether the session has ended
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Terminated)
    }

    /// Stable lowercase name, used in logs and snapshots
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::AwaitingSpeech => "awaiting_speech",
            Self::Generating => "generating",
            Self::Synthesizing => "synthesizing",
            Self::Responding => "responding",
            Self::Terminated => "terminated",
        }
    }
}

impl fmt::Display for TurnState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
