//! One completed request/response cycle

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::ClipId;

/// A completed turn of the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// 1-based position within the call
    pub index: u32,
    /// What the provider recognized, possibly empty
    pub input: String,
    /// What the agent answered
    pub reply: String,
    /// Clip holding the spoken reply, if synthesis succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clip: Option<ClipId>,
    /// The reply is the fixed apology, not generated text
    pub generation_fallback: bool,
    /// The reply is spoken by the provider instead of a clip
    pub synthesis_fallback: bool,
    pub completed_at: DateTime<Utc>,
}

impl Turn {
    /// Start a turn once its reply text exists
    pub fn new(index: u32, input: impl Into<String>, reply: impl Into<String>) -> Self {
        Self {
            index,
            input: input.into(),
            reply: reply.into(),
            clip: None,
            generation_fallback: false,
            synthesis_fallback: false,
            completed_at: Utc::now(),
        }
    }

    /// Attach the synthesized clip for the reply
    #[must_use]
    pub fn with_clip(mut self, clip: ClipId) -> Self {
        self.clip = Some(clip);
        self.synthesis_fallback = false;
        self
    }

    #[must_use]
    pub fn with_generation_fallback(mut self) -> Self {
        self.generation_fallback = true;
        self
    }

    #[must_use]
    pub fn with_synthesis_fallback(mut self) -> Self {
        self.clip = None;
        self.synthesis_fallback = true;
        self
    }
}
