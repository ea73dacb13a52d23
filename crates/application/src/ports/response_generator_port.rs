//! Response generator port - Turns a caller utterance into a reply

use async_trait::async_trait;
use domain::TranscriptEntry;
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// Port for the language model that writes the agent's replies
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ResponseGeneratorPort: Send + Sync {
    /// Produce a short spoken-style reply
    ///
    /// # Arguments
    /// * `transcript` - What the caller just said
    /// * `recent` - Preceding transcript lines, oldest first
    ///
    /// Implementations make one bounded attempt and do not retry.
    async fn generate(
        &self,
        transcript: &str,
        recent: &[TranscriptEntry],
    ) -> Result<String, ApplicationError>;

    /// Check if the backing model is reachable
    async fn is_healthy(&self) -> bool;
}
