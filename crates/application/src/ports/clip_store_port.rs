//! Clip store port - Short-lived storage for synthesized speech
//!
//! The provider fetches each clip over HTTP shortly after the directive that
//! references it. Stores bound memory by age, count and fetches per clip.

use domain::ClipId;

use crate::{error::ApplicationError, ports::SynthesizedAudio};

/// Counters exposed by clip stores
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClipStats {
    /// Clips currently held
    pub held: usize,
    /// Clips registered since start
    pub registered: u64,
    /// Successful fetches since start
    pub served: u64,
    /// Clips dropped by age, count or fetch limit
    pub evicted: u64,
    /// Fetches for unknown or expired clips
    pub misses: u64,
}

/// Port for the synthesis cache
///
/// Calls never suspend, so implementations use plain locks.
pub trait ClipStorePort: Send + Sync {
    /// Store audio under a fresh identifier, evicting stale clips first
    fn register(&self, audio: SynthesizedAudio) -> ClipId;

    /// Fetch a clip, counting the fetch against its limit
    fn fetch(&self, id: &ClipId) -> Result<SynthesizedAudio, ApplicationError>;

    /// Number of clips currently held
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn stats(&self) -> ClipStats;
}
