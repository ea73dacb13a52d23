//! In-memory stores for call state and synthesized audio

mod clip_store;
mod session_store;

pub use clip_store::InMemoryClipStore;
pub use session_store::MokaSessionStore;
