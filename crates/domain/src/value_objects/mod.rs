//! Value Objects - Immutable, identity-less domain primitives

mod call_sid;
mod clip_id;

pub use call_sid::CallSid;
pub use clip_id::ClipId;
