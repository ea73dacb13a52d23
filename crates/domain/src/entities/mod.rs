//! Domain entities - Objects with identity and lifecycle

mod call_session;
mod next_action;
mod transcript;
mod turn;
mod turn_state;

pub use call_session::{CallSession, SessionLimits};
pub use next_action::{NextAction, TerminationReason, Utterance};
pub use transcript::{Speaker, Transcript, TranscriptEntry};
pub use turn::Turn;
pub use turn_state::TurnState;
