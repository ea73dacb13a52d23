//! Call session entity - The state of one phone call

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{NextAction, TerminationReason, Transcript, TranscriptEntry, Turn, TurnState};
use crate::{errors::DomainError, value_objects::CallSid};

/// Bounds applied to every session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionLimits {
    /// Counted rounds per call, greeting included
    pub max_turns: u32,
    /// Transcript lines kept per call
    pub max_transcript_entries: usize,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            max_turns: 3,
            max_transcript_entries: 20,
        }
    }
}

/// Ephemeral state of one call, keyed by the provider call identifier
///
/// `exchanges` counts directives emitted to the provider. It is echoed back
/// on the next callback so redelivered or out-of-order webhooks can be told
/// apart from fresh ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallSession {
    call_sid: CallSid,
    state: TurnState,
    turn_count: u32,
    max_turns: u32,
    reprompts: u32,
    exchanges: u32,
    transcript: Transcript,
    turns: Vec<Turn>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_action: Option<NextAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    termination: Option<TerminationReason>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CallSession {
    /// Create a fresh session in [`TurnState::Start`]
    pub fn new(call_sid: CallSid, limits: SessionLimits) -> Self {
        let now = Utc::now();
        Self {
            call_sid,
            state: TurnState::Start,
            turn_count: 0,
            max_turns: limits.max_turns.max(1),
            reprompts: 0,
            exchanges: 0,
            transcript: Transcript::with_capacity(limits.max_transcript_entries),
            turns: Vec::new(),
            last_action: None,
            termination: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub const fn call_sid(&self) -> &CallSid {
        &self.call_sid
    }

    pub const fn state(&self) -> TurnState {
        self.state
    }

    pub const fn turn_count(&self) -> u32 {
        self.turn_count
    }

    pub const fn max_turns(&self) -> u32 {
        self.max_turns
    }

    /// Consecutive exchanges without recognized speech
    pub const fn reprompts(&self) -> u32 {
        self.reprompts
    }

    pub const fn exchanges(&self) -> u32 {
        self.exchanges
    }

    pub const fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub const fn last_action(&self) -> Option<&NextAction> {
        self.last_action.as_ref()
    }

    pub const fn termination(&self) -> Option<TerminationReason> {
        self.termination
    }

    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub const fn is_terminated(&self) -> bool {
        self.state.is_terminal()
    }

    /// Index the next completed turn will get
    pub const fn next_turn_index(&self) -> u32 {
        self.turn_count.saturating_add(1)
    }

    /// Whether the next counted round uses up the turn budget
    pub const fn is_final_round(&self) -> bool {
        self.next_turn_index() >= self.max_turns
    }

    /// Whether a callback carrying `turn_hint` was already answered
    ///
    /// Callbacks without a hint only come from the initial call webhook, so
    /// once anything was emitted they are redeliveries as well.
    pub fn is_replay(&self, turn_hint: Option<u32>) -> bool {
        turn_hint.map_or(self.exchanges > 0, |hint| hint < self.exchanges)
    }

    /// Move the state machine, rejecting illegal transitions
    pub fn transition(&mut self, next: TurnState) -> Result<(), DomainError> {
        if !self.state.can_transition_to(next) {
            return Err(DomainError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        self.touch();
        Ok(())
    }

    /// Abandon an exchange whose request was dropped mid-flight
    ///
    /// Returns `true` when the session was stuck in an in-flight state and
    /// was put back to listening. Nothing of the abandoned turn was counted.
    pub fn resume(&mut self) -> bool {
        match self.state {
            TurnState::Generating | TurnState::Synthesizing | TurnState::Responding => {
                self.state = TurnState::AwaitingSpeech;
                self.touch();
                true
            },
            _ => false,
        }
    }

    /// Append a caller line to the transcript
    pub fn record_caller(&mut self, text: impl Into<String>) {
        self.transcript.push(TranscriptEntry::caller(text));
        self.touch();
    }

    /// Append an agent line to the transcript
    pub fn record_agent(&mut self, text: impl Into<String>) {
        self.transcript.push(TranscriptEntry::agent(text));
        self.touch();
    }

    /// Count one exchange without recognized speech and return the new total
    pub fn register_reprompt(&mut self) -> u32 {
        self.reprompts = self.reprompts.saturating_add(1);
        self.touch();
        self.reprompts
    }

    /// Record a completed turn, advancing the turn counter
    pub fn complete_turn(&mut self, turn: Turn) -> Result<(), DomainError> {
        if self.turn_count >= self.max_turns {
            return Err(DomainError::TurnLimitReached {
                max: self.max_turns,
            });
        }
        self.turn_count += 1;
        self.reprompts = 0;
        self.turns.push(turn);
        self.touch();
        Ok(())
    }

    /// Remember the directive sent to the provider, returning the new sequence
    pub fn emit(&mut self, action: NextAction) -> u32 {
        self.exchanges = self.exchanges.saturating_add(1);
        self.last_action = Some(action);
        self.touch();
        self.exchanges
    }

    /// End the session and remember the closing directive
    pub fn terminate(
        &mut self,
        reason: TerminationReason,
        action: NextAction,
    ) -> Result<u32, DomainError> {
        self.transition(TurnState::Terminated)?;
        self.termination = Some(reason);
        Ok(self.emit(action))
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
