//! Conversation turn controller - Drives one phone call through its turns
//!
//! Every provider webhook becomes one call to [`TurnController::handle_turn`]:
//! 1. Reject the request if the shared secret did not match
//! 2. Lock the call's session (created on first contact)
//! 3. Replay the last directive for redelivered callbacks
//! 4. Greet, reprompt, or generate and synthesize a reply
//! 5. Return the next directive and the sequence the provider echoes back
//!
//! Upstream failures never fail a turn. A generator failure speaks a fixed
//! apology, a synthesizer failure lets the provider speak the text itself.

use std::{fmt, future::Future, sync::Arc, time::Duration};

use domain::{
    CallSession, CallSid, NextAction, SessionLimits, TerminationReason, TranscriptEntry, Turn,
    TurnState, Utterance,
    speech::{has_speech, prepare_for_speech},
};
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

use crate::{
    error::ApplicationError,
    ports::{ClipStorePort, ResponseGeneratorPort, SessionStorePort, SpeechSynthesizerPort},
};

const GENERATOR: &str = "response generator";
const SYNTHESIZER: &str = "speech synthesizer";

/// Configuration for the turn controller
#[derive(Debug, Clone)]
pub struct TurnControllerConfig {
    /// Counted rounds per call, greeting included
    pub max_turns: u32,
    /// Silent exchanges tolerated before hanging up
    pub max_reprompts: u32,
    /// Transcript lines passed to the generator as context
    pub history_window: usize,
    /// Transcript lines kept per session
    pub max_transcript_entries: usize,
    /// Reply length cap in characters, 0 disables it
    pub max_reply_chars: usize,
    /// Deadline for one generator call
    pub generation_timeout: Duration,
    /// Deadline for one synthesizer call
    pub synthesis_timeout: Duration,
    /// First thing the caller hears
    pub greeting: String,
    /// Spoken when no speech was recognized
    pub reprompt: String,
    /// Farewell after too many silent exchanges
    pub goodbye: String,
    /// Farewell once the turn budget is used up
    pub closing: String,
    /// Reply used when generation fails
    pub apology: String,
    /// Spoken when the provider falls back
    pub unavailable: String,
}

impl Default for TurnControllerConfig {
    fn default() -> Self {
        Self {
            max_turns: 3,
            max_reprompts: 2,
            history_window: 6,
            max_transcript_entries: 20,
            max_reply_chars: 320,
            generation_timeout: Duration::from_millis(4000),
            synthesis_timeout: Duration::from_millis(5000),
            greeting: "Hi, thanks for calling. How can I help you today?".to_string(),
            reprompt: "Sorry, I didn't catch that. Could you say it again?".to_string(),
            goodbye: "I'm having trouble hearing you. Please try again or call back later. \
                      Goodbye."
                .to_string(),
            closing: "Thank you for calling. Have a great day!".to_string(),
            apology: "Sorry, I can't answer that right now.".to_string(),
            unavailable: "Sorry, the service is temporarily unavailable. Please try again later."
                .to_string(),
        }
    }
}

impl TurnControllerConfig {
    /// Bounds for newly created sessions
    pub const fn session_limits(&self) -> SessionLimits {
        SessionLimits {
            max_turns: self.max_turns,
            max_transcript_entries: self.max_transcript_entries,
        }
    }
}

/// One inbound webhook, already authenticated by the caller of the controller
#[derive(Debug, Clone)]
pub struct TurnRequest {
    /// Raw call identifier from the provider form
    pub call_sid: String,
    /// Sequence echoed back from the previous directive
    pub turn_hint: Option<u32>,
    /// Recognized speech, absent or empty when nothing was heard
    pub transcript: Option<String>,
    /// Whether the shared secret matched
    pub secret_valid: bool,
}

/// Directive for the provider plus bookkeeping for the HTTP layer
#[derive(Debug, Clone)]
pub struct TurnResponse {
    pub call_sid: CallSid,
    pub action: NextAction,
    /// Value the provider must echo as turn hint on its next callback
    pub sequence: u32,
    /// The directive was answered before and is sent again unchanged
    pub replayed: bool,
    /// A fallback path replaced generated text or synthesized audio
    pub degraded: bool,
}

/// Reachability of the upstream services
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Readiness {
    pub generator: bool,
    pub synthesizer: bool,
}

impl Readiness {
    /// The generator is required; without the synthesizer replies are spoken
    /// by the provider
    pub const fn is_ready(&self) -> bool {
        self.generator
    }
}

struct Outcome {
    action: NextAction,
    sequence: u32,
    degraded: bool,
}

/// Service that runs the per-call turn state machine
pub struct TurnController {
    generator: Arc<dyn ResponseGeneratorPort>,
    synthesizer: Arc<dyn SpeechSynthesizerPort>,
    clips: Arc<dyn ClipStorePort>,
    sessions: Arc<dyn SessionStorePort>,
    config: TurnControllerConfig,
}

impl fmt::Debug for TurnController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TurnController")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl TurnController {
    /// Create a controller with default configuration
    pub fn new(
        generator: Arc<dyn ResponseGeneratorPort>,
        synthesizer: Arc<dyn SpeechSynthesizerPort>,
        clips: Arc<dyn ClipStorePort>,
        sessions: Arc<dyn SessionStorePort>,
    ) -> Self {
        Self::with_config(
            generator,
            synthesizer,
            clips,
            sessions,
            TurnControllerConfig::default(),
        )
    }

    /// Create a controller with custom configuration
    pub fn with_config(
        generator: Arc<dyn ResponseGeneratorPort>,
        synthesizer: Arc<dyn SpeechSynthesizerPort>,
        clips: Arc<dyn ClipStorePort>,
        sessions: Arc<dyn SessionStorePort>,
        config: TurnControllerConfig,
    ) -> Self {
        Self {
            generator,
            synthesizer,
            clips,
            sessions,
            config,
        }
    }

    pub const fn config(&self) -> &TurnControllerConfig {
        &self.config
    }

    /// Process one webhook exchange
    ///
    /// Returns [`ApplicationError::AuthRejected`] without touching any session
    /// when the secret did not match.
    #[instrument(skip(self, request), fields(
        call_sid = %request.call_sid,
        turn_hint = ?request.turn_hint,
        has_transcript = request.transcript.is_some()
    ))]
    pub async fn handle_turn(&self, request: TurnRequest) -> Result<TurnResponse, ApplicationError> {
        if !request.secret_valid {
            warn!("Rejected webhook with invalid secret");
            return Err(ApplicationError::AuthRejected);
        }

        let call_sid = parse_call_sid(&request.call_sid)?;
        let mut session = self
            .sessions
            .acquire(&call_sid, self.config.session_limits())
            .await;

        if session.is_terminated() || session.is_replay(request.turn_hint) {
            return replay(&session);
        }

        if session.resume() {
            warn!("Previous exchange was interrupted, listening again");
        }

        let transcript = request
            .transcript
            .as_deref()
            .map(str::trim)
            .filter(|text| has_speech(Some(text)));

        let outcome = match (session.state(), transcript) {
            (TurnState::Start, _) => self.greet(&mut session)?,
            (_, None) => self.reprompt(&mut session).await?,
            (_, Some(text)) => self.respond(&mut session, text).await?,
        };

        debug!(
            action = outcome.action.kind(),
            sequence = outcome.sequence,
            state = %session.state(),
            "Directive ready"
        );

        Ok(TurnResponse {
            call_sid,
            action: outcome.action,
            sequence: outcome.sequence,
            replayed: false,
            degraded: outcome.degraded,
        })
    }

    /// End the call after the provider invoked its fallback route
    #[instrument(skip(self))]
    pub async fn abandon(
        &self,
        call_sid: &str,
        secret_valid: bool,
    ) -> Result<TurnResponse, ApplicationError> {
        if !secret_valid {
            warn!("Rejected fallback webhook with invalid secret");
            return Err(ApplicationError::AuthRejected);
        }

        let call_sid = parse_call_sid(call_sid)?;
        let mut session = self
            .sessions
            .acquire(&call_sid, self.config.session_limits())
            .await;

        if session.is_terminated() {
            return replay(&session);
        }

        warn!("Provider fallback invoked, ending call");
        let outcome = terminate(
            &mut session,
            TerminationReason::ProviderFallback,
            None,
            Utterance::Text(self.config.unavailable.clone()),
            true,
        )?;

        Ok(TurnResponse {
            call_sid,
            action: outcome.action,
            sequence: outcome.sequence,
            replayed: false,
            degraded: outcome.degraded,
        })
    }

    /// Forget a call the provider reported as finished
    #[instrument(skip(self))]
    pub async fn end_call(&self, call_sid: &str, secret_valid: bool) -> Result<bool, ApplicationError> {
        if !secret_valid {
            warn!("Rejected status callback with invalid secret");
            return Err(ApplicationError::AuthRejected);
        }

        let call_sid = parse_call_sid(call_sid)?;
        let removed = self.sessions.remove(&call_sid).await;
        if removed {
            info!("Call ended, session removed");
        }
        Ok(removed)
    }

    /// Snapshot of one live session
    pub async fn session(&self, call_sid: &str) -> Result<CallSession, ApplicationError> {
        let call_sid = parse_call_sid(call_sid)?;
        self.sessions
            .get(&call_sid)
            .await
            .ok_or_else(|| ApplicationError::SessionNotFound(call_sid.to_string()))
    }

    /// Snapshots of all live sessions
    pub async fn sessions(&self) -> Vec<CallSession> {
        self.sessions.list().await
    }

    pub fn active_sessions(&self) -> u64 {
        self.sessions.len()
    }

    /// Probe the generator and synthesizer concurrently
    pub async fn readiness(&self) -> Readiness {
        let (generator, synthesizer) =
            tokio::join!(self.generator.is_healthy(), self.synthesizer.is_available());
        Readiness {
            generator,
            synthesizer,
        }
    }

    fn greet(&self, session: &mut CallSession) -> Result<Outcome, ApplicationError> {
        let greeting = self.config.greeting.clone();
        let index = session.next_turn_index();

        session.transition(TurnState::AwaitingSpeech)?;
        session.complete_turn(Turn::new(index, "", greeting.clone()))?;
        session.record_agent(greeting.clone());

        let action = NextAction::Prompt { text: greeting };
        let sequence = session.emit(action.clone());
        info!(turn = index, "Greeting caller");

        Ok(Outcome {
            action,
            sequence,
            degraded: false,
        })
    }

    /// Ask again, or hang up once silence exhausts the reprompt cap
    ///
    /// The final round tolerates a single reprompt; a second silent exchange
    /// there ends the call as if the round had been used.
    async fn reprompt(&self, session: &mut CallSession) -> Result<Outcome, ApplicationError> {
        let attempts = session.register_reprompt();
        if attempts > self.config.max_reprompts {
            info!(attempts, "No speech detected, ending call");
            return terminate(
                session,
                TerminationReason::NoSpeechDetected,
                None,
                Utterance::Text(self.config.goodbye.clone()),
                false,
            );
        }

        if session.is_final_round() && attempts > 1 {
            info!(attempts, "Silent final round, ending call");
            let (farewell, degraded) = self.closing().await;
            return terminate(
                session,
                TerminationReason::TurnLimitReached,
                None,
                farewell,
                degraded,
            );
        }

        session.transition(TurnState::AwaitingSpeech)?;
        let action = NextAction::Reprompt {
            text: self.config.reprompt.clone(),
        };
        let sequence = session.emit(action.clone());
        debug!(attempts, "No speech detected, reprompting");

        Ok(Outcome {
            action,
            sequence,
            degraded: false,
        })
    }

    async fn respond(
        &self,
        session: &mut CallSession,
        text: &str,
    ) -> Result<Outcome, ApplicationError> {
        if session.turn_count() >= session.max_turns() {
            let (farewell, degraded) = self.closing().await;
            return terminate(
                session,
                TerminationReason::TurnLimitReached,
                None,
                farewell,
                degraded,
            );
        }

        let final_round = session.is_final_round();
        let index = session.next_turn_index();
        let recent = session.transcript().recent(self.config.history_window);

        session.transition(TurnState::Generating)?;
        let (reply, generation_fallback) = self.generate_reply(text, &recent).await;
        session.record_caller(text);
        session.record_agent(reply.clone());

        session.transition(TurnState::Synthesizing)?;
        let utterance = self.speak(&reply).await;
        let synthesis_fallback = utterance.clip().is_none();

        session.transition(TurnState::Responding)?;
        let mut turn = Turn::new(index, text, reply.clone());
        if generation_fallback {
            turn = turn.with_generation_fallback();
        }
        turn = match utterance.clip() {
            Some(clip) => turn.with_clip(clip),
            None => turn.with_synthesis_fallback(),
        };
        session.complete_turn(turn)?;

        info!(
            turn = index,
            generation_fallback, synthesis_fallback, "Turn completed"
        );

        let degraded = generation_fallback || synthesis_fallback;
        if final_round {
            let (farewell, closing_fallback) = self.closing().await;
            return terminate(
                session,
                TerminationReason::TurnLimitReached,
                Some(utterance),
                farewell,
                degraded || closing_fallback,
            );
        }

        session.transition(TurnState::AwaitingSpeech)?;
        let action = NextAction::Continue { reply, utterance };
        let sequence = session.emit(action.clone());

        Ok(Outcome {
            action,
            sequence,
            degraded,
        })
    }

    /// Generate a reply, returning the apology and `true` on any failure
    async fn generate_reply(&self, text: &str, recent: &[TranscriptEntry]) -> (String, bool) {
        let result = with_deadline(
            GENERATOR,
            self.config.generation_timeout,
            self.generator.generate(text, recent),
        )
        .await;

        match result {
            Ok(raw) => {
                let reply = prepare_for_speech(&raw, self.config.max_reply_chars);
                if reply.is_empty() {
                    warn!("Generator returned an empty reply, using apology");
                    (self.config.apology.clone(), true)
                } else {
                    (reply, false)
                }
            },
            Err(e) => {
                warn!(error = %e, "Reply generation failed, using apology");
                (self.config.apology.clone(), true)
            },
        }
    }

    /// The closing line, synthesized like a reply
    async fn closing(&self) -> (Utterance, bool) {
        let farewell = self.speak(&self.config.closing).await;
        let fallback = farewell.clip().is_none();
        (farewell, fallback)
    }

    /// Synthesize and register a clip, or fall back to provider speech
    async fn speak(&self, text: &str) -> Utterance {
        let result = with_deadline(
            SYNTHESIZER,
            self.config.synthesis_timeout,
            self.synthesizer.synthesize(text),
        )
        .await;

        match result {
            Ok(audio) if !audio.is_empty() => {
                let bytes = audio.len();
                let clip = self.clips.register(audio);
                debug!(clip = %clip, bytes, "Reply clip registered");
                Utterance::Clip(clip)
            },
            Ok(_) => {
                warn!("Synthesizer returned no audio, using provider speech");
                Utterance::Text(text.to_string())
            },
            Err(e) => {
                warn!(error = %e, "Speech synthesis failed, using provider speech");
                Utterance::Text(text.to_string())
            },
        }
    }
}

fn parse_call_sid(raw: &str) -> Result<CallSid, ApplicationError> {
    CallSid::new(raw).map_err(|e| ApplicationError::InvalidRequest(e.to_string()))
}

fn replay(session: &CallSession) -> Result<TurnResponse, ApplicationError> {
    let action = session.last_action().cloned().ok_or_else(|| {
        ApplicationError::Internal("session has no directive to replay".to_string())
    })?;

    debug!(
        action = action.kind(),
        sequence = session.exchanges(),
        "Replaying last directive"
    );

    Ok(TurnResponse {
        call_sid: session.call_sid().clone(),
        action,
        sequence: session.exchanges(),
        replayed: true,
        degraded: false,
    })
}

fn terminate(
    session: &mut CallSession,
    reason: TerminationReason,
    reply: Option<Utterance>,
    farewell: Utterance,
    degraded: bool,
) -> Result<Outcome, ApplicationError> {
    let action = NextAction::Terminate {
        reason,
        reply,
        farewell,
    };
    let sequence = session.terminate(reason, action.clone())?;
    info!(
        reason = %reason,
        turns = session.turn_count(),
        "Call session terminated"
    );

    Ok(Outcome {
        action,
        sequence,
        degraded,
    })
}

/// Run an upstream call under a deadline, mapping expiry to `UpstreamTimeout`
async fn with_deadline<T, F>(
    service: &'static str,
    limit: Duration,
    call: F,
) -> Result<T, ApplicationError>
where
    F: Future<Output = Result<T, ApplicationError>>,
{
    match timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(ApplicationError::UpstreamTimeout {
            service,
            timeout_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
        }),
    }
}
