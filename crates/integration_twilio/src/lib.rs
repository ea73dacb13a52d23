//! Twilio Programmable Voice integration
//!
//! Parses voice webhooks, authenticates them, and renders TwiML replies.

pub mod error;
pub mod twiml;
pub mod webhook;

pub use error::TwilioError;
pub use twiml::{Gather, Say, VoiceResponse};
pub use webhook::{
    CallStatus, StatusCallbackForm, VoiceWebhookForm, WebhookQuery, action_url, compute_signature,
    parse_form, secrets_match, verify_signature,
};
