//! Rendering of turn directives as TwiML
//!
//! Every listening directive points the provider back at `/voice/incoming`
//! with the sequence it has to echo, so a redelivered callback can be
//! recognized and answered with the same markup.

use domain::{ClipId, NextAction, Utterance};
use infrastructure::TelephonyConfig;
use integration_twilio::{Gather, Say, TwilioError, VoiceResponse, action_url};
use secrecy::ExposeSecret;

pub const INCOMING_PATH: &str = "/voice/incoming";

/// Render one directive for the provider
pub fn render(
    action: &NextAction,
    sequence: u32,
    telephony: &TelephonyConfig,
) -> Result<VoiceResponse, TwilioError> {
    let markup = Markup::new(telephony);

    let response = match action {
        NextAction::Prompt { text } | NextAction::Reprompt { text } => {
            markup.listen(Gather::new(markup.action(sequence)?).say(markup.say(text)), sequence)?
        },
        NextAction::Continue { utterance, .. } => {
            let gather = markup.utterance(Gather::new(markup.action(sequence)?), utterance);
            markup.listen(gather, sequence)?
        },
        NextAction::Terminate {
            reply, farewell, ..
        } => {
            let response = match reply {
                Some(reply) => markup.speak(VoiceResponse::new(), reply),
                None => VoiceResponse::new(),
            };
            markup.speak(response, farewell).hangup()
        },
    };

    Ok(response)
}

struct Markup<'a> {
    telephony: &'a TelephonyConfig,
}

impl<'a> Markup<'a> {
    const fn new(telephony: &'a TelephonyConfig) -> Self {
        Self { telephony }
    }

    fn action(&self, sequence: u32) -> Result<String, TwilioError> {
        action_url(
            self.telephony.base_url(),
            INCOMING_PATH,
            self.telephony.webhook_secret.expose_secret(),
            Some(sequence),
        )
    }

    fn audio_url(&self, clip: &ClipId) -> String {
        format!("{}/audio/{clip}", self.telephony.base_url())
    }

    fn say(&self, text: &str) -> Say {
        let say = Say::new(text).language(self.telephony.speech_language.as_str());
        match self.telephony.say_voice.as_deref() {
            Some(voice) => say.voice(voice),
            None => say,
        }
    }

    fn speak(&self, response: VoiceResponse, utterance: &Utterance) -> VoiceResponse {
        match utterance {
            Utterance::Clip(clip) => response.play(self.audio_url(clip)),
            Utterance::Text(text) => response.say(self.say(text)),
        }
    }

    fn utterance(&self, gather: Gather, utterance: &Utterance) -> Gather {
        match utterance {
            Utterance::Clip(clip) => gather.play(self.audio_url(clip)),
            Utterance::Text(text) => gather.say(self.say(text)),
        }
    }

    /// Gather speech, then come back with an empty result if the gather
    /// ends without calling its action
    fn listen(&self, gather: Gather, sequence: u32) -> Result<VoiceResponse, TwilioError> {
        let gather = gather
            .timeout(self.telephony.gather_timeout_secs)
            .language(self.telephony.speech_language.as_str());
        Ok(VoiceResponse::new()
            .gather(gather)
            .redirect(self.action(sequence)?))
    }
}

#[cfg(test)]
mod tests {
    use domain::TerminationReason;
    use secrecy::SecretString;

    use super::*;

    fn telephony() -> TelephonyConfig {
        TelephonyConfig {
            webhook_secret: SecretString::from("s3cret"),
            public_base_url: "https://voice.example.com/".to_string(),
            ..TelephonyConfig::default()
        }
    }

    #[test]
    fn prompt_gathers_speech_and_redirects() {
        let action = NextAction::Prompt {
            text: "How can I help?".to_string(),
        };
        let xml = render(&action, 1, &telephony()).unwrap().to_xml();

        assert!(xml.contains(
            "<Gather input=\"speech\" action=\"https://voice.example.com/voice/incoming?secret=s3cret&amp;turn=1\""
        ));
        assert!(xml.contains("timeout=\"15\""));
        assert!(xml.contains("actionOnEmptyResult=\"true\""));
        assert!(xml.contains("<Say language=\"en-US\">How can I help?</Say></Gather>"));
        assert!(xml.ends_with(
            "<Redirect method=\"POST\">https://voice.example.com/voice/incoming?secret=s3cret&amp;turn=1</Redirect></Response>"
        ));
        assert!(!xml.contains("<Hangup/>"));
    }

    #[test]
    fn continue_plays_clip() {
        let clip = ClipId::new();
        let action = NextAction::Continue {
            reply: "We're open nine to five".to_string(),
            utterance: Utterance::Clip(clip),
        };
        let xml = render(&action, 2, &telephony()).unwrap().to_xml();

        assert!(xml.contains(&format!(
            "<Play>https://voice.example.com/audio/{clip}</Play></Gather>"
        )));
        assert!(xml.contains("turn=2"));
        assert!(!xml.contains("We're open"));
    }

    #[test]
    fn continue_without_clip_lets_provider_speak() {
        let action = NextAction::Continue {
            reply: "We're open nine to five".to_string(),
            utterance: Utterance::Text("We're open nine to five".to_string()),
        };
        let xml = render(&action, 2, &telephony()).unwrap().to_xml();

        assert!(xml.contains("<Say language=\"en-US\">We&apos;re open nine to five</Say></Gather>"));
        assert!(!xml.contains("<Play>"));
    }

    #[test]
    fn terminate_plays_reply_then_farewell_then_hangs_up() {
        let clip = ClipId::new();
        let action = NextAction::Terminate {
            reason: TerminationReason::TurnLimitReached,
            reply: Some(Utterance::Clip(clip)),
            farewell: Utterance::Text("Thank you for calling.".to_string()),
        };
        let xml = render(&action, 4, &telephony()).unwrap().to_xml();

        assert!(xml.ends_with(&format!(
            "<Response><Play>https://voice.example.com/audio/{clip}</Play>\
             <Say language=\"en-US\">Thank you for calling.</Say><Hangup/></Response>"
        )));
        assert!(!xml.contains("<Gather"));
        assert!(!xml.contains("<Redirect"));
    }

    #[test]
    fn synthesized_farewell_is_played() {
        let reply = ClipId::new();
        let farewell = ClipId::new();
        let action = NextAction::Terminate {
            reason: TerminationReason::TurnLimitReached,
            reply: Some(Utterance::Clip(reply)),
            farewell: Utterance::Clip(farewell),
        };
        let xml = render(&action, 4, &telephony()).unwrap().to_xml();

        assert!(xml.ends_with(&format!(
            "<Response><Play>https://voice.example.com/audio/{reply}</Play>\
             <Play>https://voice.example.com/audio/{farewell}</Play><Hangup/></Response>"
        )));
        assert!(!xml.contains("<Say"));
    }

    #[test]
    fn terminate_without_reply_says_farewell() {
        let action = NextAction::Terminate {
            reason: TerminationReason::NoSpeechDetected,
            reply: None,
            farewell: Utterance::Text("Goodbye.".to_string()),
        };
        let xml = render(&action, 3, &telephony()).unwrap().to_xml();
        assert!(xml.ends_with("<Response><Say language=\"en-US\">Goodbye.</Say><Hangup/></Response>"));
    }

    #[test]
    fn configured_voice_is_used() {
        let mut config = telephony();
        config.say_voice = Some("Polly.Joanna".to_string());
        let action = NextAction::Reprompt {
            text: "Sorry?".to_string(),
        };
        let xml = render(&action, 2, &config).unwrap().to_xml();
        assert!(xml.contains("<Say voice=\"Polly.Joanna\" language=\"en-US\">Sorry?</Say>"));
    }

    #[test]
    fn invalid_base_url_is_an_error() {
        let mut config = telephony();
        config.public_base_url = "not a url".to_string();
        let action = NextAction::Prompt {
            text: "Hi".to_string(),
        };
        assert!(matches!(
            render(&action, 1, &config),
            Err(TwilioError::InvalidUrl(_))
        ));
    }
}
