//! TwiML voice response builder
//!
//! Only the verbs the call flow uses are modelled. Text and attribute values
//! are XML-escaped when rendered.

use std::fmt::{self, Write as _};

use quick_xml::escape::escape;

/// `<Say>` verb
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Say {
    text: String,
    voice: Option<String>,
    language: Option<String>,
}

impl Say {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            voice: None,
            language: None,
        }
    }

    #[must_use]
    pub fn voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = Some(voice.into());
        self
    }

    #[must_use]
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    fn render(&self, out: &mut String) {
        out.push_str("<Say");
        push_attr(out, "voice", self.voice.as_deref());
        push_attr(out, "language", self.language.as_deref());
        out.push('>');
        out.push_str(&escape(self.text.as_str()));
        out.push_str("</Say>");
    }
}

/// Verbs allowed inside `<Gather>`
#[derive(Debug, Clone, PartialEq, Eq)]
enum Prompt {
    Say(Say),
    Play(String),
}

impl Prompt {
    fn render(&self, out: &mut String) {
        match self {
            Self::Say(say) => say.render(out),
            Self::Play(url) => render_play(out, url),
        }
    }
}

/// `<Gather input="speech">` verb
///
/// Twilio posts the recognized speech to `action`. With
/// `actionOnEmptyResult` set the action is called even when nothing was
/// heard, so silence reaches the webhook as an empty transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gather {
    action: String,
    timeout_secs: u32,
    language: Option<String>,
    children: Vec<Prompt>,
}

impl Gather {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            timeout_secs: 5,
            language: None,
            children: Vec::new(),
        }
    }

    #[must_use]
    pub const fn timeout(mut self, secs: u32) -> Self {
        self.timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    #[must_use]
    pub fn say(mut self, say: Say) -> Self {
        self.children.push(Prompt::Say(say));
        self
    }

    #[must_use]
    pub fn play(mut self, url: impl Into<String>) -> Self {
        self.children.push(Prompt::Play(url.into()));
        self
    }

    fn render(&self, out: &mut String) {
        out.push_str("<Gather input=\"speech\"");
        push_attr(out, "action", Some(&self.action));
        out.push_str(" method=\"POST\"");
        let _ = write!(out, " timeout=\"{}\"", self.timeout_secs);
        out.push_str(" speechTimeout=\"auto\"");
        push_attr(out, "language", self.language.as_deref());
        out.push_str(" actionOnEmptyResult=\"true\">");
        for child in &self.children {
            child.render(out);
        }
        out.push_str("</Gather>");
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Verb {
    Say(Say),
    Play(String),
    Gather(Gather),
    Pause(u32),
    Redirect(String),
    Hangup,
}

/// A `<Response>` document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoiceResponse {
    verbs: Vec<Verb>,
}

impl VoiceResponse {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn say(mut self, say: Say) -> Self {
        self.verbs.push(Verb::Say(say));
        self
    }

    #[must_use]
    pub fn play(mut self, url: impl Into<String>) -> Self {
        self.verbs.push(Verb::Play(url.into()));
        self
    }

    #[must_use]
    pub fn gather(mut self, gather: Gather) -> Self {
        self.verbs.push(Verb::Gather(gather));
        self
    }

    #[must_use]
    pub fn pause(mut self, secs: u32) -> Self {
        self.verbs.push(Verb::Pause(secs));
        self
    }

    /// Redirect with POST
    #[must_use]
    pub fn redirect(mut self, url: impl Into<String>) -> Self {
        self.verbs.push(Verb::Redirect(url.into()));
        self
    }

    #[must_use]
    pub fn hangup(mut self) -> Self {
        self.verbs.push(Verb::Hangup);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.verbs.is_empty()
    }

    /// Render the document as XML
    pub fn to_xml(&self) -> String {
        let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response>");
        for verb in &self.verbs {
            match verb {
                Verb::Say(say) => say.render(&mut out),
                Verb::Play(url) => render_play(&mut out, url),
                Verb::Gather(gather) => gather.render(&mut out),
                Verb::Pause(secs) => {
                    let _ = write!(out, "<Pause length=\"{secs}\"/>");
                },
                Verb::Redirect(url) => {
                    out.push_str("<Redirect method=\"POST\">");
                    out.push_str(&escape(url.as_str()));
                    out.push_str("</Redirect>");
                },
                Verb::Hangup => out.push_str("<Hangup/>"),
            }
        }
        out.push_str("</Response>");
        out
    }
}

impl fmt::Display for VoiceResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_xml())
    }
}

fn render_play(out: &mut String, url: &str) {
    out.push_str("<Play>");
    out.push_str(&escape(url));
    out.push_str("</Play>");
}

fn push_attr(out: &mut String, name: &str, value: Option<&str>) {
    if let Some(value) = value {
        let _ = write!(out, " {name}=\"{}\"", escape(value));
    }
}
