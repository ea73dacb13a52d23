//! Text shaping for spoken replies
//!
//! Model output is written for screens. Before it is spoken it is flattened
//! to one line, stripped of markdown emphasis, and cut to a length a caller
//! can sit through.

/// Characters dropped from replies before speaking them
const MARKUP_CHARS: [char; 4] = ['*', '#', '`', '_'];

/// Normalize `text` for speech and cap it at `max_chars` characters
///
/// Cuts prefer the last sentence end within the limit, then the last word
/// boundary. A word-boundary cut gets a closing period.
pub fn prepare_for_speech(text: &str, max_chars: usize) -> String {
    let cleaned: String = text.chars().filter(|c| !MARKUP_CHARS.contains(c)).collect();
    let flat = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

    if max_chars == 0 || flat.chars().count() <= max_chars {
        return flat;
    }

    let head: String = flat.chars().take(max_chars).collect();

    if let Some(end) = head.rfind(['.', '!', '?']).filter(|&end| end > 0) {
        return head[..=end].to_string();
    }

    let cut = head.rfind(' ').map_or(head.as_str(), |space| &head[..space]);
    let trimmed = cut.trim_end_matches([',', ';', ':', '-', ' ']);
    if trimmed.is_empty() {
        return head;
    }
    format!("{trimmed}.")
}

/// Whether a recognized transcript carries any speech
pub fn has_speech(transcript: Option<&str>) -> bool {
    transcript.is_some_and(|t| t.chars().any(char::is_alphanumeric))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_only_flattened() {
        assert_eq!(
            prepare_for_speech("We're open\n  nine to five.", 100),
            "We're open nine to five."
        );
    }

    #[test]
    fn markdown_is_removed() {
        assert_eq!(
            prepare_for_speech("**Yes**, `we` are #open", 100),
            "Yes, we are open"
        );
    }

    #[test]
    fn long_text_is_cut_at_sentence_end() {
        let text = "We open at nine. We close at five. Weekends are by appointment only.";
        assert_eq!(
            prepare_for_speech(text, 40),
            "We open at nine. We close at five."
        );
    }

    #[test]
    fn long_sentence_is_cut_at_word_boundary() {
        let text = "We are open every weekday from nine in the morning until five";
        assert_eq!(prepare_for_speech(text, 20), "We are open every.");
    }

    #[test]
    fn zero_limit_disables_cap() {
        let text = "a ".repeat(50);
        assert_eq!(prepare_for_speech(&text, 0).len(), 99);
    }

    #[test]
    fn cut_is_char_safe() {
        let text = "Grüße aus München und Köln und Düsseldorf";
        let out = prepare_for_speech(text, 12);
        assert!(out.chars().count() <= 13);
        assert!(out.starts_with("Grüße"));
    }

    #[test]
    fn speech_detection() {
        assert!(has_speech(Some("What are your hours?")));
        assert!(!has_speech(Some("   ")));
        assert!(!has_speech(Some("...")));
        assert!(!has_speech(None));
    }
}
