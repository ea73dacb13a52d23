//! Bounded conversation transcript

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Who said a transcript line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    /// The person on the phone
    Caller,
    /// The voice agent
    Agent,
}

/// One line of the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub speaker: Speaker,
    pub text: String,
}

impl TranscriptEntry {
    /// Line spoken by the caller
    pub fn caller(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Caller,
            text: text.into(),
        }
    }

    /// Line spoken by the agent
    pub fn agent(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Agent,
            text: text.into(),
        }
    }
}

/// Ordered transcript that keeps at most `capacity` entries
///
/// Pushing beyond capacity drops the oldest line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    entries: VecDeque<TranscriptEntry>,
    capacity: usize,
}

impl Transcript {
    /// Create an empty transcript; a zero capacity is raised to one
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a line, evicting the oldest when full
    pub fn push(&mut self, entry: TranscriptEntry) {
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// The last `n` lines, oldest first
    pub fn recent(&self, n: usize) -> Vec<TranscriptEntry> {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(skip).cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TranscriptEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_keeps_order() {
        let mut transcript = Transcript::with_capacity(4);
        transcript.push(TranscriptEntry::caller("hi"));
        transcript.push(TranscriptEntry::agent("hello"));

        let lines: Vec<_> = transcript.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(lines, vec!["hi", "hello"]);
    }

    #[test]
    fn oldest_entry_is_dropped_at_capacity() {
        let mut transcript = Transcript::with_capacity(2);
        transcript.push(TranscriptEntry::caller("one"));
        transcript.push(TranscriptEntry::agent("two"));
        transcript.push(TranscriptEntry::caller("three"));

        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.recent(10)[0].text, "two");
    }

    #[test]
    fn recent_returns_tail() {
        let mut transcript = Transcript::with_capacity(10);
        for i in 0..5 {
            transcript.push(TranscriptEntry::caller(i.to_string()));
        }

        let recent = transcript.recent(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].text, "3");
        assert_eq!(recent[1].text, "4");
    }

    #[test]
    fn zero_capacity_is_raised() {
        let transcript = Transcript::with_capacity(0);
        assert_eq!(transcript.capacity(), 1);
        assert!(transcript.is_empty());
    }

    #[test]
    fn speaker_serializes_lowercase() {
        let json = serde_json::to_string(&TranscriptEntry::agent("ok")).unwrap();
        assert!(json.contains("\"agent\""));
    }
}
