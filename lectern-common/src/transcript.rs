//! Word-timed lecture transcript
//!
//! Follows the listener's playback position through a speech-to-text
//! transcript so that lecture text can highlight the word being spoken.
//! Input is the recogniser's result list:
//!
//! ```json
//! [{ "alternatives": [{ "words": [
//!     { "word": "hello", "startTime": { "seconds": "1", "nanos": 500000000 },
//!       "endTime": { "seconds": "2" } }
//! ] }] }]
//! ```

use crate::{Error, Result};
use serde::Deserialize;

const NANOS_PER_SEC: f64 = 1_000_000_000.0;

#[derive(Debug, Deserialize)]
struct RecognitionResult {
    #[serde(default)]
    alternatives: Vec<Alternative>,
}

#[derive(Debug, Deserialize)]
struct Alternative {
    #[serde(default)]
    words: Vec<RawWord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawWord {
    word: String,
    #[serde(default)]
    start_time: Offset,
    #[serde(default)]
    end_time: Offset,
}

/// Recognisers emit `seconds` as either a string or a number.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Seconds {
    Number(f64),
    Text(String),
}

#[derive(Debug, Default, Deserialize)]
struct Offset {
    seconds: Option<Seconds>,
    #[serde(default)]
    nanos: u32,
}

impl Offset {
    fn to_seconds(&self) -> Result<f64> {
        let whole = match &self.seconds {
            None => 0.0,
            Some(Seconds::Number(n)) => *n,
            Some(Seconds::Text(s)) => s
                .trim()
                .parse::<f64>()
                .map_err(|e| Error::Transcript(format!("Invalid seconds '{}': {}", s, e)))?,
        };
        Ok(whole + self.nanos as f64 / NANOS_PER_SEC)
    }
}

/// A single timed word
#[derive(Debug, Clone, PartialEq)]
pub struct TimedWord {
    pub word: String,
    /// Start of the word in seconds
    pub start: f64,
    /// End of the word in seconds
    pub end: f64,
}

/// Flattened, start-ordered transcript
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    words: Vec<TimedWord>,
}

impl Transcript {
    /// Parse a recogniser result list, flattening every section's first
    /// alternative in order.
    pub fn from_json(json: &str) -> Result<Self> {
        let results: Vec<RecognitionResult> = serde_json::from_str(json)?;

        let mut words = Vec::new();
        for result in results {
            let Some(best) = result.alternatives.into_iter().next() else {
                continue;
            };
            for raw in best.words {
                words.push(TimedWord {
                    start: raw.start_time.to_seconds()?,
                    end: raw.end_time.to_seconds()?,
                    word: raw.word,
                });
            }
        }

        words.sort_by(|a, b| a.start.total_cmp(&b.start));
        Ok(Self { words })
    }

    pub fn words(&self) -> &[TimedWord] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Index of the word being spoken at `position`.
    ///
    /// Between two words the earlier one stays active. Returns `None` before
    /// the first word starts.
    pub fn word_at(&self, position: f64) -> Option<usize> {
        let started = self.words.partition_point(|w| w.start <= position);
        started.checked_sub(1)
    }
}

/// Tracks the active transcript word and reports only changes.
#[derive(Debug)]
pub struct TranscriptCursor {
    transcript: Transcript,
    active: Option<usize>,
}

impl TranscriptCursor {
    pub fn new(transcript: Transcript) -> Self {
        Self {
            transcript,
            active: None,
        }
    }

    /// Move the cursor to `position`, returning the newly active word if it
    /// differs from the previous one.
    pub fn advance(&mut self, position: f64) -> Option<&TimedWord> {
        let next = self.transcript.word_at(position);
        if next == self.active {
            return None;
        }
        self.active = next;
        next.map(|i| &self.transcript.words[i])
    }

    pub fn active(&self) -> Option<usize> {
        self.active
    }
}
