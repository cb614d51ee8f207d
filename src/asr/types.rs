//! Transcription data shapes shared across stages.

use serde::Serialize;

/// A single word with refined timing, produced by alignment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Word {
    pub text: String,
    /// Start offset in seconds from the beginning of the audio.
    pub start: f64,
    /// End offset in seconds.
    pub end: f64,
    /// Model confidence in [0.0, 1.0].
    pub score: f32,
}

/// A unit of transcribed speech.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    /// Start offset in seconds.
    pub start: f64,
    /// End offset in seconds.
    pub end: f64,
    pub text: String,
    /// Per-word timings; empty until the alignment stage has run.
    pub words: Vec<Word>,
}

impl Segment {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
            words: Vec::new(),
        }
    }

    /// Duration in seconds. Segments are well-formed with `start <= end`.
    pub fn duration(&self) -> f64 {
        (self.end - self.start).max(0.0)
    }
}

/// Ordered transcription of one audio file. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Transcription {
    pub segments: Vec<Segment>,
    /// Detected (or configured) language tag, e.g. "pt". Drives alignment
    /// model selection.
    pub language: Option<String>,
}

impl Transcription {
    pub fn new(segments: Vec<Segment>, language: Option<String>) -> Self {
        Self { segments, language }
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}
