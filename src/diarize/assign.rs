//! Speaker assignment by temporal overlap.
//!
//! Merges transcription segments with diarization turns: every segment gets
//! the speaker whose turn overlaps it the most. Segments no turn touches get
//! the [`UNKNOWN_SPEAKER`] sentinel, so the output invariant holds: exactly
//! one label per segment.

use crate::asr::types::Transcription;
use crate::diarize::diarizer::Turn;
use serde::Serialize;

/// Label for segments no diarization turn overlaps.
pub const UNKNOWN_SPEAKER: &str = "UNKNOWN";

/// A transcription segment annotated with its speaker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeakerSegment {
    pub speaker: String,
    pub text: String,
    /// Start offset in seconds.
    pub start: f64,
    /// End offset in seconds.
    pub end: f64,
}

/// The terminal pipeline entity: speaker-labeled segments in chronological
/// order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DiarizedTranscript {
    pub segments: Vec<SpeakerSegment>,
    pub language: Option<String>,
}

impl DiarizedTranscript {
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Label every transcription segment with the maximally overlapping turn's
/// speaker.
///
/// Ties go to the earliest-starting turn: turns are scanned in order and a
/// candidate only replaces the current best on strictly greater overlap.
/// Segment order and timestamps pass through unchanged.
pub fn assign_speakers(transcription: &Transcription, turns: &[Turn]) -> DiarizedTranscript {
    let segments = transcription
        .segments
        .iter()
        .map(|segment| {
            let speaker = best_speaker(segment.start, segment.end, turns)
                .unwrap_or(UNKNOWN_SPEAKER)
                .to_string();
            SpeakerSegment {
                speaker,
                text: segment.text.clone(),
                start: segment.start,
                end: segment.end,
            }
        })
        .collect();

    DiarizedTranscript {
        segments,
        language: transcription.language.clone(),
    }
}

/// Speaker of the turn with maximal overlap against `[start, end)`, or None
/// when nothing overlaps.
fn best_speaker(start: f64, end: f64, turns: &[Turn]) -> Option<&str> {
    let mut best: Option<(&str, f64)> = None;

    for turn in turns {
        let overlap = overlap(start, end, turn.start, turn.end);
        if overlap <= 0.0 {
            continue;
        }
        match best {
            Some((_, best_overlap)) if overlap <= best_overlap => {}
            _ => best = Some((&turn.speaker, overlap)),
        }
    }

    best.map(|(speaker, _)| speaker)
}

/// Overlap duration of two half-open intervals, zero when disjoint.
fn overlap(a_start: f64, a_end: f64, b_start: f64, b_end: f64) -> f64 {
    (a_end.min(b_end) - a_start.max(b_start)).max(0.0)
}
