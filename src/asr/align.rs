//! Timestamp alignment collaborator.
//!
//! Alignment refines segment boundaries (and produces per-word timings) by
//! matching decoded tokens against the audio signal. The model is selected by
//! the language code of the transcription and is nested inside the
//! transcription stage: it does not reclaim resources itself.

use crate::asr::types::{Segment, Transcription, Word};
use crate::device::DeviceKind;
use crate::error::{Result, ScribeError};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A loaded alignment model.
pub trait AlignModel: Send {
    /// Refine the transcription's timestamps against the original audio.
    ///
    /// The refined result never invents segments: the output segment count is
    /// at most the input's, and every timestamp satisfies `0 <= start <= end`.
    fn align(&self, transcription: &Transcription, audio: &[f32]) -> Result<Transcription>;
}

/// Loads alignment models by language code.
#[async_trait]
pub trait AlignModelProvider: Send + Sync {
    async fn load(&self, language: &str, device: DeviceKind) -> Result<Box<dyn AlignModel>>;
}

/// A decoded token with acoustic timing, the raw material of alignment.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedToken {
    pub text: String,
    pub start: f64,
    pub end: f64,
    pub score: f32,
}

/// Snap segment boundaries to the timed tokens that fall inside them.
///
/// A segment with no overlapping tokens keeps its original timing; a
/// refinement that would invert the interval is discarded. Segment count and
/// order are preserved.
pub fn refine_segments(transcription: &Transcription, tokens: &[TimedToken]) -> Transcription {
    let segments = transcription
        .segments
        .iter()
        .map(|segment| refine_one(segment, tokens))
        .collect();

    Transcription::new(segments, transcription.language.clone())
}

fn refine_one(segment: &Segment, tokens: &[TimedToken]) -> Segment {
    // Tokens belong to the segment whose window contains their midpoint.
    let inside: Vec<&TimedToken> = tokens
        .iter()
        .filter(|t| {
            let mid = (t.start + t.end) / 2.0;
            mid >= segment.start && mid < segment.end
        })
        .collect();

    if inside.is_empty() {
        return segment.clone();
    }

    let start = inside
        .iter()
        .map(|t| t.start)
        .fold(f64::INFINITY, f64::min)
        .max(0.0);
    let end = inside.iter().map(|t| t.end).fold(f64::NEG_INFINITY, f64::max);

    if start > end {
        return segment.clone();
    }

    Segment {
        start,
        end,
        text: segment.text.clone(),
        words: group_words(&inside),
    }
}

/// Group subword tokens into words. A token starting with whitespace opens a
/// new word; others extend the current one.
fn group_words(tokens: &[&TimedToken]) -> Vec<Word> {
    let mut words: Vec<Word> = Vec::new();

    for token in tokens {
        let trimmed = token.text.trim();
        if trimmed.is_empty() {
            continue;
        }
        let starts_word = token.text.starts_with(char::is_whitespace) || words.is_empty();
        if starts_word {
            words.push(Word {
                text: trimmed.to_string(),
                start: token.start.max(0.0),
                end: token.end,
                score: token.score,
            });
        } else if let Some(last) = words.last_mut() {
            last.text.push_str(trimmed);
            last.end = token.end;
            last.score = last.score.min(token.score);
        }
    }

    words
}

/// Mock alignment provider for testing.
#[derive(Debug, Clone, Default)]
pub struct MockAlignProvider {
    refined: Option<Transcription>,
    fail_load: bool,
    fail_align: bool,
    loads: Arc<AtomicUsize>,
}

impl MockAlignProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the result every loaded model returns. Without it the mock
    /// echoes its input unchanged.
    pub fn with_result(mut self, refined: Transcription) -> Self {
        self.refined = Some(refined);
        self
    }

    pub fn with_load_failure(mut self) -> Self {
        self.fail_load = true;
        self
    }

    pub fn with_failure(mut self) -> Self {
        self.fail_align = true;
        self
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AlignModelProvider for MockAlignProvider {
    async fn load(&self, language: &str, _device: DeviceKind) -> Result<Box<dyn AlignModel>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if self.fail_load {
            return Err(ScribeError::model_load(
                "alignment",
                format!("mock load failure for language '{language}'"),
            ));
        }
        Ok(Box::new(MockAlignModel {
            refined: self.refined.clone(),
            fail_align: self.fail_align,
        }))
    }
}

struct MockAlignModel {
    refined: Option<Transcription>,
    fail_align: bool,
}

impl AlignModel for MockAlignModel {
    fn align(&self, transcription: &Transcription, _audio: &[f32]) -> Result<Transcription> {
        if self.fail_align {
            return Err(ScribeError::inference("alignment", "mock align failure"));
        }
        Ok(self
            .refined
            .clone()
            .unwrap_or_else(|| transcription.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(text: &str, start: f64, end: f64) -> TimedToken {
        TimedToken {
            text: text.to_string(),
            start,
            end,
            score: 0.9,
        }
    }

    #[test]
    fn refine_snaps_boundaries_to_tokens() {
        let t = Transcription::new(vec![Segment::new(0.0, 5.0, "ola bom dia")], None);
        let tokens = vec![token(" ola", 0.4, 0.9), token(" bom", 1.2, 1.6), token(" dia", 1.7, 2.1)];

        let refined = refine_segments(&t, &tokens);

        assert_eq!(refined.segments.len(), 1);
        let seg = &refined.segments[0];
        assert!((seg.start - 0.4).abs() < 1e-9);
        assert!((seg.end - 2.1).abs() < 1e-9);
        assert_eq!(seg.words.len(), 3);
        assert_eq!(seg.words[0].text, "ola");
    }

    #[test]
    fn refine_preserves_segment_count() {
        let t = Transcription::new(
            vec![
                Segment::new(0.0, 2.0, "one"),
                Segment::new(2.0, 4.0, "two"),
                Segment::new(4.0, 6.0, "three"),
            ],
            Some("pt".to_string()),
        );
        let tokens = vec![token(" one", 0.5, 1.0)];

        let refined = refine_segments(&t, &tokens);

        assert_eq!(refined.segments.len(), 3);
        assert_eq!(refined.language.as_deref(), Some("pt"));
    }

    #[test]
    fn refine_keeps_original_timing_without_tokens() {
        let t = Transcription::new(vec![Segment::new(1.0, 2.0, "quiet")], None);

        let refined = refine_segments(&t, &[]);

        assert_eq!(refined.segments[0], t.segments[0]);
    }

    #[test]
    fn refined_timestamps_are_well_formed() {
        let t = Transcription::new(vec![Segment::new(0.0, 10.0, "speech")], None);
        // Token timings from a model can be noisy; output must still satisfy
        // 0 <= start <= end.
        let tokens = vec![token(" speech", -0.3, 0.7)];

        let refined = refine_segments(&t, &tokens);

        let seg = &refined.segments[0];
        assert!(seg.start >= 0.0);
        assert!(seg.start <= seg.end);
        assert!(seg.words.iter().all(|w| w.start >= 0.0 && w.start <= w.end));
    }

    #[test]
    fn subword_tokens_merge_into_one_word() {
        let t = Transcription::new(vec![Segment::new(0.0, 3.0, "observatorio")], None);
        let tokens = vec![
            token(" observa", 0.2, 0.8),
            token("torio", 0.8, 1.3),
        ];

        let refined = refine_segments(&t, &tokens);

        let words = &refined.segments[0].words;
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].text, "observatorio");
        assert!((words[0].start - 0.2).abs() < 1e-9);
        assert!((words[0].end - 1.3).abs() < 1e-9);
    }

    #[tokio::test]
    async fn mock_align_echoes_input_by_default() {
        let provider = MockAlignProvider::new();
        let model = provider.load("pt", DeviceKind::Cpu).await.unwrap();

        let t = Transcription::new(vec![Segment::new(0.0, 1.0, "echo")], None);
        let out = model.align(&t, &[]).unwrap();

        assert_eq!(out, t);
        assert_eq!(provider.load_count(), 1);
    }

    #[tokio::test]
    async fn mock_align_load_failure_names_language() {
        let provider = MockAlignProvider::new().with_load_failure();
        let result = provider.load("xx", DeviceKind::Cpu).await;

        match result {
            Err(ScribeError::ModelLoad { stage, message }) => {
                assert_eq!(stage, "alignment");
                assert!(message.contains("xx"));
            }
            _ => panic!("Expected ModelLoad error"),
        }
    }

    #[tokio::test]
    async fn mock_align_failure() {
        let provider = MockAlignProvider::new().with_failure();
        let model = provider.load("pt", DeviceKind::Cpu).await.unwrap();

        let t = Transcription::default();
        assert!(model.align(&t, &[]).is_err());
    }
}
