//! Diarization collaborator traits.
//!
//! The diarizer partitions raw audio into speaker-attributed time intervals,
//! independent of transcription content. Loading requires an access
//! credential for the gated model weights; its absence is a load failure.

use crate::device::DeviceKind;
use crate::error::{Result, ScribeError};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A speaker-attributed interval, e.g. `("SPEAKER_00", 0.0, 30.0)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Turn {
    pub speaker: String,
    /// Start offset in seconds.
    pub start: f64,
    /// End offset in seconds.
    pub end: f64,
}

impl Turn {
    pub fn new(speaker: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            speaker: speaker.into(),
            start,
            end,
        }
    }
}

/// A loaded diarization model.
pub trait DiarizationModel: Send {
    /// Partition normalized mono 16 kHz samples into ordered speaker turns.
    fn diarize(&self, audio: &[f32]) -> Result<Vec<Turn>>;
}

/// Loads diarization models.
#[async_trait]
pub trait DiarizerProvider: Send + Sync {
    /// Load the diarizer onto `device`, authenticating with `auth_token`.
    ///
    /// A missing token fails with [`ScribeError::MissingCredential`] before
    /// any network or device work.
    async fn load(
        &self,
        device: DeviceKind,
        auth_token: Option<&str>,
    ) -> Result<Box<dyn DiarizationModel>>;
}

/// Mock diarizer provider for testing.
///
/// Counts loads so tests can assert that a failed transcription stage never
/// reaches diarization.
#[derive(Debug, Clone, Default)]
pub struct MockDiarizerProvider {
    turns: Vec<Turn>,
    fail_load: bool,
    fail_inference: bool,
    require_token: bool,
    loads: Arc<AtomicUsize>,
}

impl MockDiarizerProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the turns every loaded model returns.
    pub fn with_turns(mut self, turns: Vec<Turn>) -> Self {
        self.turns = turns;
        self
    }

    pub fn with_load_failure(mut self) -> Self {
        self.fail_load = true;
        self
    }

    pub fn with_inference_failure(mut self) -> Self {
        self.fail_inference = true;
        self
    }

    /// Make the mock enforce the credential contract like the real provider.
    pub fn requiring_token(mut self) -> Self {
        self.require_token = true;
        self
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DiarizerProvider for MockDiarizerProvider {
    async fn load(
        &self,
        _device: DeviceKind,
        auth_token: Option<&str>,
    ) -> Result<Box<dyn DiarizationModel>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if self.require_token && auth_token.is_none() {
            return Err(ScribeError::MissingCredential {
                var: crate::defaults::TOKEN_ENV.to_string(),
            });
        }
        if self.fail_load {
            return Err(ScribeError::model_load("diarization", "mock load failure"));
        }
        Ok(Box::new(MockDiarizationModel {
            turns: self.turns.clone(),
            fail_inference: self.fail_inference,
        }))
    }
}

struct MockDiarizationModel {
    turns: Vec<Turn>,
    fail_inference: bool,
}

impl DiarizationModel for MockDiarizationModel {
    fn diarize(&self, _audio: &[f32]) -> Result<Vec<Turn>> {
        if self.fail_inference {
            return Err(ScribeError::inference(
                "diarization",
                "mock inference failure",
            ));
        }
        Ok(self.turns.clone())
    }
}
