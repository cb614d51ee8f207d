//! Speech-to-text collaborator traits.
//!
//! The pipeline never talks to a concrete model: it loads a [`SpeechModel`]
//! through a [`SpeechModelProvider`] and runs inference through the trait, so
//! tests substitute deterministic stand-ins without any model weights.

use crate::asr::types::Transcription;
use crate::device::DeviceKind;
use crate::error::{Result, ScribeError};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Numeric precision the model runs at. Fixed per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Precision {
    #[default]
    Float32,
    Float16,
}

impl Precision {
    pub fn as_str(self) -> &'static str {
        match self {
            Precision::Float32 => "float32",
            Precision::Float16 => "float16",
        }
    }
}

/// Load-time parameters for the speech model.
#[derive(Debug, Clone)]
pub struct ModelSpec {
    /// Architecture tier, e.g. "tiny", "base", "small".
    pub arch: String,
    /// Target language code, or "auto" for detection.
    pub language: String,
    pub precision: Precision,
    /// Local weight cache; weights are fetched here on first use.
    pub model_dir: PathBuf,
    /// Windows per inference call, for backends that batch.
    pub batch_size: usize,
}

impl Default for ModelSpec {
    fn default() -> Self {
        Self {
            arch: crate::defaults::DEFAULT_MODEL.to_string(),
            language: crate::defaults::DEFAULT_LANGUAGE.to_string(),
            precision: Precision::default(),
            model_dir: PathBuf::new(),
            batch_size: crate::defaults::BATCH_SIZE,
        }
    }
}

/// A loaded speech-recognition model.
///
/// Dropping the handle releases the weights, on the accelerator included.
pub trait SpeechModel: Send {
    /// Transcribe normalized mono 16 kHz samples into timed segments.
    fn transcribe(&self, audio: &[f32]) -> Result<Transcription>;

    /// Name of the loaded model, for logs.
    fn model_name(&self) -> &str;
}

/// Loads speech models for a device.
#[async_trait]
pub trait SpeechModelProvider: Send + Sync {
    async fn load(&self, device: DeviceKind, spec: &ModelSpec) -> Result<Box<dyn SpeechModel>>;
}

/// Mock speech model provider for testing.
///
/// Counts loads so tests can assert the short-circuit property: a stage that
/// never ran never loaded its model.
#[derive(Debug, Clone, Default)]
pub struct MockSpeechProvider {
    transcription: Transcription,
    fail_load: bool,
    fail_inference: bool,
    loads: Arc<AtomicUsize>,
}

impl MockSpeechProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the transcription every loaded model returns.
    pub fn with_transcription(mut self, transcription: Transcription) -> Self {
        self.transcription = transcription;
        self
    }

    /// Configure the provider to fail at load time.
    pub fn with_load_failure(mut self) -> Self {
        self.fail_load = true;
        self
    }

    /// Configure loaded models to fail at inference time.
    pub fn with_inference_failure(mut self) -> Self {
        self.fail_inference = true;
        self
    }

    /// Number of successful and failed load attempts so far.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechModelProvider for MockSpeechProvider {
    async fn load(&self, _device: DeviceKind, spec: &ModelSpec) -> Result<Box<dyn SpeechModel>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if self.fail_load {
            return Err(ScribeError::model_load(
                "transcription",
                "mock load failure",
            ));
        }
        Ok(Box::new(MockSpeechModel {
            name: format!("mock-{}", spec.arch),
            transcription: self.transcription.clone(),
            fail_inference: self.fail_inference,
        }))
    }
}

struct MockSpeechModel {
    name: String,
    transcription: Transcription,
    fail_inference: bool,
}

impl SpeechModel for MockSpeechModel {
    fn transcribe(&self, _audio: &[f32]) -> Result<Transcription> {
        if self.fail_inference {
            return Err(ScribeError::inference(
                "transcription",
                "mock inference failure",
            ));
        }
        Ok(self.transcription.clone())
    }

    fn model_name(&self) -> &str {
        &self.name
    }
}
