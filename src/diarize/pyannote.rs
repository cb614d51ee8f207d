//! Pyannote-based diarization backend.
//!
//! Real implementation of the [`DiarizerProvider`] collaborator: pyannote
//! segmentation splits the audio into speech turns, a speaker-embedding model
//! clusters them into speaker identities. Both ONNX weight files are gated on
//! Hugging Face and fetched with the caller's access token.
//!
//! # Feature Gate
//!
//! Requires the `diarization` feature (enabled by default). Without it the
//! provider still exists but fails at load time, which the pipeline reports
//! as a clean stage failure.

use crate::diarize::diarizer::{DiarizationModel, DiarizerProvider, Turn};
use crate::defaults;
use crate::device::DeviceKind;
use crate::error::{Result, ScribeError};
use async_trait::async_trait;

#[cfg(feature = "diarization")]
use std::path::PathBuf;
#[cfg(feature = "diarization")]
use std::sync::Mutex;
#[cfg(feature = "diarization")]
use tracing::{debug, warn};

/// Gated segmentation weights (speech-turn boundaries).
#[cfg(feature = "diarization")]
const SEGMENTATION_REPO: &str = "pyannote/segmentation-3.0";
#[cfg(feature = "diarization")]
const SEGMENTATION_FILE: &str = "segmentation-3.0.onnx";

/// Speaker-embedding weights (turn clustering).
#[cfg(feature = "diarization")]
const EMBEDDING_REPO: &str = "pyannote/wespeaker-voxceleb-resnet34-LM";
#[cfg(feature = "diarization")]
const EMBEDDING_FILE: &str = "speaker-embedding.onnx";

/// Diarizer provider backed by pyannote ONNX models.
#[derive(Debug, Default, Clone)]
pub struct PyannoteDiarizerProvider {
    max_speakers: usize,
    match_threshold: f32,
}

impl PyannoteDiarizerProvider {
    pub fn new(max_speakers: usize, match_threshold: f32) -> Self {
        Self {
            max_speakers,
            match_threshold,
        }
    }
}

#[cfg(feature = "diarization")]
async fn fetch_weights(repo: &str, file: &str, token: &str) -> Result<PathBuf> {
    let api = hf_hub::api::tokio::ApiBuilder::new()
        .with_token(Some(token.to_string()))
        .build()
        .map_err(|e| {
            ScribeError::model_load("diarization", format!("hub client init failed: {}", e))
        })?;

    api.model(repo.to_string()).get(file).await.map_err(|e| {
        ScribeError::model_load(
            "diarization",
            format!(
                "failed to fetch {repo}/{file}: {e}. \
                 Accept the model's conditions on Hugging Face and check your token"
            ),
        )
    })
}

#[cfg(feature = "diarization")]
#[async_trait]
impl DiarizerProvider for PyannoteDiarizerProvider {
    async fn load(
        &self,
        device: DeviceKind,
        auth_token: Option<&str>,
    ) -> Result<Box<dyn DiarizationModel>> {
        let token = auth_token.ok_or_else(|| ScribeError::MissingCredential {
            var: defaults::TOKEN_ENV.to_string(),
        })?;

        let segmentation = fetch_weights(SEGMENTATION_REPO, SEGMENTATION_FILE, token).await?;
        let embedding = fetch_weights(EMBEDDING_REPO, EMBEDDING_FILE, token).await?;

        // ONNX Runtime binds its execution provider at build time; the
        // device choice is recorded so the run log matches the other stages.
        debug!(%device, "diarization models resolved");

        let extractor = pyannote_rs::EmbeddingExtractor::new(&embedding).map_err(|e| {
            ScribeError::model_load("diarization", format!("embedding model load failed: {}", e))
        })?;

        Ok(Box::new(PyannoteModel {
            segmentation,
            extractor: Mutex::new(extractor),
            max_speakers: self.max_speakers,
            match_threshold: self.match_threshold,
        }))
    }
}

#[cfg(feature = "diarization")]
struct PyannoteModel {
    segmentation: PathBuf,
    extractor: Mutex<pyannote_rs::EmbeddingExtractor>,
    max_speakers: usize,
    match_threshold: f32,
}

#[cfg(feature = "diarization")]
impl DiarizationModel for PyannoteModel {
    fn diarize(&self, audio: &[f32]) -> Result<Vec<Turn>> {
        // pyannote-rs consumes 16-bit PCM
        let samples: Vec<i16> = audio
            .iter()
            .map(|&s| (s.clamp(-1.0, 1.0) * 32767.0) as i16)
            .collect();

        let segments =
            pyannote_rs::segment(&samples, defaults::SAMPLE_RATE, &self.segmentation).map_err(
                |e| ScribeError::inference("diarization", format!("segmentation failed: {}", e)),
            )?;

        let mut extractor = self.extractor.lock().map_err(|e| {
            ScribeError::inference("diarization", format!("extractor lock poisoned: {}", e))
        })?;
        let mut manager = pyannote_rs::EmbeddingManager::new(self.max_speakers);

        let mut turns = Vec::new();
        for segment in segments {
            let embedding: Vec<f32> = match extractor.compute(&segment.samples) {
                Ok(embedding) => embedding.collect(),
                Err(e) => {
                    // A single unreadable turn does not sink the run; it just
                    // stays unattributed.
                    warn!(
                        start = segment.start,
                        end = segment.end,
                        "speaker embedding failed: {e}"
                    );
                    continue;
                }
            };

            let speaker = if manager.get_all_speakers().len() == self.max_speakers {
                manager.get_best_speaker_match(embedding).ok()
            } else {
                manager.search_speaker(embedding, self.match_threshold)
            };

            if let Some(id) = speaker {
                turns.push(Turn::new(
                    format!("SPEAKER_{:02}", id),
                    segment.start,
                    segment.end,
                ));
            }
        }

        Ok(turns)
    }
}

#[cfg(not(feature = "diarization"))]
#[async_trait]
impl DiarizerProvider for PyannoteDiarizerProvider {
    async fn load(
        &self,
        _device: DeviceKind,
        auth_token: Option<&str>,
    ) -> Result<Box<dyn DiarizationModel>> {
        // The credential contract holds in every build
        auth_token.ok_or_else(|| ScribeError::MissingCredential {
            var: defaults::TOKEN_ENV.to_string(),
        })?;
        Err(ScribeError::model_load(
            "diarization",
            "Diarization feature not enabled; rebuild with the default feature set",
        ))
    }
}
