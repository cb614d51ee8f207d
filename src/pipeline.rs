//! Pipeline orchestrator.
//!
//! Runs one video through extract → transcribe → [align] → diarize →
//! render as a strict causal chain: stage N+1 never begins before stage N
//! returns Ok, and the first failure is terminal for the run. Model-bearing
//! stages acquire their model, use it, and hand it to the resource reclaimer
//! on every exit path, so a run never leaks scratch files or accelerator
//! memory whether it succeeds or fails.
//!
//! The accelerator and the scratch directory are process-wide shared state;
//! mutual exclusion is by this strict sequencing, not by locks. Concurrent
//! runs against the same scratch directory are unsupported.

use crate::asr::align::AlignModelProvider;
use crate::asr::transcriber::SpeechModelProvider;
use crate::asr::types::Transcription;
use crate::audio::{extract, wav};
use crate::config::Config;
use crate::defaults;
use crate::device::{DeviceKind, DeviceProbe, SystemDeviceProbe, select_device};
use crate::diarize::assign::{DiarizedTranscript, assign_speakers};
use crate::diarize::diarizer::DiarizerProvider;
use crate::error::{Result, ScribeError};
use crate::reclaim::reclaim;
use crate::report;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// States of one pipeline run. `Failed` is reachable from every non-terminal
/// state; there is no retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    Idle,
    Extracting,
    Transcribing,
    Aligning,
    Diarizing,
    Rendering,
    Done,
    Failed,
}

impl RunStage {
    pub fn label(self) -> &'static str {
        match self {
            RunStage::Idle => "idle",
            RunStage::Extracting => "extracting",
            RunStage::Transcribing => "transcribing",
            RunStage::Aligning => "aligning",
            RunStage::Diarizing => "diarizing",
            RunStage::Rendering => "rendering",
            RunStage::Done => "done",
            RunStage::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RunStage::Done | RunStage::Failed)
    }
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What a finished run produced.
///
/// `report_path` is `None` when the transcript was computed but the report
/// could not be written.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub transcript: DiarizedTranscript,
    pub report_path: Option<PathBuf>,
}

/// One-shot pipeline over injected model collaborators.
pub struct Pipeline {
    config: Config,
    probe: Arc<dyn DeviceProbe>,
    speech: Arc<dyn SpeechModelProvider>,
    aligner: Arc<dyn AlignModelProvider>,
    diarizer: Arc<dyn DiarizerProvider>,
    stage: RunStage,
}

impl Pipeline {
    /// Creates a pipeline with the system device probe.
    pub fn new(
        config: Config,
        speech: Arc<dyn SpeechModelProvider>,
        aligner: Arc<dyn AlignModelProvider>,
        diarizer: Arc<dyn DiarizerProvider>,
    ) -> Self {
        Self {
            config,
            probe: Arc::new(SystemDeviceProbe),
            speech,
            aligner,
            diarizer,
            stage: RunStage::Idle,
        }
    }

    /// Sets a custom device probe (for deterministic testing).
    pub fn with_device_probe(mut self, probe: Arc<dyn DeviceProbe>) -> Self {
        self.probe = probe;
        self
    }

    /// Current state of the run. Terminal after [`Pipeline::run`] returns.
    pub fn stage(&self) -> RunStage {
        self.stage
    }

    /// Run the full pipeline for one video.
    ///
    /// On success the diarized transcript has been handed to the report
    /// writer; a report that could not be written leaves
    /// `report_path: None` and is not a run failure. The scratch directory
    /// is swept at the end on every path.
    pub async fn run(&mut self, video: &Path) -> Result<RunOutcome> {
        self.stage = RunStage::Idle;
        let result = self.drive(video).await;

        // Lifecycle invariant: no run leaves artifacts behind, whether it
        // succeeded or failed. The per-stage reclaims already ran; this
        // final sweep is idempotent.
        reclaim(DeviceKind::Cpu, None::<()>, &self.config.storage.scratch_dir);

        result
    }

    async fn drive(&mut self, video: &Path) -> Result<RunOutcome> {
        let scratch = self.config.storage.scratch_dir.clone();

        self.advance(RunStage::Extracting);
        let audio_path = match extract::extract_audio(video, &scratch).await {
            Ok(path) => path,
            Err(e) => return self.fail(e),
        };

        // The in-memory buffer is the working copy from here on: stages may
        // purge the scratch directory between each other without racing the
        // next stage's input.
        let samples = match wav::load_samples(&audio_path) {
            Ok(samples) => Arc::new(samples),
            Err(e) => return self.fail(e),
        };
        info!(seconds = wav::duration_secs(&samples), "audio ready");

        self.advance(RunStage::Transcribing);
        let transcription = match self.transcribe_stage(Arc::clone(&samples)).await {
            Ok(t) => t,
            Err(e) => return self.fail(e),
        };
        info!(segments = transcription.segments.len(), "transcription finished");

        self.advance(RunStage::Diarizing);
        let transcript = match self
            .diarize_stage(Arc::clone(&samples), &transcription, &audio_path)
            .await
        {
            Ok(t) => t,
            Err(e) => return self.fail(e),
        };
        info!(segments = transcript.segments.len(), "speakers assigned");

        self.advance(RunStage::Rendering);
        let report_path =
            match report::write_report(&transcript, &self.config.storage.output_dir, video) {
                Ok(path) => Some(path),
                Err(e) => {
                    // Computed but not saved: the transcript survives, the
                    // missing file is the caller's failure signal.
                    error!(stage = %self.stage, "{e}");
                    None
                }
            };

        self.advance(RunStage::Done);
        Ok(RunOutcome {
            transcript,
            report_path,
        })
    }

    /// Load the speech model, run inference, optionally hand the result to
    /// the alignment stage, and reclaim exactly once on every exit path.
    async fn transcribe_stage(&mut self, samples: Arc<Vec<f32>>) -> Result<Transcription> {
        let scratch = self.config.storage.scratch_dir.clone();
        let device = select_device(self.probe.as_ref());
        let spec = self.config.model_spec();
        info!(%device, model = %spec.arch, "loading speech model");

        let model = match self.speech.load(device, &spec).await {
            Ok(model) => model,
            Err(e) => {
                reclaim(device, None::<()>, &scratch);
                return Err(e);
            }
        };

        let inference_input = Arc::clone(&samples);
        let joined = tokio::task::spawn_blocking(move || {
            let decoded = model.transcribe(&inference_input);
            (model, decoded)
        })
        .await;

        let (model, decoded) = match joined {
            Ok(pair) => pair,
            Err(e) => {
                reclaim(device, None::<()>, &scratch);
                return Err(ScribeError::inference(
                    "transcription",
                    format!("inference task failed: {e}"),
                ));
            }
        };

        let result = match decoded {
            Ok(transcription) if self.config.stt.align => {
                self.advance(RunStage::Aligning);
                self.align_stage(&transcription, Arc::clone(&samples), device)
                    .await
            }
            other => other,
        };

        reclaim(device, Some(model), &scratch);
        result
    }

    /// Nested inside the transcription stage: loads the alignment model by
    /// language code and refines the timestamps. The alignment model's
    /// lifetime ends here; device and scratch reclamation belong to the
    /// caller.
    async fn align_stage(
        &self,
        transcription: &Transcription,
        samples: Arc<Vec<f32>>,
        device: DeviceKind,
    ) -> Result<Transcription> {
        let language = transcription.language.clone().ok_or_else(|| {
            ScribeError::model_load("alignment", "transcription carries no language tag")
        })?;
        info!(language = language.as_str(), "loading alignment model");

        let model = self.aligner.load(&language, device).await?;

        let input = transcription.clone();
        tokio::task::spawn_blocking(move || {
            let refined = model.align(&input, &samples);
            drop(model);
            refined
        })
        .await
        .map_err(|e| ScribeError::inference("alignment", format!("alignment task failed: {e}")))?
    }

    /// Load the diarizer with the environment credential, attribute speakers
    /// by maximal overlap, and signal "done with audio" by deleting the
    /// working WAV before the stage's reclaim.
    async fn diarize_stage(
        &self,
        samples: Arc<Vec<f32>>,
        transcription: &Transcription,
        audio_path: &Path,
    ) -> Result<DiarizedTranscript> {
        let scratch = self.config.storage.scratch_dir.clone();
        let device = select_device(self.probe.as_ref());
        let token = std::env::var(defaults::TOKEN_ENV).ok();
        info!(%device, "loading diarization model");

        let model = match self.diarizer.load(device, token.as_deref()).await {
            Ok(model) => model,
            Err(e) => {
                reclaim(device, None::<()>, &scratch);
                return Err(e);
            }
        };

        let joined = tokio::task::spawn_blocking(move || {
            let turns = model.diarize(&samples);
            (model, turns)
        })
        .await;

        let (model, turns) = match joined {
            Ok(pair) => pair,
            Err(e) => {
                reclaim(device, None::<()>, &scratch);
                return Err(ScribeError::inference(
                    "diarization",
                    format!("diarization task failed: {e}"),
                ));
            }
        };

        let turns = match turns {
            Ok(turns) => turns,
            Err(e) => {
                reclaim(device, Some(model), &scratch);
                return Err(e);
            }
        };
        debug!(turns = turns.len(), "diarization finished");

        let transcript = assign_speakers(transcription, &turns);

        // Diarization input is no longer needed anywhere: drop the working
        // audio now instead of waiting for the end-of-run sweep.
        match std::fs::remove_file(audio_path) {
            Ok(()) => debug!(audio = %audio_path.display(), "working audio removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(audio = %audio_path.display(), "failed to remove working audio: {e}");
            }
        }

        reclaim(device, Some(model), &scratch);
        Ok(transcript)
    }

    fn advance(&mut self, next: RunStage) {
        debug!(from = %self.stage, to = %next, "stage transition");
        self.stage = next;
    }

    fn fail<T>(&mut self, err: ScribeError) -> Result<T> {
        error!(stage = %self.stage, "{err}");
        self.stage = RunStage::Failed;
        Err(err)
    }
}
