//! Whisper-based speech recognition and alignment backends.
//!
//! Real implementations of the [`SpeechModelProvider`] and
//! [`AlignModelProvider`] collaborator traits on top of whisper.cpp via
//! whisper-rs.
//!
//! # Feature Gate
//!
//! These backends require the `whisper` feature (enabled by default) and
//! cmake to be installed. Without the feature the providers still exist but
//! fail at load time with build instructions, so the rest of the crate
//! compiles and the pipeline degrades into a clean stage failure.

use crate::asr::align::{AlignModel, AlignModelProvider};
use crate::asr::transcriber::{ModelSpec, SpeechModel, SpeechModelProvider};
use crate::device::DeviceKind;
use crate::error::{Result, ScribeError};
use async_trait::async_trait;
use std::path::PathBuf;

#[cfg(feature = "whisper")]
use crate::asr::align::{TimedToken, refine_segments};
#[cfg(feature = "whisper")]
use crate::asr::types::{Segment, Transcription};
#[cfg(feature = "whisper")]
use crate::defaults;
#[cfg(feature = "whisper")]
use std::sync::{Mutex, Once};
#[cfg(feature = "whisper")]
use tracing::debug;
#[cfg(feature = "whisper")]
use whisper_rs::{
    FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters, install_logging_hooks,
};

#[cfg(feature = "whisper")]
static LOGGING_HOOKS_INSTALLED: Once = Once::new();

/// Resolve the weight file for an architecture tier, downloading it on first
/// use when the `model-download` feature is available.
#[cfg_attr(not(feature = "whisper"), allow(dead_code))]
async fn resolve_weights(spec: &ModelSpec) -> Result<PathBuf> {
    let path = if spec.model_dir.as_os_str().is_empty() {
        crate::models::download::model_path(&spec.arch)
    } else {
        spec.model_dir.join(format!("ggml-{}.bin", spec.arch))
    };

    if path.exists() {
        return Ok(path);
    }

    #[cfg(feature = "model-download")]
    {
        crate::models::download::download_model_to(&spec.arch, &path, true).await
    }
    #[cfg(not(feature = "model-download"))]
    {
        Err(ScribeError::model_load(
            "transcription",
            format!(
                "model weights not found at {} and this build cannot download them",
                path.display()
            ),
        ))
    }
}

/// Speech model provider backed by whisper.cpp.
#[derive(Debug, Default, Clone)]
pub struct WhisperSpeechProvider;

/// Alignment provider backed by a second whisper.cpp decode with per-word
/// timestamps.
///
/// The multilingual weights serve every language; the language code passed to
/// [`AlignModelProvider::load`] pins decoding so the alignment pass cannot
/// drift into another language.
#[derive(Debug, Clone)]
pub struct WhisperAlignProvider {
    #[cfg_attr(not(feature = "whisper"), allow(dead_code))]
    spec: ModelSpec,
}

impl WhisperAlignProvider {
    pub fn new(spec: ModelSpec) -> Self {
        Self { spec }
    }
}

#[cfg(feature = "whisper")]
mod backend {
    use super::*;

    /// Load a whisper context for the given device, reporting failures
    /// against the named pipeline stage.
    pub(super) fn load_context(
        path: &PathBuf,
        device: DeviceKind,
        stage: &str,
    ) -> Result<WhisperContext> {
        // Install logging hooks to suppress whisper.cpp output (only once)
        LOGGING_HOOKS_INSTALLED.call_once(|| {
            install_logging_hooks();
        });

        let mut context_params = WhisperContextParameters::default();
        context_params.use_gpu(device.is_accelerator());
        // Fused attention kernels avoid the standalone softmax CUDA kernel,
        // which crashes on Blackwell GPUs (sm_120) with ggml <= 1.7.6
        context_params.flash_attn(device.is_accelerator());

        WhisperContext::new_with_params(
            path.to_str()
                .ok_or_else(|| ScribeError::model_load(stage, "Invalid UTF-8 in model path"))?,
            context_params,
        )
        .map_err(|e| ScribeError::model_load(stage, format!("Failed to load model: {}", e)))
    }

    pub(super) struct WhisperSpeechModel {
        pub(super) context: Mutex<WhisperContext>,
        pub(super) language: String,
        pub(super) name: String,
    }

    impl SpeechModel for WhisperSpeechModel {
        fn transcribe(&self, audio: &[f32]) -> Result<Transcription> {
            let context = self.context.lock().map_err(|e| {
                ScribeError::inference("transcription", format!("context lock poisoned: {}", e))
            })?;

            let mut state = context.create_state().map_err(|e| {
                ScribeError::inference("transcription", format!("Failed to create state: {}", e))
            })?;

            let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
            if self.language == defaults::AUTO_LANGUAGE {
                params.set_language(None);
            } else {
                params.set_language(Some(&self.language));
            }
            params.set_translate(false);
            params.set_print_special(false);
            params.set_print_progress(false);
            params.set_print_realtime(false);
            params.set_print_timestamps(false);

            state.full(params, audio).map_err(|e| {
                ScribeError::inference("transcription", format!("decode failed: {}", e))
            })?;

            let lang_id = state.full_lang_id_from_state();
            let language = whisper_rs::get_lang_str(lang_id).map(str::to_string);

            let mut segments = Vec::new();
            for segment in state.as_iter() {
                let text = segment.to_string().trim().to_string();
                if text.is_empty() {
                    continue;
                }
                // whisper timestamps are centiseconds
                segments.push(Segment::new(
                    segment.start_timestamp() as f64 / 100.0,
                    segment.end_timestamp() as f64 / 100.0,
                    text,
                ));
            }

            debug!(segments = segments.len(), "whisper decode finished");
            Ok(Transcription::new(segments, language))
        }

        fn model_name(&self) -> &str {
            &self.name
        }
    }

    pub(super) struct WhisperAlignModel {
        pub(super) context: Mutex<WhisperContext>,
        pub(super) language: String,
    }

    impl WhisperAlignModel {
        /// Decode with one-word segments and acoustic token timestamps,
        /// yielding the timed tokens the refinement pass snaps to.
        fn decode_words(&self, audio: &[f32]) -> Result<Vec<TimedToken>> {
            let context = self.context.lock().map_err(|e| {
                ScribeError::inference("alignment", format!("context lock poisoned: {}", e))
            })?;

            let mut state = context.create_state().map_err(|e| {
                ScribeError::inference("alignment", format!("Failed to create state: {}", e))
            })?;

            let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
            params.set_language(Some(&self.language));
            params.set_translate(false);
            params.set_token_timestamps(true);
            params.set_split_on_word(true);
            params.set_max_len(1);
            params.set_print_special(false);
            params.set_print_progress(false);
            params.set_print_realtime(false);
            params.set_print_timestamps(false);

            state.full(params, audio).map_err(|e| {
                ScribeError::inference("alignment", format!("decode failed: {}", e))
            })?;

            let mut tokens = Vec::new();
            for segment in state.as_iter() {
                let text = segment.to_string();
                if text.trim().is_empty() {
                    continue;
                }
                tokens.push(TimedToken {
                    start: segment.start_timestamp() as f64 / 100.0,
                    end: segment.end_timestamp() as f64 / 100.0,
                    score: (1.0 - segment.no_speech_probability()).clamp(0.0, 1.0),
                    text,
                });
            }
            Ok(tokens)
        }
    }

    impl AlignModel for WhisperAlignModel {
        fn align(&self, transcription: &Transcription, audio: &[f32]) -> Result<Transcription> {
            let tokens = self.decode_words(audio)?;
            Ok(refine_segments(transcription, &tokens))
        }
    }
}

#[cfg(feature = "whisper")]
#[async_trait]
impl SpeechModelProvider for WhisperSpeechProvider {
    async fn load(&self, device: DeviceKind, spec: &ModelSpec) -> Result<Box<dyn SpeechModel>> {
        let path = resolve_weights(spec).await?;
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown")
            .to_string();
        let language = spec.language.clone();

        // Context creation parses the full weight file; keep it off the
        // async executor.
        let context =
            tokio::task::spawn_blocking(move || backend::load_context(&path, device, "transcription"))
                .await
                .map_err(|e| {
                    ScribeError::model_load("transcription", format!("load task failed: {}", e))
                })??;

        Ok(Box::new(backend::WhisperSpeechModel {
            context: Mutex::new(context),
            language,
            name,
        }))
    }
}

#[cfg(feature = "whisper")]
#[async_trait]
impl AlignModelProvider for WhisperAlignProvider {
    async fn load(&self, language: &str, device: DeviceKind) -> Result<Box<dyn AlignModel>> {
        let path = resolve_weights(&self.spec).await.map_err(|e| {
            ScribeError::model_load("alignment", e.to_string())
        })?;
        let language = language.to_string();

        let context =
            tokio::task::spawn_blocking(move || backend::load_context(&path, device, "alignment"))
                .await
                .map_err(|e| {
                    ScribeError::model_load("alignment", format!("load task failed: {}", e))
                })??;

        Ok(Box::new(backend::WhisperAlignModel {
            context: Mutex::new(context),
            language,
        }))
    }
}

#[cfg(not(feature = "whisper"))]
#[async_trait]
impl SpeechModelProvider for WhisperSpeechProvider {
    async fn load(&self, _device: DeviceKind, _spec: &ModelSpec) -> Result<Box<dyn SpeechModel>> {
        Err(ScribeError::model_load(
            "transcription",
            concat!(
                "Whisper feature not enabled. This binary was built without speech recognition.\n",
                "To fix: cargo build --release (whisper is enabled by default)\n",
                "If build fails with cmake errors, install: sudo apt install cmake"
            ),
        ))
    }
}

#[cfg(not(feature = "whisper"))]
#[async_trait]
impl AlignModelProvider for WhisperAlignProvider {
    async fn load(&self, _language: &str, _device: DeviceKind) -> Result<Box<dyn AlignModel>> {
        Err(ScribeError::model_load(
            "alignment",
            "Whisper feature not enabled; rebuild with the default feature set",
        ))
    }
}
