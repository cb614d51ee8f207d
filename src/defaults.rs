//! Default configuration constants for vidscribe.
//!
//! This module provides shared constants used across different configuration types
//! to ensure consistency and eliminate duplication.

/// Canonical audio sample rate in Hz.
///
/// 16kHz is the standard for speech recognition and provides a good balance
/// between quality and computational efficiency. The extractor resamples every
/// audio track to this rate before any model sees it.
pub const SAMPLE_RATE: u32 = 16000;

/// Default Whisper model architecture tier.
///
/// "small" trades accuracy against load time and memory; the tier is
/// configurable, the target language is not.
pub const DEFAULT_MODEL: &str = "small";

/// Target language code for transcription.
///
/// The pipeline transcribes a single fixed language per deployment; the
/// alignment model is selected by this code as well.
pub const DEFAULT_LANGUAGE: &str = "pt";

/// Language value that triggers automatic language detection.
pub const AUTO_LANGUAGE: &str = "auto";

/// Default number of audio windows submitted to the speech model per
/// inference call, for backends that batch.
pub const BATCH_SIZE: usize = 16;

/// Filename of the compressed audio track pulled out of the video container.
///
/// Lives at a fixed, non-namespaced path inside the scratch directory:
/// a second concurrent run against the same scratch directory would collide,
/// which is explicitly unsupported.
pub const AUDIO_TRACK_FILE: &str = "audio.mp3";

/// Filename of the canonical mono 16 kHz WAV the models consume.
pub const PROCESSED_WAV_FILE: &str = "processed_audio.wav";

/// Prefix of the report file written next to other run outputs:
/// `transcription_<video_stem>.txt`.
pub const REPORT_PREFIX: &str = "transcription_";

/// Width of the separator line between report blocks.
pub const REPORT_SEPARATOR_WIDTH: usize = 40;

/// Environment variable holding the diarization-service access token.
pub const TOKEN_ENV: &str = "HF_TOKEN";

/// Maximum number of distinct speakers the diarizer will track.
pub const MAX_SPEAKERS: usize = 6;

/// Cosine-similarity threshold for matching a segment embedding to a known
/// speaker. Above the threshold the segment joins the existing speaker,
/// below it a new speaker is opened (up to [`MAX_SPEAKERS`]).
pub const SPEAKER_MATCH_THRESHOLD: f32 = 0.5;

/// Report the GPU backend compiled into this build.
///
/// Returns a human-readable name based on the compile-time feature flags.
/// Only one GPU backend can be active at a time; if none is enabled, returns "CPU".
pub fn gpu_backend() -> &'static str {
    if cfg!(feature = "cuda") {
        "CUDA"
    } else if cfg!(feature = "vulkan") {
        "Vulkan"
    } else if cfg!(feature = "hipblas") {
        "HipBLAS (AMD)"
    } else if cfg!(feature = "openblas") {
        "OpenBLAS"
    } else {
        "CPU"
    }
}
