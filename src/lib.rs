//! vidscribe - Speaker-labeled transcripts from video files
//!
//! One-shot pipeline: extract audio, transcribe, optionally align
//! timestamps, diarize speakers, render a text report.

// Enforce error handling discipline
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod asr;
pub mod audio;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod defaults;
pub mod device;
#[cfg(feature = "cli")]
pub mod diagnostics;
pub mod diarize;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod reclaim;
pub mod report;

// Collaborator traits (the seams tests substitute stand-ins at)
pub use asr::align::{AlignModel, AlignModelProvider};
pub use asr::transcriber::{ModelSpec, SpeechModel, SpeechModelProvider};
pub use diarize::diarizer::{DiarizationModel, DiarizerProvider, Turn};

// Data shapes
pub use asr::types::{Segment, Transcription, Word};
pub use diarize::assign::{DiarizedTranscript, SpeakerSegment, UNKNOWN_SPEAKER};

// Pipeline
pub use pipeline::{Pipeline, RunOutcome, RunStage};

// Error handling
pub use error::{Result, ScribeError};

// Config
pub use config::Config;

// Device selection
pub use device::{DeviceKind, DeviceProbe, SystemDeviceProbe, select_device};

/// Build version string with optional git commit hash.
///
/// Returns `"0.3.1+abc1234"` when git hash is available, `"0.3.1"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
