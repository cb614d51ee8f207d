//! Run configuration.
//!
//! One explicit value object covers the whole run: model selection, language,
//! diarization clustering, and the scratch/output directories. It is loaded
//! once, adjusted by CLI overrides, and passed to the pipeline at
//! construction time. No process-wide mutable state.

use crate::asr::transcriber::ModelSpec;
use crate::defaults;
use crate::error::{Result, ScribeError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub stt: SttConfig,
    pub diarization: DiarizationConfig,
    pub storage: StorageConfig,
}

/// Speech-to-text configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SttConfig {
    /// Model architecture tier (e.g. "small")
    pub model: String,
    /// Fixed target language code
    pub language: String,
    /// Windows per inference call, for backends that batch
    pub batch_size: usize,
    /// Refine timestamps with the alignment stage
    pub align: bool,
}

/// Diarization clustering configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DiarizationConfig {
    pub max_speakers: usize,
    pub match_threshold: f32,
}

/// Filesystem layout for one run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    /// Single-run scratch directory holding the two transient audio artifacts
    pub scratch_dir: PathBuf,
    /// Where the report file is written
    pub output_dir: PathBuf,
    /// Local model weight cache; empty means the shared user cache
    pub model_dir: Option<PathBuf>,
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            model: defaults::DEFAULT_MODEL.to_string(),
            language: defaults::DEFAULT_LANGUAGE.to_string(),
            batch_size: defaults::BATCH_SIZE,
            align: false,
        }
    }
}

impl Default for DiarizationConfig {
    fn default() -> Self {
        Self {
            max_speakers: defaults::MAX_SPEAKERS,
            match_threshold: defaults::SPEAKER_MATCH_THRESHOLD,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            scratch_dir: std::env::temp_dir().join("vidscribe"),
            output_dir: PathBuf::from("."),
            model_dir: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only falls back to defaults when the file is missing; invalid TOML is
    /// an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(ScribeError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - VIDSCRIBE_MODEL → stt.model
    /// - VIDSCRIBE_LANGUAGE → stt.language
    /// - VIDSCRIBE_SCRATCH_DIR → storage.scratch_dir
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(model) = std::env::var("VIDSCRIBE_MODEL")
            && !model.is_empty()
        {
            self.stt.model = model;
        }

        if let Ok(language) = std::env::var("VIDSCRIBE_LANGUAGE")
            && !language.is_empty()
        {
            self.stt.language = language;
        }

        if let Ok(scratch) = std::env::var("VIDSCRIBE_SCRATCH_DIR")
            && !scratch.is_empty()
        {
            self.storage.scratch_dir = PathBuf::from(scratch);
        }

        self
    }

    /// Reject values no stage can work with.
    pub fn validate(&self) -> Result<()> {
        if self.stt.batch_size == 0 {
            return Err(ScribeError::ConfigInvalidValue {
                key: "stt.batch_size".to_string(),
                message: "must be positive".to_string(),
            });
        }
        if self.diarization.max_speakers == 0 {
            return Err(ScribeError::ConfigInvalidValue {
                key: "diarization.max_speakers".to_string(),
                message: "must be positive".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.diarization.match_threshold) {
            return Err(ScribeError::ConfigInvalidValue {
                key: "diarization.match_threshold".to_string(),
                message: "must be within [0.0, 1.0]".to_string(),
            });
        }
        Ok(())
    }

    /// Load-time parameters for the speech model, derived from this config.
    pub fn model_spec(&self) -> ModelSpec {
        ModelSpec {
            arch: self.stt.model.clone(),
            language: self.stt.language.clone(),
            precision: Default::default(),
            model_dir: self.storage.model_dir.clone().unwrap_or_default(),
            batch_size: self.stt.batch_size,
        }
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/vidscribe/config.toml on Linux
    pub fn default_path() -> PathBuf {
        #[cfg(feature = "cli")]
        if let Some(dir) = dirs::config_dir() {
            return dir.join("vidscribe").join("config.toml");
        }

        std::env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_default()
            .join(".config")
            .join("vidscribe")
            .join("config.toml")
    }
}
