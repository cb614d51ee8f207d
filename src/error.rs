//! Error types for vidscribe.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScribeError {
    // Input errors
    #[error("Input video not found at {path}")]
    MissingInput { path: String },

    // Audio extraction errors
    #[error("Audio extraction failed: {message}")]
    Extraction { message: String },

    // Model lifecycle errors
    #[error("Failed to load {stage} model: {message}")]
    ModelLoad { stage: String, message: String },

    #[error("Missing credential: set the {var} environment variable")]
    MissingCredential { var: String },

    #[error("{stage} inference failed: {message}")]
    Inference { stage: String, message: String },

    // Model download errors
    #[error("Model download failed: {message}")]
    Download { message: String },

    // Report errors
    #[error("Failed to write report to {path}: {message}")]
    Persistence { path: String, message: String },

    // Configuration errors
    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

impl ScribeError {
    /// Build a model-load error for a named pipeline stage.
    pub fn model_load(stage: &str, message: impl Into<String>) -> Self {
        ScribeError::ModelLoad {
            stage: stage.to_string(),
            message: message.into(),
        }
    }

    /// Build an inference error for a named pipeline stage.
    pub fn inference(stage: &str, message: impl Into<String>) -> Self {
        ScribeError::Inference {
            stage: stage.to_string(),
            message: message.into(),
        }
    }
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, ScribeError>;
