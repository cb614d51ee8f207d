//! Whisper model metadata catalog.
//!
//! Static catalog of the ggml weight files the speech backend can run,
//! including sizes for download display and alias resolution for friendly
//! names.

/// Metadata for a Whisper model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInfo {
    /// Model identifier (e.g., "tiny", "small", "large-v3-turbo")
    pub name: &'static str,
    /// Model size in megabytes
    pub size_mb: u32,
    /// Whether this model supports English only
    pub english_only: bool,
}

impl ModelInfo {
    /// Download URL on Hugging Face.
    pub fn url(&self) -> String {
        format!(
            "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-{}.bin",
            self.name
        )
    }
}

/// Catalog of available Whisper models.
///
/// Models range from tiny (75 MB, fast, lower accuracy) to large (1.6 GB,
/// slower, highest accuracy). The `.en` suffix indicates English-only
/// variants; multilingual variants are required for the fixed non-English
/// target language.
pub const MODELS: &[ModelInfo] = &[
    ModelInfo {
        name: "tiny",
        size_mb: 75,
        english_only: false,
    },
    ModelInfo {
        name: "tiny.en",
        size_mb: 75,
        english_only: true,
    },
    ModelInfo {
        name: "base",
        size_mb: 142,
        english_only: false,
    },
    ModelInfo {
        name: "base.en",
        size_mb: 142,
        english_only: true,
    },
    ModelInfo {
        name: "small",
        size_mb: 466,
        english_only: false,
    },
    ModelInfo {
        name: "small.en",
        size_mb: 466,
        english_only: true,
    },
    ModelInfo {
        name: "medium",
        size_mb: 1533,
        english_only: false,
    },
    ModelInfo {
        name: "large-v3-turbo",
        size_mb: 1620,
        english_only: false,
    },
];

/// Resolve a friendly alias to a catalog name.
///
/// "large" points at the current best large variant so configs survive
/// upstream renames. Unknown names pass through unchanged.
pub fn resolve_name(name: &str) -> &str {
    match name {
        "large" => "large-v3-turbo",
        other => other,
    }
}

/// Look up a model by name (after alias resolution).
pub fn get_model(name: &str) -> Option<&'static ModelInfo> {
    let resolved = resolve_name(name);
    MODELS.iter().find(|m| m.name == resolved)
}

/// All catalog models.
pub fn list_models() -> &'static [ModelInfo] {
    MODELS
}
