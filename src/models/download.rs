//! Model download and installation management.
//!
//! Handles downloading Whisper weights from Hugging Face and storing them in
//! the user's cache directory. Diarization weights are gated and fetched
//! elsewhere with the access token; the files here are public.

use crate::models::catalog::{ModelInfo, resolve_name};
use std::path::PathBuf;

#[cfg(feature = "model-download")]
use crate::error::{Result, ScribeError};
#[cfg(feature = "model-download")]
use crate::models::catalog::get_model;
#[cfg(feature = "model-download")]
use std::path::Path;

#[cfg(feature = "model-download")]
use futures_util::StreamExt;
#[cfg(feature = "model-download")]
use indicatif::{ProgressBar, ProgressStyle};
#[cfg(feature = "model-download")]
use std::io::Write;

/// Get the directory where models are stored.
///
/// Uses `~/.cache/vidscribe/models/` on Linux/Unix.
pub fn models_dir() -> PathBuf {
    #[cfg(feature = "model-download")]
    let base = dirs::cache_dir().unwrap_or_else(|| PathBuf::from(".cache"));
    #[cfg(not(feature = "model-download"))]
    let base = std::env::var_os("XDG_CACHE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(".cache"));

    base.join("vidscribe").join("models")
}

/// Get the full path for a model file in the cache.
///
/// Always returns a path regardless of whether the model is in the catalog.
/// The file may or may not exist on disk.
pub fn model_path(name: &str) -> PathBuf {
    let resolved = resolve_name(name);
    models_dir().join(format!("ggml-{resolved}.bin"))
}

/// Check if a model is installed in the cache.
pub fn is_model_installed(name: &str) -> bool {
    model_path(name).exists()
}

/// Download a Whisper model into the cache, returning its path.
#[cfg(feature = "model-download")]
pub async fn download_model(name: &str, progress: bool) -> Result<PathBuf> {
    let path = model_path(name);
    download_model_to(name, &path, progress).await
}

/// Download a Whisper model to an explicit location.
///
/// Skips the download when the file already exists.
#[cfg(feature = "model-download")]
pub async fn download_model_to(name: &str, output_path: &Path, progress: bool) -> Result<PathBuf> {
    if output_path.exists() {
        return Ok(output_path.to_path_buf());
    }

    let info = get_model(name).ok_or_else(|| ScribeError::Download {
        message: format!(
            "Unknown model '{name}'. Run `vidscribe models list` to see available models."
        ),
    })?;

    download_to_path(info, output_path, progress).await?;
    Ok(output_path.to_path_buf())
}

/// Core download: fetch the catalog URL and stream it to `output_path`.
#[cfg(feature = "model-download")]
async fn download_to_path(info: &ModelInfo, output_path: &Path, progress: bool) -> Result<()> {
    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ScribeError::Download {
            message: format!("Failed to create models directory: {e}"),
        })?;
    }

    if progress {
        eprintln!("Downloading {} ({} MB)...", info.name, info.size_mb);
    }

    let client = reqwest::Client::new();
    let response = client
        .get(info.url())
        .send()
        .await
        .map_err(|e| ScribeError::Download {
            message: format!("Failed to start download: {e}"),
        })?;

    if !response.status().is_success() {
        return Err(ScribeError::Download {
            message: format!("Download failed with status: {}", response.status()),
        });
    }

    let total_size = response.content_length().unwrap_or(0);

    let pb = if progress {
        let pb = ProgressBar::new(total_size);
        pb.set_style(
            // SAFETY: hardcoded template string — always valid
            #[allow(clippy::expect_used)]
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
                .expect("hardcoded progress bar template")
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let mut stream = response.bytes_stream();
    let mut file = std::fs::File::create(output_path).map_err(|e| ScribeError::Download {
        message: format!("Failed to create output file: {e}"),
    })?;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| ScribeError::Download {
            message: format!("Failed to read download chunk: {e}"),
        })?;

        file.write_all(&chunk).map_err(|e| ScribeError::Download {
            message: format!("Failed to write to file: {e}"),
        })?;

        if let Some(ref pb) = pb {
            pb.inc(chunk.len() as u64);
        }
    }

    if let Some(pb) = pb {
        pb.finish_with_message("Downloaded");
    }

    if progress {
        eprintln!("Model installed to: {}", output_path.display());
    }

    Ok(())
}

/// List all installed model names by scanning the models directory.
///
/// Discovers every `ggml-*.bin` file, not just catalog models. Returns model
/// names with the `ggml-` prefix and `.bin` suffix stripped.
pub fn list_installed_models() -> Vec<String> {
    let dir = models_dir();
    let entries = match std::fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };

    let mut names: Vec<String> = entries
        .filter_map(|entry| {
            let entry = entry.ok()?;
            let name = entry.file_name();
            let name = name.to_str()?;
            let model = name.strip_prefix("ggml-")?.strip_suffix(".bin")?;
            if entry.path().is_file() {
                Some(model.to_string())
            } else {
                None
            }
        })
        .collect();

    names.sort();
    names
}

/// Format model information for display.
pub fn format_model_info(model: &ModelInfo) -> String {
    let status = if is_model_installed(model.name) {
        "[installed]"
    } else {
        "[not installed]"
    };
    format!("{:16} {:5} MB   {}", model.name, model.size_mb, status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::catalog::{get_model, list_models};

    #[test]
    fn test_models_dir_is_valid_path() {
        let dir = models_dir();
        assert!(dir.to_string_lossy().contains("vidscribe"));
        assert!(dir.to_string_lossy().contains("models"));
    }

    #[test]
    fn test_model_path_for_valid_model() {
        let path = model_path("small");
        assert!(path.to_string_lossy().contains("ggml-small.bin"));
    }

    #[test]
    fn test_model_path_for_unknown_model() {
        let path = model_path("nonexistent");
        assert!(path.to_string_lossy().contains("ggml-nonexistent.bin"));
    }

    #[test]
    fn test_model_path_resolves_alias() {
        let path = model_path("large");
        assert!(
            path.to_string_lossy().contains("large-v3-turbo"),
            "model_path(\"large\") should resolve to large-v3-turbo, got: {}",
            path.display()
        );
    }

    #[test]
    fn test_is_model_installed_returns_false_for_invalid_model() {
        assert!(!is_model_installed("nonexistent_model_xyz"));
    }

    #[test]
    fn test_format_model_info_shows_name_and_size() {
        let model = get_model("small").unwrap();
        let formatted = format_model_info(model);
        assert!(formatted.contains("small"));
        assert!(formatted.contains("466"));
        assert!(formatted.contains("MB"));
        assert!(formatted.contains("installed"));
    }

    #[test]
    fn test_model_path_filename_format() {
        for model in list_models() {
            let path = model_path(model.name);
            let filename = path.file_name().unwrap().to_string_lossy();
            assert!(
                filename.starts_with("ggml-"),
                "Model {} filename should start with 'ggml-': {}",
                model.name,
                filename
            );
            assert!(
                filename.ends_with(".bin"),
                "Model {} filename should end with '.bin': {}",
                model.name,
                filename
            );
        }
    }

    #[test]
    fn test_list_installed_models_returns_sorted_names() {
        let installed = list_installed_models();
        let mut sorted = installed.clone();
        sorted.sort();
        assert_eq!(
            installed, sorted,
            "list_installed_models should return sorted names"
        );
    }

    #[test]
    fn test_list_installed_models_strips_prefix_and_suffix() {
        for name in list_installed_models() {
            assert!(!name.starts_with("ggml-"));
            assert!(!name.ends_with(".bin"));
        }
    }

    #[cfg(feature = "model-download")]
    #[tokio::test]
    async fn test_download_unknown_model_fails_without_network() {
        let tmp = tempfile::TempDir::new().unwrap();
        let target = tmp.path().join("ggml-nope.bin");

        let result = download_model_to("nope", &target, false).await;

        match result {
            Err(ScribeError::Download { message }) => {
                assert!(message.contains("Unknown model"));
            }
            _ => panic!("Expected Download error"),
        }
        assert!(!target.exists());
    }

    #[cfg(feature = "model-download")]
    #[tokio::test]
    async fn test_download_skips_existing_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let target = tmp.path().join("ggml-small.bin");
        std::fs::write(&target, b"already here").unwrap();

        let path = download_model_to("small", &target, false).await.unwrap();

        assert_eq!(path, target);
        assert_eq!(std::fs::read(&target).unwrap(), b"already here");
    }
}
