//! Audio extraction from video containers.
//!
//! Two ffmpeg passes: pull the audio track out of the container, then
//! downmix and resample it to the canonical mono 16 kHz WAV. Both artifacts
//! land at fixed paths inside the scratch directory and are removed by the
//! resource reclaimer at the end of the run.

use crate::defaults::{AUDIO_TRACK_FILE, PROCESSED_WAV_FILE, SAMPLE_RATE};
use crate::error::{Result, ScribeError};
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};

/// Extract the audio track of `video` into `scratch`, returning the path of
/// the processed WAV.
///
/// Fails with [`ScribeError::MissingInput`] before touching the filesystem
/// when the video does not exist; any ffmpeg failure maps to
/// [`ScribeError::Extraction`] carrying the tail of stderr.
pub async fn extract_audio(video: &Path, scratch: &Path) -> Result<PathBuf> {
    if !video.exists() {
        return Err(ScribeError::MissingInput {
            path: video.display().to_string(),
        });
    }

    std::fs::create_dir_all(scratch).map_err(|e| ScribeError::Extraction {
        message: format!(
            "Failed to create scratch directory {}: {}",
            scratch.display(),
            e
        ),
    })?;

    let track = scratch.join(AUDIO_TRACK_FILE);
    let wav = scratch.join(PROCESSED_WAV_FILE);

    // Pass 1: demux/transcode the audio track out of the container.
    run_ffmpeg(&[
        "-y",
        "-i",
        &video.display().to_string(),
        "-vn",
        "-codec:a",
        "libmp3lame",
        "-q:a",
        "2",
        &track.display().to_string(),
    ])
    .await?;
    debug!(track = %track.display(), "audio track extracted");

    // Pass 2: downmix to one channel and resample to the canonical rate.
    let rate = SAMPLE_RATE.to_string();
    run_ffmpeg(&[
        "-y",
        "-i",
        &track.display().to_string(),
        "-ac",
        "1",
        "-ar",
        &rate,
        "-codec:a",
        "pcm_s16le",
        &wav.display().to_string(),
    ])
    .await?;

    info!(wav = %wav.display(), "audio extracted");
    Ok(wav)
}

/// Run ffmpeg with the given arguments, mapping every failure mode to
/// [`ScribeError::Extraction`].
async fn run_ffmpeg(args: &[&str]) -> Result<()> {
    let output = Command::new("ffmpeg")
        .args(args)
        .output()
        .await
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ScribeError::Extraction {
                    message: "ffmpeg not found on PATH (install it with your package manager)"
                        .to_string(),
                }
            } else {
                ScribeError::Extraction {
                    message: format!("Failed to run ffmpeg: {}", e),
                }
            }
        })?;

    if !output.status.success() {
        return Err(ScribeError::Extraction {
            message: format!(
                "ffmpeg exited with {}: {}",
                output.status,
                stderr_tail(&output.stderr, 3)
            ),
        });
    }

    Ok(())
}

/// Last `lines` non-empty lines of ffmpeg's stderr, the part that names the
/// actual failure.
fn stderr_tail(stderr: &[u8], lines: usize) -> String {
    let text = String::from_utf8_lossy(stderr);
    let tail: Vec<&str> = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .rev()
        .take(lines)
        .collect();
    tail.into_iter().rev().collect::<Vec<_>>().join(" | ")
}
