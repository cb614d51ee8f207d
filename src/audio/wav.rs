//! WAV loading for model input.
//!
//! The extractor already writes mono 16 kHz WAV, but the loader downmixes and
//! resamples defensively so a hand-supplied WAV works too. Models consume
//! `f32` samples normalized to [-1.0, 1.0].

use crate::defaults::SAMPLE_RATE;
use crate::error::{Result, ScribeError};
use std::io::Read;
use std::path::Path;

/// Read a WAV file into normalized mono samples at the canonical rate.
pub fn load_samples(path: &Path) -> Result<Vec<f32>> {
    let file = std::fs::File::open(path).map_err(|e| ScribeError::Extraction {
        message: format!("Failed to open {}: {}", path.display(), e),
    })?;
    samples_from_reader(Box::new(std::io::BufReader::new(file)))
}

/// Read WAV data from any reader (for testing/flexibility).
pub fn samples_from_reader(reader: Box<dyn Read + Send>) -> Result<Vec<f32>> {
    let mut wav_reader = hound::WavReader::new(reader).map_err(|e| ScribeError::Extraction {
        message: format!("Failed to parse WAV file: {}", e),
    })?;

    let spec = wav_reader.spec();
    let source_rate = spec.sample_rate;
    let source_channels = spec.channels;

    let raw_samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => wav_reader
            .samples::<f32>()
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| ScribeError::Extraction {
                message: format!("Failed to read WAV samples: {}", e),
            })?,
        hound::SampleFormat::Int => wav_reader
            .samples::<i16>()
            .map(|s| s.map(|s| s as f32 / 32768.0))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| ScribeError::Extraction {
                message: format!("Failed to read WAV samples: {}", e),
            })?,
    };

    // Downmix interleaved channels by averaging
    let mono_samples = if source_channels > 1 {
        let channels = source_channels as usize;
        raw_samples
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    } else {
        raw_samples
    };

    // Resample to 16kHz if needed
    if source_rate != SAMPLE_RATE {
        Ok(resample(&mono_samples, source_rate, SAMPLE_RATE))
    } else {
        Ok(mono_samples)
    }
}

/// Duration of a sample buffer in seconds at the canonical rate.
pub fn duration_secs(samples: &[f32]) -> f64 {
    samples.len() as f64 / SAMPLE_RATE as f64
}

/// Simple linear interpolation resampling.
fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate {
        return samples.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let output_len = (samples.len() as f64 / ratio).ceil() as usize;

    (0..output_len)
        .map(|i| {
            let source_pos = i as f64 * ratio;
            let source_idx = source_pos.floor() as usize;
            let fraction = (source_pos - source_idx as f64) as f32;

            if source_idx + 1 >= samples.len() {
                samples[source_idx]
            } else {
                let left = samples[source_idx];
                let right = samples[source_idx + 1];
                left + (right - left) * fraction
            }
        })
        .collect()
}
