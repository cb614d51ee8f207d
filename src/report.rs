//! Text report rendering and persistence.
//!
//! The report format is fixed: four lines per segment (speaker, text, start
//! and end in minutes with two decimals) followed by a separator line,
//! segments concatenated chronologically. A write failure never unwinds the
//! computed transcript; the run is "computed but not saved".

use crate::defaults::{REPORT_PREFIX, REPORT_SEPARATOR_WIDTH};
use crate::diarize::assign::DiarizedTranscript;
use crate::error::{Result, ScribeError};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::info;

/// Render the transcript into the report text.
///
/// An empty transcript renders to an empty string: the report file is still
/// written, it just contains no segment blocks.
pub fn render(transcript: &DiarizedTranscript) -> String {
    let separator = "-".repeat(REPORT_SEPARATOR_WIDTH);
    let mut out = String::new();

    for segment in &transcript.segments {
        let start_min = segment.start / 60.0;
        let end_min = segment.end / 60.0;
        // Four fixed lines per block, then the separator
        let _ = writeln!(out, "Speaker: {}", segment.speaker);
        let _ = writeln!(out, "Text: {}", segment.text.trim());
        let _ = writeln!(out, "Start: {:.2} min", start_min);
        let _ = writeln!(out, "End: {:.2} min", end_min);
        let _ = writeln!(out, "{}", separator);
    }

    out
}

/// Report path for a given video: `<output_dir>/transcription_<stem>.txt`.
pub fn report_path(output_dir: &Path, video: &Path) -> PathBuf {
    let stem = video
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("video");
    output_dir.join(format!("{REPORT_PREFIX}{stem}.txt"))
}

/// Render and write the report, returning where it landed.
pub fn write_report(
    transcript: &DiarizedTranscript,
    output_dir: &Path,
    video: &Path,
) -> Result<PathBuf> {
    let path = report_path(output_dir, video);

    std::fs::create_dir_all(output_dir).map_err(|e| ScribeError::Persistence {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    std::fs::write(&path, render(transcript)).map_err(|e| ScribeError::Persistence {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    info!(report = %path.display(), "report written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diarize::assign::SpeakerSegment;
    use tempfile::TempDir;

    fn transcript(segments: Vec<SpeakerSegment>) -> DiarizedTranscript {
        DiarizedTranscript {
            segments,
            language: Some("pt".to_string()),
        }
    }

    fn segment(speaker: &str, text: &str, start: f64, end: f64) -> SpeakerSegment {
        SpeakerSegment {
            speaker: speaker.to_string(),
            text: text.to_string(),
            start,
            end,
        }
    }

    #[test]
    fn render_formats_four_lines_and_separator() {
        let t = transcript(vec![segment("SPEAKER_00", "bom dia", 90.0, 150.0)]);

        let text = render(&t);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "Speaker: SPEAKER_00");
        assert_eq!(lines[1], "Text: bom dia");
        assert_eq!(lines[2], "Start: 1.50 min");
        assert_eq!(lines[3], "End: 2.50 min");
        assert_eq!(lines[4], "-".repeat(40));
    }

    #[test]
    fn render_concatenates_blocks_chronologically() {
        let t = transcript(vec![
            segment("SPEAKER_00", "first", 0.0, 30.0),
            segment("SPEAKER_01", "second", 30.0, 60.0),
        ]);

        let text = render(&t);

        assert_eq!(text.lines().count(), 10);
        let first_pos = text.find("first").unwrap();
        let second_pos = text.find("second").unwrap();
        assert!(first_pos < second_pos);
    }

    #[test]
    fn render_empty_transcript_is_empty() {
        let t = transcript(vec![]);
        assert_eq!(render(&t), "");
    }

    #[test]
    fn render_trims_segment_text() {
        let t = transcript(vec![segment("SPEAKER_00", "  padded  ", 0.0, 1.0)]);
        assert!(render(&t).contains("Text: padded\n"));
    }

    #[test]
    fn report_path_uses_video_stem() {
        let path = report_path(Path::new("/out"), Path::new("/videos/senate_debate.mp4"));
        assert_eq!(path, Path::new("/out/transcription_senate_debate.txt"));
    }

    #[test]
    fn write_report_creates_output_dir_and_file() {
        let tmp = TempDir::new().unwrap();
        let output_dir = tmp.path().join("reports");
        let t = transcript(vec![segment("SPEAKER_00", "ola", 0.0, 60.0)]);

        let path = write_report(&t, &output_dir, Path::new("talk.mp4")).unwrap();

        assert_eq!(path, output_dir.join("transcription_talk.txt"));
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("Speaker: SPEAKER_00"));
        assert!(written.contains("End: 1.00 min"));
    }

    #[test]
    fn write_report_empty_transcript_writes_empty_file() {
        let tmp = TempDir::new().unwrap();
        let t = transcript(vec![]);

        let path = write_report(&t, tmp.path(), Path::new("silent.mp4")).unwrap();

        assert!(path.exists());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn write_report_failure_is_persistence_error() {
        // Output "directory" is an existing file, so create_dir_all fails
        let tmp = TempDir::new().unwrap();
        let blocked = tmp.path().join("blocked");
        std::fs::write(&blocked, b"file").unwrap();

        let t = transcript(vec![]);
        let result = write_report(&t, &blocked, Path::new("talk.mp4"));

        match result {
            Err(ScribeError::Persistence { path, .. }) => {
                assert!(path.contains("transcription_talk.txt"));
            }
            _ => panic!("Expected Persistence error"),
        }
    }
}
