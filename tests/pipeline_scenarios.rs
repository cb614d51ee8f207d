//! End-to-end pipeline scenarios with deterministic model stand-ins.
//!
//! Extraction runs real ffmpeg over a generated WAV container (ffmpeg reads
//! WAV like any other container), so these tests skip with a visible warning
//! on machines without ffmpeg. Everything past extraction uses the mock
//! collaborators.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use vidscribe::asr::align::MockAlignProvider;
use vidscribe::asr::transcriber::MockSpeechProvider;
use vidscribe::asr::types::{Segment, Transcription};
use vidscribe::config::Config;
use vidscribe::diarize::diarizer::{MockDiarizerProvider, Turn};
use vidscribe::error::ScribeError;
use vidscribe::pipeline::{Pipeline, RunStage};
use vidscribe::{DeviceKind, DeviceProbe, UNKNOWN_SPEAKER, select_device};

fn ffmpeg_available() -> bool {
    std::process::Command::new("ffmpeg")
        .arg("-version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Print a visible warning and return false when ffmpeg is missing.
fn require_ffmpeg() -> bool {
    if ffmpeg_available() {
        return true;
    }
    eprintln!();
    eprintln!("  ╔══════════════════════════════════════════════════════════════╗");
    eprintln!("  ║  WARNING: ffmpeg NOT FOUND — SKIPPING EXTRACTION SCENARIO    ║");
    eprintln!("  ║                                                              ║");
    eprintln!("  ║  Install ffmpeg to enable the end-to-end pipeline tests.     ║");
    eprintln!("  ╚══════════════════════════════════════════════════════════════╝");
    eprintln!();
    false
}

/// Write a mono 16 kHz WAV of `secs` seconds of silence. ffmpeg accepts it
/// as a (video-less) input container, which is all extraction needs.
fn write_silent_source(dir: &Path, name: &str, secs: u32) -> PathBuf {
    let path = dir.join(name);
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    for _ in 0..(16000 * secs) {
        writer.write_sample(0i16).unwrap();
    }
    writer.finalize().unwrap();
    path
}

struct Dirs {
    _tmp: TempDir,
    scratch: PathBuf,
    output: PathBuf,
    source: PathBuf,
}

fn setup(source_secs: u32) -> Dirs {
    let tmp = TempDir::new().unwrap();
    let scratch = tmp.path().join("scratch");
    let output = tmp.path().join("out");
    let source = write_silent_source(tmp.path(), "meeting.wav", source_secs);
    Dirs {
        _tmp: tmp,
        scratch,
        output,
        source,
    }
}

fn config_for(dirs: &Dirs) -> Config {
    let mut config = Config::default();
    config.storage.scratch_dir = dirs.scratch.clone();
    config.storage.output_dir = dirs.output.clone();
    config
}

fn pipeline_for(
    config: Config,
    speech: &MockSpeechProvider,
    aligner: &MockAlignProvider,
    diarizer: &MockDiarizerProvider,
) -> Pipeline {
    Pipeline::new(
        config,
        Arc::new(speech.clone()),
        Arc::new(aligner.clone()),
        Arc::new(diarizer.clone()),
    )
}

// Scenario: silent input → empty transcription, empty diarization, report
// file written with no segment blocks, scratch left clean.
#[tokio::test]
async fn silent_video_produces_empty_report() {
    if !require_ffmpeg() {
        return;
    }
    let dirs = setup(10);

    let speech = MockSpeechProvider::new()
        .with_transcription(Transcription::new(vec![], Some("pt".to_string())));
    let aligner = MockAlignProvider::new();
    let diarizer = MockDiarizerProvider::new();

    let mut pipeline = pipeline_for(config_for(&dirs), &speech, &aligner, &diarizer);
    let outcome = pipeline.run(&dirs.source).await.unwrap();

    assert_eq!(pipeline.stage(), RunStage::Done);
    assert!(outcome.transcript.is_empty());

    let report = outcome.report_path.expect("report must be written");
    assert_eq!(report, dirs.output.join("transcription_meeting.txt"));
    assert_eq!(std::fs::read_to_string(&report).unwrap(), "");

    // Lifecycle invariant: nothing survives in scratch
    assert_eq!(std::fs::read_dir(&dirs.scratch).unwrap().count(), 0);
    assert_eq!(speech.load_count(), 1);
    assert_eq!(diarizer.load_count(), 1);
}

// Scenario: the source video does not exist → MissingInput, no scratch
// files, no report file.
#[tokio::test]
async fn missing_video_halts_before_any_stage_work() {
    let tmp = TempDir::new().unwrap();
    let scratch = tmp.path().join("scratch");
    let output = tmp.path().join("out");

    let mut config = Config::default();
    config.storage.scratch_dir = scratch.clone();
    config.storage.output_dir = output.clone();

    let speech = MockSpeechProvider::new();
    let diarizer = MockDiarizerProvider::new();
    let mut pipeline = pipeline_for(
        config,
        &speech,
        &MockAlignProvider::new(),
        &diarizer,
    );

    let result = pipeline.run(Path::new("/no/such/video.mp4")).await;

    assert!(matches!(result, Err(ScribeError::MissingInput { .. })));
    assert_eq!(pipeline.stage(), RunStage::Failed);
    assert!(!scratch.exists());
    assert!(!output.exists());
    assert_eq!(speech.load_count(), 0);
    assert_eq!(diarizer.load_count(), 0);
}

// Scenario: two speakers with known ground-truth turns at [0, 30) and
// [30, 60) → every contained segment carries its turn's label.
#[tokio::test]
async fn two_speaker_clip_labels_every_contained_segment() {
    if !require_ffmpeg() {
        return;
    }
    let dirs = setup(60);

    let transcription = Transcription::new(
        vec![
            Segment::new(2.0, 8.0, "abertura da sessao"),
            Segment::new(12.0, 28.0, "primeiro ponto da pauta"),
            Segment::new(31.0, 44.0, "resposta ao primeiro ponto"),
            Segment::new(50.0, 59.0, "encerramento"),
        ],
        Some("pt".to_string()),
    );
    let speech = MockSpeechProvider::new().with_transcription(transcription);
    let diarizer = MockDiarizerProvider::new().with_turns(vec![
        Turn::new("SPEAKER_00", 0.0, 30.0),
        Turn::new("SPEAKER_01", 30.0, 60.0),
    ]);

    let mut pipeline =
        pipeline_for(config_for(&dirs), &speech, &MockAlignProvider::new(), &diarizer);
    let outcome = pipeline.run(&dirs.source).await.unwrap();

    let speakers: Vec<&str> = outcome
        .transcript
        .segments
        .iter()
        .map(|s| s.speaker.as_str())
        .collect();
    assert_eq!(
        speakers,
        ["SPEAKER_00", "SPEAKER_00", "SPEAKER_01", "SPEAKER_01"]
    );

    // Segments stay temporally ordered and non-overlapping, in the order of
    // the underlying transcription
    for pair in outcome.transcript.segments.windows(2) {
        assert!(pair[0].end <= pair[1].start);
    }

    // The report carries one block per segment
    let report = std::fs::read_to_string(outcome.report_path.unwrap()).unwrap();
    assert_eq!(report.matches("Speaker: ").count(), 4);
    assert_eq!(report.matches("SPEAKER_01").count(), 2);
    assert!(report.contains("Start: 0.03 min"));
}

// A segment outside every turn keeps the defined sentinel label.
#[tokio::test]
async fn uncovered_segment_is_labeled_unknown() {
    if !require_ffmpeg() {
        return;
    }
    let dirs = setup(10);

    let transcription = Transcription::new(
        vec![Segment::new(100.0, 105.0, "fora do alcance")],
        Some("pt".to_string()),
    );
    let speech = MockSpeechProvider::new().with_transcription(transcription);
    let diarizer =
        MockDiarizerProvider::new().with_turns(vec![Turn::new("SPEAKER_00", 0.0, 10.0)]);

    let mut pipeline =
        pipeline_for(config_for(&dirs), &speech, &MockAlignProvider::new(), &diarizer);
    let outcome = pipeline.run(&dirs.source).await.unwrap();

    assert_eq!(outcome.transcript.segments[0].speaker, UNKNOWN_SPEAKER);
}

// Alignment, when enabled, replaces the transcription without inventing
// segments, and the report reflects the refined timestamps.
#[tokio::test]
async fn alignment_refines_timestamps_end_to_end() {
    if !require_ffmpeg() {
        return;
    }
    let dirs = setup(10);

    let raw = Transcription::new(vec![Segment::new(0.0, 9.0, "fala unica")], Some("pt".into()));
    let refined =
        Transcription::new(vec![Segment::new(0.6, 6.0, "fala unica")], Some("pt".into()));

    let speech = MockSpeechProvider::new().with_transcription(raw.clone());
    let aligner = MockAlignProvider::new().with_result(refined.clone());
    let diarizer =
        MockDiarizerProvider::new().with_turns(vec![Turn::new("SPEAKER_00", 0.0, 10.0)]);

    let mut config = config_for(&dirs);
    config.stt.align = true;
    let mut pipeline = pipeline_for(config, &speech, &aligner, &diarizer);

    let outcome = pipeline.run(&dirs.source).await.unwrap();

    assert_eq!(aligner.load_count(), 1);
    assert!(outcome.transcript.segments.len() <= raw.segments.len());
    let segment = &outcome.transcript.segments[0];
    assert_eq!(segment.start, 0.6);
    assert_eq!(segment.end, 6.0);
    assert!(segment.start >= 0.0 && segment.start <= segment.end);

    let report = std::fs::read_to_string(outcome.report_path.unwrap()).unwrap();
    assert!(report.contains("Start: 0.01 min"));
    assert!(report.contains("End: 0.10 min"));
}

// A report that cannot be written is logged, not fatal: the transcript is
// still returned and the run ends in Done.
#[tokio::test]
async fn unwritable_report_is_computed_but_not_saved() {
    if !require_ffmpeg() {
        return;
    }
    let dirs = setup(5);

    // Block the output directory path with a plain file
    std::fs::write(&dirs.output, b"not a directory").unwrap();

    let speech = MockSpeechProvider::new().with_transcription(Transcription::new(
        vec![Segment::new(0.0, 4.0, "fala")],
        Some("pt".into()),
    ));
    let diarizer =
        MockDiarizerProvider::new().with_turns(vec![Turn::new("SPEAKER_00", 0.0, 5.0)]);

    let mut pipeline =
        pipeline_for(config_for(&dirs), &speech, &MockAlignProvider::new(), &diarizer);
    let outcome = pipeline.run(&dirs.source).await.unwrap();

    assert_eq!(pipeline.stage(), RunStage::Done);
    assert!(outcome.report_path.is_none());
    assert_eq!(outcome.transcript.segments.len(), 1);
}

// A diarizer load failure after a successful transcription is terminal and
// still leaves the scratch directory clean.
#[tokio::test]
async fn diarizer_failure_is_terminal_and_clean() {
    if !require_ffmpeg() {
        return;
    }
    let dirs = setup(5);

    let speech = MockSpeechProvider::new().with_transcription(Transcription::new(
        vec![Segment::new(0.0, 4.0, "fala")],
        Some("pt".into()),
    ));
    let diarizer = MockDiarizerProvider::new().with_load_failure();

    let mut pipeline =
        pipeline_for(config_for(&dirs), &speech, &MockAlignProvider::new(), &diarizer);
    let result = pipeline.run(&dirs.source).await;

    assert!(matches!(result, Err(ScribeError::ModelLoad { .. })));
    assert_eq!(pipeline.stage(), RunStage::Failed);
    assert_eq!(std::fs::read_dir(&dirs.scratch).unwrap().count(), 0);
    assert!(!dirs.output.exists(), "no report for a failed run");
}

// The device is queried fresh for every model-bearing stage: a probe whose
// answer changes mid-run is honored, not cached.
#[tokio::test]
async fn device_is_probed_per_stage() {
    if !require_ffmpeg() {
        return;
    }
    let dirs = setup(5);

    struct CountingProbe(std::sync::atomic::AtomicUsize);
    impl DeviceProbe for CountingProbe {
        fn accelerator_available(&self) -> bool {
            self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            false
        }
    }
    let probe = Arc::new(CountingProbe(std::sync::atomic::AtomicUsize::new(0)));
    assert_eq!(select_device(probe.as_ref()), DeviceKind::Cpu);
    let baseline = probe.0.load(std::sync::atomic::Ordering::SeqCst);

    let speech = MockSpeechProvider::new().with_transcription(Transcription::new(
        vec![Segment::new(0.0, 4.0, "fala")],
        Some("pt".into()),
    ));
    let diarizer = MockDiarizerProvider::new();

    let mut pipeline = Pipeline::new(
        config_for(&dirs),
        Arc::new(speech),
        Arc::new(MockAlignProvider::new()),
        Arc::new(diarizer),
    )
    .with_device_probe(probe.clone());

    pipeline.run(&dirs.source).await.unwrap();

    let queried = probe.0.load(std::sync::atomic::Ordering::SeqCst) - baseline;
    assert_eq!(
        queried, 2,
        "transcription and diarization must each probe the device"
    );
}
