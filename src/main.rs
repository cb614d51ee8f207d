use anyhow::Result;
use clap::{CommandFactory, Parser};
use owo_colors::OwoColorize;
use std::path::Path;
use std::sync::Arc;
use vidscribe::asr::whisper::{WhisperAlignProvider, WhisperSpeechProvider};
use vidscribe::cli::{Cli, Commands, ModelsAction};
use vidscribe::config::Config;
use vidscribe::diagnostics::check_dependencies;
use vidscribe::diarize::pyannote::PyannoteDiarizerProvider;
use vidscribe::models::catalog::list_models;
use vidscribe::models::download::{download_model, format_model_info};
use vidscribe::pipeline::Pipeline;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose);

    match cli.command {
        None => match cli.video {
            Some(ref video) => {
                let config = load_config(&cli)?;
                run_transcribe(config, video).await;
            }
            None => {
                Cli::command().print_help()?;
                std::process::exit(2);
            }
        },
        Some(Commands::Models { ref action }) => {
            handle_models_command(action).await?;
        }
        Some(Commands::Check) => {
            println!("vidscribe {}", vidscribe::version_string());
            if !check_dependencies() {
                std::process::exit(1);
            }
        }
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "vidscribe",
                &mut std::io::stdout(),
            );
        }
    }

    Ok(())
}

/// Route log verbosity through the standard env-filter: RUST_LOG wins,
/// otherwise -q/-v pick the level.
fn init_tracing(quiet: bool, verbose: u8) {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("vidscribe={level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Load configuration and fold in the CLI overrides.
///
/// Priority order:
/// 1. CLI flags
/// 2. Environment variables
/// 3. Custom config path from CLI (--config), or the default path
/// 4. Built-in defaults
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = if let Some(ref path) = cli.config {
        Config::load(path)?
    } else {
        Config::load_or_default(&Config::default_path())?
    }
    .with_env_overrides();

    if let Some(ref model) = cli.model {
        config.stt.model = model.clone();
    }
    if let Some(ref language) = cli.language {
        config.stt.language = language.clone();
    }
    if cli.align {
        config.stt.align = true;
    }
    if let Some(ref output_dir) = cli.output_dir {
        config.storage.output_dir = output_dir.clone();
    }
    if let Some(ref scratch_dir) = cli.scratch_dir {
        config.storage.scratch_dir = scratch_dir.clone();
    }

    config.validate()?;
    Ok(config)
}

/// Run the full pipeline for one video and report the outcome.
async fn run_transcribe(config: Config, video: &Path) {
    let diarizer = PyannoteDiarizerProvider::new(
        config.diarization.max_speakers,
        config.diarization.match_threshold,
    );
    let align_spec = config.model_spec();

    let mut pipeline = Pipeline::new(
        config,
        Arc::new(WhisperSpeechProvider),
        Arc::new(WhisperAlignProvider::new(align_spec)),
        Arc::new(diarizer),
    );

    match pipeline.run(video).await {
        Ok(outcome) => match outcome.report_path {
            Some(path) => {
                println!(
                    "{} {}",
                    "Transcript written to".green(),
                    path.display()
                );
            }
            None => {
                eprintln!(
                    "{}",
                    "Transcript computed but the report could not be saved".yellow()
                );
                std::process::exit(1);
            }
        },
        Err(e) => {
            eprintln!("{}", format!("Transcription failed: {}", e).red());
            std::process::exit(1);
        }
    }
}

/// Handle model management commands.
async fn handle_models_command(action: &ModelsAction) -> Result<()> {
    match action {
        ModelsAction::List => {
            println!("Available models:");
            for model in list_models() {
                println!("  {}", format_model_info(model));
            }
        }
        ModelsAction::Install { name } => {
            let path = download_model(name, true).await?;
            println!("Model '{}' installed successfully", name);
            println!("Location: {}", path.display());
        }
    }
    Ok(())
}
