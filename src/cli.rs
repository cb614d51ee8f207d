//! Command-line interface for vidscribe
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Speaker-labeled transcripts from video files
#[derive(Parser, Debug)]
#[command(
    name = "vidscribe",
    version,
    about = "Speaker-labeled transcripts from video files"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Video file to transcribe
    #[arg(value_name = "VIDEO")]
    pub video: Option<PathBuf>,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress output (quiet mode)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output (-v: stage progress, -vv: full diagnostics)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Whisper model tier (default: small). Examples: tiny, base, small, medium
    #[arg(long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Language code for transcription (default: pt)
    #[arg(long, value_name = "LANG")]
    pub language: Option<String>,

    /// Refine timestamps with the alignment stage
    #[arg(long)]
    pub align: bool,

    /// Directory the report file is written to (default: current directory)
    #[arg(long, short = 'o', value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Scratch directory for transient audio artifacts
    #[arg(long, value_name = "DIR")]
    pub scratch_dir: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage speech models
    Models {
        /// Action to perform
        #[command(subcommand)]
        action: ModelsAction,
    },

    /// Check system dependencies
    Check,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Model management actions
#[derive(Subcommand, Debug)]
pub enum ModelsAction {
    /// List available models and their installation status
    List,

    /// Download and install a model
    Install {
        /// Model name (e.g., small, medium, large-v3-turbo)
        name: String,
    },
}
