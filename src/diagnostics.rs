//! System diagnostics and dependency checking.
//!
//! Verifies that the external pieces a run needs are present: the ffmpeg
//! binary, installed model weights, and the diarization credential.

use crate::defaults;
use crate::models::download::list_installed_models;
use std::process::Command;

/// Result of a dependency check.
#[derive(Debug, PartialEq)]
pub enum CheckResult {
    /// Dependency is present and working
    Ok,
    /// Dependency is not found
    NotFound,
    /// Dependency is present but has issues
    Warning(String),
}

/// Check if a command exists and is executable.
fn check_command(command: &str) -> CheckResult {
    match Command::new(command).arg("-version").output() {
        Ok(output) if output.status.success() => CheckResult::Ok,
        Ok(_) => CheckResult::Warning(format!("'{}' found but -version failed", command)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => CheckResult::NotFound,
        Err(e) => CheckResult::Warning(format!("Error checking '{}': {}", command, e)),
    }
}

/// Check that ffmpeg is on PATH. Extraction cannot run without it.
pub fn check_ffmpeg() -> CheckResult {
    check_command("ffmpeg")
}

/// Check that at least one speech model is installed.
pub fn check_models() -> CheckResult {
    let installed = list_installed_models();
    if installed.is_empty() {
        CheckResult::Warning(
            "no models installed; the first run will download one (vidscribe models install <name> to prefetch)"
                .to_string(),
        )
    } else {
        CheckResult::Ok
    }
}

/// Check that the diarization credential is set.
pub fn check_credential() -> CheckResult {
    match std::env::var(defaults::TOKEN_ENV) {
        Ok(token) if !token.is_empty() => CheckResult::Ok,
        _ => CheckResult::Warning(format!(
            "{} not set; the diarization stage will fail without it",
            defaults::TOKEN_ENV
        )),
    }
}

/// Run all checks and print a human-readable summary.
///
/// Returns `true` when nothing blocks a run.
pub fn check_dependencies() -> bool {
    let mut runnable = true;

    print!("ffmpeg:      ");
    match check_ffmpeg() {
        CheckResult::Ok => println!("ok"),
        CheckResult::NotFound => {
            runnable = false;
            println!("NOT FOUND (install it with your package manager)");
        }
        CheckResult::Warning(msg) => println!("warning: {msg}"),
    }

    print!("models:      ");
    match check_models() {
        CheckResult::Ok => println!("ok"),
        CheckResult::NotFound => println!("none installed"),
        CheckResult::Warning(msg) => println!("warning: {msg}"),
    }

    print!("credential:  ");
    match check_credential() {
        CheckResult::Ok => println!("ok"),
        CheckResult::NotFound | CheckResult::Warning(_) => {
            println!(
                "warning: {} not set; diarization will fail",
                defaults::TOKEN_ENV
            );
        }
    }

    println!("gpu backend: {}", defaults::gpu_backend());

    runnable
}
