//! Build script: embeds the git hash and pre-checks GPU toolkits.
//!
//! The toolkit checks run before whisper-rs-sys compiles so a missing
//! toolchain fails with an actionable message instead of a wall of nvcc
//! errors.

use std::process::Command;

fn main() {
    // Embed git short hash for version string
    if let Ok(output) = Command::new("git")
        .args(["rev-parse", "--short=7", "HEAD"])
        .output()
        && output.status.success()
    {
        let hash = String::from_utf8_lossy(&output.stdout).trim().to_string();
        println!("cargo:rustc-env=GIT_HASH={}", hash);
    }
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/heads/");

    if cfg!(feature = "cuda") {
        require_tool(
            "nvcc",
            "CUDA toolkit not found. Install it from \
             https://developer.nvidia.com/cuda-downloads or build without \
             CUDA: cargo build --release",
        );
    }
    if cfg!(feature = "vulkan") {
        require_tool(
            "vulkaninfo",
            "Vulkan SDK not found. Install it from https://vulkan.lunarg.com/ \
             or build without Vulkan: cargo build --release",
        );
    }
    if cfg!(feature = "hipblas") {
        require_tool(
            "rocminfo",
            "ROCm not found. Install it from https://rocm.docs.amd.com/ or \
             build without HipBLAS: cargo build --release",
        );
    }
}

/// Panic with `message` when `tool` is not runnable.
fn require_tool(tool: &str, message: &str) {
    if Command::new(tool).arg("--version").output().is_err() {
        panic!("\n\n{message}\n");
    }
    println!("cargo::warning={tool} detected");
}
