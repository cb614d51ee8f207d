//! Compute device selection for model-bearing stages.
//!
//! The pipeline asks for a device once per stage invocation rather than
//! caching a choice globally, so an accelerator that disappears mid-run
//! degrades the next stage to the CPU instead of crashing it.

use crate::defaults;
use std::fmt;
use std::path::Path;

/// The device a model is loaded onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    /// The compiled GPU backend (CUDA, Vulkan, HipBLAS).
    Gpu,
    /// Host processor fallback. Always available.
    Cpu,
}

impl DeviceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DeviceKind::Gpu => "gpu",
            DeviceKind::Cpu => "cpu",
        }
    }

    pub fn is_accelerator(self) -> bool {
        matches!(self, DeviceKind::Gpu)
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reports whether an accelerator is currently usable.
///
/// This trait allows swapping implementations (real hardware probe vs fixed
/// answer in tests).
pub trait DeviceProbe: Send + Sync {
    /// True if the accelerator is present and healthy right now.
    fn accelerator_available(&self) -> bool;
}

/// Pick the device for the next model load.
///
/// Pure query: prefers the accelerator when the probe reports it usable,
/// otherwise the host processor. Never fails.
pub fn select_device(probe: &dyn DeviceProbe) -> DeviceKind {
    if probe.accelerator_available() {
        DeviceKind::Gpu
    } else {
        DeviceKind::Cpu
    }
}

/// Probe backed by the compiled GPU backend plus a runtime health check.
///
/// A binary built without a GPU backend never reports an accelerator. CUDA
/// and HipBLAS builds additionally require the kernel device nodes, which
/// vanish when the driver is unloaded or the GPU is lost mid-run.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemDeviceProbe;

impl DeviceProbe for SystemDeviceProbe {
    fn accelerator_available(&self) -> bool {
        match defaults::gpu_backend() {
            "CUDA" => Path::new("/dev/nvidiactl").exists() || Path::new("/dev/nvidia0").exists(),
            "HipBLAS (AMD)" => Path::new("/dev/kfd").exists(),
            "Vulkan" => true,
            // OpenBLAS accelerates the CPU path; it is not a device.
            _ => false,
        }
    }
}

/// Probe with a fixed answer, for deterministic tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedDeviceProbe {
    available: bool,
}

impl FixedDeviceProbe {
    pub fn accelerator() -> Self {
        Self { available: true }
    }

    pub fn host_only() -> Self {
        Self { available: false }
    }
}

impl DeviceProbe for FixedDeviceProbe {
    fn accelerator_available(&self) -> bool {
        self.available
    }
}
