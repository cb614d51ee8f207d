//! Resource reclamation between pipeline stages.
//!
//! Invoked after every model-bearing stage and once more at the end of the
//! run, so no run leaks scratch files or holds accelerator memory. Cleanup is
//! strictly best-effort: every failure is logged and swallowed, nothing here
//! can abort the pipeline.

use crate::device::DeviceKind;
use std::path::Path;
use tracing::{debug, warn};

/// Release a stage's resources.
///
/// Order matters: the model handle is dropped first. That is the release
/// point for host memory and, when the active device is the accelerator, for
/// its memory pool (the backend frees device buffers with the handle). The
/// scratch directory is purged afterwards.
pub fn reclaim<M>(device: DeviceKind, model: Option<M>, scratch: &Path) {
    if let Some(model) = model {
        drop(model);
        debug!("model handle dropped");
        if device.is_accelerator() {
            debug!("accelerator memory released");
        }
    }

    purge_scratch(scratch);
}

/// Remove every file and subdirectory inside the scratch directory.
///
/// Each entry is removed individually; a failure is logged and does not stop
/// the purge of the rest. A missing or already-empty directory is a no-op,
/// making the purge idempotent.
pub fn purge_scratch(scratch: &Path) {
    let entries = match std::fs::read_dir(scratch) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return,
        Err(e) => {
            warn!(scratch = %scratch.display(), "failed to read scratch directory: {e}");
            return;
        }
    };

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("failed to read scratch entry: {e}");
                continue;
            }
        };

        let path = entry.path();
        let removed = if path.is_dir() {
            std::fs::remove_dir_all(&path)
        } else {
            std::fs::remove_file(&path)
        };

        match removed {
            Ok(()) => debug!(entry = %path.display(), "scratch entry removed"),
            Err(e) => warn!(entry = %path.display(), "failed to remove scratch entry: {e}"),
        }
    }
}
