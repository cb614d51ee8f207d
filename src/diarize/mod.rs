//! Speaker diarization and speaker assignment.

pub mod assign;
pub mod diarizer;
pub mod pyannote;
