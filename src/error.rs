//! Error types for ripsync

use std::process::ExitStatus;
use thiserror::Error;

/// Domain errors surfaced to the operator
#[derive(Debug, Error)]
pub enum RipsyncError {
    #[error("{tool} not found. Install it with:\n  {install_hint}")]
    MissingDependency {
        tool: &'static str,
        install_hint: &'static str,
    },

    #[error("{tool} exited with {status}")]
    Subprocess { tool: String, status: ExitStatus },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("no sync target: no MP3 player detected and no sync_directory configured")]
    NoSyncTarget,
}
