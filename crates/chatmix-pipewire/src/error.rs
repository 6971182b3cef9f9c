//! Audio server error types.

use thiserror::Error;

/// Audio server error type.
#[derive(Debug, Error)]
pub enum PwError {
    #[error("Failed to run {program}: {reason}")]
    SpawnFailed { program: String, reason: String },

    #[error("{command} failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("Unexpected {command} output: {output:?}")]
    UnexpectedOutput { command: String, output: String },

    #[error("Sink creation failed: {0}")]
    SinkCreationFailed(String),

    #[error("Loopback creation failed: {0}")]
    LoopbackCreationFailed(String),

    #[error("Volume control failed: {0}")]
    VolumeControlFailed(String),
}

/// Result type for audio server operations.
pub type PwResult<T> = Result<T, PwError>;
