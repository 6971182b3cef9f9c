//! Error types for Chatmix core.

use thiserror::Error;

/// Core error type for Chatmix operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid USB id: {0} (expected VVVV:PPPP)")]
    InvalidUsbId(String),

    #[error("Invalid sink name for {role}: {reason}")]
    InvalidSinkName { role: &'static str, reason: String },

    #[error("Game and chat sinks must differ (both are {0:?})")]
    DuplicateSinkName(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid phase transition: {from} -> {to}")]
    InvalidTransition { from: &'static str, to: &'static str },
}

/// Result type alias for Chatmix core operations.
pub type Result<T> = std::result::Result<T, Error>;
