//! Error types for lectern-listener
//!
//! Defines module-specific error types using thiserror for clear error propagation.

use thiserror::Error;

/// Main error type for lectern-listener
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Audio decoding errors
    #[error("Audio decode error: {0}")]
    Decode(String),

    /// Audio output device errors
    #[error("Audio output error: {0}")]
    AudioOutput(String),

    /// Coordination service unreachable or request failed in transit
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Coordination service answered with a non-success status
    #[error("Coordination service returned {status} for {path}")]
    Status { path: String, status: u16 },

    /// Errors from shared Lectern code (session validation, config files)
    #[error(transparent)]
    Common(#[from] lectern_common::Error),
}

/// Convenience Result type using lectern-listener Error
pub type Result<T> = std::result::Result<T, Error>;
