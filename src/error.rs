//! Error types for the telemetry recorder

use thiserror::Error;

/// Main error type for the application
#[derive(Error, Debug)]
pub enum Error {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Log rotation error: {0}")]
    Rotation(#[from] RotationError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Network errors
#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("Socket bind failed for {name} @ {addr}: {reason}")]
    BindFailed {
        name: String,
        addr: String,
        reason: String,
    },

    #[error("Socket setup failed: {0}")]
    SocketSetup(String),

    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Receive failed: {0}")]
    ReceiveFailed(String),
}

/// Log rotation errors
///
/// These are fatal: once the diagnostic channel itself is compromised the
/// recorder must not keep running against a stale or missing log file.
#[derive(Error, Debug)]
pub enum RotationError {
    #[error("Failed to create log folder {path}: {reason}")]
    CreateFolder { path: String, reason: String },

    #[error("Failed to open log file {path}: {reason}")]
    OpenFile { path: String, reason: String },
}

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, Error>;
