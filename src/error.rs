//! # Error Types
//!
//! Custom error types for GEM Bridge using `thiserror`.

use thiserror::Error;

/// Main error type for GEM Bridge
#[derive(Debug, Error)]
pub enum GemBridgeError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Sink address/parameter errors detected at startup
    #[error("Sink configuration error: {0}")]
    SinkConfig(String),

    /// Writer queue errors (the writer task is gone)
    #[error("Writer unavailable: {0}")]
    WriterClosed(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for GEM Bridge
pub type Result<T> = std::result::Result<T, GemBridgeError>;
