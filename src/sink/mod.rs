//! # Sink Module
//!
//! Interface to the remote time-series store.
//!
//! This module handles:
//! - The `Sink` collaborator trait consumed by the batching writer
//! - Failure classification (payload-too-large vs everything else)
//! - Metric point representation
//! - The concrete InfluxDB HTTP sink

pub mod influx;
pub mod point;

pub use point::{FieldValue, MetricPoint};

use async_trait::async_trait;
use thiserror::Error;

/// A failed batched write, classified for the writer's congestion control
///
/// `PayloadTooLarge` is the only class the writer reacts to structurally
/// (cap halving); every other failure is treated as transient and retried
/// on the next flush cycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SinkError {
    /// The sink rejected the batch as oversized
    #[error("sink rejected batch as too large")]
    PayloadTooLarge,

    /// The write call itself failed (connect, send, read response)
    #[error("sink transport error: {0}")]
    Transport(String),

    /// The sink answered with a non-success status other than too-large
    #[error("sink returned status {0}")]
    Status(u16),
}

/// Trait for batched writes to a time-series store
#[async_trait]
pub trait Sink: Send + Sync {
    /// Write one batch of points
    ///
    /// Must report a payload-size rejection distinctly from all other
    /// failures so the writer can shrink its batch cap.
    async fn write_batch(&self, points: &[MetricPoint]) -> Result<(), SinkError>;
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sink_error_classification() {
        assert_eq!(SinkError::PayloadTooLarge, SinkError::PayloadTooLarge);
        assert_ne!(
            SinkError::Status(500),
            SinkError::PayloadTooLarge,
        );
    }

    #[test]
    fn test_sink_error_display() {
        assert_eq!(
            SinkError::PayloadTooLarge.to_string(),
            "sink rejected batch as too large"
        );
        assert_eq!(SinkError::Status(500).to_string(), "sink returned status 500");
        assert_eq!(
            SinkError::Transport("connection refused".to_string()).to_string(),
            "sink transport error: connection refused"
        );
    }
}
