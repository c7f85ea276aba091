//! # InfluxDB Sink
//!
//! Batched writes to an InfluxDB v1 `/write` endpoint using the line
//! protocol, with second-precision timestamps.

use super::{FieldValue, MetricPoint, Sink, SinkError};
use crate::error::{GemBridgeError, Result};
use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use std::fmt::Write as _;
use tracing::debug;

/// Timestamp precision requested from the sink
const WRITE_PRECISION: &str = "s";

/// InfluxDB HTTP sink
///
/// Write parameters (address, database, precision) are validated once at
/// construction; a bad sink address is fatal at startup, before any device
/// connection is established.
pub struct InfluxSink {
    client: reqwest::Client,
    write_url: Url,
}

impl std::fmt::Debug for InfluxSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InfluxSink")
            .field("write_url", &self.write_url.as_str())
            .finish_non_exhaustive()
    }
}

impl InfluxSink {
    /// Create a sink for one InfluxDB database
    ///
    /// # Arguments
    ///
    /// * `url` - Base address of the InfluxDB server (e.g., "http://influx:8086")
    /// * `database` - Target database name
    ///
    /// # Returns
    ///
    /// * `Result<InfluxSink>` - Configured sink or a fatal configuration error
    ///
    /// # Errors
    ///
    /// Returns error if the address does not parse as an HTTP URL or the
    /// database name is empty.
    pub fn new(url: &str, database: &str) -> Result<Self> {
        if database.is_empty() {
            return Err(GemBridgeError::SinkConfig(
                "database name cannot be empty".to_string(),
            ));
        }

        let base = Url::parse(url)
            .map_err(|e| GemBridgeError::SinkConfig(format!("invalid sink url {}: {}", url, e)))?;
        let mut write_url = base
            .join("write")
            .map_err(|e| GemBridgeError::SinkConfig(format!("invalid sink url {}: {}", url, e)))?;
        write_url
            .query_pairs_mut()
            .append_pair("db", database)
            .append_pair("precision", WRITE_PRECISION);

        Ok(Self {
            client: reqwest::Client::new(),
            write_url,
        })
    }

    /// Address batched writes are POSTed to
    pub fn write_url(&self) -> &str {
        self.write_url.as_str()
    }
}

#[async_trait]
impl Sink for InfluxSink {
    async fn write_batch(&self, points: &[MetricPoint]) -> std::result::Result<(), SinkError> {
        let body = encode_batch(points);

        let response = self
            .client
            .post(self.write_url.clone())
            .body(body)
            .send()
            .await
            .map_err(|e| SinkError::Transport(e.to_string()))?;

        debug!(status = %response.status(), points = points.len(), "sink write completed");
        classify_status(response.status())
    }
}

/// Map an HTTP status to the writer-facing failure classification
fn classify_status(status: StatusCode) -> std::result::Result<(), SinkError> {
    if status.is_success() {
        Ok(())
    } else if status == StatusCode::PAYLOAD_TOO_LARGE {
        Err(SinkError::PayloadTooLarge)
    } else {
        Err(SinkError::Status(status.as_u16()))
    }
}

/// Encode a batch of points as InfluxDB line protocol
///
/// One line per point: `measurement,tag=value field=1.5,count=3i 1700000000`.
/// Timestamps are epoch seconds to match the requested precision.
pub fn encode_batch(points: &[MetricPoint]) -> String {
    let mut body = String::new();
    for point in points {
        encode_point(&mut body, point);
        body.push('\n');
    }
    body
}

fn encode_point(out: &mut String, point: &MetricPoint) {
    out.push_str(&escape_measurement(&point.measurement));

    for (key, value) in &point.tags {
        out.push(',');
        out.push_str(&escape_identifier(key));
        out.push('=');
        out.push_str(&escape_identifier(value));
    }

    out.push(' ');
    let mut first = true;
    for (key, value) in &point.fields {
        if !first {
            out.push(',');
        }
        first = false;
        out.push_str(&escape_identifier(key));
        out.push('=');
        match value {
            FieldValue::Float(v) => {
                let _ = write!(out, "{}", v);
            }
            FieldValue::Integer(v) => {
                let _ = write!(out, "{}i", v);
            }
        }
    }

    let _ = write!(out, " {}", point.timestamp.timestamp());
}

/// Escape a measurement name (commas and spaces)
fn escape_measurement(raw: &str) -> String {
    raw.replace(',', "\\,").replace(' ', "\\ ")
}

/// Escape a tag key, tag value or field key (commas, equals signs and spaces)
fn escape_identifier(raw: &str) -> String {
    raw.replace(',', "\\,").replace('=', "\\=").replace(' ', "\\ ")
}
