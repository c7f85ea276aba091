//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::Result;
use crate::writer::WriterOptions;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Monitor addresses (`host:port`), one connection task each
    pub devices: Vec<String>,

    pub influx: InfluxConfig,

    #[serde(default)]
    pub writer: WriterConfig,

    #[serde(default)]
    pub device: DeviceConfig,
}

/// Sink connection configuration
#[derive(Debug, Deserialize, Clone)]
pub struct InfluxConfig {
    /// Base address of the InfluxDB server
    pub url: String,

    #[serde(default = "default_database")]
    pub database: String,
}

/// Batching writer tuning
#[derive(Debug, Deserialize, Clone)]
pub struct WriterConfig {
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: u64,

    #[serde(default = "default_fast_flush_interval_ms")]
    pub fast_flush_interval_ms: u64,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            flush_interval_ms: default_flush_interval_ms(),
            fast_flush_interval_ms: default_fast_flush_interval_ms(),
        }
    }
}

/// Device session tuning
#[derive(Debug, Deserialize, Clone)]
pub struct DeviceConfig {
    #[serde(default = "default_keepalive_interval_ms")]
    pub keepalive_interval_ms: u64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            keepalive_interval_ms: default_keepalive_interval_ms(),
        }
    }
}

// Default value functions
fn default_database() -> String { "gem".to_string() }

fn default_queue_capacity() -> usize { 100_000 }
fn default_flush_interval_ms() -> u64 { 1000 }
fn default_fast_flush_interval_ms() -> u64 { 100 }

fn default_keepalive_interval_ms() -> u64 { 1000 }

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Returns
    ///
    /// * `Result<()>` - Ok if valid, Err if invalid
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    fn validate(&self) -> Result<()> {
        if self.devices.is_empty() {
            return Err(crate::error::GemBridgeError::Config(
                toml::de::Error::custom("devices cannot be empty")
            ));
        }

        for address in &self.devices {
            if address.is_empty() {
                return Err(crate::error::GemBridgeError::Config(
                    toml::de::Error::custom("device address cannot be empty")
                ));
            }
        }

        if self.influx.url.is_empty() {
            return Err(crate::error::GemBridgeError::Config(
                toml::de::Error::custom("influx url cannot be empty")
            ));
        }

        if self.influx.database.is_empty() {
            return Err(crate::error::GemBridgeError::Config(
                toml::de::Error::custom("influx database cannot be empty")
            ));
        }

        if self.writer.queue_capacity == 0 {
            return Err(crate::error::GemBridgeError::Config(
                toml::de::Error::custom("queue_capacity must be greater than 0")
            ));
        }

        if self.writer.flush_interval_ms == 0 || self.writer.flush_interval_ms > 60000 {
            return Err(crate::error::GemBridgeError::Config(
                toml::de::Error::custom("flush_interval_ms must be between 1 and 60000")
            ));
        }

        if self.writer.fast_flush_interval_ms == 0
            || self.writer.fast_flush_interval_ms > self.writer.flush_interval_ms {
            return Err(crate::error::GemBridgeError::Config(
                toml::de::Error::custom("fast_flush_interval_ms must be between 1 and flush_interval_ms")
            ));
        }

        if self.device.keepalive_interval_ms == 0 || self.device.keepalive_interval_ms > 60000 {
            return Err(crate::error::GemBridgeError::Config(
                toml::de::Error::custom("keepalive_interval_ms must be between 1 and 60000")
            ));
        }

        Ok(())
    }

    /// Writer tuning as used by the batching writer task
    pub fn writer_options(&self) -> WriterOptions {
        WriterOptions {
            queue_capacity: self.writer.queue_capacity,
            flush_interval: Duration::from_millis(self.writer.flush_interval_ms),
            fast_flush_interval: Duration::from_millis(self.writer.fast_flush_interval_ms),
        }
    }

    /// Keepalive poll cadence for device sessions
    pub fn keepalive_interval(&self) -> Duration {
        Duration::from_millis(self.device.keepalive_interval_ms)
    }
}
