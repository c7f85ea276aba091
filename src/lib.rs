//! # GEM Bridge Library
//!
//! Forward Brultech GEM energy monitor telemetry to InfluxDB.
//!
//! This library provides the core functionality for the bridge: decoding the
//! monitors' ASCII status reports into typed samples, and batching the
//! resulting metric points toward the time-series store with adaptive flush
//! cadence and batch-size control.

pub mod config;
pub mod error;
pub mod gem;
pub mod sink;
pub mod writer;
pub mod device;
