//! # GEM Bridge
//!
//! Forward Brultech GEM energy monitor telemetry to InfluxDB.
//!
//! One long-lived TCP session per configured monitor; each periodic status
//! report is decoded into metric points and handed to a shared batching
//! writer that flushes to InfluxDB on an adaptive cadence.

use anyhow::Result;
use tracing::info;
use tracing_subscriber;

use gem_bridge::config::Config;
use gem_bridge::device::DeviceConnection;
use gem_bridge::sink::influx::InfluxSink;
use gem_bridge::writer::BatchingWriter;

/// Configuration path used when none is given on the command line
const DEFAULT_CONFIG_PATH: &str = "/config/config.toml";

/// Main entry point for GEM Bridge
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Set up logging with tracing subscriber
///    - Load and validate configuration (fatal on failure, before any
///      connection is established)
///    - Build the InfluxDB sink and spawn the batching writer
///
/// 2. **Steady state**
///    - One connection task per configured monitor, each reconnecting
///      forever on its own
///    - The writer task flushes batched points on its adaptive timer
///
/// 3. **Shutdown**
///    - Ctrl+C exits the process; buffered points are not persisted
///
/// # Errors
///
/// Returns error if the configuration cannot be loaded or the sink address
/// is invalid.
#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into())
        )
        .init();

    info!("GEM Bridge v{} starting...", env!("CARGO_PKG_VERSION"));

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = Config::load(&config_path)?;
    info!(config = %config_path, devices = config.devices.len(), "configuration loaded");

    let sink = InfluxSink::new(&config.influx.url, &config.influx.database)?;
    let writer = BatchingWriter::spawn(sink, config.writer_options());

    for address in &config.devices {
        let connection = DeviceConnection::new(
            address.clone(),
            writer.clone(),
            config.keepalive_interval(),
        );
        tokio::spawn(connection.run());
    }

    info!("Press Ctrl+C to exit");
    tokio::signal::ctrl_c().await?;
    info!("Received Ctrl+C, shutting down...");

    Ok(())
}
