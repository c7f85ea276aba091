//! # Device Connection Module
//!
//! Handles the long-lived session with one GEM monitor.
//!
//! This module handles:
//! - Dialing the monitor and reconnecting on any failure
//! - Sending the keepalive poll once per second for the session lifetime
//! - Reading complete status-report frames
//! - Decoding frames and enqueueing the resulting points

pub mod frames;
pub mod points;

use crate::gem::decoder;
use crate::gem::protocol::KEEPALIVE_POLL;
use crate::writer::WriterHandle;
use chrono::Utc;
use frames::{FrameSource, LineFrames};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::time;
use tracing::{debug, info, warn};

/// Why a session's read loop ended
#[derive(Debug, PartialEq, Eq)]
enum SessionEnd {
    /// The connection dropped or the peer closed it; reconnect
    Disconnected,
    /// The shared writer is gone; there is nowhere left to forward points
    WriterClosed,
}

/// One task per configured monitor address
///
/// Runs for the process lifetime: there is no graceful shutdown path. A
/// failed dial or read abandons the session and retries connecting
/// immediately, with no delay and no retry limit.
pub struct DeviceConnection {
    address: String,
    writer: WriterHandle,
    keepalive_interval: Duration,
}

impl DeviceConnection {
    pub fn new(address: String, writer: WriterHandle, keepalive_interval: Duration) -> Self {
        Self {
            address,
            writer,
            keepalive_interval,
        }
    }

    /// Run the connection loop
    ///
    /// Only returns if the shared writer goes away.
    pub async fn run(self) {
        loop {
            let stream = match TcpStream::connect(&self.address).await {
                Ok(stream) => stream,
                Err(error) => {
                    // No backoff: retry dialing immediately
                    warn!(address = %self.address, %error, "failed connecting to device");
                    continue;
                }
            };
            info!(address = %self.address, "connected to device");

            let (read_half, write_half) = stream.into_split();
            let keepalive = tokio::spawn(keepalive_loop(write_half, self.keepalive_interval));

            let mut source = LineFrames::new(read_half);
            let ended = self.read_frames(&mut source).await;
            keepalive.abort();

            if ended == SessionEnd::WriterClosed {
                warn!(address = %self.address, "writer gone, stopping device connection");
                return;
            }
        }
    }

    /// Read and forward frames until the session ends
    async fn read_frames<F: FrameSource>(&self, source: &mut F) -> SessionEnd {
        loop {
            match source.next_frame().await {
                Ok(Some(frame)) => {
                    if self.forward_frame(&frame).await.is_err() {
                        return SessionEnd::WriterClosed;
                    }
                }
                Ok(None) => {
                    info!(address = %self.address, "device closed connection");
                    return SessionEnd::Disconnected;
                }
                Err(error) => {
                    warn!(address = %self.address, %error, "device read failed");
                    return SessionEnd::Disconnected;
                }
            }
        }
    }

    /// Decode one frame and enqueue its points
    ///
    /// Malformed fields are logged and tolerated; the only error out of
    /// here is a closed writer.
    async fn forward_frame(&self, frame: &str) -> crate::error::Result<()> {
        let decoded = decoder::decode(frame);

        for field_error in &decoded.field_errors {
            warn!(address = %self.address, error = %field_error, frame, "skipped malformed field");
        }
        info!(
            address = %self.address,
            serial = %decoded.serial,
            volts = decoded.voltage,
            "decoded voltage data"
        );

        let timestamp = Utc::now();
        for point in points::frame_points(&decoded, timestamp) {
            self.writer.enqueue(point).await?;
        }
        Ok(())
    }
}

/// Send the keepalive poll at a fixed cadence for the session lifetime
///
/// The task is aborted when its session ends; a failed send just ends the
/// task early and lets the read side notice the dead connection.
async fn keepalive_loop(mut write_half: OwnedWriteHalf, period: Duration) {
    loop {
        time::sleep(period).await;
        if let Err(error) = write_half.write_all(KEEPALIVE_POLL).await {
            debug!(%error, "keepalive send failed");
            return;
        }
    }
}
