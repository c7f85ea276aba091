//! # Batching Writer Module
//!
//! Buffers outgoing metric points and flushes them to the sink in batches.
//!
//! This module handles:
//! - The bounded point queue shared by all device connections
//! - Per-tick flush cycles driven by a [`ticker::DynamicTicker`]
//! - Cap halving when the sink rejects a batch as oversized
//! - Requeueing failed batches as overflow, drained ahead of new points
//! - Switching to a fast flush cadence while a backlog exists

pub mod ticker;

use crate::error::{GemBridgeError, Result};
use crate::sink::{MetricPoint, Sink, SinkError};
use std::time::Duration;
use ticker::DynamicTicker;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Queue capacity shared by all producers; enqueueing blocks beyond this
pub const QUEUE_CAPACITY: usize = 100_000;

/// Flush period while the writer is keeping up
pub const BASELINE_FLUSH_INTERVAL: Duration = Duration::from_secs(1);

/// Flush period while draining a backlog
pub const FAST_FLUSH_INTERVAL: Duration = Duration::from_millis(100);

/// Tuning for one writer task
#[derive(Debug, Clone)]
pub struct WriterOptions {
    pub queue_capacity: usize,
    pub flush_interval: Duration,
    pub fast_flush_interval: Duration,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            queue_capacity: QUEUE_CAPACITY,
            flush_interval: BASELINE_FLUSH_INTERVAL,
            fast_flush_interval: FAST_FLUSH_INTERVAL,
        }
    }
}

/// Flush cadence the writer is currently running at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IntervalMode {
    Baseline,
    Fast,
}

/// Producer-side handle to a writer task
///
/// Cheap to clone; one per device connection.
#[derive(Debug, Clone)]
pub struct WriterHandle {
    queue: mpsc::Sender<MetricPoint>,
}

impl WriterHandle {
    /// Enqueue one point for delivery
    ///
    /// Suspends the caller while the queue is at capacity — backpressure to
    /// the device loops, a rare safety valve rather than primary flow
    /// control.
    ///
    /// # Errors
    ///
    /// Returns error if the writer task is gone.
    pub async fn enqueue(&self, point: MetricPoint) -> Result<()> {
        self.queue
            .send(point)
            .await
            .map_err(|_| GemBridgeError::WriterClosed("writer task stopped".to_string()))
    }
}

/// Background task batching points toward one sink target
///
/// Exactly one task consumes the queue, so sink writes are fully serialized:
/// there is never more than one in-flight write call.
pub struct BatchingWriter;

impl BatchingWriter {
    /// Spawn the writer task and return the producer handle
    pub fn spawn<S: Sink + 'static>(sink: S, options: WriterOptions) -> WriterHandle {
        let (queue, queue_rx) = mpsc::channel(options.queue_capacity);
        tokio::spawn(writer_task(sink, queue_rx, options));
        WriterHandle { queue }
    }

    #[cfg(test)]
    pub(crate) fn test_handle(capacity: usize) -> (WriterHandle, mpsc::Receiver<MetricPoint>) {
        let (queue, queue_rx) = mpsc::channel(capacity);
        (WriterHandle { queue }, queue_rx)
    }
}

async fn writer_task<S: Sink>(sink: S, mut queue: mpsc::Receiver<MetricPoint>, options: WriterOptions) {
    let mut ticker = DynamicTicker::new(options.flush_interval);
    let mut core = WriterCore::new(sink);
    let mut pending: Vec<MetricPoint> = Vec::new();

    info!(
        flush_interval_ms = options.flush_interval.as_millis() as u64,
        "batching writer started"
    );

    loop {
        tokio::select! {
            received = queue.recv() => match received {
                Some(point) => pending.push(point),
                // All producers are gone: decommission the writer
                None => break,
            },
            tick = ticker.tick() => {
                if tick.is_none() {
                    error!("flush ticker stopped unexpectedly");
                    break;
                }
                if let Some(mode) = core.flush(&mut pending).await {
                    let interval = match mode {
                        IntervalMode::Fast => options.fast_flush_interval,
                        IntervalMode::Baseline => options.flush_interval,
                    };
                    ticker.set_interval(interval);
                }
            }
        }
    }

    ticker.stop().await;
    debug!("batching writer stopped");
}

/// Flush-cycle state, owned exclusively by the writer task
///
/// Producers never read or write any of this; the queue is the only shared
/// resource.
struct WriterCore<S> {
    sink: S,
    /// Maximum points per write call; 0 means unbounded. Only ever shrinks.
    max_points: usize,
    /// Points deferred past the previous cycle; drained ahead of new points
    overflow: Vec<MetricPoint>,
    mode: IntervalMode,
}

impl<S: Sink> WriterCore<S> {
    fn new(sink: S) -> Self {
        Self {
            sink,
            max_points: 0,
            overflow: Vec::new(),
            mode: IntervalMode::Baseline,
        }
    }

    /// Run one flush cycle over the overflow and the drained queue
    ///
    /// Returns the new interval mode if this cycle changed it, `None`
    /// otherwise. An empty cycle is a complete no-op: no write call, no
    /// interval change.
    async fn flush(&mut self, pending: &mut Vec<MetricPoint>) -> Option<IntervalMode> {
        if self.overflow.is_empty() && pending.is_empty() {
            return None;
        }

        // Overflow from the previous cycle goes ahead of newly queued points
        let mut points = std::mem::take(&mut self.overflow);
        points.append(pending);

        let cap = if self.max_points > 0 {
            self.max_points.min(points.len())
        } else {
            points.len()
        };
        self.overflow = points.split_off(cap);
        let to_send = points;

        info!(points = to_send.len(), "writing batch to sink");
        match self.sink.write_batch(&to_send).await {
            Ok(()) => {
                debug!(points = to_send.len(), "batch written");
            }
            Err(SinkError::PayloadTooLarge) => {
                self.max_points = to_send.len() / 2;
                warn!(
                    rejected = to_send.len(),
                    max_points = self.max_points,
                    "sink rejected oversized batch, halving cap"
                );

                // One immediate retry of the first half; its outcome is not
                // inspected further, the second half becomes overflow
                let mut first_half = to_send;
                let second_half = first_half.split_off(self.max_points);
                if let Err(retry_error) = self.sink.write_batch(&first_half).await {
                    warn!(error = %retry_error, points = first_half.len(), "retry of reduced batch failed");
                }
                self.overflow.extend(second_half);
            }
            Err(transient) => {
                warn!(error = %transient, points = to_send.len(), "sink write failed, requeueing batch");

                // The whole attempt goes back to the front of the overflow
                let mut requeued = to_send;
                requeued.append(&mut self.overflow);
                self.overflow = requeued;
            }
        }

        // Backlog beyond the cap: drain quickly, otherwise settle back down
        let target = if self.overflow.len() > self.max_points {
            IntervalMode::Fast
        } else {
            IntervalMode::Baseline
        };
        if target != self.mode {
            self.mode = target;
            Some(target)
        } else {
            None
        }
    }
}
