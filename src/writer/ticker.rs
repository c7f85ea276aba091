//! # Dynamic Ticker
//!
//! Single-consumer periodic signal with a runtime-mutable period.
//!
//! The timer itself lives in a small control loop that owns the deadline and
//! consumes a command set (change period, revert to the initial period,
//! stop). Callers never touch the deadline directly; the active period is
//! exposed through a guarded read.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};

/// Commands consumed by the ticker control loop
#[derive(Debug)]
enum TickerCommand {
    SetInterval(Duration),
    RevertToInitial,
    Stop,
}

/// Periodic time signal whose period can be changed at runtime
///
/// Owned by a single consumer. The first tick fires immediately; subsequent
/// ticks fire at the current period. Ticks coalesce if the consumer is slow:
/// at most one fired-but-unconsumed tick is ever buffered.
pub struct DynamicTicker {
    ticks: mpsc::Receiver<()>,
    commands: mpsc::Sender<TickerCommand>,
    period: Arc<Mutex<Duration>>,
    initial: Duration,
    task: JoinHandle<()>,
}

impl std::fmt::Debug for DynamicTicker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamicTicker")
            .field("initial", &self.initial)
            .field("current", &self.current_duration())
            .finish_non_exhaustive()
    }
}

impl DynamicTicker {
    /// Start a ticker with the given initial period
    ///
    /// The first tick is available immediately.
    pub fn new(initial: Duration) -> Self {
        let (tick_tx, ticks) = mpsc::channel(1);
        let (commands, command_rx) = mpsc::channel(1);
        let period = Arc::new(Mutex::new(initial));
        let task = tokio::spawn(ticker_loop(initial, tick_tx, command_rx, Arc::clone(&period)));

        Self {
            ticks,
            commands,
            period,
            initial,
            task,
        }
    }

    /// Wait for the next tick
    ///
    /// Returns `None` if the control loop has stopped.
    pub async fn tick(&mut self) -> Option<()> {
        self.ticks.recv().await
    }

    /// Request a period change, best-effort and non-blocking
    ///
    /// Any already-fired-but-unconsumed tick is drained first, and the loop
    /// applies the change by re-arming its deadline without emitting a
    /// spurious tick. At most one change request can be pending; if one
    /// already is, this request is dropped.
    pub fn set_interval(&mut self, interval: Duration) {
        let _ = self.ticks.try_recv();
        let _ = self.commands.try_send(TickerCommand::SetInterval(interval));
    }

    /// Apply a period immediately, then revert to the initial period later
    ///
    /// The revert is an asynchronous request scheduled `revert_after` from
    /// now; like any other change request it is best-effort.
    pub fn set_interval_with_revert(&mut self, interval: Duration, revert_after: Duration) {
        self.set_interval(interval);

        let commands = self.commands.clone();
        tokio::spawn(async move {
            time::sleep(revert_after).await;
            let _ = commands.try_send(TickerCommand::RevertToInitial);
        });
    }

    /// Shut the ticker down, waiting for the control loop to exit
    ///
    /// Consumes the ticker, so it can only be called once.
    pub async fn stop(self) {
        let _ = self.commands.send(TickerCommand::Stop).await;
        let _ = self.task.await;
    }

    /// Read the active period
    pub fn current_duration(&self) -> Duration {
        *self.period.lock().expect("ticker period lock poisoned")
    }
}

async fn ticker_loop(
    initial: Duration,
    ticks: mpsc::Sender<()>,
    mut commands: mpsc::Receiver<TickerCommand>,
    period: Arc<Mutex<Duration>>,
) {
    let mut current = initial;
    // First tick fires immediately
    let mut deadline = Instant::now();

    loop {
        tokio::select! {
            _ = time::sleep_until(deadline) => {
                match ticks.try_send(()) {
                    // Consumer gone: nothing left to tick for
                    Err(TrySendError::Closed(())) => break,
                    // Full means the previous tick is still unconsumed;
                    // ticks coalesce rather than queue up
                    Err(TrySendError::Full(())) | Ok(()) => {}
                }
                deadline = Instant::now() + current;
            }
            command = commands.recv() => {
                let new_period = match command {
                    Some(TickerCommand::SetInterval(interval)) => interval,
                    Some(TickerCommand::RevertToInitial) => initial,
                    Some(TickerCommand::Stop) | None => break,
                };
                current = new_period;
                *period.lock().expect("ticker period lock poisoned") = new_period;
                // Re-arm from now at the new period; no tick is emitted for
                // the change itself
                deadline = Instant::now() + new_period;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_first_tick_fires_immediately() {
        let mut ticker = DynamicTicker::new(Duration::from_secs(60));

        let tick = timeout(Duration::from_millis(100), ticker.tick()).await;
        assert_eq!(tick, Ok(Some(())));

        ticker.stop().await;
    }

    #[tokio::test]
    async fn test_subsequent_ticks_follow_period() {
        let mut ticker = DynamicTicker::new(Duration::from_millis(30));

        // First tick is immediate, the next two take a period each
        assert_eq!(ticker.tick().await, Some(()));
        let start = Instant::now();
        assert_eq!(ticker.tick().await, Some(()));
        assert_eq!(ticker.tick().await, Some(()));
        assert!(start.elapsed() >= Duration::from_millis(50));

        ticker.stop().await;
    }

    #[tokio::test]
    async fn test_current_duration_tracks_changes() {
        let mut ticker = DynamicTicker::new(Duration::from_millis(500));
        assert_eq!(ticker.current_duration(), Duration::from_millis(500));

        ticker.set_interval(Duration::from_millis(20));
        // The change is applied asynchronously by the loop
        assert_eq!(ticker.tick().await, Some(()));
        assert_eq!(ticker.tick().await, Some(()));
        assert_eq!(ticker.current_duration(), Duration::from_millis(20));

        ticker.stop().await;
    }

    #[tokio::test]
    async fn test_set_interval_speeds_up_ticking() {
        let mut ticker = DynamicTicker::new(Duration::from_secs(60));

        assert_eq!(ticker.tick().await, Some(()));
        ticker.set_interval(Duration::from_millis(20));

        // Next tick arrives at the new period, far sooner than the initial
        let tick = timeout(Duration::from_secs(5), ticker.tick()).await;
        assert_eq!(tick, Ok(Some(())));

        ticker.stop().await;
    }

    #[tokio::test]
    async fn test_period_change_emits_no_spurious_tick() {
        let mut ticker = DynamicTicker::new(Duration::from_secs(60));
        assert_eq!(ticker.tick().await, Some(()));

        ticker.set_interval(Duration::from_millis(200));
        // The change itself must not produce an immediate tick
        let tick = timeout(Duration::from_millis(50), ticker.tick()).await;
        assert!(tick.is_err());

        ticker.stop().await;
    }

    #[tokio::test]
    async fn test_set_interval_with_revert_restores_initial() {
        let mut ticker = DynamicTicker::new(Duration::from_millis(200));
        assert_eq!(ticker.tick().await, Some(()));

        ticker.set_interval_with_revert(Duration::from_millis(10), Duration::from_millis(50));

        // Give the revert request time to fire and be applied
        time::sleep(Duration::from_millis(150)).await;
        assert_eq!(ticker.tick().await, Some(()));
        assert_eq!(ticker.current_duration(), Duration::from_millis(200));

        ticker.stop().await;
    }

    #[tokio::test]
    async fn test_stop_terminates_loop() {
        let ticker = DynamicTicker::new(Duration::from_millis(10));
        // stop() only returns once the control loop has exited
        ticker.stop().await;
    }

    #[tokio::test]
    async fn test_ticks_coalesce_for_slow_consumer() {
        let mut ticker = DynamicTicker::new(Duration::from_millis(10));

        // Let several periods elapse without consuming
        time::sleep(Duration::from_millis(100)).await;

        // At most one buffered tick: consume it, then the next one must
        // take roughly a period to arrive
        assert_eq!(ticker.tick().await, Some(()));
        let immediate = timeout(Duration::from_millis(2), ticker.tick()).await;
        if immediate.is_err() {
            // Buffered backlog was exactly one tick
            let next = timeout(Duration::from_millis(100), ticker.tick()).await;
            assert_eq!(next, Ok(Some(())));
        }

        ticker.stop().await;
    }
}
