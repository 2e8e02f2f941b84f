//! Background removal of expired sessions.
//!
//! `SessionSweeper` ticks on a fixed interval and asks the ledger to delete
//! every session past its expiry. A failed sweep is logged and counted; the
//! loop keeps running. Shutdown is signalled through a `watch` channel and
//! takes effect between ticks.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut sweeper = SessionSweeper::new(store.clone())
//!     .with_interval(Duration::from_secs(60));
//! let handle = sweeper.start();
//! // ... serve ...
//! sweeper.shutdown();
//! handle.await?;
//! ```

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::capability::SessionLedger;
use crate::error::StoreResult;

/// Default time between sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Counters of the sweeper's work so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepStats {
    /// Completed sweeps, successful or not.
    pub sweeps: u64,
    pub sessions_removed: u64,
    pub failures: u64,
}

/// Periodically deletes expired sessions from a [`SessionLedger`].
pub struct SessionSweeper<L: SessionLedger> {
    ledger: Arc<L>,

    /// Time between sweeps.
    interval: Duration,

    stats: Arc<Mutex<SweepStats>>,

    /// Shutdown signal sender.
    shutdown_tx: Option<watch::Sender<bool>>,

    /// Shutdown signal receiver for the spawned task.
    shutdown_rx: watch::Receiver<bool>,
}

async fn sweep<L: SessionLedger>(ledger: &L, stats: &Mutex<SweepStats>) -> StoreResult<u64> {
    let result = ledger.sweep_expired().await;

    if let Ok(mut s) = stats.lock() {
        s.sweeps += 1;
        match &result {
            Ok(removed) => s.sessions_removed += removed,
            Err(_) => s.failures += 1,
        }
    }

    match &result {
        Ok(0) => debug!("Session sweep removed nothing"),
        Ok(removed) => info!(removed = *removed, "Expired sessions removed"),
        Err(e) => warn!(error = %e, "Session sweep failed"),
    }
    result
}

impl<L: SessionLedger + 'static> SessionSweeper<L> {
    /// Creates a sweeper over `ledger` with the default interval.
    pub fn new(ledger: L) -> Self {
        Self::from_arc(Arc::new(ledger))
    }

    /// Creates a sweeper over a shared ledger.
    pub fn from_arc(ledger: Arc<L>) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            ledger,
            interval: DEFAULT_SWEEP_INTERVAL,
            stats: Arc::new(Mutex::new(SweepStats::default())),
            shutdown_tx: Some(shutdown_tx),
            shutdown_rx,
        }
    }

    /// Sets the time between sweeps.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns the current sweep statistics.
    pub fn stats(&self) -> SweepStats {
        self.stats.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Runs one sweep now, outside the background loop.
    pub async fn sweep_once(&self) -> StoreResult<u64> {
        sweep(self.ledger.as_ref(), &self.stats).await
    }

    /// Starts the background loop. The first sweep runs immediately.
    pub fn start(&self) -> tokio::task::JoinHandle<()> {
        let ledger = self.ledger.clone();
        let stats = self.stats.clone();
        let period = self.interval;
        let mut shutdown_rx = self.shutdown_rx.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(interval_secs = period.as_secs(), "Session sweeper started");

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let _ = sweep(ledger.as_ref(), &stats).await;
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            info!("Session sweeper shutting down");
                            break;
                        }
                    }
                }
            }
        })
    }

    /// Signals the background loop to stop.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(true);
        }
    }
}
