//! Periodic refresh loop
//!
//! Runs one refresh at startup and then one per interval. Cycles never
//! overlap: ticks that fall due while a cycle is still running are skipped.
//! The outcome of every cycle is published on a watch channel; a failed
//! cycle keeps the previous snapshot.

use crate::coordinator::Coordinator;
use crate::error::Result;
use crate::logging::{StructuredLogger, get_logger};
use crate::persistence::PersistenceManager;
use crate::portal::PortalConnector;
use crate::snapshot::Snapshot;
use crate::statistics::{StatisticsSink, import_statistics};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{MissedTickBehavior, interval};

/// Last known result of the refresh loop
#[derive(Debug, Clone, Default)]
pub struct RefreshStatus {
    /// Snapshot of the last successful cycle
    pub snapshot: Option<Arc<Snapshot>>,
    /// Error of the last cycle, cleared on success
    pub last_error: Option<String>,
    /// Whether the last cycle failed because the credentials were rejected
    pub auth_failed: bool,
    pub last_success: Option<DateTime<Utc>>,
    pub cycles: u64,
    pub failures: u64,
}

pub struct Scheduler<C: PortalConnector> {
    coordinator: Coordinator<C>,
    interval: Duration,
    sink: Option<Arc<dyn StatisticsSink>>,
    currency: String,
    persistence: Option<PersistenceManager>,
    status_tx: watch::Sender<RefreshStatus>,
    logger: StructuredLogger,
}

impl<C: PortalConnector> Scheduler<C> {
    pub fn new(coordinator: Coordinator<C>, interval: Duration) -> Self {
        let (status_tx, _) = watch::channel(RefreshStatus::default());
        Self {
            coordinator,
            interval,
            sink: None,
            currency: "SEK".to_string(),
            persistence: None,
            status_tx,
            logger: get_logger("scheduler"),
        }
    }

    /// Import statistics into `sink` after each successful cycle
    pub fn with_statistics(mut self, sink: Arc<dyn StatisticsSink>, currency: &str) -> Self {
        self.sink = Some(sink);
        self.currency = currency.to_string();
        self
    }

    /// Persist the history caches after each successful cycle
    pub fn with_persistence(mut self, persistence: PersistenceManager) -> Self {
        self.persistence = Some(persistence);
        self
    }

    /// Receiver observing every published status
    pub fn subscribe(&self) -> watch::Receiver<RefreshStatus> {
        self.status_tx.subscribe()
    }

    pub fn status(&self) -> RefreshStatus {
        self.status_tx.borrow().clone()
    }

    pub fn coordinator(&self) -> &Coordinator<C> {
        &self.coordinator
    }

    /// Load persisted history into the coordinator, if any
    pub fn restore(&mut self) {
        let Some(persistence) = &self.persistence else {
            return;
        };
        match persistence.load() {
            Ok(Some(state)) => self.coordinator.restore_history(state),
            Ok(None) => {}
            Err(e) => self
                .logger
                .warn(&format!("Ignoring unreadable state file: {}", e)),
        }
    }

    fn persist(&self) {
        if let Some(persistence) = &self.persistence
            && let Err(e) = persistence.save(self.coordinator.history_state())
        {
            self.logger
                .error(&format!("Failed to persist history: {}", e));
        }
    }

    /// Run one cycle and publish its outcome
    pub async fn run_cycle(&mut self) -> Result<()> {
        let result = self.coordinator.refresh().await;

        match result {
            Ok(snapshot) => {
                self.status_tx.send_modify(|status| {
                    status.snapshot = Some(Arc::new(snapshot));
                    status.last_error = None;
                    status.auth_failed = false;
                    status.last_success = Some(Utc::now());
                    status.cycles += 1;
                });

                if let Some(sink) = &self.sink {
                    import_statistics(
                        &**sink,
                        self.coordinator.historical_entries(),
                        self.coordinator.historical_cost_entries(),
                        &self.currency,
                    )
                    .await;
                }
                self.persist();
                Ok(())
            }
            Err(e) => {
                self.logger.error(&format!("Refresh cycle failed: {}", e));
                self.status_tx.send_modify(|status| {
                    status.last_error = Some(e.to_string());
                    status.auth_failed = e.is_auth_failure();
                    status.cycles += 1;
                    status.failures += 1;
                });
                Err(e)
            }
        }
    }

    /// Run until `shutdown` turns true or its sender is dropped.
    ///
    /// Rejected credentials on the startup refresh end the loop with an
    /// authentication error; any other failure is retried next interval.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        self.restore();

        if let Err(e) = self.run_cycle().await
            && e.is_auth_failure()
        {
            self.coordinator.shutdown().await;
            return Err(e);
        }

        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately; the startup refresh covered it
        ticker.tick().await;

        while !*shutdown.borrow() {
            tokio::select! {
                _ = ticker.tick() => {
                    // Failures are published on the status channel
                    let _ = self.run_cycle().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        self.logger.info("Shutdown signal received");

        self.coordinator.shutdown().await;
        self.persist();
        Ok(())
    }
}
