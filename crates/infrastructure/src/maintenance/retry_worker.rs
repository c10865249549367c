//! Retry sweep worker
//!
//! Periodically walks the failure lifecycle forward:
//!
//! 1. park FAILED events that are out of retries as DEAD
//! 2. requeue FAILED events whose backoff window has elapsed
//! 3. reclaim PROCESSING claims older than the stale timeout
//!
//! Parking runs before requeueing so an exhausted event can never slip
//! back to PENDING in the same sweep.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time;
use tracing::{info, warn};

use tavolo_domain::outbox::{BackoffConfig, OutboxError, OutboxRepository};

/// Configuration for the retry sweeper
#[derive(Debug, Clone)]
pub struct RetrySweepConfig {
    pub interval: Duration,
    pub backoff: BackoffConfig,
    pub stale_claim_timeout: Duration,
    pub requeue_batch_size: u32,
    pub enabled: bool,
}

impl Default for RetrySweepConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            backoff: BackoffConfig::standard(),
            stale_claim_timeout: Duration::from_secs(300),
            requeue_batch_size: 100,
            enabled: true,
        }
    }
}

impl RetrySweepConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_backoff(mut self, backoff: BackoffConfig) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_stale_claim_timeout(mut self, timeout: Duration) -> Self {
        self.stale_claim_timeout = timeout;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// Outcome counts for one sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetrySweepReport {
    pub parked: u64,
    pub requeued: u64,
    pub reclaimed: u64,
}

/// Periodic retry sweeper over the outbox
pub struct RetrySweeper<R> {
    repository: Arc<R>,
    config: RetrySweepConfig,
}

impl<R> RetrySweeper<R>
where
    R: OutboxRepository + Send + Sync,
{
    pub fn new(repository: Arc<R>, config: RetrySweepConfig) -> Self {
        Self { repository, config }
    }

    /// Execute one sweep. Park first, then requeue, then reclaim.
    pub async fn run_once(&self) -> Result<RetrySweepReport, OutboxError> {
        let parked = self
            .repository
            .park_exhausted(self.config.backoff.max_retries)
            .await?;

        let requeued = self
            .repository
            .requeue_failed(self.config.requeue_batch_size, &self.config.backoff)
            .await?;

        let reclaimed = self
            .repository
            .reclaim_stale(self.config.stale_claim_timeout)
            .await?;

        let report = RetrySweepReport {
            parked,
            requeued,
            reclaimed,
        };

        if report != RetrySweepReport::default() {
            info!(
                parked = report.parked,
                requeued = report.requeued,
                reclaimed = report.reclaimed,
                "Retry sweep completed"
            );
        }

        Ok(report)
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        if !self.config.enabled {
            info!("Retry sweeper is disabled");
            return;
        }

        info!(
            interval = ?self.config.interval,
            stale_claim_timeout = ?self.config.stale_claim_timeout,
            max_retries = self.config.backoff.max_retries,
            "Starting retry sweeper"
        );

        let mut interval = time::interval(self.config.interval);

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    info!("Retry sweeper shutting down");
                    break;
                }
                _ = interval.tick() => {
                    if let Err(e) = self.run_once().await {
                        warn!(error = %e, "Retry sweep failed");
                    }
                }
            }
        }
    }
}

/// Spawn the retry sweeper on the runtime.
pub fn start_retry_sweeper<R>(
    repository: Arc<R>,
    config: RetrySweepConfig,
    shutdown: broadcast::Sender<()>,
) where
    R: OutboxRepository + Send + Sync + 'static,
{
    let sweeper = RetrySweeper::new(repository, config);
    let shutdown_rx = shutdown.subscribe();

    tokio::spawn(async move {
        sweeper.run(shutdown_rx).await;
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tavolo_domain::outbox::{
        OutboxEventInsert, OutboxEventView, OutboxStats,
    };
    use tavolo_shared::ids::EventId;

    #[derive(Default)]
    struct SweepLog {
        parked_with: Vec<i32>,
        requeued_with: Vec<u32>,
        reclaimed_with: Vec<Duration>,
    }

    /// Repository stub that records sweep calls in order.
    struct RecordingRepository {
        log: Mutex<SweepLog>,
        parked: u64,
        requeued: u64,
        reclaimed: u64,
    }

    impl RecordingRepository {
        fn with_counts(parked: u64, requeued: u64, reclaimed: u64) -> Self {
            Self {
                log: Mutex::new(SweepLog::default()),
                parked,
                requeued,
                reclaimed,
            }
        }
    }

    #[async_trait]
    impl OutboxRepository for RecordingRepository {
        async fn insert_events(&self, _events: &[OutboxEventInsert]) -> Result<(), OutboxError> {
            Ok(())
        }

        async fn claim_pending(&self, _limit: usize) -> Result<Vec<OutboxEventView>, OutboxError> {
            Ok(Vec::new())
        }

        async fn mark_processed(&self, _event_ids: &[EventId]) -> Result<(), OutboxError> {
            Ok(())
        }

        async fn mark_failed(&self, _event_id: &EventId, _error: &str) -> Result<(), OutboxError> {
            Ok(())
        }

        async fn requeue_failed(
            &self,
            limit: u32,
            _backoff: &BackoffConfig,
        ) -> Result<u64, OutboxError> {
            self.log.lock().unwrap().requeued_with.push(limit);
            Ok(self.requeued)
        }

        async fn park_exhausted(&self, max_retries: i32) -> Result<u64, OutboxError> {
            self.log.lock().unwrap().parked_with.push(max_retries);
            Ok(self.parked)
        }

        async fn reclaim_stale(&self, older_than: Duration) -> Result<u64, OutboxError> {
            self.log.lock().unwrap().reclaimed_with.push(older_than);
            Ok(self.reclaimed)
        }

        async fn cleanup_processed(
            &self,
            _older_than: Duration,
            _limit: u32,
        ) -> Result<u64, OutboxError> {
            Ok(0)
        }

        async fn exists_by_idempotency_key(&self, _key: &str) -> Result<bool, OutboxError> {
            Ok(false)
        }

        async fn count_pending(&self) -> Result<u64, OutboxError> {
            Ok(0)
        }

        async fn get_stats(&self) -> Result<OutboxStats, OutboxError> {
            Ok(OutboxStats::default())
        }

        async fn find_by_id(&self, _id: EventId) -> Result<Option<OutboxEventView>, OutboxError> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn test_sweep_reports_all_three_phases() {
        let repo = Arc::new(RecordingRepository::with_counts(1, 3, 2));
        let sweeper = RetrySweeper::new(repo.clone(), RetrySweepConfig::default());

        let report = sweeper.run_once().await.unwrap();
        assert_eq!(
            report,
            RetrySweepReport {
                parked: 1,
                requeued: 3,
                reclaimed: 2
            }
        );
    }

    #[tokio::test]
    async fn test_sweep_parks_before_requeueing() {
        let repo = Arc::new(RecordingRepository::with_counts(0, 0, 0));
        let config = RetrySweepConfig::default()
            .with_stale_claim_timeout(Duration::from_secs(120));
        let sweeper = RetrySweeper::new(repo.clone(), config);

        sweeper.run_once().await.unwrap();

        let log = repo.log.lock().unwrap();
        assert_eq!(log.parked_with, vec![BackoffConfig::standard().max_retries]);
        assert_eq!(log.requeued_with, vec![100]);
        assert_eq!(log.reclaimed_with, vec![Duration::from_secs(120)]);
    }

    #[tokio::test]
    async fn test_disabled_sweeper_exits_immediately() {
        let repo = Arc::new(RecordingRepository::with_counts(0, 0, 0));
        let sweeper = RetrySweeper::new(repo.clone(), RetrySweepConfig::default().disabled());

        let (tx, rx) = broadcast::channel(1);
        drop(tx);
        sweeper.run(rx).await;

        assert!(repo.log.lock().unwrap().parked_with.is_empty());
    }
}
