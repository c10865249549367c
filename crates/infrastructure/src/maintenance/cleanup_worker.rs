//! Outbox cleanup worker
//!
//! Periodically deletes PROCESSED events older than the retention window,
//! in bounded batches so a large backlog never turns into one giant DELETE.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time;
use tracing::{info, warn};

use tavolo_domain::outbox::{OutboxError, OutboxRepository};

/// Configuration for the cleanup worker
#[derive(Debug, Clone)]
pub struct CleanupConfig {
    pub interval: Duration,
    pub retention: Duration,
    pub batch_size: u32,
    pub enabled: bool,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3600),
            retention: Duration::from_secs(7 * 24 * 3600),
            batch_size: 1000,
            enabled: true,
        }
    }
}

impl CleanupConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    pub fn with_batch_size(mut self, size: u32) -> Self {
        self.batch_size = size;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// Metrics from the cleanup worker
#[derive(Debug, Default)]
pub struct CleanupMetrics {
    pub events_deleted: AtomicU64,
    pub last_cleanup: AtomicU64,
    pub errors: AtomicU64,
}

impl CleanupMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events_deleted_count(&self) -> u64 {
        self.events_deleted.load(Ordering::SeqCst)
    }

    pub fn error_count(&self) -> u64 {
        self.errors.load(Ordering::SeqCst)
    }
}

/// Periodic retention cleanup over the outbox
pub struct CleanupWorker<R> {
    repository: Arc<R>,
    config: CleanupConfig,
    metrics: Arc<CleanupMetrics>,
}

impl<R> CleanupWorker<R>
where
    R: OutboxRepository + Send + Sync,
{
    pub fn new(repository: Arc<R>, config: CleanupConfig, metrics: Arc<CleanupMetrics>) -> Self {
        Self {
            repository,
            config,
            metrics,
        }
    }

    /// Delete expired PROCESSED events, batch by batch, until a batch
    /// comes back short.
    pub async fn run_once(&self) -> Result<u64, OutboxError> {
        let mut total = 0u64;

        loop {
            let deleted = self
                .repository
                .cleanup_processed(self.config.retention, self.config.batch_size)
                .await?;
            total += deleted;

            if deleted < self.config.batch_size as u64 {
                break;
            }
        }

        if total > 0 {
            self.metrics.events_deleted.fetch_add(total, Ordering::SeqCst);
            info!(events_deleted = total, "Outbox cleanup completed");
        }

        Ok(total)
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        if !self.config.enabled {
            info!("Cleanup worker is disabled");
            return;
        }

        info!(
            interval = ?self.config.interval,
            retention = ?self.config.retention,
            "Starting cleanup worker"
        );

        let mut interval = time::interval(self.config.interval);

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    info!("Cleanup worker shutting down");
                    break;
                }
                _ = interval.tick() => {
                    match self.run_once().await {
                        Ok(_) => {
                            self.metrics.last_cleanup.store(
                                chrono::Utc::now().timestamp() as u64,
                                Ordering::SeqCst,
                            );
                        }
                        Err(e) => {
                            warn!(error = %e, "Cleanup iteration failed");
                            self.metrics.errors.fetch_add(1, Ordering::SeqCst);
                        }
                    }
                }
            }
        }
    }
}

/// Spawn the cleanup worker on the runtime.
pub fn start_cleanup_worker<R>(
    repository: Arc<R>,
    config: CleanupConfig,
    shutdown: broadcast::Sender<()>,
) -> Arc<CleanupMetrics>
where
    R: OutboxRepository + Send + Sync + 'static,
{
    let metrics = Arc::new(CleanupMetrics::new());
    let worker = CleanupWorker::new(repository, config, metrics.clone());
    let shutdown_rx = shutdown.subscribe();

    tokio::spawn(async move {
        worker.run(shutdown_rx).await;
    });

    metrics
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tavolo_domain::outbox::{
        BackoffConfig, OutboxEventInsert, OutboxEventView, OutboxStats,
    };
    use tavolo_shared::ids::EventId;

    /// Repository stub that hands out a scripted sequence of delete counts.
    struct ScriptedRepository {
        deletions: Mutex<Vec<u64>>,
        calls: Mutex<Vec<(Duration, u32)>>,
    }

    impl ScriptedRepository {
        fn new(deletions: Vec<u64>) -> Self {
            Self {
                deletions: Mutex::new(deletions),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl OutboxRepository for ScriptedRepository {
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
            _limit: u32,
            _backoff: &BackoffConfig,
        ) -> Result<u64, OutboxError> {
            Ok(0)
        }

        async fn park_exhausted(&self, _max_retries: i32) -> Result<u64, OutboxError> {
            Ok(0)
        }

        async fn reclaim_stale(&self, _older_than: Duration) -> Result<u64, OutboxError> {
            Ok(0)
        }

        async fn cleanup_processed(
            &self,
            older_than: Duration,
            limit: u32,
        ) -> Result<u64, OutboxError> {
            self.calls.lock().unwrap().push((older_than, limit));
            Ok(self.deletions.lock().unwrap().remove(0))
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
    async fn test_cleanup_drains_in_batches_until_short_batch() {
        let repo = Arc::new(ScriptedRepository::new(vec![1000, 1000, 40]));
        let config = CleanupConfig::default().with_batch_size(1000);
        let metrics = Arc::new(CleanupMetrics::new());
        let worker = CleanupWorker::new(repo.clone(), config, metrics.clone());

        let total = worker.run_once().await.unwrap();
        assert_eq!(total, 2040);
        assert_eq!(repo.calls.lock().unwrap().len(), 3);
        assert_eq!(metrics.events_deleted_count(), 2040);
    }

    #[tokio::test]
    async fn test_cleanup_passes_retention_and_batch_size() {
        let repo = Arc::new(ScriptedRepository::new(vec![0]));
        let config = CleanupConfig::default()
            .with_retention(Duration::from_secs(24 * 3600))
            .with_batch_size(500);
        let worker = CleanupWorker::new(repo.clone(), config, Arc::new(CleanupMetrics::new()));

        worker.run_once().await.unwrap();

        let calls = repo.calls.lock().unwrap();
        assert_eq!(calls[0], (Duration::from_secs(24 * 3600), 500));
    }

    #[tokio::test]
    async fn test_zero_deletions_leave_metrics_untouched() {
        let repo = Arc::new(ScriptedRepository::new(vec![0]));
        let metrics = Arc::new(CleanupMetrics::new());
        let worker = CleanupWorker::new(repo, CleanupConfig::default(), metrics.clone());

        assert_eq!(worker.run_once().await.unwrap(), 0);
        assert_eq!(metrics.events_deleted_count(), 0);
    }
}
