//! Outbox Repository Traits
//!
//! Abstraction over outbox event persistence. The claim step is the only
//! mutual-exclusion mechanism between concurrent processor invocations, so
//! implementations must make it a single atomic conditional update, never a
//! read-then-write.

use crate::outbox::backoff::BackoffConfig;
use crate::outbox::model::{OutboxError, OutboxEventInsert, OutboxEventView};
use async_trait::async_trait;
use sqlx::PgTransaction;
use std::time::Duration;
use tavolo_shared::ids::EventId;

/// Repository for outbox event persistence
#[async_trait]
pub trait OutboxRepository {
    /// Insert events outside a caller-managed transaction.
    ///
    /// Business code paths must prefer [`OutboxRepositoryTx`] so the outbox
    /// row commits or rolls back together with the business mutation; this
    /// variant exists for tooling and tests.
    async fn insert_events(&self, events: &[OutboxEventInsert]) -> Result<(), OutboxError>;

    /// Atomically claim up to `limit` PENDING events, oldest first.
    ///
    /// Claimed rows transition `PENDING -> PROCESSING` in one conditional
    /// statement (`WHERE status = 'PENDING'` at update time), so two
    /// overlapping invocations split the set instead of double-claiming.
    /// FIFO by `created_at` holds within the returned batch only.
    async fn claim_pending(&self, limit: usize) -> Result<Vec<OutboxEventView>, OutboxError>;

    /// Mark claimed events as processed and stamp `processed_at`.
    async fn mark_processed(&self, event_ids: &[EventId]) -> Result<(), OutboxError>;

    /// Mark a claimed event as failed: increments `retry_count`, records the
    /// error and `failed_at`. The event stays out of rotation until the
    /// retry sweep requeues it.
    async fn mark_failed(&self, event_id: &EventId, error: &str) -> Result<(), OutboxError>;

    /// Requeue FAILED events whose backoff delay has elapsed, oldest first,
    /// batch-limited. Returns the number of events moved back to PENDING.
    async fn requeue_failed(&self, limit: u32, backoff: &BackoffConfig)
        -> Result<u64, OutboxError>;

    /// Park FAILED events that exhausted their retries as DEAD.
    /// Returns the number of events parked.
    async fn park_exhausted(&self, max_retries: i32) -> Result<u64, OutboxError>;

    /// Return PROCESSING rows claimed longer than `older_than` ago to
    /// PENDING. Covers passes that crashed between claim and publish.
    async fn reclaim_stale(&self, older_than: Duration) -> Result<u64, OutboxError>;

    /// Delete PROCESSED rows with `processed_at` older than `older_than`,
    /// batch-limited. Never touches any other status.
    async fn cleanup_processed(&self, older_than: Duration, limit: u32)
        -> Result<u64, OutboxError>;

    /// Check whether an idempotency key was already used.
    async fn exists_by_idempotency_key(&self, idempotency_key: &str) -> Result<bool, OutboxError>;

    /// Count PENDING events; used for monitoring.
    async fn count_pending(&self) -> Result<u64, OutboxError>;

    /// Per-status counts plus the age of the oldest pending event.
    async fn get_stats(&self) -> Result<OutboxStats, OutboxError>;

    /// Find an event by id.
    async fn find_by_id(&self, id: EventId) -> Result<Option<OutboxEventView>, OutboxError>;
}

/// Transaction-aware outbox writes
///
/// The core of the pattern: the caller holds a `PgTransaction` for the
/// business mutation and stages outbox rows into the same transaction.
/// Requiring the transaction handle in the signature makes "called outside
/// an active transaction" unrepresentable rather than a runtime error.
#[async_trait]
pub trait OutboxRepositoryTx {
    /// Insert events within an existing transaction.
    async fn insert_events_with_tx(
        &self,
        tx: &mut PgTransaction<'_>,
        events: &[OutboxEventInsert],
    ) -> Result<(), OutboxError>;

    /// Check an idempotency key within an existing transaction.
    async fn exists_by_idempotency_key_with_tx(
        &self,
        tx: &mut PgTransaction<'_>,
        idempotency_key: &str,
    ) -> Result<bool, OutboxError>;
}

/// Statistics about outbox events
#[derive(Debug, Clone, Default)]
pub struct OutboxStats {
    pub pending_count: u64,
    pub processing_count: u64,
    pub processed_count: u64,
    pub failed_count: u64,
    pub dead_count: u64,
    pub oldest_pending_age_seconds: Option<i64>,
}

impl OutboxStats {
    pub fn total(&self) -> u64 {
        self.pending_count
            + self.processing_count
            + self.processed_count
            + self.failed_count
            + self.dead_count
    }

    pub fn has_pending(&self) -> bool {
        self.pending_count > 0
    }

    /// Failed plus dead share of all events, as a percentage.
    pub fn error_rate(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            ((self.failed_count + self.dead_count) as f64 / total as f64) * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_total_and_error_rate() {
        let stats = OutboxStats {
            pending_count: 4,
            processing_count: 1,
            processed_count: 10,
            failed_count: 4,
            dead_count: 1,
            oldest_pending_age_seconds: Some(12),
        };
        assert_eq!(stats.total(), 20);
        assert!(stats.has_pending());
        assert!((stats.error_rate() - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_stats_error_rate_is_zero() {
        let stats = OutboxStats::default();
        assert_eq!(stats.total(), 0);
        assert_eq!(stats.error_rate(), 0.0);
        assert!(!stats.has_pending());
    }
}
