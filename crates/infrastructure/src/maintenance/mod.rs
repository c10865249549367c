//! Background maintenance workers
//!
//! `retry_worker` runs the retry sweep (requeue due failures, park
//! exhausted ones, reclaim stale claims); `cleanup_worker` trims old
//! PROCESSED rows. Both run on an interval until shutdown is broadcast.

pub mod cleanup_worker;
pub mod retry_worker;

pub use cleanup_worker::{CleanupConfig, CleanupMetrics, CleanupWorker, start_cleanup_worker};
pub use retry_worker::{RetrySweepConfig, RetrySweepReport, RetrySweeper, start_retry_sweeper};
