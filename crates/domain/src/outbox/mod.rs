//! Transactional Outbox
//!
//! Model, repository traits, backoff policy, the transactional writer and
//! the polling processor that drains the outbox to the event bus.

pub mod backoff;
pub mod model;
pub mod processor;
pub mod repository;
pub mod writer;

pub use backoff::BackoffConfig;
pub use model::{AggregateType, OutboxError, OutboxEventInsert, OutboxEventView, OutboxStatus};
pub use processor::{OutboxProcessor, PassReport, ProcessorMetricsSnapshot};
pub use repository::{OutboxRepository, OutboxRepositoryTx, OutboxStats};
pub use writer::TransactionalOutbox;
