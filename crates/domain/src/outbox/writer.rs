//! Transactional Outbox Writer
//!
//! Stages domain events into the outbox within the caller's database
//! transaction. The business mutation and its event row commit together or
//! not at all; publishing happens later, from the processor.

use std::sync::Arc;

use sqlx::PgTransaction;
use tavolo_shared::ids::AggregateId;
use tracing::debug;

use crate::events::DomainEvent;
use crate::outbox::model::{AggregateType, OutboxError, OutboxEventInsert};
use crate::outbox::repository::OutboxRepositoryTx;

/// Writer side of the Transactional Outbox Pattern
pub struct TransactionalOutbox<R> {
    repository: Arc<R>,
}

impl<R> TransactionalOutbox<R>
where
    R: OutboxRepositoryTx + Send + Sync,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Stage a raw event row inside the caller's transaction.
    pub async fn stage(
        &self,
        tx: &mut PgTransaction<'_>,
        event: OutboxEventInsert,
    ) -> Result<(), OutboxError> {
        let event_type = event.event_type.clone();
        let aggregate_id = event.aggregate_id.clone();

        self.repository.insert_events_with_tx(tx, &[event]).await?;

        debug!(
            event_type = %event_type,
            aggregate_id = %aggregate_id,
            "Event staged to outbox"
        );
        Ok(())
    }

    /// Stage a typed domain event inside the caller's transaction.
    ///
    /// The payload is the serialized event body; the metadata carries the
    /// correlation context consumers and the envelope builder read back.
    pub async fn stage_domain_event(
        &self,
        tx: &mut PgTransaction<'_>,
        aggregate_id: AggregateId,
        aggregate_type: AggregateType,
        event: &DomainEvent,
        trace_id: Option<String>,
        idempotency_key: Option<String>,
    ) -> Result<(), OutboxError> {
        let payload = event.to_payload()?;

        let metadata = trace_id.map(|trace_id| {
            serde_json::json!({
                "trace_id": trace_id,
                "aggregate_type": aggregate_type.to_string(),
            })
        });

        let insert = OutboxEventInsert::new(
            aggregate_id,
            aggregate_type,
            event.event_type().to_string(),
            payload,
            metadata,
            idempotency_key,
        );

        self.stage(tx, insert).await
    }
}
