//! Consumer-side event dispatch
//!
//! Routes inbound bus events to registered handlers. Handlers are tried
//! in registration order and the first one that supports the event type
//! wins. A dispatch always ends with an audit record; only a failure of
//! the audit store itself surfaces as an error to the caller.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde_json::Value;
use tokio::time::Instant;
use tracing::{debug, error, warn};

use crate::classifier::ClassifierTable;
use crate::consumer::audit::{
    AuditError, ProcessedEvent, ProcessedEventStore, ProcessingError,
};
use crate::events::DomainEvent;
use tavolo_shared::ids::EventId;

/// An event as received from the bus, before any handler sees it
#[derive(Debug, Clone)]
pub struct InboundEvent {
    pub event_id: EventId,
    pub event_type: String,
    pub source: String,
    pub timestamp: DateTime<Utc>,
    pub detail: Value,
}

impl InboundEvent {
    pub fn new(
        event_id: EventId,
        event_type: impl Into<String>,
        source: impl Into<String>,
        detail: Value,
    ) -> Self {
        Self {
            event_id,
            event_type: event_type.into(),
            source: source.into(),
            timestamp: Utc::now(),
            detail,
        }
    }
}

/// Errors that abort a dispatch instead of being audited
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Audit store error: {0}")]
    Audit(#[from] AuditError),
}

/// A consumer of one or more event types
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Stable name used in logs and audit sources.
    fn name(&self) -> &str;

    /// Whether this handler wants the given event type.
    fn supports(&self, event_type: &str) -> bool;

    /// Process the event. The decoded form is provided alongside the raw
    /// inbound payload; unknown event types arrive as
    /// [`DomainEvent::Unknown`].
    async fn handle(
        &self,
        event: &InboundEvent,
        decoded: &DomainEvent,
    ) -> Result<(), ProcessingError>;
}

/// Ordered first-match dispatcher with an unconditional audit trail
pub struct EventDispatcher<S> {
    handlers: Vec<Arc<dyn EventHandler>>,
    store: Arc<S>,
    classifier: ClassifierTable,
}

impl<S> EventDispatcher<S>
where
    S: ProcessedEventStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self {
            handlers: Vec::new(),
            store,
            classifier: ClassifierTable::with_known_types(),
        }
    }

    /// Register a handler. Registration order is the dispatch tiebreak
    /// when multiple handlers support the same event type.
    pub fn register(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Dispatch one event.
    ///
    /// Handler failures, undecodable payloads and unsupported event types
    /// all resolve to `Ok` with a FAILURE audit record; `Err` means the
    /// audit row itself could not be written.
    pub async fn process_event(
        &self,
        event: &InboundEvent,
    ) -> Result<ProcessedEvent, DispatchError> {
        let start = Instant::now();
        let category = self.classifier.classify(&event.event_type);

        let outcome = self.try_dispatch(event).await;
        let elapsed = start.elapsed();

        let record = match outcome {
            Ok(()) => {
                debug!(
                    event_id = %event.event_id,
                    event_type = %event.event_type,
                    duration_ms = elapsed.as_millis() as u64,
                    "Event processed"
                );
                ProcessedEvent::success(
                    event.event_id,
                    &event.event_type,
                    category,
                    &event.source,
                    elapsed,
                )
            }
            Err(processing_error) => {
                warn!(
                    event_id = %event.event_id,
                    event_type = %event.event_type,
                    code = %processing_error.code,
                    error = %processing_error.message,
                    "Event processing failed"
                );
                ProcessedEvent::failure(
                    event.event_id,
                    &event.event_type,
                    category,
                    &event.source,
                    processing_error,
                    elapsed,
                )
            }
        };

        if let Err(e) = self.store.record(&record).await {
            error!(
                event_id = %event.event_id,
                error = %e,
                "Failed to write processing audit record"
            );
            return Err(e.into());
        }

        Ok(record)
    }

    /// Dispatch a batch concurrently. Every event gets its own outcome;
    /// one audit failure does not cancel the rest of the batch.
    pub async fn process_batch(
        &self,
        events: &[InboundEvent],
    ) -> Vec<Result<ProcessedEvent, DispatchError>> {
        join_all(events.iter().map(|event| self.process_event(event))).await
    }

    async fn try_dispatch(&self, event: &InboundEvent) -> Result<(), ProcessingError> {
        let decoded = DomainEvent::decode(&event.event_type, &event.detail)
            .map_err(|e| ProcessingError::payload_invalid(e.to_string()))?;

        let handler = self
            .handlers
            .iter()
            .find(|h| h.supports(&event.event_type))
            .ok_or_else(|| ProcessingError::unsupported_event_type(&event.event_type))?;

        debug!(
            event_id = %event.event_id,
            event_type = %event.event_type,
            handler = handler.name(),
            "Dispatching event"
        );

        handler.handle(event, &decoded).await
    }
}
