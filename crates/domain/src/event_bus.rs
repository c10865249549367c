//! Event bus seam
//!
//! The pipeline publishes through this trait; the concrete transport
//! (EventBridge, SQS, NATS) lives outside the core and is injected. Bus
//! responses can report per-entry failures even when the call itself
//! succeeds, so callers must check `PublishReceipt::failed_entry_count`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::classifier::{ClassifierTable, EventBusKind};
use crate::outbox::OutboxEventView;

#[derive(Error, Debug)]
pub enum EventBusError {
    #[error("Failed to publish event: {0}")]
    Publish(String),

    #[error("Publish timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result of a publish call.
///
/// `failed_entry_count > 0` is a partial-failure signal the transport may
/// return alongside an otherwise successful response.
#[derive(Debug, Clone, Default)]
pub struct PublishReceipt {
    pub failed_entry_count: usize,
    pub entry_ids: Vec<String>,
}

impl PublishReceipt {
    pub fn accepted(entry_id: impl Into<String>) -> Self {
        Self {
            failed_entry_count: 0,
            entry_ids: vec![entry_id.into()],
        }
    }

    pub fn is_fully_accepted(&self) -> bool {
        self.failed_entry_count == 0
    }
}

/// Outbound message in the bus wire shape
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Logical bus the event routes to
    #[serde(skip)]
    pub bus: Option<EventBusKind>,
    pub source: String,
    /// Detail-type header; equals the outbox event type
    pub detail_type: String,
    /// Detail body: original payload merged with event identity fields
    pub detail: Value,
}

impl EventEnvelope {
    /// Build the outbound envelope for a claimed outbox event.
    ///
    /// The detail body is the original payload extended with `event_id`,
    /// `timestamp` (ISO-8601), `event_type`, `source`, `version`, an
    /// optional `trace_id` taken from the event metadata, and the
    /// `aggregateId`/`eventId` pair consumers correlate on. A payload that
    /// is not a JSON object cannot carry those fields and is rejected.
    pub fn from_outbox(
        event: &OutboxEventView,
        source: &str,
        classifier: &ClassifierTable,
    ) -> Result<Self, EventBusError> {
        let mut detail = match &event.payload {
            Value::Object(map) => map.clone(),
            other => {
                return Err(EventBusError::Serialization(serde::de::Error::custom(
                    format!("outbox payload must be a JSON object, got {}", other),
                )));
            }
        };

        let timestamp: DateTime<Utc> = Utc::now();
        detail.insert("event_id".into(), Value::String(event.id.to_string()));
        detail.insert("timestamp".into(), Value::String(timestamp.to_rfc3339()));
        detail.insert("event_type".into(), Value::String(event.event_type.clone()));
        detail.insert("source".into(), Value::String(source.to_string()));
        detail.insert("version".into(), Value::from(event.event_version));
        if let Some(trace_id) = event
            .metadata
            .as_ref()
            .and_then(|m| m.get("trace_id"))
            .and_then(|v| v.as_str())
        {
            detail.insert("trace_id".into(), Value::String(trace_id.to_string()));
        }
        detail.insert(
            "aggregateId".into(),
            Value::String(event.aggregate_id.to_string()),
        );
        detail.insert("eventId".into(), Value::String(event.id.to_string()));

        Ok(Self {
            bus: Some(classifier.bus_for(&event.event_type)),
            source: source.to_string(),
            detail_type: event.event_type.clone(),
            detail: Value::Object(detail),
        })
    }

    /// Logical bus name for the transport, defaulting to SYSTEM.
    pub fn bus_name(&self) -> &'static str {
        self.bus.unwrap_or(EventBusKind::System).bus_name()
    }
}

/// Publish seam consumed by the outbox processor
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Publish one envelope to its bus.
    ///
    /// An `Ok` receipt with `failed_entry_count > 0` still means the event
    /// was not delivered and must be treated as a failure by the caller.
    async fn publish(&self, envelope: &EventEnvelope) -> Result<PublishReceipt, EventBusError>;
}
