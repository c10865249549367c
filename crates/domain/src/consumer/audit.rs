//! Processing audit trail
//!
//! Every dispatch attempt produces exactly one `ProcessedEvent` record,
//! whatever its outcome. The store behind the trait is the system of
//! record for "did we see this event, and what happened".

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::classifier::EventCategory;
use tavolo_shared::ids::EventId;

/// Terminal outcome of one dispatch attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessingStatus {
    Success,
    Failure,
}

impl fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessingStatus::Success => write!(f, "SUCCESS"),
            ProcessingStatus::Failure => write!(f, "FAILURE"),
        }
    }
}

/// Structured failure detail attached to FAILURE audit records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingError {
    pub message: String,
    pub code: String,
}

impl ProcessingError {
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
        }
    }

    pub fn unsupported_event_type(event_type: &str) -> Self {
        Self::new(
            format!("no handler registered for event type '{}'", event_type),
            "UNSUPPORTED_EVENT_TYPE",
        )
    }

    pub fn handler_failed(message: impl Into<String>) -> Self {
        Self::new(message, "HANDLER_FAILED")
    }

    pub fn payload_invalid(message: impl Into<String>) -> Self {
        Self::new(message, "PAYLOAD_INVALID")
    }
}

/// One row of the processing audit trail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedEvent {
    pub event_id: EventId,
    pub event_type: String,
    pub category: EventCategory,
    pub source: String,
    pub status: ProcessingStatus,
    pub error: Option<ProcessingError>,
    pub processing_time_ms: u64,
    pub processed_at: DateTime<Utc>,
}

impl ProcessedEvent {
    pub fn success(
        event_id: EventId,
        event_type: impl Into<String>,
        category: EventCategory,
        source: impl Into<String>,
        processing_time: Duration,
    ) -> Self {
        Self {
            event_id,
            event_type: event_type.into(),
            category,
            source: source.into(),
            status: ProcessingStatus::Success,
            error: None,
            processing_time_ms: processing_time.as_millis() as u64,
            processed_at: Utc::now(),
        }
    }

    pub fn failure(
        event_id: EventId,
        event_type: impl Into<String>,
        category: EventCategory,
        source: impl Into<String>,
        error: ProcessingError,
        processing_time: Duration,
    ) -> Self {
        Self {
            event_id,
            event_type: event_type.into(),
            category,
            source: source.into(),
            status: ProcessingStatus::Failure,
            error: Some(error),
            processing_time_ms: processing_time.as_millis() as u64,
            processed_at: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ProcessingStatus::Success
    }
}

/// Errors from the audit store itself
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Audit record not found for event {0}")]
    NotFound(EventId),
}

/// Persistence seam for the audit trail
#[async_trait]
pub trait ProcessedEventStore: Send + Sync {
    /// Record one dispatch outcome. Called once per attempt, never skipped.
    async fn record(&self, event: &ProcessedEvent) -> Result<(), AuditError>;

    /// Fetch the most recent record for an event, if any attempt was made.
    async fn find_latest(&self, event_id: EventId) -> Result<Option<ProcessedEvent>, AuditError>;

    /// Count records by status since a point in time.
    async fn count_since(
        &self,
        status: ProcessingStatus,
        since: DateTime<Utc>,
    ) -> Result<u64, AuditError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_record_carries_no_error() {
        let record = ProcessedEvent::success(
            EventId::new(),
            "PROFILE_UPDATED",
            EventCategory::UserEvent,
            "tavolo.platform",
            Duration::from_millis(12),
        );
        assert!(record.is_success());
        assert!(record.error.is_none());
        assert_eq!(record.processing_time_ms, 12);
    }

    #[test]
    fn test_failure_record_carries_structured_error() {
        let record = ProcessedEvent::failure(
            EventId::new(),
            "UNKNOWN_THING",
            EventCategory::SystemEvent,
            "tavolo.platform",
            ProcessingError::unsupported_event_type("UNKNOWN_THING"),
            Duration::from_millis(3),
        );
        assert!(!record.is_success());
        let error = record.error.unwrap();
        assert_eq!(error.code, "UNSUPPORTED_EVENT_TYPE");
        assert!(error.message.contains("UNKNOWN_THING"));
    }

    #[test]
    fn test_status_serializes_screaming_snake() {
        let json = serde_json::to_string(&ProcessingStatus::Success).unwrap();
        assert_eq!(json, "\"SUCCESS\"");
    }
}
