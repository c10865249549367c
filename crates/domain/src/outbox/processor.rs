//! Outbox Processor
//!
//! Drains claimed outbox events to the event bus with at-least-once
//! semantics. One `run_once` call is one complete pass: claim a batch, fan
//! out the publishes, mark each outcome. The processor keeps no state
//! between passes, so it can be driven by an external scheduler or by its
//! own `run` loop.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::stream::FuturesUnordered;
use futures::StreamExt;
use tavolo_shared::ids::EventId;
use tokio::time::{timeout, Instant};
use tracing::{debug, error, info, warn};

use crate::classifier::ClassifierTable;
use crate::event_bus::{EventBus, EventEnvelope};
use crate::outbox::model::{OutboxError, OutboxEventView};
use crate::outbox::repository::OutboxRepository;

/// Outcome counts for a single processor pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
    pub processed: u64,
    pub failed: u64,
}

/// How a single event's publish attempt ended
enum PublishOutcome {
    Published {
        id: EventId,
        duration: Duration,
    },
    Failed {
        id: EventId,
        error: String,
        /// Payload could not even be turned into an envelope; retrying will
        /// not help, flagged apart in logs
        deserialization: bool,
    },
}

/// Metrics collected across processor passes
#[derive(Debug)]
struct ProcessorMetrics {
    passes: u64,
    events_processed_total: u64,
    events_failed_total: u64,
    publish_duration_sum_ms: u64,
    min_publish_duration_ms: u64,
    max_publish_duration_ms: u64,
}

impl ProcessorMetrics {
    fn new() -> Self {
        Self {
            passes: 0,
            events_processed_total: 0,
            events_failed_total: 0,
            publish_duration_sum_ms: 0,
            min_publish_duration_ms: u64::MAX,
            max_publish_duration_ms: 0,
        }
    }

    fn record_published(&mut self, duration_ms: u64) {
        self.events_processed_total += 1;
        self.publish_duration_sum_ms += duration_ms;
        self.min_publish_duration_ms = self.min_publish_duration_ms.min(duration_ms);
        self.max_publish_duration_ms = self.max_publish_duration_ms.max(duration_ms);
    }

    fn snapshot(&self) -> ProcessorMetricsSnapshot {
        ProcessorMetricsSnapshot {
            passes: self.passes,
            events_processed_total: self.events_processed_total,
            events_failed_total: self.events_failed_total,
            avg_publish_duration_ms: if self.events_processed_total == 0 {
                0.0
            } else {
                self.publish_duration_sum_ms as f64 / self.events_processed_total as f64
            },
            min_publish_duration_ms: if self.min_publish_duration_ms == u64::MAX {
                0
            } else {
                self.min_publish_duration_ms
            },
            max_publish_duration_ms: self.max_publish_duration_ms,
        }
    }
}

/// Point-in-time snapshot of processor metrics
#[derive(Debug, Clone)]
pub struct ProcessorMetricsSnapshot {
    pub passes: u64,
    pub events_processed_total: u64,
    pub events_failed_total: u64,
    pub avg_publish_duration_ms: f64,
    pub min_publish_duration_ms: u64,
    pub max_publish_duration_ms: u64,
}

/// Polling publisher for the transactional outbox
pub struct OutboxProcessor<R, B> {
    repository: Arc<R>,
    bus: Arc<B>,
    classifier: ClassifierTable,
    batch_size: usize,
    publish_timeout: Duration,
    source: String,
    metrics: Arc<Mutex<ProcessorMetrics>>,
}

impl<R, B> OutboxProcessor<R, B>
where
    R: OutboxRepository + Send + Sync,
    B: EventBus + Send + Sync,
{
    pub fn new(
        repository: Arc<R>,
        bus: Arc<B>,
        batch_size: usize,
        publish_timeout: Duration,
        source: impl Into<String>,
    ) -> Self {
        Self {
            repository,
            bus,
            classifier: ClassifierTable::with_known_types(),
            batch_size,
            publish_timeout,
            source: source.into(),
            metrics: Arc::new(Mutex::new(ProcessorMetrics::new())),
        }
    }

    pub fn metrics_snapshot(&self) -> ProcessorMetricsSnapshot {
        self.metrics.lock().unwrap().snapshot()
    }

    /// Execute one complete pass.
    ///
    /// Repository errors (claim or mark) abort the pass and propagate; bus
    /// errors are converted into per-event FAILED marks and never abort the
    /// batch. An empty claim is a successful no-op.
    pub async fn run_once(&self) -> Result<PassReport, OutboxError> {
        let events = self.repository.claim_pending(self.batch_size).await?;
        if events.is_empty() {
            debug!("No pending events to process");
            return Ok(PassReport::default());
        }

        info!(count = events.len(), "Processing claimed outbox events");

        let mut stream = events
            .into_iter()
            .map(|event| self.publish_one(event))
            .collect::<FuturesUnordered<_>>();

        let mut processed_ids: Vec<EventId> = Vec::new();
        let mut report = PassReport::default();

        while let Some(outcome) = stream.next().await {
            match outcome {
                PublishOutcome::Published { id, duration } => {
                    let duration_ms = duration.as_millis() as u64;
                    self.metrics.lock().unwrap().record_published(duration_ms);
                    processed_ids.push(id);
                    report.processed += 1;
                }
                PublishOutcome::Failed {
                    id,
                    error,
                    deserialization,
                } => {
                    if deserialization {
                        error!(
                            event_id = %id,
                            error = %error,
                            "Outbox payload failed to deserialize; retry will not recover this event"
                        );
                    }
                    self.repository.mark_failed(&id, &error).await?;
                    self.metrics.lock().unwrap().events_failed_total += 1;
                    report.failed += 1;
                }
            }
        }

        if !processed_ids.is_empty() {
            self.repository.mark_processed(&processed_ids).await?;
        }

        self.metrics.lock().unwrap().passes += 1;

        info!(
            processed = report.processed,
            failed = report.failed,
            "Outbox pass complete"
        );

        Ok(report)
    }

    /// Run passes on a fixed cadence until shutdown.
    ///
    /// Pass errors are logged and the loop keeps going; they indicate
    /// infrastructure trouble the next tick may not see.
    pub async fn run(&self, poll_interval: Duration, shutdown: tokio::sync::broadcast::Sender<()>) {
        info!(
            poll_interval_ms = poll_interval.as_millis(),
            batch_size = self.batch_size,
            "Starting outbox processor"
        );

        let mut interval = tokio::time::interval(poll_interval);
        let mut shutdown_rx = shutdown.subscribe();

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.run_once().await {
                        warn!(error = %e, "Outbox pass failed");
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Outbox processor shutting down");
                    break;
                }
            }
        }
    }

    async fn publish_one(&self, event: OutboxEventView) -> PublishOutcome {
        let start = Instant::now();
        let id = event.id;

        let envelope = match EventEnvelope::from_outbox(&event, &self.source, &self.classifier) {
            Ok(envelope) => envelope,
            Err(e) => {
                return PublishOutcome::Failed {
                    id,
                    error: e.to_string(),
                    deserialization: true,
                };
            }
        };

        match timeout(self.publish_timeout, self.bus.publish(&envelope)).await {
            Err(_) => PublishOutcome::Failed {
                id,
                error: format!("publish timed out after {:?}", self.publish_timeout),
                deserialization: false,
            },
            Ok(Err(e)) => {
                error!(
                    event_id = %id,
                    event_type = %event.event_type,
                    retry_count = event.retry_count,
                    error = %e,
                    "Failed to publish outbox event"
                );
                PublishOutcome::Failed {
                    id,
                    error: e.to_string(),
                    deserialization: false,
                }
            }
            Ok(Ok(receipt)) if !receipt.is_fully_accepted() => PublishOutcome::Failed {
                id,
                error: format!(
                    "bus reported {} failed entries",
                    receipt.failed_entry_count
                ),
                deserialization: false,
            },
            Ok(Ok(_)) => {
                debug!(
                    event_id = %id,
                    event_type = %event.event_type,
                    "Event published"
                );
                PublishOutcome::Published {
                    id,
                    duration: start.elapsed(),
                }
            }
        }
    }
}
