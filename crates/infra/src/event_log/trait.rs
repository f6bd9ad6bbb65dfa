use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;
use uuid::Uuid;

use billdesk_core::AggregateId;
use std::sync::Arc;

/// An event ready to be appended to a stream (no sequence number yet).
///
/// Events move through this lifecycle:
///
/// 1. **Domain event**: produced by an aggregate's `handle()`
/// 2. **PendingEvent**: wrapped with stream metadata, payload serialized
/// 3. **RecordedEvent**: appended to the log, sequence number assigned
/// 4. **EventEnvelope**: published to the bus for read-model consumers
///
/// Use [`PendingEvent::from_typed`] to build one from a typed domain event;
/// it captures the event metadata (`event_type`, `event_version`,
/// `occurred_at`) needed to deserialize the payload later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingEvent {
    pub event_id: Uuid,
    pub aggregate_id: AggregateId,
    pub aggregate_type: String,

    pub event_type: String,
    pub event_version: u32,
    pub occurred_at: DateTime<Utc>,

    pub payload: JsonValue,
}

/// An event recorded in an append-only stream.
///
/// Sequence numbers are assigned by the log during append: per-stream,
/// starting at 1, always `last + 1`, never reassigned. Consumers rely on
/// them for ordering and for duplicate detection under at-least-once
/// delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedEvent {
    pub event_id: Uuid,
    pub aggregate_id: AggregateId,
    pub aggregate_type: String,

    /// Monotonically increasing position in the aggregate stream.
    pub sequence_number: u64,

    pub event_type: String,
    pub event_version: u32,
    pub occurred_at: DateTime<Utc>,

    pub payload: JsonValue,
}

impl RecordedEvent {
    pub fn stream_version(&self) -> u64 {
        self.sequence_number
    }

    /// Convert a recorded event into an envelope for publication.
    pub fn to_envelope(&self) -> billdesk_events::EventEnvelope<JsonValue> {
        billdesk_events::EventEnvelope::new(
            self.event_id,
            self.aggregate_id,
            self.aggregate_type.clone(),
            self.sequence_number,
            self.payload.clone(),
        )
    }
}

/// Event log operation error.
///
/// These are infrastructure failures (storage, stream hygiene), distinct from
/// domain errors (validation, invariants).
#[derive(Debug, Error)]
pub enum EventLogError {
    #[error("aggregate type mismatch: {0}")]
    AggregateTypeMismatch(String),

    #[error("invalid append: {0}")]
    InvalidAppend(String),

    #[error("event publication failed: {0}")]
    Publish(String),
}

/// Append-only event log.
///
/// Events are organized into streams, one stream per aggregate instance,
/// keyed by `aggregate_id`. Within a stream, sequence numbers increase by
/// one per event with no gaps.
///
/// `append()` must:
/// - validate that the whole batch targets one aggregate and one
///   aggregate type
/// - enforce aggregate-type stability across the life of a stream
/// - assign sequence numbers starting at `current_version + 1`
/// - persist the batch atomically
///
/// `load_stream()` returns the full stream in sequence order, or an empty
/// vector for a stream that does not exist yet. There is no concurrency
/// token on append: the office has a single writer, and the append position
/// is always "after whatever is there".
pub trait EventLog: Send + Sync {
    /// Append events to an aggregate stream (append-only).
    fn append(&self, events: Vec<PendingEvent>) -> Result<Vec<RecordedEvent>, EventLogError>;

    /// Load the full stream for an aggregate.
    fn load_stream(&self, aggregate_id: AggregateId) -> Result<Vec<RecordedEvent>, EventLogError>;
}

impl<S> EventLog for Arc<S>
where
    S: EventLog + ?Sized,
{
    fn append(&self, events: Vec<PendingEvent>) -> Result<Vec<RecordedEvent>, EventLogError> {
        (**self).append(events)
    }

    fn load_stream(&self, aggregate_id: AggregateId) -> Result<Vec<RecordedEvent>, EventLogError> {
        (**self).load_stream(aggregate_id)
    }
}

impl PendingEvent {
    /// Convenience constructor from a typed domain event.
    ///
    /// Keeps infra decoupled from the domain crates while still capturing the
    /// event metadata needed for future deserialization.
    pub fn from_typed<E>(
        aggregate_id: AggregateId,
        aggregate_type: impl Into<String>,
        event_id: Uuid,
        event: &E,
    ) -> Result<Self, EventLogError>
    where
        E: billdesk_events::Event + Serialize,
    {
        let payload = serde_json::to_value(event).map_err(|e| {
            EventLogError::InvalidAppend(format!("payload serialization failed: {e}"))
        })?;

        Ok(Self {
            event_id,
            aggregate_id,
            aggregate_type: aggregate_type.into(),
            event_type: event.event_type().to_string(),
            event_version: event.version(),
            occurred_at: event.occurred_at(),
            payload,
        })
    }
}
