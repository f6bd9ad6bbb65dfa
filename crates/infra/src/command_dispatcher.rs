//! Command execution pipeline (application-level orchestration).
//!
//! Every write in the workspace goes through the same pipeline:
//!
//! ```text
//! Command
//!   ↓
//! 1. Load events from the log
//!   ↓
//! 2. Rehydrate aggregate (apply history to rebuild state)
//!   ↓
//! 3. Handle command (pure decision logic, produces events)
//!   ↓
//! 4. Persist events to the log (append-only)
//!   ↓
//! 5. Publish events to the bus (for read models)
//! ```
//!
//! The dispatcher composes the [`EventLog`] and [`EventBus`] traits, so the
//! same pipeline runs against in-memory backends in tests and against
//! durable ones if they ever exist. Domain code never touches the log or
//! the bus directly.
//!
//! Events are persisted before publication. If publication fails the events
//! are already durable; the caller gets `DispatchError::Publish` and
//! downstream consumers can be caught up from the log. Delivery is
//! at-least-once, which is why projections deduplicate by sequence number.
//!
//! This module contains no IO itself; it composes infrastructure traits.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use billdesk_core::{Aggregate, AggregateId, DomainError};
use billdesk_events::{EventBus, EventEnvelope};

use crate::event_log::{EventLog, EventLogError, PendingEvent, RecordedEvent};

#[derive(Debug)]
pub enum DispatchError {
    /// Domain validation failure (deterministic).
    Validation(String),
    /// Domain invariant failure (deterministic).
    InvariantViolation(String),
    /// Command conflicts with existing state (e.g. duplicate create).
    Conflict(String),
    /// Domain-level not found.
    NotFound,
    /// Loaded stream failed integrity checks (wrong aggregate, bad ordering).
    CorruptStream(String),
    /// Failed to deserialize historical event payloads into the aggregate event type.
    Deserialize(String),
    /// Persisting to the event log failed.
    Store(EventLogError),
    /// Publication failed after a successful append (at-least-once; retry may duplicate).
    Publish(String),
}

impl From<EventLogError> for DispatchError {
    fn from(value: EventLogError) -> Self {
        DispatchError::Store(value)
    }
}

impl From<DomainError> for DispatchError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) => DispatchError::Validation(msg),
            DomainError::InvariantViolation(msg) => DispatchError::InvariantViolation(msg),
            DomainError::Conflict(msg) => DispatchError::Conflict(msg),
            DomainError::NotFound => DispatchError::NotFound,
            DomainError::InvalidId(msg) => DispatchError::Validation(msg),
        }
    }
}

/// Reusable command execution engine for event-sourced aggregates.
///
/// Generic over the log (`S`) and bus (`B`) so tests run entirely in memory.
/// The aggregate itself arrives through a factory closure; the dispatcher
/// never needs to know how a particular aggregate is constructed.
#[derive(Debug)]
pub struct CommandDispatcher<S, B> {
    log: S,
    bus: B,
}

impl<S, B> CommandDispatcher<S, B> {
    pub fn new(log: S, bus: B) -> Self {
        Self { log, bus }
    }

    pub fn into_parts(self) -> (S, B) {
        (self.log, self.bus)
    }
}

impl<S, B> CommandDispatcher<S, B>
where
    S: EventLog,
    B: EventBus<EventEnvelope<JsonValue>>,
{
    /// Dispatch a command through the full pipeline.
    ///
    /// Loads the aggregate's history, rehydrates a fresh instance from
    /// `make_aggregate`, lets the aggregate decide, then appends and
    /// publishes whatever it decided. A command that decides nothing is a
    /// successful no-op and returns an empty vector.
    ///
    /// The loaded stream is re-validated before rehydration even though the
    /// log already enforces these invariants on append. A corrupt stream
    /// here means the backend misbehaved, not the caller.
    pub fn dispatch<A>(
        &self,
        aggregate_id: AggregateId,
        aggregate_type: impl Into<String>,
        command: A::Command,
        make_aggregate: impl FnOnce(AggregateId) -> A,
    ) -> Result<Vec<RecordedEvent>, DispatchError>
    where
        A: Aggregate<Error = DomainError>,
        A::Event: billdesk_events::Event + Serialize + DeserializeOwned,
    {
        // 1) Load history
        let history = self.log.load_stream(aggregate_id)?;
        validate_loaded_stream(aggregate_id, &history)?;

        // 2) Rehydrate aggregate
        let mut aggregate = make_aggregate(aggregate_id);
        apply_history::<A>(&mut aggregate, &history)?;

        // 3) Decide events (no mutation)
        let decided = aggregate.handle(&command).map_err(DispatchError::from)?;
        if decided.is_empty() {
            return Ok(vec![]);
        }

        // 4) Persist (append-only)
        let aggregate_type = aggregate_type.into();
        let pending = decided
            .iter()
            .map(|ev| {
                PendingEvent::from_typed(aggregate_id, aggregate_type.clone(), Uuid::now_v7(), ev)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let recorded = self.log.append(pending)?;

        // 5) Publish recorded events (after append)
        for event in &recorded {
            self.bus
                .publish(event.to_envelope())
                .map_err(|e| DispatchError::Publish(format!("{e:?}")))?;
        }

        Ok(recorded)
    }
}

fn validate_loaded_stream(
    aggregate_id: AggregateId,
    stream: &[RecordedEvent],
) -> Result<(), DispatchError> {
    // The stream must belong to the requested aggregate and be strictly
    // increasing by sequence number, even if the backend is buggy.
    let mut last = 0u64;
    for (idx, e) in stream.iter().enumerate() {
        if e.aggregate_id != aggregate_id {
            return Err(DispatchError::CorruptStream(format!(
                "loaded stream contains wrong aggregate_id at index {idx}"
            )));
        }
        if e.sequence_number == 0 {
            return Err(DispatchError::CorruptStream(
                "recorded event has sequence_number=0".to_string(),
            ));
        }
        if e.sequence_number <= last {
            return Err(DispatchError::CorruptStream(format!(
                "non-monotonic sequence_number in loaded stream (last={last}, found={})",
                e.sequence_number
            )));
        }
        last = e.sequence_number;
    }
    Ok(())
}

fn apply_history<A>(aggregate: &mut A, history: &[RecordedEvent]) -> Result<(), DispatchError>
where
    A: Aggregate,
    A::Event: DeserializeOwned,
{
    // Ensure deterministic ordering.
    let mut sorted = history.to_vec();
    sorted.sort_by_key(|e| e.sequence_number);

    for recorded in sorted {
        let ev: A::Event = serde_json::from_value(recorded.payload)
            .map_err(|e| DispatchError::Deserialize(e.to_string()))?;
        aggregate.apply(&ev);
    }

    Ok(())
}
