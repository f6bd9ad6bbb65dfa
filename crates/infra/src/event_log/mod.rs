//! Append-only event log.
//!
//! [`EventLog`] is the storage seam; [`InMemoryEventLog`] is the only concrete
//! backend. [`PublishingEventLog`] decorates a log so that successfully
//! appended events are also broadcast on an event bus.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryEventLog;
pub use r#trait::{EventLog, EventLogError, PendingEvent, RecordedEvent};

use serde_json::Value as JsonValue;

use billdesk_core::AggregateId;
use billdesk_events::{EventBus, EventEnvelope};

/// Event log decorator that publishes appended events to a bus.
///
/// Append first, publish second. If publication fails the events are already
/// durable in the wrapped log; the caller sees the publish error and can
/// retry downstream consumers from the log itself.
#[derive(Debug)]
pub struct PublishingEventLog<S, B> {
    log: S,
    bus: B,
}

impl<S, B> PublishingEventLog<S, B>
where
    S: EventLog,
    B: EventBus<EventEnvelope<JsonValue>>,
{
    pub fn new(log: S, bus: B) -> Self {
        Self { log, bus }
    }

    pub fn into_parts(self) -> (S, B) {
        (self.log, self.bus)
    }
}

impl<S, B> EventLog for PublishingEventLog<S, B>
where
    S: EventLog,
    B: EventBus<EventEnvelope<JsonValue>>,
{
    fn append(&self, events: Vec<PendingEvent>) -> Result<Vec<RecordedEvent>, EventLogError> {
        let recorded = self.log.append(events)?;

        for event in &recorded {
            self.bus
                .publish(event.to_envelope())
                .map_err(|err| EventLogError::Publish(format!("{err:?}")))?;
        }

        Ok(recorded)
    }

    fn load_stream(&self, aggregate_id: AggregateId) -> Result<Vec<RecordedEvent>, EventLogError> {
        self.log.load_stream(aggregate_id)
    }
}
