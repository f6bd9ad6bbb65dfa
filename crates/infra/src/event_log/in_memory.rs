use std::collections::HashMap;
use std::sync::RwLock;

use billdesk_core::AggregateId;

use super::r#trait::{EventLog, EventLogError, PendingEvent, RecordedEvent};

/// In-memory event log backed by a `HashMap` of streams.
///
/// The only log backend in the workspace. Suitable for a single office
/// process and for tests; a durable backend would implement the same
/// [`EventLog`] trait.
#[derive(Debug, Default)]
pub struct InMemoryEventLog {
    streams: RwLock<HashMap<AggregateId, Vec<RecordedEvent>>>,
}

impl InMemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of events across all streams. Test and bench helper.
    pub fn total_events(&self) -> usize {
        self.streams
            .read()
            .map(|streams| streams.values().map(Vec::len).sum())
            .unwrap_or(0)
    }
}

impl EventLog for InMemoryEventLog {
    fn append(&self, events: Vec<PendingEvent>) -> Result<Vec<RecordedEvent>, EventLogError> {
        if events.is_empty() {
            return Ok(Vec::new());
        }

        let aggregate_id = events[0].aggregate_id;
        let aggregate_type = events[0].aggregate_type.clone();

        // The whole batch must target one stream.
        for event in &events {
            if event.aggregate_id != aggregate_id {
                return Err(EventLogError::InvalidAppend(format!(
                    "batch mixes aggregate ids: {} and {}",
                    aggregate_id, event.aggregate_id
                )));
            }
            if event.aggregate_type != aggregate_type {
                return Err(EventLogError::AggregateTypeMismatch(format!(
                    "batch mixes aggregate types: {} and {}",
                    aggregate_type, event.aggregate_type
                )));
            }
        }

        let mut streams = self
            .streams
            .write()
            .map_err(|_| EventLogError::InvalidAppend("lock poisoned".to_string()))?;

        let stream = streams.entry(aggregate_id).or_default();

        // A stream never changes aggregate type once created.
        if let Some(first) = stream.first() {
            if first.aggregate_type != aggregate_type {
                return Err(EventLogError::AggregateTypeMismatch(format!(
                    "stream {} holds {} events, append tried {}",
                    aggregate_id, first.aggregate_type, aggregate_type
                )));
            }
        }

        let mut next_sequence = stream.last().map_or(0, |e| e.sequence_number);
        let mut recorded = Vec::with_capacity(events.len());

        for event in events {
            next_sequence += 1;
            let stored = RecordedEvent {
                event_id: event.event_id,
                aggregate_id: event.aggregate_id,
                aggregate_type: event.aggregate_type,
                sequence_number: next_sequence,
                event_type: event.event_type,
                event_version: event.event_version,
                occurred_at: event.occurred_at,
                payload: event.payload,
            };
            stream.push(stored.clone());
            recorded.push(stored);
        }

        Ok(recorded)
    }

    fn load_stream(&self, aggregate_id: AggregateId) -> Result<Vec<RecordedEvent>, EventLogError> {
        let streams = self
            .streams
            .read()
            .map_err(|_| EventLogError::InvalidAppend("lock poisoned".to_string()))?;

        Ok(streams.get(&aggregate_id).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;

    fn pending(aggregate_id: AggregateId, aggregate_type: &str) -> PendingEvent {
        PendingEvent {
            event_id: Uuid::now_v7(),
            aggregate_id,
            aggregate_type: aggregate_type.to_string(),
            event_type: "test.event".to_string(),
            event_version: 1,
            occurred_at: Utc::now(),
            payload: json!({"ok": true}),
        }
    }

    #[test]
    fn append_assigns_contiguous_sequence_numbers() {
        let log = InMemoryEventLog::new();
        let id = AggregateId::new();

        let first = log
            .append(vec![pending(id, "invoicing.invoice"), pending(id, "invoicing.invoice")])
            .unwrap();
        let second = log.append(vec![pending(id, "invoicing.invoice")]).unwrap();

        assert_eq!(first[0].sequence_number, 1);
        assert_eq!(first[1].sequence_number, 2);
        assert_eq!(second[0].sequence_number, 3);

        let stream = log.load_stream(id).unwrap();
        assert_eq!(stream.len(), 3);
        assert!(stream.windows(2).all(|w| w[1].sequence_number == w[0].sequence_number + 1));
    }

    #[test]
    fn empty_batch_is_a_no_op() {
        let log = InMemoryEventLog::new();
        assert!(log.append(Vec::new()).unwrap().is_empty());
        assert_eq!(log.total_events(), 0);
    }

    #[test]
    fn batch_must_target_a_single_aggregate() {
        let log = InMemoryEventLog::new();
        let result = log.append(vec![
            pending(AggregateId::new(), "invoicing.invoice"),
            pending(AggregateId::new(), "invoicing.invoice"),
        ]);

        assert!(matches!(result, Err(EventLogError::InvalidAppend(_))));
    }

    #[test]
    fn stream_aggregate_type_is_stable() {
        let log = InMemoryEventLog::new();
        let id = AggregateId::new();

        log.append(vec![pending(id, "invoicing.invoice")]).unwrap();
        let result = log.append(vec![pending(id, "clients.client")]);

        assert!(matches!(result, Err(EventLogError::AggregateTypeMismatch(_))));
    }

    #[test]
    fn missing_stream_loads_empty() {
        let log = InMemoryEventLog::new();
        assert!(log.load_stream(AggregateId::new()).unwrap().is_empty());
    }
}
