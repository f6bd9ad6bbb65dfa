use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;

use billdesk_clients::{ClientEvent, ClientId, ContactInfo};
use billdesk_core::AggregateId;
use billdesk_events::EventEnvelope;

use crate::projections::ProjectionError;
use crate::read_model::RecordStore;

/// Flattened client directory row.
///
/// The contact fields are unnested so the search module can address them as
/// plain columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientRecord {
    pub client_id: ClientId,
    pub business_name: String,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub state: Option<String>,
    pub zipcode: Option<String>,
    pub industry: Option<String>,
    pub notes: Option<String>,
    pub modified_by: String,
    pub modified_date: DateTime<Utc>,
}

impl ClientRecord {
    fn from_snapshot(
        client_id: ClientId,
        business_name: String,
        contact_name: Option<String>,
        contact: ContactInfo,
        state: Option<String>,
        zipcode: Option<String>,
        industry: Option<String>,
        notes: Option<String>,
        modified_by: String,
        modified_date: DateTime<Utc>,
    ) -> Self {
        Self {
            client_id,
            business_name,
            contact_name,
            email: contact.email,
            phone_number: contact.phone_number,
            address: contact.address,
            state,
            zipcode,
            industry,
            notes,
            modified_by,
            modified_date,
        }
    }
}

/// Builds the client directory from client events.
///
/// Both client events carry the full post-change snapshot, so every apply is
/// a plain overwrite of the row.
#[derive(Debug)]
pub struct ClientDirectoryProjection<S>
where
    S: RecordStore<ClientId, ClientRecord>,
{
    store: S,
    cursors: RwLock<HashMap<AggregateId, u64>>,
}

impl<S> ClientDirectoryProjection<S>
where
    S: RecordStore<ClientId, ClientRecord>,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            cursors: RwLock::new(HashMap::new()),
        }
    }

    fn get_cursor(&self, aggregate_id: AggregateId) -> u64 {
        match self.cursors.read() {
            Ok(cursors) => *cursors.get(&aggregate_id).unwrap_or(&0),
            Err(_) => 0,
        }
    }

    fn update_cursor(&self, aggregate_id: AggregateId, seq: u64) {
        if let Ok(mut cursors) = self.cursors.write() {
            cursors.insert(aggregate_id, seq);
        }
    }

    fn clear_cursors(&self) {
        if let Ok(mut cursors) = self.cursors.write() {
            cursors.clear();
        }
    }

    pub fn get(&self, client_id: &ClientId) -> Option<ClientRecord> {
        self.store.get(client_id)
    }

    pub fn list(&self) -> Vec<ClientRecord> {
        self.store.list()
    }

    pub fn apply_envelope(
        &self,
        envelope: &EventEnvelope<JsonValue>,
    ) -> Result<(), ProjectionError> {
        if envelope.aggregate_type() != "clients.client" {
            return Ok(());
        }

        let aggregate_id = envelope.aggregate_id();
        let seq = envelope.sequence_number();

        let last = self.get_cursor(aggregate_id);
        if seq == 0 {
            return Err(ProjectionError::NonMonotonicSequence { last, found: seq });
        }
        if seq <= last {
            return Ok(());
        }
        if seq != last + 1 && last != 0 {
            return Err(ProjectionError::NonMonotonicSequence { last, found: seq });
        }

        let ev: ClientEvent = serde_json::from_value(envelope.payload().clone())
            .map_err(|e| ProjectionError::Deserialize(e.to_string()))?;

        let client_id = match &ev {
            ClientEvent::ClientRegistered(e) => e.client_id,
            ClientEvent::ClientDetailsUpdated(e) => e.client_id,
        };

        if client_id.0 != aggregate_id {
            return Err(ProjectionError::StreamMismatch(
                "event client_id does not match envelope aggregate_id".to_string(),
            ));
        }

        let record = match ev {
            ClientEvent::ClientRegistered(e) => ClientRecord::from_snapshot(
                e.client_id,
                e.business_name,
                e.contact_name,
                e.contact,
                e.state,
                e.zipcode,
                e.industry,
                e.notes,
                e.audit.modified_by,
                e.audit.modified_date,
            ),
            ClientEvent::ClientDetailsUpdated(e) => ClientRecord::from_snapshot(
                e.client_id,
                e.business_name,
                e.contact_name,
                e.contact,
                e.state,
                e.zipcode,
                e.industry,
                e.notes,
                e.audit.modified_by,
                e.audit.modified_date,
            ),
        };
        self.store.upsert(client_id, record);

        self.update_cursor(aggregate_id, seq);
        Ok(())
    }

    pub fn rebuild_from_scratch(
        &self,
        envelopes: impl IntoIterator<Item = EventEnvelope<JsonValue>>,
    ) -> Result<(), ProjectionError> {
        let mut envs: Vec<_> = envelopes.into_iter().collect();

        self.store.clear();
        self.clear_cursors();

        envs.sort_by_key(|e| (*e.aggregate_id().as_uuid().as_bytes(), e.sequence_number()));

        for env in &envs {
            self.apply_envelope(env)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::read_model::InMemoryRecordStore;
    use billdesk_clients::{ClientDetailsUpdated, ClientRegistered};
    use billdesk_core::AuditStamp;
    use uuid::Uuid;

    fn projection() -> ClientDirectoryProjection<InMemoryRecordStore<ClientId, ClientRecord>> {
        ClientDirectoryProjection::new(InMemoryRecordStore::new())
    }

    fn registered_event(client_id: ClientId) -> ClientEvent {
        ClientEvent::ClientRegistered(ClientRegistered {
            client_id,
            business_name: "Acme Corp".to_string(),
            contact_name: Some("Jane Doe".to_string()),
            contact: ContactInfo {
                email: Some("jane@acme.example".to_string()),
                phone_number: Some("555-0100".to_string()),
                address: None,
            },
            state: Some("CA".to_string()),
            zipcode: Some("94103".to_string()),
            industry: None,
            notes: None,
            audit: AuditStamp::new("jdoe", Utc::now()),
        })
    }

    fn envelope(client_id: ClientId, seq: u64, ev: &ClientEvent) -> EventEnvelope<JsonValue> {
        EventEnvelope::new(
            Uuid::now_v7(),
            client_id.0,
            "clients.client".to_string(),
            seq,
            serde_json::to_value(ev).unwrap(),
        )
    }

    #[test]
    fn registered_event_creates_a_directory_row() {
        let projection = projection();
        let client_id = ClientId::new(AggregateId::new());

        projection
            .apply_envelope(&envelope(client_id, 1, &registered_event(client_id)))
            .unwrap();

        let record = projection.get(&client_id).unwrap();
        assert_eq!(record.business_name, "Acme Corp");
        assert_eq!(record.phone_number.as_deref(), Some("555-0100"));
        assert_eq!(record.state.as_deref(), Some("CA"));
    }

    #[test]
    fn updated_event_overwrites_the_row() {
        let projection = projection();
        let client_id = ClientId::new(AggregateId::new());

        projection
            .apply_envelope(&envelope(client_id, 1, &registered_event(client_id)))
            .unwrap();

        let updated = ClientEvent::ClientDetailsUpdated(ClientDetailsUpdated {
            client_id,
            business_name: "Acme Corporation".to_string(),
            contact_name: Some("Jane Doe".to_string()),
            contact: ContactInfo {
                email: Some("billing@acme.example".to_string()),
                phone_number: Some("555-0100".to_string()),
                address: None,
            },
            state: Some("TX".to_string()),
            zipcode: Some("94103".to_string()),
            industry: Some("Retail".to_string()),
            notes: None,
            audit: AuditStamp::new("asmith", Utc::now()),
        });
        projection
            .apply_envelope(&envelope(client_id, 2, &updated))
            .unwrap();

        let record = projection.get(&client_id).unwrap();
        assert_eq!(record.business_name, "Acme Corporation");
        assert_eq!(record.email.as_deref(), Some("billing@acme.example"));
        assert_eq!(record.state.as_deref(), Some("TX"));
        assert_eq!(record.modified_by, "asmith");
    }

    #[test]
    fn invoice_events_are_ignored() {
        let projection = projection();
        let client_id = ClientId::new(AggregateId::new());

        let env = EventEnvelope::new(
            Uuid::now_v7(),
            client_id.0,
            "invoicing.invoice".to_string(),
            1,
            serde_json::to_value(&registered_event(client_id)).unwrap(),
        );
        projection.apply_envelope(&env).unwrap();

        assert!(projection.list().is_empty());
    }

    #[test]
    fn rebuild_replays_in_order() {
        let projection = projection();
        let client_id = ClientId::new(AggregateId::new());

        projection
            .rebuild_from_scratch(vec![envelope(client_id, 1, &registered_event(client_id))])
            .unwrap();

        assert_eq!(projection.list().len(), 1);
    }
}
