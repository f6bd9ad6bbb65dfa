use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;

use billdesk_clients::ClientId;
use billdesk_core::AggregateId;
use billdesk_events::EventEnvelope;
use billdesk_invoicing::{InvoiceEvent, InvoiceId, InvoiceStatus, format_percent, format_usd};

use crate::projections::ProjectionError;
use crate::read_model::RecordStore;

/// Queryable billing record, one row per invoice.
///
/// This is the row the records table renders and the search module filters.
/// Monetary fields stay as raw `f64`; rounding happens only in the
/// `*_display` helpers.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceRecord {
    pub invoice_id: InvoiceId,
    pub client_id: Option<ClientId>,
    pub business_name: String,
    pub service: String,
    pub amount_usd: f64,
    pub tax_rate_applied: f64,
    pub discount_percent: f64,
    pub tax_amount: f64,
    pub discount_amount: f64,
    pub final_total: f64,
    pub status: InvoiceStatus,
    pub notes: Option<String>,
    pub modified_by: String,
    pub modified_date: DateTime<Utc>,
}

impl InvoiceRecord {
    pub fn amount_display(&self) -> String {
        format_usd(self.amount_usd)
    }

    pub fn tax_amount_display(&self) -> String {
        format_usd(self.tax_amount)
    }

    pub fn discount_amount_display(&self) -> String {
        format_usd(self.discount_amount)
    }

    pub fn final_total_display(&self) -> String {
        format_usd(self.final_total)
    }

    pub fn tax_rate_display(&self) -> String {
        format_percent(self.tax_rate_applied)
    }
}

/// Builds [`InvoiceRecord`] rows from invoice events.
///
/// Tracks a per-aggregate cursor so redelivered envelopes are skipped and
/// gaps are reported instead of silently applied.
#[derive(Debug)]
pub struct InvoiceRecordsProjection<S>
where
    S: RecordStore<InvoiceId, InvoiceRecord>,
{
    store: S,
    cursors: RwLock<HashMap<AggregateId, u64>>,
}

impl<S> InvoiceRecordsProjection<S>
where
    S: RecordStore<InvoiceId, InvoiceRecord>,
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

    pub fn get(&self, invoice_id: &InvoiceId) -> Option<InvoiceRecord> {
        self.store.get(invoice_id)
    }

    pub fn list(&self) -> Vec<InvoiceRecord> {
        self.store.list()
    }

    pub fn apply_envelope(
        &self,
        envelope: &EventEnvelope<JsonValue>,
    ) -> Result<(), ProjectionError> {
        if envelope.aggregate_type() != "invoicing.invoice" {
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

        let ev: InvoiceEvent = serde_json::from_value(envelope.payload().clone())
            .map_err(|e| ProjectionError::Deserialize(e.to_string()))?;

        let invoice_id = match &ev {
            InvoiceEvent::InvoiceIssued(e) => e.invoice_id,
            InvoiceEvent::InvoiceEdited(e) => e.invoice_id,
        };

        if invoice_id.0 != aggregate_id {
            return Err(ProjectionError::StreamMismatch(
                "event invoice_id does not match envelope aggregate_id".to_string(),
            ));
        }

        match ev {
            InvoiceEvent::InvoiceIssued(e) => {
                self.store.upsert(
                    e.invoice_id,
                    InvoiceRecord {
                        invoice_id: e.invoice_id,
                        client_id: e.client_id,
                        business_name: e.business_name,
                        service: e.service,
                        amount_usd: e.amount_usd,
                        tax_rate_applied: e.tax_rate_applied,
                        discount_percent: e.discount_percent,
                        tax_amount: e.tax_amount,
                        discount_amount: e.discount_amount,
                        final_total: e.final_total,
                        status: e.status,
                        notes: e.notes,
                        modified_by: e.audit.modified_by,
                        modified_date: e.audit.modified_date,
                    },
                );
            }
            InvoiceEvent::InvoiceEdited(e) => {
                // business_name and client_id are not on the edit event;
                // keep whatever the issued row recorded.
                let mut record = self.store.get(&e.invoice_id).unwrap_or(InvoiceRecord {
                    invoice_id: e.invoice_id,
                    client_id: None,
                    business_name: String::new(),
                    service: String::new(),
                    amount_usd: 0.0,
                    tax_rate_applied: 0.0,
                    discount_percent: 0.0,
                    tax_amount: 0.0,
                    discount_amount: 0.0,
                    final_total: 0.0,
                    status: InvoiceStatus::Pending,
                    notes: None,
                    modified_by: String::new(),
                    modified_date: e.audit.modified_date,
                });
                record.service = e.service;
                record.amount_usd = e.amount_usd;
                record.tax_rate_applied = e.tax_rate_applied;
                record.discount_percent = e.discount_percent;
                record.tax_amount = e.tax_amount;
                record.discount_amount = e.discount_amount;
                record.final_total = e.final_total;
                record.status = e.status;
                record.notes = e.notes;
                record.modified_by = e.audit.modified_by;
                record.modified_date = e.audit.modified_date;
                self.store.upsert(e.invoice_id, record);
            }
        }

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
