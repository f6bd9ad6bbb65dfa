use std::collections::HashMap;

use serde_json::Value as JsonValue;

use billdesk_core::AggregateId;
use billdesk_events::{EventEnvelope, Projection};
use billdesk_invoicing::{InvoiceEvent, InvoiceId, InvoiceStatus};

use crate::projections::ProjectionError;

/// Dashboard totals: outstanding money grouped by invoice status.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DashboardSummary {
    pub pending_total: f64,
    pub paid_total: f64,
    pub overdue_total: f64,
}

impl DashboardSummary {
    pub fn total(&self) -> f64 {
        self.pending_total + self.paid_total + self.overdue_total
    }
}

/// Folds invoice events into per-status revenue totals.
///
/// Unlike the record projections this one owns its state directly; the
/// dashboard only ever wants the aggregated summary, never row lookups.
/// An edit that moves an invoice between statuses moves its final total
/// between buckets.
#[derive(Debug, Default)]
pub struct DashboardProjection {
    invoices: HashMap<InvoiceId, (InvoiceStatus, f64)>,
    cursors: HashMap<AggregateId, u64>,
}

impl DashboardProjection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn summary(&self) -> DashboardSummary {
        let mut summary = DashboardSummary::default();
        for (status, final_total) in self.invoices.values() {
            match status {
                InvoiceStatus::Pending => summary.pending_total += final_total,
                InvoiceStatus::Paid => summary.paid_total += final_total,
                InvoiceStatus::Overdue => summary.overdue_total += final_total,
            }
        }
        summary
    }

    pub fn invoice_count(&self) -> usize {
        self.invoices.len()
    }

    /// Apply a raw envelope as delivered by the bus or replayed from the log.
    ///
    /// Filters, deduplicates, and deserializes before handing the typed
    /// envelope to [`Projection::apply`].
    pub fn apply_json(
        &mut self,
        envelope: &EventEnvelope<JsonValue>,
    ) -> Result<(), ProjectionError> {
        if envelope.aggregate_type() != "invoicing.invoice" {
            return Ok(());
        }

        let aggregate_id = envelope.aggregate_id();
        let seq = envelope.sequence_number();

        let last = *self.cursors.get(&aggregate_id).unwrap_or(&0);
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

        let typed = EventEnvelope::new(
            envelope.event_id(),
            aggregate_id,
            envelope.aggregate_type().to_string(),
            seq,
            ev,
        );
        self.apply(&typed);
        Ok(())
    }

    pub fn rebuild_from_scratch(
        &mut self,
        envelopes: impl IntoIterator<Item = EventEnvelope<JsonValue>>,
    ) -> Result<(), ProjectionError> {
        self.invoices.clear();
        self.cursors.clear();

        let mut envs: Vec<_> = envelopes.into_iter().collect();
        envs.sort_by_key(|e| (*e.aggregate_id().as_uuid().as_bytes(), e.sequence_number()));

        for env in &envs {
            self.apply_json(env)?;
        }
        Ok(())
    }
}

impl Projection for DashboardProjection {
    type Ev = InvoiceEvent;

    fn apply(&mut self, envelope: &EventEnvelope<Self::Ev>) {
        match envelope.payload() {
            InvoiceEvent::InvoiceIssued(e) => {
                self.invoices.insert(e.invoice_id, (e.status, e.final_total));
            }
            InvoiceEvent::InvoiceEdited(e) => {
                self.invoices.insert(e.invoice_id, (e.status, e.final_total));
            }
        }
        self.cursors
            .insert(envelope.aggregate_id(), envelope.sequence_number());
    }
}
