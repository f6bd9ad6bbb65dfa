use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use billdesk_clients::ClientId;
use billdesk_core::{
    Aggregate, AggregateId, AggregateRoot, AuditStamp, DomainError, usable_percentage,
};
use billdesk_events::{Command, Event};

use crate::calculator::{DEFAULT_DISCOUNT_PERCENT, compute_invoice_totals};

/// Invoice identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InvoiceId(pub AggregateId);

impl InvoiceId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for InvoiceId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Invoice payment status.
///
/// The status is caller-chosen data, not a computed state machine: the office
/// marks invoices paid or overdue by hand, and an edit may move a status in
/// any direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Pending,
    Paid,
    Overdue,
}

impl core::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let label = match self {
            InvoiceStatus::Pending => "Pending",
            InvoiceStatus::Paid => "Paid",
            InvoiceStatus::Overdue => "Overdue",
        };
        f.write_str(label)
    }
}

/// Aggregate root: Invoice.
///
/// Derived fields (`tax_amount`, `discount_amount`, `final_total`,
/// `tax_rate_applied`) only ever come out of the calculator; commands never
/// carry them in, and every edit recomputes all of them. The aggregate never
/// assigns identifiers or reads the clock, both arrive on commands.
#[derive(Debug, Clone, PartialEq)]
pub struct Invoice {
    id: InvoiceId,
    client_id: Option<ClientId>,
    business_name: String,
    service: String,
    amount_usd: f64,
    tax_rate_applied: f64,
    discount_percent: f64,
    tax_amount: f64,
    discount_amount: f64,
    final_total: f64,
    status: InvoiceStatus,
    notes: Option<String>,
    audit: Option<AuditStamp>,
    version: u64,
    created: bool,
}

impl Invoice {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: InvoiceId) -> Self {
        Self {
            id,
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
            audit: None,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> InvoiceId {
        self.id
    }

    pub fn client_id(&self) -> Option<ClientId> {
        self.client_id
    }

    pub fn business_name(&self) -> &str {
        &self.business_name
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn amount_usd(&self) -> f64 {
        self.amount_usd
    }

    pub fn tax_rate_applied(&self) -> f64 {
        self.tax_rate_applied
    }

    pub fn discount_percent(&self) -> f64 {
        self.discount_percent
    }

    pub fn tax_amount(&self) -> f64 {
        self.tax_amount
    }

    pub fn discount_amount(&self) -> f64 {
        self.discount_amount
    }

    pub fn final_total(&self) -> f64 {
        self.final_total
    }

    pub fn status(&self) -> InvoiceStatus {
        self.status
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn audit(&self) -> Option<&AuditStamp> {
        self.audit.as_ref()
    }

    /// True once the creating event has been applied.
    pub fn is_persisted(&self) -> bool {
        self.created
    }
}

impl AggregateRoot for Invoice {
    type Id = InvoiceId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateInvoice.
///
/// `tax_rate` and `discount_percent` are the form fields as entered (already
/// coerced from text at the boundary); absent or unusable values fall back to
/// the calculator defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateInvoice {
    pub invoice_id: InvoiceId,
    pub client_id: Option<ClientId>,
    pub business_name: String,
    pub service: String,
    pub amount_usd: f64,
    pub tax_rate: Option<f64>,
    pub discount_percent: Option<f64>,
    pub status: InvoiceStatus,
    pub notes: Option<String>,
    pub audit: AuditStamp,
}

/// Command: EditInvoice.
///
/// Carries the full editable surface of the edit form. The derived fields are
/// recomputed from scratch, never patched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditInvoice {
    pub invoice_id: InvoiceId,
    pub service: String,
    pub amount_usd: f64,
    pub tax_rate: Option<f64>,
    pub discount_percent: Option<f64>,
    pub status: InvoiceStatus,
    pub notes: Option<String>,
    pub audit: AuditStamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InvoiceCommand {
    CreateInvoice(CreateInvoice),
    EditInvoice(EditInvoice),
}

impl Command for InvoiceCommand {
    fn target_aggregate_id(&self) -> AggregateId {
        match self {
            InvoiceCommand::CreateInvoice(cmd) => cmd.invoice_id.0,
            InvoiceCommand::EditInvoice(cmd) => cmd.invoice_id.0,
        }
    }
}

/// Event: InvoiceIssued.
///
/// Full snapshot of the invoice at creation, including the computed derived
/// fields. Replaying this event alone reconstructs the row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceIssued {
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
    pub audit: AuditStamp,
}

/// Event: InvoiceEdited.
///
/// Post-edit snapshot of the editable surface plus freshly computed derived
/// fields. `business_name` and `client_id` are not editable and stay as
/// issued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceEdited {
    pub invoice_id: InvoiceId,
    pub service: String,
    pub amount_usd: f64,
    pub tax_rate_applied: f64,
    pub discount_percent: f64,
    pub tax_amount: f64,
    pub discount_amount: f64,
    pub final_total: f64,
    pub status: InvoiceStatus,
    pub notes: Option<String>,
    pub audit: AuditStamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InvoiceEvent {
    InvoiceIssued(InvoiceIssued),
    InvoiceEdited(InvoiceEdited),
}

impl Event for InvoiceEvent {
    fn event_type(&self) -> &'static str {
        match self {
            InvoiceEvent::InvoiceIssued(_) => "invoicing.invoice.issued",
            InvoiceEvent::InvoiceEdited(_) => "invoicing.invoice.edited",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            InvoiceEvent::InvoiceIssued(e) => e.audit.modified_date,
            InvoiceEvent::InvoiceEdited(e) => e.audit.modified_date,
        }
    }
}

impl Aggregate for Invoice {
    type Command = InvoiceCommand;
    type Event = InvoiceEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            InvoiceEvent::InvoiceIssued(e) => {
                self.id = e.invoice_id;
                self.client_id = e.client_id;
                self.business_name = e.business_name.clone();
                self.service = e.service.clone();
                self.amount_usd = e.amount_usd;
                self.tax_rate_applied = e.tax_rate_applied;
                self.discount_percent = e.discount_percent;
                self.tax_amount = e.tax_amount;
                self.discount_amount = e.discount_amount;
                self.final_total = e.final_total;
                self.status = e.status;
                self.notes = e.notes.clone();
                self.audit = Some(e.audit.clone());
                self.created = true;
            }
            InvoiceEvent::InvoiceEdited(e) => {
                self.service = e.service.clone();
                self.amount_usd = e.amount_usd;
                self.tax_rate_applied = e.tax_rate_applied;
                self.discount_percent = e.discount_percent;
                self.tax_amount = e.tax_amount;
                self.discount_amount = e.discount_amount;
                self.final_total = e.final_total;
                self.status = e.status;
                self.notes = e.notes.clone();
                self.audit = Some(e.audit.clone());
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            InvoiceCommand::CreateInvoice(cmd) => self.handle_create(cmd),
            InvoiceCommand::EditInvoice(cmd) => self.handle_edit(cmd),
        }
    }
}

impl Invoice {
    fn ensure_invoice_id(&self, invoice_id: InvoiceId) -> Result<(), DomainError> {
        if self.id != invoice_id {
            return Err(DomainError::invariant("invoice_id mismatch"));
        }
        Ok(())
    }

    fn handle_create(&self, cmd: &CreateInvoice) -> Result<Vec<InvoiceEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("invoice already exists"));
        }

        if cmd.business_name.trim().is_empty() {
            return Err(DomainError::validation("business_name cannot be empty"));
        }
        if cmd.service.trim().is_empty() {
            return Err(DomainError::validation("service cannot be empty"));
        }

        let totals = compute_invoice_totals(cmd.amount_usd, cmd.tax_rate, cmd.discount_percent)?;

        Ok(vec![InvoiceEvent::InvoiceIssued(InvoiceIssued {
            invoice_id: cmd.invoice_id,
            client_id: cmd.client_id,
            business_name: cmd.business_name.clone(),
            service: cmd.service.clone(),
            amount_usd: cmd.amount_usd,
            tax_rate_applied: totals.tax_rate_applied,
            // Record the discount actually applied, mirroring tax_rate_applied.
            discount_percent: usable_percentage(cmd.discount_percent)
                .unwrap_or(DEFAULT_DISCOUNT_PERCENT),
            tax_amount: totals.tax_amount,
            discount_amount: totals.discount_amount,
            final_total: totals.final_total,
            status: cmd.status,
            notes: cmd.notes.clone(),
            audit: cmd.audit.clone(),
        })])
    }

    fn handle_edit(&self, cmd: &EditInvoice) -> Result<Vec<InvoiceEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_invoice_id(cmd.invoice_id)?;

        if cmd.service.trim().is_empty() {
            return Err(DomainError::validation("service cannot be empty"));
        }

        let totals = compute_invoice_totals(cmd.amount_usd, cmd.tax_rate, cmd.discount_percent)?;

        Ok(vec![InvoiceEvent::InvoiceEdited(InvoiceEdited {
            invoice_id: cmd.invoice_id,
            service: cmd.service.clone(),
            amount_usd: cmd.amount_usd,
            tax_rate_applied: totals.tax_rate_applied,
            discount_percent: usable_percentage(cmd.discount_percent)
                .unwrap_or(DEFAULT_DISCOUNT_PERCENT),
            tax_amount: totals.tax_amount,
            discount_amount: totals.discount_amount,
            final_total: totals.final_total,
            status: cmd.status,
            notes: cmd.notes.clone(),
            audit: cmd.audit.clone(),
        })])
    }
}
