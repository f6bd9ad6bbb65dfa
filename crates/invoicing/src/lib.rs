//! Invoicing domain module (event-sourced).
//!
//! This crate contains the billing rules for invoices: pricing a draft into
//! derived totals, and the invoice aggregate itself. Everything in here is
//! deterministic domain logic (no IO, no HTTP, no storage, no clock).

pub mod calculator;
pub mod display;
pub mod invoice;

pub use calculator::{
    DEFAULT_DISCOUNT_PERCENT, InvoiceDraft, ResolvedInvoice, compute_invoice_totals, price_draft,
};
pub use display::{format_percent, format_usd};
pub use invoice::{
    CreateInvoice, EditInvoice, Invoice, InvoiceCommand, InvoiceEdited, InvoiceEvent, InvoiceId,
    InvoiceIssued, InvoiceStatus,
};
