//! Projection implementations (read model builders).
//!
//! Projections consume domain events and build query-optimized read models.
//! All projections are:
//! - **Rebuildable**: Can be reconstructed from the event log
//! - **Idempotent**: Safe for at-least-once delivery (cursor per aggregate)

use thiserror::Error;

pub mod client_directory;
pub mod dashboard;
pub mod invoice_records;

pub use client_directory::{ClientDirectoryProjection, ClientRecord};
pub use dashboard::{DashboardProjection, DashboardSummary};
pub use invoice_records::{InvoiceRecord, InvoiceRecordsProjection};

/// Projection ingestion error.
///
/// Shared across all projections; they fail the same ways.
#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("failed to deserialize event: {0}")]
    Deserialize(String),
    #[error("stream integrity violation: {0}")]
    StreamMismatch(String),
    #[error("non-monotonic sequence number (last={last}, found={found})")]
    NonMonotonicSequence { last: u64, found: u64 },
}
