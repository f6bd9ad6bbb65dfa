//! Client-side filtering over read-model rows.
//!
//! Three distinct behaviors, kept deliberately separate because the pages
//! that use them differ:
//! - records search: AND of every non-blank criterion (substring match)
//! - client directory filter: prefix match on one chosen field
//! - quick client search: one term, any searchable field may contain it
//!
//! All matching is case-insensitive. Blank criteria are skipped, except in
//! the quick search where a blank term matches nothing at all.

use crate::projections::{ClientRecord, InvoiceRecord};

/// Criteria for the billing records search. Blank fields are not applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordQuery {
    pub business_name: String,
    pub service: String,
    pub status: String,
    pub invoice_id: String,
}

impl RecordQuery {
    pub fn is_blank(&self) -> bool {
        self.business_name.trim().is_empty()
            && self.service.trim().is_empty()
            && self.status.trim().is_empty()
            && self.invoice_id.trim().is_empty()
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn criterion_matches(criterion: &str, field: &str) -> bool {
    let criterion = criterion.trim();
    criterion.is_empty() || contains_ci(field, criterion)
}

/// Filter billing records: every non-blank criterion must match its field.
///
/// A fully blank query matches everything (the unfiltered table).
pub fn filter_records<'a>(
    records: &'a [InvoiceRecord],
    query: &RecordQuery,
) -> Vec<&'a InvoiceRecord> {
    records
        .iter()
        .filter(|record| {
            criterion_matches(&query.business_name, &record.business_name)
                && criterion_matches(&query.service, &record.service)
                && criterion_matches(&query.status, &record.status.to_string())
                && criterion_matches(&query.invoice_id, &record.invoice_id.to_string())
        })
        .collect()
}

/// The client directory columns a prefix filter can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientSearchField {
    BusinessName,
    ContactName,
    Email,
    PhoneNumber,
}

impl ClientSearchField {
    fn value<'a>(&self, record: &'a ClientRecord) -> Option<&'a str> {
        match self {
            ClientSearchField::BusinessName => Some(record.business_name.as_str()),
            ClientSearchField::ContactName => record.contact_name.as_deref(),
            ClientSearchField::Email => record.email.as_deref(),
            ClientSearchField::PhoneNumber => record.phone_number.as_deref(),
        }
    }
}

/// Filter the client directory by prefix on a single chosen field.
///
/// Rows without a value in the chosen field never match, even for an empty
/// prefix; the filter answers "whose X starts with ...", and a missing X is
/// not an empty X.
pub fn filter_clients_by_prefix<'a>(
    records: &'a [ClientRecord],
    field: ClientSearchField,
    prefix: &str,
) -> Vec<&'a ClientRecord> {
    let prefix = prefix.to_lowercase();
    records
        .iter()
        .filter(|record| {
            field
                .value(record)
                .is_some_and(|value| value.to_lowercase().starts_with(&prefix))
        })
        .collect()
}

/// Quick search over the client directory: one term, matched against every
/// searchable field.
///
/// A blank term matches nothing. This is the one place blankness does not
/// mean "unfiltered"; the quick-search box narrows or shows nothing.
pub fn quick_search_clients<'a>(records: &'a [ClientRecord], term: &str) -> Vec<&'a ClientRecord> {
    let term = term.trim();
    if term.is_empty() {
        return Vec::new();
    }

    const FIELDS: [ClientSearchField; 4] = [
        ClientSearchField::BusinessName,
        ClientSearchField::ContactName,
        ClientSearchField::Email,
        ClientSearchField::PhoneNumber,
    ];

    records
        .iter()
        .filter(|record| {
            FIELDS
                .iter()
                .any(|field| field.value(record).is_some_and(|value| contains_ci(value, term)))
        })
        .collect()
}
