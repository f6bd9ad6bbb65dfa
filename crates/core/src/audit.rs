//! Audit stamp: who changed a record, and when.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_object::ValueObject;

/// Caller-supplied modification stamp.
///
/// The domain layer records this verbatim. It never reads the clock and never
/// derives an actor itself; both values arrive from the boundary that accepted
/// the change (a session user and a request timestamp, typically).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStamp {
    pub modified_by: String,
    pub modified_date: DateTime<Utc>,
}

impl AuditStamp {
    pub fn new(modified_by: impl Into<String>, modified_date: DateTime<Utc>) -> Self {
        Self {
            modified_by: modified_by.into(),
            modified_date,
        }
    }
}

impl ValueObject for AuditStamp {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn stamps_compare_by_value() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
        let a = AuditStamp::new("jdoe", at);
        let b = AuditStamp::new("jdoe", at);
        assert_eq!(a, b);
    }

    #[test]
    fn serializes_with_snake_case_fields() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
        let stamp = AuditStamp::new("jdoe", at);
        let json = serde_json::to_value(&stamp).unwrap();
        assert_eq!(json["modified_by"], "jdoe");
        assert!(json["modified_date"].is_string());
    }
}
