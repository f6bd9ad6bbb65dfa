//! Rate source boundary: where jurisdiction rates come from.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A rate source collaborator failed.
///
/// Sources backed by a database or an HTTP service surface their failures
/// through this type. The resolver treats any such failure as "no match" and
/// falls back to the default rate, so this error never reaches invoice
/// computation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("rate source unavailable: {0}")]
pub struct RateSourceError(pub String);

impl RateSourceError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Supplies tax rates by jurisdiction code.
///
/// `Ok(None)` means the source answered but has no entry for the code;
/// `Err` means the source itself failed. Callers are expected to have
/// already awaited any network-backed source: this contract is synchronous.
pub trait RateSource: Send + Sync {
    fn rate_for(&self, jurisdiction: &str) -> Result<Option<f64>, RateSourceError>;
}

impl<S> RateSource for Arc<S>
where
    S: RateSource + ?Sized,
{
    fn rate_for(&self, jurisdiction: &str) -> Result<Option<f64>, RateSourceError> {
        (**self).rate_for(jurisdiction)
    }
}

/// In-memory jurisdiction → rate table.
///
/// Lookup is exact match on the code as stored; callers normalize (trim)
/// before asking. Serializable so a seed table can ship as plain JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaticRateTable {
    rates: HashMap<String, f64>,
}

impl StaticRateTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        Self {
            rates: pairs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn insert(&mut self, jurisdiction: impl Into<String>, rate: f64) {
        self.rates.insert(jurisdiction.into(), rate);
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

impl RateSource for StaticRateTable {
    fn rate_for(&self, jurisdiction: &str) -> Result<Option<f64>, RateSourceError> {
        Ok(self.rates.get(jurisdiction).copied())
    }
}
