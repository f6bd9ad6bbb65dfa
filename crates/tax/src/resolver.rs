//! Jurisdiction → tax rate resolution with a fixed default fallback.

use crate::rate_source::RateSource;

/// System-wide default tax rate (percent).
///
/// Applied whenever a jurisdiction cannot produce a concrete rate. Fixed, not
/// configurable per call.
pub const DEFAULT_TAX_RATE: f64 = 8.0;

/// Outcome of a jurisdiction lookup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TaxLookupResult {
    /// The source produced a usable rate for the jurisdiction.
    Found(f64),
    /// Absent/blank jurisdiction, no table entry, or a failed source.
    NotFound,
}

impl TaxLookupResult {
    /// The located rate, or [`DEFAULT_TAX_RATE`] when nothing was found.
    pub fn rate_or_default(self) -> f64 {
        match self {
            TaxLookupResult::Found(rate) => rate,
            TaxLookupResult::NotFound => DEFAULT_TAX_RATE,
        }
    }

    pub fn matched(self) -> bool {
        matches!(self, TaxLookupResult::Found(_))
    }
}

/// Resolves jurisdiction codes to tax rates.
///
/// Wraps a [`RateSource`] and guarantees a usable rate for every call:
///
/// - a blank or absent jurisdiction short-circuits to the default without
///   consulting the source at all
/// - a source failure or a no-match answer degrades to the default
///
/// Resolution never returns an error. A degraded lookup is a defined fallback
/// behavior, logged at debug level, not an exception.
#[derive(Debug, Clone)]
pub struct TaxResolver<S> {
    source: S,
}

impl<S: RateSource> TaxResolver<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Look up the rate for an optional jurisdiction code.
    ///
    /// A rate of exactly zero from the source counts as found: a table entry
    /// saying 0% is a tax-free jurisdiction, not a missing value. Negative or
    /// non-finite rates from a misconfigured source count as not found.
    pub fn lookup(&self, jurisdiction: Option<&str>) -> TaxLookupResult {
        let code = match jurisdiction.map(str::trim) {
            None | Some("") => return TaxLookupResult::NotFound,
            Some(code) => code,
        };

        match self.source.rate_for(code) {
            Ok(Some(rate)) if rate.is_finite() && rate >= 0.0 => TaxLookupResult::Found(rate),
            Ok(Some(rate)) => {
                tracing::debug!("unusable rate {rate} for jurisdiction '{code}', using default");
                TaxLookupResult::NotFound
            }
            Ok(None) => {
                tracing::debug!("no rate entry for jurisdiction '{code}', using default");
                TaxLookupResult::NotFound
            }
            Err(err) => {
                tracing::debug!("rate lookup failed for jurisdiction '{code}': {err}, using default");
                TaxLookupResult::NotFound
            }
        }
    }

    /// Resolve to a concrete rate, falling back to [`DEFAULT_TAX_RATE`].
    pub fn resolve(&self, jurisdiction: Option<&str>) -> f64 {
        self.lookup(jurisdiction).rate_or_default()
    }
}
