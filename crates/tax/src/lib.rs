//! `billdesk-tax` — jurisdiction-aware tax rate resolution.
//!
//! Maps a jurisdiction code (a US state abbreviation in practice) to an
//! applicable tax rate. Resolution never fails: a blank jurisdiction, a
//! missing table entry, or a broken rate source all degrade to the fixed
//! system-wide default rate.

pub mod rate_source;
pub mod resolver;

pub use rate_source::{RateSource, RateSourceError, StaticRateTable};
pub use resolver::{DEFAULT_TAX_RATE, TaxLookupResult, TaxResolver};
