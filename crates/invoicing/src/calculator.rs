//! Invoice pricing: tax, discount, and final total from a draft.
//!
//! The calculator is a pure function over plain numbers. Inputs arrive either
//! as the canonical [`InvoiceDraft`] schema or as raw form text via
//! [`InvoiceDraft::parse`]; both price identically. Derived values keep full
//! `f64` precision, rounding happens only in [`crate::display`].

use serde::{Deserialize, Serialize};

use billdesk_core::{DomainError, DomainResult, ValueObject, lenient_f64, usable_percentage};
use billdesk_tax::{DEFAULT_TAX_RATE, RateSource, TaxResolver};

/// Default discount when the field is absent (percent).
pub const DEFAULT_DISCOUNT_PERCENT: f64 = 0.0;

/// Canonical pricing input.
///
/// Optional fields are genuinely optional: `None` means "use the default",
/// and the lenient deserializer maps `0`, `null`, and unparsable strings to
/// `None` as well, so a form that submits `"taxRate": "0"` gets the standard
/// rate rather than a tax-free invoice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoiceDraft {
    pub amount_usd: f64,
    #[serde(default, deserialize_with = "billdesk_core::num::lenient_f64_opt")]
    pub tax_rate: Option<f64>,
    #[serde(default, deserialize_with = "billdesk_core::num::lenient_f64_opt")]
    pub discount_percent: Option<f64>,
    #[serde(default)]
    pub jurisdiction: Option<String>,
}

impl InvoiceDraft {
    /// Build a draft from raw form text.
    ///
    /// Numeric fields parse by longest numeric prefix. An unparsable amount
    /// coerces to `0.0` (the empty form submits as a zero-value draft);
    /// unparsable percentages become absent and fall back to their defaults
    /// at pricing time. Text inputs price identically to their numeric
    /// equivalents: `("100", "8", "10")` is `(100.0, Some(8.0), Some(10.0))`.
    pub fn parse(
        amount_usd: &str,
        tax_rate: &str,
        discount_percent: &str,
        jurisdiction: Option<&str>,
    ) -> Self {
        Self {
            amount_usd: lenient_f64(amount_usd).unwrap_or(0.0),
            tax_rate: lenient_f64(tax_rate),
            discount_percent: lenient_f64(discount_percent),
            jurisdiction: jurisdiction.map(str::to_owned),
        }
    }
}

/// Derived pricing fields for one invoice.
///
/// Carries `tax_rate_applied` so callers can show which rate actually took
/// effect after defaulting and jurisdiction resolution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedInvoice {
    pub tax_amount: f64,
    pub discount_amount: f64,
    pub final_total: f64,
    pub tax_rate_applied: f64,
}

impl ValueObject for ResolvedInvoice {}

/// Compute derived totals for a draft's numeric fields.
///
/// - `tax_amount = amount_usd * rate / 100`
/// - `discount_amount = amount_usd * discount / 100`
/// - `final_total = amount_usd + tax_amount - discount_amount`
///
/// An absent or unusable (zero, negative, non-finite) `tax_rate` falls back
/// to [`DEFAULT_TAX_RATE`]; `discount_percent` likewise falls back to
/// [`DEFAULT_DISCOUNT_PERCENT`]. The only rejected input is an `amount_usd`
/// that is negative or non-finite; everything else degrades to a defined
/// default. `final_total` is not clamped at zero and rates above 100 apply
/// as given.
pub fn compute_invoice_totals(
    amount_usd: f64,
    tax_rate: Option<f64>,
    discount_percent: Option<f64>,
) -> DomainResult<ResolvedInvoice> {
    let rate = usable_percentage(tax_rate).unwrap_or(DEFAULT_TAX_RATE);
    totals_with_rate(amount_usd, rate, discount_percent)
}

/// Price a draft, resolving the tax rate through `rates` when the draft does
/// not carry a usable one.
///
/// The resolver's answer is final: a 0% table entry is a tax-free
/// jurisdiction, not a missing value, so it must not collapse to the default
/// the way a zero form field does.
pub fn price_draft<S: RateSource>(
    draft: &InvoiceDraft,
    rates: &TaxResolver<S>,
) -> DomainResult<ResolvedInvoice> {
    match usable_percentage(draft.tax_rate) {
        Some(rate) => totals_with_rate(draft.amount_usd, rate, draft.discount_percent),
        None => totals_with_rate(
            draft.amount_usd,
            rates.resolve(draft.jurisdiction.as_deref()),
            draft.discount_percent,
        ),
    }
}

fn totals_with_rate(
    amount_usd: f64,
    tax_rate_applied: f64,
    discount_percent: Option<f64>,
) -> DomainResult<ResolvedInvoice> {
    if !amount_usd.is_finite() {
        return Err(DomainError::validation("amount_usd must be a finite number"));
    }
    if amount_usd < 0.0 {
        return Err(DomainError::validation("amount_usd cannot be negative"));
    }

    let discount = usable_percentage(discount_percent).unwrap_or(DEFAULT_DISCOUNT_PERCENT);

    // Fixed evaluation order, no intermediate rounding.
    let tax_amount = amount_usd * tax_rate_applied / 100.0;
    let discount_amount = amount_usd * discount / 100.0;
    let final_total = amount_usd + tax_amount - discount_amount;

    Ok(ResolvedInvoice {
        tax_amount,
        discount_amount,
        final_total,
        tax_rate_applied,
    })
}
