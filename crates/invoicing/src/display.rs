//! Presentation-boundary formatting.
//!
//! Stored and derived values keep full `f64` precision; two-decimal rounding
//! happens here and nowhere else.

/// Format a dollar amount with two decimals: `98.0` -> `"98.00"`.
pub fn format_usd(value: f64) -> String {
    format!("{value:.2}")
}

/// Format a percentage with two decimals: `8.875` -> `"8.88"`.
pub fn format_percent(value: f64) -> String {
    format!("{value:.2}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_two_decimals_at_the_boundary_only() {
        assert_eq!(format_usd(98.0), "98.00");
        assert_eq!(format_usd(108.875), "108.88");
        assert_eq!(format_usd(0.005), "0.01");
        assert_eq!(format_percent(8.875), "8.88");
    }

    #[test]
    fn negative_totals_format_with_sign() {
        assert_eq!(format_usd(-42.0), "-42.00");
    }
}
