//! Lenient numeric coercion for form-style input.
//!
//! Billing data arrives from free-text forms and CSV-ish exports, so numeric
//! fields are parsed by longest valid prefix rather than strict grammar, and
//! optional percentage fields treat zero/blank/garbage uniformly as "not
//! provided" so the field's default applies.

use serde::{Deserialize, Deserializer};

/// Parse the longest numeric prefix of `text`.
///
/// Skips leading whitespace, then accepts an optional sign, digits with at
/// most one decimal point, and an optional complete exponent. Returns `None`
/// when no digits are found.
///
/// `"8"` -> `Some(8.0)`, `" 8.5 usd"` -> `Some(8.5)`, `"1e2"` -> `Some(100.0)`,
/// `"abc"` / `""` -> `None`.
pub fn lenient_f64(text: &str) -> Option<f64> {
    let s = text.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }

    let mut saw_digit = false;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
        saw_digit = true;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
            saw_digit = true;
        }
    }
    if !saw_digit {
        return None;
    }

    // An exponent counts only when at least one digit follows it; otherwise
    // the prefix stops at the mantissa ("2e" parses as 2).
    let mantissa_end = end;
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut cursor = end + 1;
        if cursor < bytes.len() && (bytes[cursor] == b'+' || bytes[cursor] == b'-') {
            cursor += 1;
        }
        let exp_digits_start = cursor;
        while cursor < bytes.len() && bytes[cursor].is_ascii_digit() {
            cursor += 1;
        }
        end = if cursor > exp_digits_start {
            cursor
        } else {
            mantissa_end
        };
    }

    s[..end].parse().ok()
}

/// Collapse an optional percentage to "absent" unless it is usable.
///
/// Zero, negative, and non-finite values all collapse to `None`; the caller
/// then substitutes the field's default. This mirrors how the intake forms
/// treat those inputs: a `0` or unparsable tax rate means "use the standard
/// rate", not "tax-free".
pub fn usable_percentage(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

/// Deserialize an optional numeric field that may arrive as a JSON number,
/// a string (parsed via [`lenient_f64`]), or null.
///
/// Use with `#[serde(default, deserialize_with = "...")]` so a missing field
/// also lands on `None`.
pub fn lenient_f64_opt<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(f64),
        Text(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        None => None,
        Some(Raw::Num(n)) => Some(n),
        Some(Raw::Text(s)) => lenient_f64(&s),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn parses_plain_and_decimal_numbers() {
        assert_eq!(lenient_f64("8"), Some(8.0));
        assert_eq!(lenient_f64("8.875"), Some(8.875));
        assert_eq!(lenient_f64("  42.5"), Some(42.5));
        assert_eq!(lenient_f64("-3.25"), Some(-3.25));
        assert_eq!(lenient_f64("+0.5"), Some(0.5));
        assert_eq!(lenient_f64(".5"), Some(0.5));
    }

    #[test]
    fn parses_longest_numeric_prefix() {
        assert_eq!(lenient_f64("8.5 usd"), Some(8.5));
        assert_eq!(lenient_f64("12abc"), Some(12.0));
        assert_eq!(lenient_f64("3.1.4"), Some(3.1));
    }

    #[test]
    fn incomplete_exponent_stops_at_mantissa() {
        assert_eq!(lenient_f64("1e2"), Some(100.0));
        assert_eq!(lenient_f64("1E-2"), Some(0.01));
        assert_eq!(lenient_f64("2e"), Some(2.0));
        assert_eq!(lenient_f64("2e+"), Some(2.0));
    }

    #[test]
    fn rejects_text_without_digits() {
        assert_eq!(lenient_f64(""), None);
        assert_eq!(lenient_f64("   "), None);
        assert_eq!(lenient_f64("abc"), None);
        assert_eq!(lenient_f64("."), None);
        assert_eq!(lenient_f64("-"), None);
        assert_eq!(lenient_f64("e5"), None);
    }

    #[test]
    fn usable_percentage_collapses_zero_negative_and_nan() {
        assert_eq!(usable_percentage(Some(8.0)), Some(8.0));
        assert_eq!(usable_percentage(Some(0.0)), None);
        assert_eq!(usable_percentage(Some(-4.0)), None);
        assert_eq!(usable_percentage(Some(f64::NAN)), None);
        assert_eq!(usable_percentage(Some(f64::INFINITY)), None);
        assert_eq!(usable_percentage(None), None);
    }

    #[derive(Deserialize)]
    struct Row {
        #[serde(default, deserialize_with = "lenient_f64_opt")]
        rate: Option<f64>,
    }

    #[test]
    fn deserializes_numbers_strings_and_null() {
        let n: Row = serde_json::from_str(r#"{"rate": 8.25}"#).unwrap();
        assert_eq!(n.rate, Some(8.25));

        let s: Row = serde_json::from_str(r#"{"rate": "8.25"}"#).unwrap();
        assert_eq!(s.rate, Some(8.25));

        let junk: Row = serde_json::from_str(r#"{"rate": "n/a"}"#).unwrap();
        assert_eq!(junk.rate, None);

        let null: Row = serde_json::from_str(r#"{"rate": null}"#).unwrap();
        assert_eq!(null.rate, None);

        let missing: Row = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(missing.rate, None);
    }
}
