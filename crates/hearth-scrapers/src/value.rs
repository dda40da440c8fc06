//! Numeric/text normalizers, total over arbitrary input.

use chrono::{Datelike, Utc};

/// Parse a loosely-formatted numeric string ("$450,000", "3.5 baths",
/// "2,400 sq ft"). Every character that is not a digit or a decimal point
/// is stripped before parsing; `None` on empty or unparseable remainders.
/// Sign and thousands separators are discarded uniformly, so negative
/// numbers cannot be expressed - they do not occur in this domain.
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// `parse_number` truncated toward zero.
pub fn parse_int(raw: &str) -> Option<i64> {
    parse_number(raw).map(|v| v.trunc() as i64)
}

/// Construction years outside this range are treated as noise.
pub fn plausible_year(year: i32) -> bool {
    (1700..=Utc::now().year()).contains(&year)
}
