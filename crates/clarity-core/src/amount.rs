//! Amount parsing for currency-tagged strings.
//!
//! Amounts are stored as the client entered or displayed them, e.g.
//! `"$1,425.30 USD"`, `"712.65"`, `"-$5.00"`. Totals need a number.

/// Parse a currency-tagged amount into a float.
///
/// Input: `"$1,425.30 USD"`, `"10.00"`, `"-$5.00"`
/// Output: `Some(1425.30)`, `Some(10.0)`, `Some(-5.0)`
///
/// # Algorithm
///
/// 1. A leading `-` or `(` marks the amount negative
/// 2. Keep ASCII digits and `.`, dropping symbols, separators and codes
/// 3. Return `None` when no digit survives or the remainder does not parse
pub fn parse_amount(s: &str) -> Option<f64> {
    let s = s.trim();
    let negative = s.starts_with('-') || s.starts_with('(');

    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    if !cleaned.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }

    let value: f64 = cleaned.parse().ok()?;
    Some(if negative { -value } else { value })
}

/// Sum the parsable amounts of `amounts`, or `None` when none parse.
pub fn sum_amounts<'a>(amounts: impl IntoIterator<Item = &'a str>) -> Option<f64> {
    amounts
        .into_iter()
        .filter_map(parse_amount)
        .fold(None, |acc, v| Some(acc.unwrap_or(0.0) + v))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_decimal() {
        assert_eq!(parse_amount("10.00"), Some(10.0));
        assert_eq!(parse_amount("42"), Some(42.0));
    }

    #[test]
    fn currency_tagged() {
        assert_eq!(parse_amount("$1,425.30 USD"), Some(1425.30));
        assert_eq!(parse_amount("  $78.00 USD "), Some(78.0));
    }

    #[test]
    fn negative_forms() {
        assert_eq!(parse_amount("-$5.00"), Some(-5.0));
        assert_eq!(parse_amount("($5.00)"), Some(-5.0));
    }

    #[test]
    fn unparsable() {
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("USD"), None);
        assert_eq!(parse_amount("1.2.3"), None);
    }

    #[test]
    fn sum_skips_unparsable() {
        let total = sum_amounts(["$712.65 USD", "", "$78.00 USD"]).unwrap();
        assert!((total - 790.65).abs() < 1e-9);
        assert_eq!(sum_amounts(["", "n/a"]), None);
    }
}
