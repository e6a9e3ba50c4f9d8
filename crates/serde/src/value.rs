//! Scalar conversions shared by both codecs.

use rust_decimal::Decimal;
use std::str::FromStr;

/// Parses decimal text, keeping its scale (`1.50` stays `1.50`).
///
/// Exponent forms such as `1e-3` are accepted as well.
pub(crate) fn parse_decimal(text: &str) -> Option<Decimal> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_decimal_keeps_scale() {
        let parsed = parse_decimal("1.50").unwrap();
        assert_eq!(parsed, dec!(1.5));
        assert_eq!(parsed.to_string(), "1.50");
        assert_eq!(parse_decimal("-0.001").unwrap().to_string(), "-0.001");
        assert_eq!(parse_decimal("2.5e2"), Some(dec!(250)));
        assert_eq!(parse_decimal("abc"), None);
    }
}
