//! Constants and scalar helpers for FHIR XML.

use crate::value::parse_decimal;
use arbor_fhir::{DataType, PrimitiveValue, ValueKind};

/// FHIR namespace URI.
///
/// Declared on the root resource element and inherited by everything below it.
pub const FHIR_NAMESPACE: &str = "http://hl7.org/fhir";

/// XHTML namespace of the narrative `div`.
pub const XHTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Attribute carrying a primitive's value.
pub const VALUE_ATTRIBUTE: &str = "value";

/// Attribute carrying a primitive's element id.
pub const ID_ATTRIBUTE: &str = "id";

/// Checks if an element name is the XHTML narrative div.
pub fn is_div_element(name: &str) -> bool {
    name == "div"
}

/// Converts a Rust boolean to its string representation for XML.
pub fn bool_to_string(b: bool) -> &'static str {
    if b { "true" } else { "false" }
}

/// The `value` attribute text of a primitive.
pub fn value_to_text(value: &PrimitiveValue) -> String {
    match value {
        PrimitiveValue::Boolean(b) => bool_to_string(*b).to_string(),
        PrimitiveValue::Integer(i) => i.to_string(),
        PrimitiveValue::Decimal(d) => d.to_string(),
        PrimitiveValue::String(s) => s.clone(),
    }
}

/// Parses `value` attribute text as a value of the given type.
///
/// Returns a description of the problem when the text is not a valid
/// lexical form for the type's value kind.
pub fn value_from_text(data_type: DataType, text: &str) -> Result<PrimitiveValue, String> {
    match data_type.value_kind() {
        ValueKind::Boolean => match text {
            "true" => Ok(PrimitiveValue::Boolean(true)),
            "false" => Ok(PrimitiveValue::Boolean(false)),
            _ => Err(format!("{:?} is not a valid boolean", text)),
        },
        ValueKind::Integer => text
            .parse::<i64>()
            .map(PrimitiveValue::Integer)
            .map_err(|_| format!("{:?} is not a valid {}", text, data_type)),
        ValueKind::Decimal => parse_decimal(text)
            .map(PrimitiveValue::Decimal)
            .ok_or_else(|| format!("{:?} is not a valid decimal", text)),
        ValueKind::String => Ok(PrimitiveValue::String(text.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_is_div_element() {
        assert!(is_div_element("div"));
        assert!(!is_div_element("Div"));
        assert!(!is_div_element("text"));
        assert!(!is_div_element("DIV"));
    }

    #[test]
    fn test_bool_to_string() {
        assert_eq!(bool_to_string(true), "true");
        assert_eq!(bool_to_string(false), "false");
    }

    #[test]
    fn test_value_text_round_trip() {
        let decimal = value_from_text(DataType::Decimal, "72.50").unwrap();
        assert_eq!(decimal, PrimitiveValue::Decimal(dec!(72.50)));
        assert_eq!(value_to_text(&decimal), "72.50");

        assert_eq!(
            value_from_text(DataType::Boolean, "true"),
            Ok(PrimitiveValue::Boolean(true))
        );
        assert_eq!(
            value_from_text(DataType::PositiveInt, "3"),
            Ok(PrimitiveValue::Integer(3))
        );
        assert_eq!(
            value_from_text(DataType::Date, "1974-12-25"),
            Ok(PrimitiveValue::String("1974-12-25".to_string()))
        );
    }

    #[test]
    fn test_invalid_lexical_forms() {
        assert!(value_from_text(DataType::Boolean, "TRUE").is_err());
        assert!(value_from_text(DataType::Integer, "1.0").is_err());
        assert!(value_from_text(DataType::Decimal, "one").is_err());
    }
}
