//! Data type identifiers and primitive scalar values.

use crate::catalog::datatypes;
use crate::error::ModelError;
use crate::shape::ShapeDescriptor;
use heck::ToUpperCamelCase;
use rust_decimal::Decimal;
use std::fmt;

/// How a primitive's value is carried in JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Boolean,
    Integer,
    Decimal,
    String,
}

/// Every data type a field can declare.
///
/// Primitive types first, then the System string used for element ids and
/// extension urls, then the complex data types of the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DataType {
    Base64Binary,
    Boolean,
    Canonical,
    Code,
    Date,
    DateTime,
    Decimal,
    Id,
    Instant,
    Integer,
    Markdown,
    Oid,
    PositiveInt,
    String,
    Time,
    UnsignedInt,
    Uri,
    Url,
    Uuid,
    Xhtml,

    SystemString,

    Address,
    Annotation,
    CodeableConcept,
    Coding,
    ContactPoint,
    Extension,
    HumanName,
    Identifier,
    Meta,
    Narrative,
    Period,
    Quantity,
    Range,
    Reference,
}

const PRIMITIVE_LINEAGE: &[&str] = &["PrimitiveType", "DataType", "Element", "Base"];
const STRING_LINEAGE: &[&str] = &["string", "PrimitiveType", "DataType", "Element", "Base"];
const URI_LINEAGE: &[&str] = &["uri", "PrimitiveType", "DataType", "Element", "Base"];
const INTEGER_LINEAGE: &[&str] = &["integer", "PrimitiveType", "DataType", "Element", "Base"];
const COMPLEX_LINEAGE: &[&str] = &["DataType", "Element", "Base"];

impl DataType {
    /// Every data type, in declaration order.
    pub const ALL: &'static [DataType] = &[
        DataType::Base64Binary,
        DataType::Boolean,
        DataType::Canonical,
        DataType::Code,
        DataType::Date,
        DataType::DateTime,
        DataType::Decimal,
        DataType::Id,
        DataType::Instant,
        DataType::Integer,
        DataType::Markdown,
        DataType::Oid,
        DataType::PositiveInt,
        DataType::String,
        DataType::Time,
        DataType::UnsignedInt,
        DataType::Uri,
        DataType::Url,
        DataType::Uuid,
        DataType::Xhtml,
        DataType::SystemString,
        DataType::Address,
        DataType::Annotation,
        DataType::CodeableConcept,
        DataType::Coding,
        DataType::ContactPoint,
        DataType::Extension,
        DataType::HumanName,
        DataType::Identifier,
        DataType::Meta,
        DataType::Narrative,
        DataType::Period,
        DataType::Quantity,
        DataType::Range,
        DataType::Reference,
    ];

    /// The FHIR type name (`dateTime`, `CodeableConcept`).
    pub const fn name(self) -> &'static str {
        match self {
            DataType::Base64Binary => "base64Binary",
            DataType::Boolean => "boolean",
            DataType::Canonical => "canonical",
            DataType::Code => "code",
            DataType::Date => "date",
            DataType::DateTime => "dateTime",
            DataType::Decimal => "decimal",
            DataType::Id => "id",
            DataType::Instant => "instant",
            DataType::Integer => "integer",
            DataType::Markdown => "markdown",
            DataType::Oid => "oid",
            DataType::PositiveInt => "positiveInt",
            DataType::String => "string",
            DataType::Time => "time",
            DataType::UnsignedInt => "unsignedInt",
            DataType::Uri => "uri",
            DataType::Url => "url",
            DataType::Uuid => "uuid",
            DataType::Xhtml => "xhtml",
            DataType::SystemString => "String",
            DataType::Address => "Address",
            DataType::Annotation => "Annotation",
            DataType::CodeableConcept => "CodeableConcept",
            DataType::Coding => "Coding",
            DataType::ContactPoint => "ContactPoint",
            DataType::Extension => "Extension",
            DataType::HumanName => "HumanName",
            DataType::Identifier => "Identifier",
            DataType::Meta => "Meta",
            DataType::Narrative => "Narrative",
            DataType::Period => "Period",
            DataType::Quantity => "Quantity",
            DataType::Range => "Range",
            DataType::Reference => "Reference",
        }
    }

    /// Wire key of this alternative in a choice field: `value` + `dateTime`
    /// gives `valueDateTime`.
    pub fn choice_key(self, field: &str) -> String {
        format!("{}{}", field, self.name().to_upper_camel_case())
    }

    /// Looks a type up by its FHIR name.
    pub fn from_name(name: &str) -> Option<DataType> {
        DataType::ALL.iter().copied().find(|t| t.name() == name)
    }

    pub const fn is_primitive(self) -> bool {
        (self as u8) <= (DataType::SystemString as u8)
    }

    /// True for the System-level string carried by element ids and extension urls.
    pub const fn is_system(self) -> bool {
        matches!(self, DataType::SystemString)
    }

    /// The shape of a complex data type; `None` for primitives.
    pub fn shape(self) -> Option<&'static ShapeDescriptor> {
        let shape = match self {
            DataType::Address => &datatypes::ADDRESS,
            DataType::Annotation => &datatypes::ANNOTATION,
            DataType::CodeableConcept => &datatypes::CODEABLE_CONCEPT,
            DataType::Coding => &datatypes::CODING,
            DataType::ContactPoint => &datatypes::CONTACT_POINT,
            DataType::Extension => &datatypes::EXTENSION,
            DataType::HumanName => &datatypes::HUMAN_NAME,
            DataType::Identifier => &datatypes::IDENTIFIER,
            DataType::Meta => &datatypes::META,
            DataType::Narrative => &datatypes::NARRATIVE,
            DataType::Period => &datatypes::PERIOD,
            DataType::Quantity => &datatypes::QUANTITY,
            DataType::Range => &datatypes::RANGE,
            DataType::Reference => &datatypes::REFERENCE,
            _ => return None,
        };
        Some(shape)
    }

    /// The JSON representation of a primitive's value.
    pub const fn value_kind(self) -> ValueKind {
        match self {
            DataType::Boolean => ValueKind::Boolean,
            DataType::Integer | DataType::PositiveInt | DataType::UnsignedInt => ValueKind::Integer,
            DataType::Decimal => ValueKind::Decimal,
            _ => ValueKind::String,
        }
    }

    /// Base types, nearest first.
    pub const fn lineage(self) -> &'static [&'static str] {
        match self {
            DataType::SystemString => &[],
            DataType::Code | DataType::Id | DataType::Markdown => STRING_LINEAGE,
            DataType::Canonical | DataType::Oid | DataType::Url | DataType::Uuid => URI_LINEAGE,
            DataType::PositiveInt | DataType::UnsignedInt => INTEGER_LINEAGE,
            t if t.is_primitive() => PRIMITIVE_LINEAGE,
            _ => COMPLEX_LINEAGE,
        }
    }

    /// Checks a value against this type's kind and range.
    pub fn check_value(self, value: &PrimitiveValue) -> Result<(), ModelError> {
        let kind = self.value_kind();
        if !self.is_primitive() || kind != value.kind() {
            return Err(ModelError::ValueKind {
                data_type: self.name(),
                found: value.kind_name(),
            });
        }
        if let (DataType::Xhtml, PrimitiveValue::String(text)) = (self, value) {
            crate::xhtml::check_div(text)?;
        }
        if let PrimitiveValue::Integer(i) = value {
            let in_range = match self {
                DataType::PositiveInt => (1..=i32::MAX as i64).contains(i),
                DataType::UnsignedInt => (0..=i32::MAX as i64).contains(i),
                _ => (i32::MIN as i64..=i32::MAX as i64).contains(i),
            };
            if !in_range {
                return Err(ModelError::OutOfRange {
                    data_type: self.name(),
                    value: *i,
                });
            }
        }
        Ok(())
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The scalar held by a primitive node.
///
/// Date, time and other lexical types are stored as their wire text and parsed
/// on demand by the type adapter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PrimitiveValue {
    Boolean(bool),
    Integer(i64),
    Decimal(Decimal),
    String(String),
}

impl PrimitiveValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            PrimitiveValue::Boolean(_) => ValueKind::Boolean,
            PrimitiveValue::Integer(_) => ValueKind::Integer,
            PrimitiveValue::Decimal(_) => ValueKind::Decimal,
            PrimitiveValue::String(_) => ValueKind::String,
        }
    }

    fn kind_name(&self) -> &'static str {
        match self {
            PrimitiveValue::Boolean(_) => "boolean",
            PrimitiveValue::Integer(_) => "integer",
            PrimitiveValue::Decimal(_) => "decimal",
            PrimitiveValue::String(_) => "string",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PrimitiveValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for PrimitiveValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimitiveValue::Boolean(b) => write!(f, "{}", b),
            PrimitiveValue::Integer(i) => write!(f, "{}", i),
            PrimitiveValue::Decimal(d) => write!(f, "{}", d),
            PrimitiveValue::String(s) => f.write_str(s),
        }
    }
}

impl From<bool> for PrimitiveValue {
    fn from(value: bool) -> Self {
        PrimitiveValue::Boolean(value)
    }
}

impl From<i64> for PrimitiveValue {
    fn from(value: i64) -> Self {
        PrimitiveValue::Integer(value)
    }
}

impl From<i32> for PrimitiveValue {
    fn from(value: i32) -> Self {
        PrimitiveValue::Integer(value.into())
    }
}

impl From<Decimal> for PrimitiveValue {
    fn from(value: Decimal) -> Self {
        PrimitiveValue::Decimal(value)
    }
}

impl From<&str> for PrimitiveValue {
    fn from(value: &str) -> Self {
        PrimitiveValue::String(value.to_string())
    }
}

impl From<String> for PrimitiveValue {
    fn from(value: String) -> Self {
        PrimitiveValue::String(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_partition() {
        assert!(DataType::DateTime.is_primitive());
        assert!(DataType::SystemString.is_primitive());
        assert!(!DataType::Coding.is_primitive());
        assert!(DataType::Coding.shape().is_some());
        assert!(DataType::Code.shape().is_none());
    }

    #[test]
    fn test_from_name() {
        assert_eq!(DataType::from_name("dateTime"), Some(DataType::DateTime));
        assert_eq!(DataType::from_name("CodeableConcept"), Some(DataType::CodeableConcept));
        assert_eq!(DataType::from_name("DateTime"), None);
    }

    #[test]
    fn test_choice_key() {
        assert_eq!(DataType::DateTime.choice_key("value"), "valueDateTime");
        assert_eq!(DataType::CodeableConcept.choice_key("value"), "valueCodeableConcept");
        assert_eq!(DataType::Base64Binary.choice_key("value"), "valueBase64Binary");
        assert_eq!(DataType::Boolean.choice_key("deceased"), "deceasedBoolean");
    }

    #[test]
    fn test_check_value_ranges() {
        assert!(DataType::PositiveInt.check_value(&0i64.into()).is_err());
        assert!(DataType::UnsignedInt.check_value(&0i64.into()).is_ok());
        assert!(DataType::Integer.check_value(&(i64::from(i32::MAX) + 1).into()).is_err());
        assert!(DataType::Boolean.check_value(&"true".into()).is_err());
        assert!(DataType::Coding.check_value(&"x".into()).is_err());
    }
}
