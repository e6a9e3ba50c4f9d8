//! Conversion errors raised by the type-adapter protocol.

use thiserror::Error;

/// A conversion that was attempted and turned out to be invalid.
///
/// Conversions that are simply not meaningful for a node (asking a
/// `CodeableConcept` for an integer, say) are not errors; they come back as
/// `Ok(None)`. This type is reserved for inputs that claim to be convertible
/// but are malformed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConversionError {
    /// Text that should hold a literal of the target type does not parse.
    #[error("invalid {target} literal: {text:?}")]
    InvalidLiteral { target: &'static str, text: String },

    /// A well-formed value of the source type has no counterpart in the target type.
    #[error("{value} cannot be converted to {target}")]
    OutOfDomain { target: &'static str, value: String },
}

impl ConversionError {
    pub(crate) fn literal(target: &'static str, text: impl Into<String>) -> Self {
        ConversionError::InvalidLiteral {
            target,
            text: text.into(),
        }
    }

    pub(crate) fn out_of_domain(target: &'static str, value: impl ToString) -> Self {
        ConversionError::OutOfDomain {
            target,
            value: value.to_string(),
        }
    }
}

/// Outcome of a `to_*` conversion.
///
/// - `Ok(Some(v))`: converted.
/// - `Ok(None)`: the conversion is not applicable to this node.
/// - `Err(_)`: the conversion was attempted and the input is invalid.
pub type Conversion<T> = std::result::Result<Option<T>, ConversionError>;
