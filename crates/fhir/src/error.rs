use thiserror::Error;

/// Errors raised while building or modifying a node tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("{shape} has no field named {field:?}")]
    UnknownField { shape: &'static str, field: String },

    #[error("{shape}.{field} is {actual}; use the {actual} setter")]
    Cardinality {
        shape: &'static str,
        field: &'static str,
        actual: &'static str,
    },

    #[error("{shape}.{field} expects {expected}, got {found}")]
    TypeMismatch {
        shape: &'static str,
        field: &'static str,
        expected: String,
        found: String,
    },

    #[error("{data_type} cannot hold a {found} value")]
    ValueKind {
        data_type: &'static str,
        found: &'static str,
    },

    #[error("{value} is out of range for {data_type}")]
    OutOfRange { data_type: &'static str, value: i64 },

    #[error("{data_type} element has neither a value nor metadata")]
    EmptyPrimitive { data_type: &'static str },

    #[error("{data_type} cannot carry an id or extensions")]
    MetadataNotAllowed { data_type: &'static str },

    #[error("extensions must be Extension elements, got {found}")]
    NotAnExtension { found: &'static str },

    #[error("invalid narrative xhtml: {reason}")]
    InvalidXhtml { reason: String },

    #[error("extension is missing its url")]
    MissingExtensionUrl,

    #[error("unknown resource type: {0}")]
    UnknownResourceType(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
