use arbor_fhir::ModelError;
use arbor_serde_support::ShadowError;
use thiserror::Error;

/// Error types for FHIR encoding and decoding.
#[derive(Error, Debug)]
pub enum SerdeError {
    /// JSON syntax error or a failure converting to/from `serde_json::Value`
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// XML writer or XHTML scanner error
    #[cfg(feature = "xml")]
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// XML document is not well-formed
    #[cfg(feature = "xml")]
    #[error("XML parse error: {0}")]
    XmlParse(#[from] roxmltree::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// Well-formed input that does not match the declared shapes
    #[error("decode error at {path}: {message}")]
    Decode { path: String, message: String },

    /// More than one alternative of a choice field is populated
    #[error("more than one alternative of choice field {field} is present")]
    AmbiguousChoice { field: String },

    #[error("unknown resource type: {0}")]
    UnknownResourceType(String),

    /// The value and `_field` channels of a primitive disagree
    #[error("malformed shadow for {field}: {reason}")]
    MalformedShadow { field: String, reason: String },

    #[error("unexpected attribute {attribute:?} on <{element}>")]
    UnexpectedAttribute { element: String, attribute: String },

    #[error("unexpected element <{element}> in <{parent}>")]
    UnexpectedElement { parent: String, element: String },

    #[error("nesting depth exceeds the limit of {limit}")]
    DepthLimitExceeded { limit: usize },

    #[error("input of {size} bytes exceeds the limit of {limit} bytes")]
    InputTooLarge { size: usize, limit: usize },

    /// Custom error message
    #[error("{0}")]
    Custom(String),
}

impl SerdeError {
    pub(crate) fn decode(path: &str, message: impl Into<String>) -> Self {
        SerdeError::Decode {
            path: path.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn shadow(field: &str, err: ShadowError) -> Self {
        SerdeError::MalformedShadow {
            field: field.to_string(),
            reason: err.to_string(),
        }
    }

    /// Maps a node builder rejection onto the codec taxonomy.
    pub(crate) fn model(path: &str, err: ModelError) -> Self {
        match err {
            ModelError::UnknownResourceType(name) => SerdeError::UnknownResourceType(name),
            other => SerdeError::decode(path, other.to_string()),
        }
    }
}

/// Result type alias for FHIR encoding and decoding
pub type Result<T> = std::result::Result<T, SerdeError>;
