//! # Arbor FHIR Serialization
//!
//! Encodes and decodes the [`arbor_fhir`] node tree as FHIR JSON and FHIR XML.
//!
//! ## Features
//!
//! - **JSON**: the dual-channel encoding, where a primitive's value sits under
//!   `field` and its id/extensions under `_field`, with parallel arrays for
//!   repeated primitives.
//! - **XML** (feature `xml`, on by default): values in `value` attributes,
//!   element ids and extension urls as attributes, verbatim XHTML narrative.
//! - **Choice fields**: `value[x]` is written under `valueQuantity`,
//!   `valueDateTime` and so on; two alternatives present at once is an error.
//! - **Resource container**: `resourceType` (JSON) or the element name (XML)
//!   selects the shape of the root, `contained` and `Bundle.entry.resource`.
//! - **Limits**: [`DecodeOptions`] bounds input size and nesting depth.
//!
//! ## Examples
//!
//! ```
//! use arbor_serde::{from_json_str, to_json_string};
//!
//! let json = r#"{"resourceType":"Patient","birthDate":"1974-12-25","_birthDate":{"id":"bd1"}}"#;
//! let patient = from_json_str(json)?;
//! assert_eq!(to_json_string(&patient)?, json);
//! # Ok::<(), arbor_serde::SerdeError>(())
//! ```

pub mod choice;
pub mod config;
pub mod error;
pub mod format;
pub mod json;
mod value;
#[cfg(feature = "xml")]
pub mod xml;

// Re-export common types and functions
pub use config::{DecodeOptions, EncodeOptions};
pub use error::{Result, SerdeError};
pub use format::{FhirFormat, decode_resource, encode_resource};

// Re-export JSON functions at top level for convenience
pub use json::{
    from_json_slice, from_json_slice_with, from_json_str, from_json_str_with, from_json_value,
    from_json_value_with, to_json_string, to_json_string_pretty, to_json_value, to_json_vec,
};

#[cfg(feature = "xml")]
pub use xml::{from_xml_slice, from_xml_str, to_xml_string, to_xml_vec};
