//! FHIR JSON encoding and decoding.
//!
//! A primitive field `F` is written as `"F": <value>` with its id and
//! extensions under `"_F"`. Repeated primitives use two parallel arrays,
//! padded with `null` so positions line up:
//!
//! ```json
//! {
//!   "given": ["Peter", null],
//!   "_given": [null, {"id": "g2"}]
//! }
//! ```
//!
//! Decoding is driven by the shape catalog: unknown keys, mistyped values
//! and disagreeing channels are errors rather than being skipped.

mod de;
mod ser;

use crate::config::{DecodeOptions, EncodeOptions};
use crate::error::{Result, SerdeError};
use arbor_fhir::{ComplexNode, ResourceNode, ShapeDescriptor};
use de::JsonDecoder;
use serde_json::Value;
use std::io::Write;

/// Decodes a resource from a JSON string.
///
/// # Examples
///
/// ```
/// use arbor_serde::json::from_json_str;
///
/// let json = r#"{"resourceType": "Patient", "id": "example", "active": true}"#;
/// let patient = from_json_str(json)?;
/// assert_eq!(patient.resource_id(), Some("example"));
/// # Ok::<(), arbor_serde::SerdeError>(())
/// ```
pub fn from_json_str(s: &str) -> Result<ResourceNode> {
    from_json_str_with(s, &DecodeOptions::default())
}

/// Decodes a resource from a JSON string under explicit limits.
pub fn from_json_str_with(s: &str, options: &DecodeOptions) -> Result<ResourceNode> {
    options.check_size(s.len())?;
    tracing::debug!(format = "json", bytes = s.len(), "decoding resource");
    let value: Value = serde_json::from_str(s)?;
    from_json_value_with(&value, options)
}

/// Decodes a resource from a JSON byte slice.
pub fn from_json_slice(v: &[u8]) -> Result<ResourceNode> {
    from_json_slice_with(v, &DecodeOptions::default())
}

/// Decodes a resource from a JSON byte slice under explicit limits.
pub fn from_json_slice_with(v: &[u8], options: &DecodeOptions) -> Result<ResourceNode> {
    options.check_size(v.len())?;
    tracing::debug!(format = "json", bytes = v.len(), "decoding resource");
    let value: Value = serde_json::from_slice(v)?;
    from_json_value_with(&value, options)
}

/// Decodes a resource from an already parsed JSON value.
pub fn from_json_value(value: &Value) -> Result<ResourceNode> {
    from_json_value_with(value, &DecodeOptions::default())
}

pub fn from_json_value_with(value: &Value, options: &DecodeOptions) -> Result<ResourceNode> {
    let resource = JsonDecoder::new(options).decode_resource(value, "", 1)?;
    tracing::debug!(resource_type = %resource.resource_type(), "decoded resource");
    Ok(resource)
}

/// Decodes an element of a known shape, e.g. a `HumanName` object.
///
/// ```
/// use arbor_fhir::catalog::datatypes;
/// use arbor_serde::json::element_from_json_value;
/// use serde_json::json;
///
/// let value = json!({"family": "Chalmers", "given": ["Peter"]});
/// let name = element_from_json_value(&value, &datatypes::HUMAN_NAME)?;
/// assert_eq!(name.type_name(), "HumanName");
/// # Ok::<(), arbor_serde::SerdeError>(())
/// ```
pub fn element_from_json_value(
    value: &Value,
    shape: &'static ShapeDescriptor,
) -> Result<ComplexNode> {
    element_from_json_value_with(value, shape, &DecodeOptions::default())
}

pub fn element_from_json_value_with(
    value: &Value,
    shape: &'static ShapeDescriptor,
    options: &DecodeOptions,
) -> Result<ComplexNode> {
    JsonDecoder::new(options).decode_element(value, shape, shape.name, 1)
}

/// Decodes an element of a known shape from a JSON string.
pub fn element_from_json_str(s: &str, shape: &'static ShapeDescriptor) -> Result<ComplexNode> {
    let options = DecodeOptions::default();
    options.check_size(s.len())?;
    let value: Value = serde_json::from_str(s)?;
    element_from_json_value_with(&value, shape, &options)
}

/// Encodes a resource as a JSON value.
pub fn to_json_value(resource: &ResourceNode) -> Result<Value> {
    tracing::debug!(
        format = "json",
        resource_type = %resource.resource_type(),
        "encoding resource"
    );
    ser::resource_to_value(resource)
}

/// Encodes an element as a JSON object.
pub fn element_to_json_value(node: &ComplexNode) -> Result<Value> {
    ser::element_to_value(node)
}

/// Encodes a resource as a compact JSON string.
///
/// # Examples
///
/// ```
/// use arbor_fhir::{DataType, PrimitiveNode, ResourceNode, ResourceType};
/// use arbor_serde::json::to_json_string;
///
/// let patient = ResourceNode::new(ResourceType::Patient)
///     .with("active", PrimitiveNode::new(DataType::Boolean, true)?)?;
/// assert_eq!(to_json_string(&patient)?, r#"{"resourceType":"Patient","active":true}"#);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn to_json_string(resource: &ResourceNode) -> Result<String> {
    Ok(serde_json::to_string(&to_json_value(resource)?)?)
}

/// Encodes a resource as a pretty-printed JSON string.
pub fn to_json_string_pretty(resource: &ResourceNode) -> Result<String> {
    Ok(serde_json::to_string_pretty(&to_json_value(resource)?)?)
}

/// Encodes a resource as JSON bytes.
pub fn to_json_vec(resource: &ResourceNode) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(&to_json_value(resource)?)?)
}

/// Writes a resource as JSON to `writer`.
pub fn to_json_writer<W: Write>(
    writer: W,
    resource: &ResourceNode,
    options: &EncodeOptions,
) -> Result<()> {
    let value = to_json_value(resource)?;
    let written = if options.pretty {
        serde_json::to_writer_pretty(writer, &value)
    } else {
        serde_json::to_writer(writer, &value)
    };
    written.map_err(|e| {
        if e.is_io() {
            SerdeError::Io(e.into())
        } else {
            SerdeError::Json(e)
        }
    })
}
