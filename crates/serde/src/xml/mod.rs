//! FHIR XML encoding and decoding.
//!
//! ## FHIR JSON ↔ XML Mapping
//!
//! | JSON Pattern | XML Pattern |
//! |--------------|-------------|
//! | `{"active": true}` | `<active value="true"/>` |
//! | `{"gender": "male", "_gender": {"id": "g"}}` | `<gender id="g" value="male"/>` |
//! | `{"given": ["John", "Doe"]}` | `<given value="John"/><given value="Doe"/>` |
//! | `{"given": [null], "_given": [{"id": "g2"}]}` | `<given id="g2"/>` |
//! | `{"contained": [{"resourceType": "Patient"}]}` | `<contained><Patient/></contained>` |
//!
//! The root element carries `xmlns="http://hl7.org/fhir"`; element ids and
//! extension urls are attributes, while a resource's logical id is an
//! `<id value=".."/>` child. The narrative `div` is copied verbatim in both
//! directions.
//!
//! Encoding writes quick-xml events; decoding parses with roxmltree and walks
//! the resulting tree against the shape catalog.

mod de;
mod ser;
pub mod utils;

pub use ser::XmlSerializer;

use crate::config::{DecodeOptions, EncodeOptions};
use crate::error::Result;
use arbor_fhir::{ComplexNode, ResourceNode, ShapeDescriptor};
use de::XmlDecoder;
use std::io::Write;

/// Decodes a resource from an XML string.
///
/// # Examples
///
/// ```
/// use arbor_serde::xml::from_xml_str;
///
/// let xml = r#"<Patient xmlns="http://hl7.org/fhir"><id value="example"/></Patient>"#;
/// let patient = from_xml_str(xml)?;
/// assert_eq!(patient.resource_id(), Some("example"));
/// # Ok::<(), arbor_serde::SerdeError>(())
/// ```
pub fn from_xml_str(s: &str) -> Result<ResourceNode> {
    from_xml_str_with(s, &DecodeOptions::default())
}

/// Decodes a resource from an XML string under explicit limits.
pub fn from_xml_str_with(s: &str, options: &DecodeOptions) -> Result<ResourceNode> {
    options.check_size(s.len())?;
    tracing::debug!(format = "xml", bytes = s.len(), "decoding resource");
    let decoder = XmlDecoder::new(s, options);
    let document = decoder.parse()?;
    let resource = decoder.decode_document(&document)?;
    tracing::debug!(resource_type = %resource.resource_type(), "decoded resource");
    Ok(resource)
}

/// Decodes a resource from UTF-8 XML bytes.
pub fn from_xml_slice(v: &[u8]) -> Result<ResourceNode> {
    from_xml_slice_with(v, &DecodeOptions::default())
}

pub fn from_xml_slice_with(v: &[u8], options: &DecodeOptions) -> Result<ResourceNode> {
    options.check_size(v.len())?;
    from_xml_str_with(std::str::from_utf8(v)?, options)
}

/// Decodes the root element of an XML document against a known shape. The
/// root's name is not checked, only its namespace and content.
pub fn element_from_xml_str(s: &str, shape: &'static ShapeDescriptor) -> Result<ComplexNode> {
    let options = DecodeOptions::default();
    options.check_size(s.len())?;
    let decoder = XmlDecoder::new(s, &options);
    let document = decoder.parse()?;
    decoder.decode_root_element(&document, shape)
}

/// Encodes a resource as a compact XML string without a declaration.
///
/// # Examples
///
/// ```
/// use arbor_fhir::{DataType, PrimitiveNode, ResourceNode, ResourceType};
/// use arbor_serde::xml::to_xml_string;
///
/// let patient = ResourceNode::new(ResourceType::Patient)
///     .with("active", PrimitiveNode::new(DataType::Boolean, true)?)?;
/// assert_eq!(
///     to_xml_string(&patient)?,
///     r#"<Patient xmlns="http://hl7.org/fhir"><active value="true"/></Patient>"#
/// );
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn to_xml_string(resource: &ResourceNode) -> Result<String> {
    to_xml_string_with(resource, &EncodeOptions::default())
}

pub fn to_xml_string_with(resource: &ResourceNode, options: &EncodeOptions) -> Result<String> {
    let bytes = to_xml_vec_with(resource, options)?;
    Ok(String::from_utf8(bytes).map_err(|e| e.utf8_error())?)
}

/// Encodes a resource as XML bytes.
pub fn to_xml_vec(resource: &ResourceNode) -> Result<Vec<u8>> {
    to_xml_vec_with(resource, &EncodeOptions::default())
}

pub fn to_xml_vec_with(resource: &ResourceNode, options: &EncodeOptions) -> Result<Vec<u8>> {
    let mut serializer = XmlSerializer::new(Vec::new(), options);
    serializer.write_resource(resource)?;
    Ok(serializer.into_inner())
}

/// Writes a resource as XML to `writer`.
pub fn to_xml_writer<W: Write>(
    writer: W,
    resource: &ResourceNode,
    options: &EncodeOptions,
) -> Result<()> {
    let mut serializer = XmlSerializer::new(writer, options);
    serializer.write_resource(resource)?;
    Ok(())
}

/// Encodes an element as a standalone XML document with the given root name.
pub fn element_to_xml_string(name: &str, node: &ComplexNode) -> Result<String> {
    let mut serializer = XmlSerializer::new(Vec::new(), &EncodeOptions::default());
    serializer.write_complex(name, node)?;
    Ok(String::from_utf8(serializer.into_inner()).map_err(|e| e.utf8_error())?)
}
