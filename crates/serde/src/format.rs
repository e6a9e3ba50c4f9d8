//! Wire format selection.

use crate::config::{DecodeOptions, EncodeOptions};
use crate::error::Result;
use arbor_fhir::ResourceNode;
use std::fmt;

/// Supported FHIR wire formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FhirFormat {
    /// JSON format (application/fhir+json)
    Json,
    /// XML format (application/fhir+xml)
    #[cfg(feature = "xml")]
    Xml,
}

impl FhirFormat {
    /// Returns the MIME type string for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            FhirFormat::Json => "application/fhir+json",
            #[cfg(feature = "xml")]
            FhirFormat::Xml => "application/fhir+xml",
        }
    }

    /// Parses a media type or `_format` value into a FhirFormat.
    ///
    /// Accepts the short forms `json` and `xml`, the plain and FHIR media
    /// types, and ignores parameters such as `; charset=utf-8`.
    pub fn parse(media_type: &str) -> Option<Self> {
        let media_type = media_type.split(';').next()?.trim().to_lowercase();
        match media_type.as_str() {
            "json" | "application/json" | "application/fhir+json" => Some(FhirFormat::Json),
            #[cfg(feature = "xml")]
            "xml" | "application/xml" | "text/xml" | "application/fhir+xml" => {
                Some(FhirFormat::Xml)
            }
            _ => None,
        }
    }
}

impl fmt::Display for FhirFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime_type())
    }
}

/// Decodes a resource in the given format.
pub fn decode_resource(
    format: FhirFormat,
    input: &[u8],
    options: &DecodeOptions,
) -> Result<ResourceNode> {
    match format {
        FhirFormat::Json => crate::json::from_json_slice_with(input, options),
        #[cfg(feature = "xml")]
        FhirFormat::Xml => crate::xml::from_xml_slice_with(input, options),
    }
}

/// Encodes a resource in the given format.
pub fn encode_resource(
    format: FhirFormat,
    resource: &ResourceNode,
    options: &EncodeOptions,
) -> Result<Vec<u8>> {
    match format {
        FhirFormat::Json => {
            let mut out = Vec::new();
            crate::json::to_json_writer(&mut out, resource, options)?;
            Ok(out)
        }
        #[cfg(feature = "xml")]
        FhirFormat::Xml => crate::xml::to_xml_vec_with(resource, options),
    }
}
