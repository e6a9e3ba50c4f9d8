//! FHIR XML encoding.

use super::utils::{self, ID_ATTRIBUTE, VALUE_ATTRIBUTE};
use crate::choice::encode_key;
use crate::config::EncodeOptions;
use crate::error::{Result, SerdeError};
use arbor_fhir::{ComplexNode, DataType, FieldValue, Node, PrimitiveNode, ResourceNode};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::io::Write;

/// XML serializer that walks a node tree and writes quick-xml events.
pub struct XmlSerializer<W: Write> {
    writer: Writer<W>,
    namespace_written: bool,
    xml_declaration: bool,
    xml_declaration_written: bool,
}

impl<W: Write> XmlSerializer<W> {
    /// Creates a new XML serializer.
    pub fn new(writer: W, options: &EncodeOptions) -> Self {
        let writer = if options.pretty {
            Writer::new_with_indent(writer, b' ', 2)
        } else {
            Writer::new(writer)
        };
        Self {
            writer,
            namespace_written: false,
            xml_declaration: options.xml_declaration,
            xml_declaration_written: false,
        }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    /// Writes a resource element named after its type.
    pub fn write_resource(&mut self, resource: &ResourceNode) -> Result<()> {
        tracing::debug!(
            format = "xml",
            resource_type = %resource.resource_type(),
            "encoding resource"
        );
        self.write_complex(resource.resource_type().name(), resource.content())
    }

    /// Writes a complex element. Fields declared as XML attributes (`id`,
    /// `Extension.url`) go on the start tag, everything else becomes
    /// child elements in schema order.
    pub fn write_complex(&mut self, name: &str, node: &ComplexNode) -> Result<()> {
        let mut element = self.start_element(name)?;
        for (field, value) in node.populated().filter(|(f, _)| f.is_attribute()) {
            if let FieldValue::Single(Node::Primitive(primitive)) = value
                && let Some(value) = primitive.value()
            {
                element.push_attribute((field.name, utils::value_to_text(value).as_str()));
            }
        }

        let mut children = node.populated().filter(|(f, _)| !f.is_attribute()).peekable();
        if children.peek().is_none() {
            self.writer.write_event(Event::Empty(element))?;
            return Ok(());
        }
        self.writer.write_event(Event::Start(element))?;
        for (field, value) in children {
            match value {
                FieldValue::Single(node) => self.write_node(field.name, node)?,
                FieldValue::List(nodes) => {
                    for node in nodes {
                        self.write_node(field.name, node)?;
                    }
                }
                FieldValue::Choice(choice) => {
                    let key = encode_key(field, Some(choice.data_type()));
                    self.write_node(&key, choice.value())?;
                }
            }
        }
        self.write_end_element(name)
    }

    fn write_node(&mut self, name: &str, node: &Node) -> Result<()> {
        match node {
            Node::Primitive(primitive) if primitive.data_type() == DataType::Xhtml => {
                self.write_div_element(primitive)
            }
            Node::Primitive(primitive) => self.write_primitive(name, primitive),
            Node::Complex(complex) => self.write_complex(name, complex),
            Node::Resource(resource) => {
                self.write_start_element(name)?;
                self.write_resource(resource)?;
                self.write_end_element(name)
            }
        }
    }

    /// Writes `<name id=".." value=".."/>`, with extensions as children.
    fn write_primitive(&mut self, name: &str, primitive: &PrimitiveNode) -> Result<()> {
        let mut element = self.start_element(name)?;
        if let Some(id) = primitive.id() {
            element.push_attribute((ID_ATTRIBUTE, id));
        }
        if let Some(value) = primitive.value() {
            element.push_attribute((VALUE_ATTRIBUTE, utils::value_to_text(value).as_str()));
        }

        let extensions = primitive.extensions();
        if extensions.is_empty() {
            self.writer.write_event(Event::Empty(element))?;
            return Ok(());
        }
        self.writer.write_event(Event::Start(element))?;
        for extension in extensions {
            self.write_complex("extension", extension)?;
        }
        self.write_end_element(name)
    }

    /// Writes the narrative div exactly as stored.
    ///
    /// The stored text must be a single XHTML `<div>` so that it lands in
    /// its own namespace. The element has no room for a FHIR id or
    /// extensions.
    fn write_div_element(&mut self, primitive: &PrimitiveNode) -> Result<()> {
        let Some(xhtml) = primitive.value().and_then(|v| v.as_str()) else {
            return Err(SerdeError::Custom(
                "narrative div has no XHTML content".to_string(),
            ));
        };
        if primitive.metadata().is_some() {
            return Err(SerdeError::Custom(
                "narrative div cannot carry an id or extensions in XML".to_string(),
            ));
        }
        arbor_fhir::xhtml::check_div(xhtml).map_err(|e| SerdeError::Custom(e.to_string()))?;
        self.writer
            .write_event(Event::Text(BytesText::from_escaped(xhtml)))?;
        Ok(())
    }

    fn write_xml_declaration(&mut self) -> Result<()> {
        if self.xml_declaration && !self.xml_declaration_written {
            self.writer
                .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
            self.xml_declaration_written = true;
        }
        Ok(())
    }

    /// Opens an element tag; the first element of the document also gets
    /// the declaration and the FHIR namespace.
    fn start_element<'n>(&mut self, name: &'n str) -> Result<BytesStart<'n>> {
        self.write_xml_declaration()?;
        let mut element = BytesStart::new(name);
        if !self.namespace_written {
            element.push_attribute(("xmlns", utils::FHIR_NAMESPACE));
            self.namespace_written = true;
        }
        Ok(element)
    }

    fn write_start_element(&mut self, name: &str) -> Result<()> {
        let element = self.start_element(name)?;
        self.writer.write_event(Event::Start(element))?;
        Ok(())
    }

    /// Writes the end of an element.
    fn write_end_element(&mut self, name: &str) -> Result<()> {
        self.writer.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_fhir::catalog::datatypes;
    use arbor_fhir::{Metadata, ResourceType};

    fn render(f: impl FnOnce(&mut XmlSerializer<Vec<u8>>) -> Result<()>) -> String {
        let mut serializer = XmlSerializer::new(Vec::new(), &EncodeOptions::default());
        f(&mut serializer).unwrap();
        String::from_utf8(serializer.into_inner()).unwrap()
    }

    #[test]
    fn test_primitive_attributes() {
        let patient = ResourceNode::new(ResourceType::Patient)
            .with(
                "birthDate",
                PrimitiveNode::new(DataType::Date, "1974-12-25")
                    .unwrap()
                    .with_metadata(Metadata::with_id("bd1"))
                    .unwrap(),
            )
            .unwrap();
        assert_eq!(
            render(|s| s.write_resource(&patient)),
            concat!(
                r#"<Patient xmlns="http://hl7.org/fhir">"#,
                r#"<birthDate id="bd1" value="1974-12-25"/></Patient>"#
            )
        );
    }

    #[test]
    fn test_extension_url_is_an_attribute() {
        let extension = ComplexNode::extension("http://example.org/flag")
            .unwrap()
            .with_choice("value", PrimitiveNode::new(DataType::Boolean, true).unwrap())
            .unwrap();
        assert_eq!(
            render(|s| s.write_complex("extension", &extension)),
            concat!(
                r#"<extension xmlns="http://hl7.org/fhir" url="http://example.org/flag">"#,
                r#"<valueBoolean value="true"/></extension>"#
            )
        );
    }

    #[test]
    fn test_declaration_and_empty_element() {
        let options = EncodeOptions::default().with_xml_declaration(true);
        let mut serializer = XmlSerializer::new(Vec::new(), &options);
        serializer
            .write_complex("period", &ComplexNode::new(&datatypes::PERIOD))
            .unwrap();
        let xml = String::from_utf8(serializer.into_inner()).unwrap();
        assert_eq!(
            xml,
            r#"<?xml version="1.0" encoding="UTF-8"?><period xmlns="http://hl7.org/fhir"/>"#
        );
    }

    #[test]
    fn test_div_without_content_is_rejected() {
        let div = PrimitiveNode::metadata_only(DataType::Xhtml, Metadata::with_id("d1")).unwrap();
        let narrative = ComplexNode::new(&datatypes::NARRATIVE)
            .with_value("status", "generated")
            .unwrap()
            .with("div", div)
            .unwrap();
        let mut serializer = XmlSerializer::new(Vec::new(), &EncodeOptions::default());
        assert!(serializer.write_complex("text", &narrative).is_err());
    }

    #[test]
    fn test_div_is_written_verbatim() {
        let xhtml = r#"<div xmlns="http://www.w3.org/1999/xhtml"><p>a &amp; b</p></div>"#;
        let narrative = ComplexNode::new(&datatypes::NARRATIVE)
            .with_value("status", "generated")
            .unwrap()
            .with_value("div", xhtml)
            .unwrap();
        let xml = render(|s| s.write_complex("text", &narrative));
        assert!(xml.ends_with(&format!("{}</text>", xhtml)));
    }
}
