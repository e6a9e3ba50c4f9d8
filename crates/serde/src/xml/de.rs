//! FHIR XML decoding.
//!
//! The document is parsed into a `roxmltree` DOM and then walked against the
//! shape catalog. Elements must be in the FHIR namespace (the narrative div in
//! XHTML), appear in schema order, and only carry the attributes their shape
//! declares.

use super::utils::{FHIR_NAMESPACE, ID_ATTRIBUTE, VALUE_ATTRIBUTE, XHTML_NAMESPACE};
use super::utils::{is_div_element, value_from_text};
use crate::choice::{ChoiceTracker, ResolvedKey, resolve_key};
use crate::config::DecodeOptions;
use crate::error::{Result, SerdeError};
use arbor_fhir::catalog::datatypes;
use arbor_fhir::{
    ComplexNode, DataType, FieldType, Metadata, Node, PrimitiveNode, PrimitiveValue, ResourceNode,
    ResourceType, ShapeDescriptor,
};
use roxmltree::{Document, Node as XmlNode};

/// Walks a parsed XML document against the shape catalog.
pub(crate) struct XmlDecoder<'o, 'input> {
    source: &'input str,
    options: &'o DecodeOptions,
}

impl<'o, 'input> XmlDecoder<'o, 'input> {
    pub(crate) fn new(source: &'input str, options: &'o DecodeOptions) -> Self {
        Self { source, options }
    }

    pub(crate) fn parse(&self) -> Result<Document<'input>> {
        Ok(Document::parse(self.source)?)
    }

    /// Decodes the root element as a resource named by its tag.
    pub(crate) fn decode_document(&self, document: &Document<'_>) -> Result<ResourceNode> {
        let root = document.root_element();
        expect_namespace(root, "#document", FHIR_NAMESPACE)?;
        self.decode_resource(root, "", 1)
    }

    /// Decodes the root element against a known shape, whatever its name.
    pub(crate) fn decode_root_element(
        &self,
        document: &Document<'_>,
        shape: &'static ShapeDescriptor,
    ) -> Result<ComplexNode> {
        let root = document.root_element();
        expect_namespace(root, "#document", FHIR_NAMESPACE)?;
        self.decode_complex(root, shape, shape.name, 1)
    }

    fn decode_resource(
        &self,
        element: XmlNode<'_, '_>,
        path: &str,
        depth: usize,
    ) -> Result<ResourceNode> {
        self.options.check_depth(depth)?;
        let tag = element.tag_name().name();
        let resource_type = ResourceType::from_name(tag)
            .ok_or_else(|| SerdeError::UnknownResourceType(tag.to_string()))?;
        tracing::trace!(resource_type = tag, path, "resolved resource container");

        let path = if path.is_empty() { tag } else { path };
        let content = self.decode_complex(element, resource_type.shape(), path, depth)?;
        ResourceNode::from_content(content).map_err(|e| SerdeError::model(path, e))
    }

    /// Decodes a `<contained>`-style wrapper holding exactly one resource.
    fn decode_wrapped_resource(
        &self,
        wrapper: XmlNode<'_, '_>,
        path: &str,
        depth: usize,
    ) -> Result<ResourceNode> {
        reject_attributes(wrapper, &[])?;
        let mut inner = None;
        for child in wrapper.children() {
            check_text(child, path)?;
            if !child.is_element() {
                continue;
            }
            if inner.is_some() {
                return Err(unexpected_element(wrapper, child));
            }
            expect_namespace(child, wrapper.tag_name().name(), FHIR_NAMESPACE)?;
            inner = Some(child);
        }
        let inner =
            inner.ok_or_else(|| SerdeError::decode(path, "expected a resource element"))?;
        self.decode_resource(inner, path, depth + 1)
    }

    fn decode_complex(
        &self,
        element: XmlNode<'_, '_>,
        shape: &'static ShapeDescriptor,
        path: &str,
        depth: usize,
    ) -> Result<ComplexNode> {
        self.options.check_depth(depth)?;
        let mut node = ComplexNode::new(shape);

        for attribute in element.attributes() {
            let declared = shape
                .field(attribute.name())
                .filter(|(_, field)| attribute.namespace().is_none() && field.is_attribute());
            let Some((_, field)) = declared else {
                return Err(SerdeError::UnexpectedAttribute {
                    element: element.tag_name().name().to_string(),
                    attribute: attribute.name().to_string(),
                });
            };
            let data_type = field.field_type.primitive().unwrap_or(DataType::SystemString);
            let path = format!("{}.{}", path, field.name);
            let value = value_from_text(data_type, attribute.value())
                .map_err(|message| SerdeError::decode(&path, message))?;
            let model = |e| SerdeError::model(&path, e);
            let value = PrimitiveNode::new(data_type, value).map_err(model)?;
            node.set(field.name, value).map_err(model)?;
        }

        let mut choices = ChoiceTracker::new();
        let mut previous: Option<usize> = None;
        let mut position = 0;
        for child in element.children() {
            check_text(child, path)?;
            if !child.is_element() {
                continue;
            }
            let name = child.tag_name().name();
            let resolved = resolve_key(shape, name)
                .filter(|r| !r.field.is_attribute())
                .ok_or_else(|| unexpected_element(element, child))?;
            let is_div = is_div_element(name) && resolved_type(&resolved) == Some(DataType::Xhtml);
            let namespace = if is_div { XHTML_NAMESPACE } else { FHIR_NAMESPACE };
            expect_namespace(child, element.tag_name().name(), namespace)?;
            choices.record(&resolved)?;

            match previous {
                Some(index) if resolved.index < index => {
                    tracing::trace!(element = name, "element out of schema order");
                    return Err(unexpected_element(element, child));
                }
                Some(index) if resolved.index == index => {
                    if !resolved.field.repeated {
                        return Err(unexpected_element(element, child));
                    }
                    position += 1;
                }
                _ => position = 0,
            }
            previous = Some(resolved.index);

            let child_path = if resolved.field.repeated {
                format!("{}.{}[{}]", path, name, position)
            } else {
                format!("{}.{}", path, name)
            };
            let value = self.decode_value(child, &resolved, &child_path, depth)?;
            let stored = if resolved.choice.is_some() {
                node.set_choice(resolved.field.name, value)
            } else if resolved.field.repeated {
                node.push(resolved.field.name, value)
            } else {
                node.set(resolved.field.name, value)
            };
            stored.map_err(|e| SerdeError::model(&child_path, e))?;
        }
        Ok(node)
    }

    fn decode_value(
        &self,
        element: XmlNode<'_, '_>,
        resolved: &ResolvedKey,
        path: &str,
        depth: usize,
    ) -> Result<Node> {
        match (resolved.field.field_type, resolved_type(resolved)) {
            (_, Some(DataType::Xhtml)) => self.decode_div(element, path).map(Node::from),
            (_, Some(data_type)) if data_type.is_primitive() => {
                self.decode_primitive(element, data_type, path, depth).map(Node::from)
            }
            (_, Some(data_type)) => {
                let shape = data_type.shape().ok_or_else(|| {
                    SerdeError::decode(path, format!("{} is not complex", data_type))
                })?;
                self.decode_complex(element, shape, path, depth + 1).map(Node::from)
            }
            (FieldType::Backbone(shape), None) => {
                self.decode_complex(element, shape, path, depth + 1).map(Node::from)
            }
            (FieldType::Resource, None) => {
                self.decode_wrapped_resource(element, path, depth).map(Node::from)
            }
            _ => Err(SerdeError::decode(path, "choice element without a type suffix")),
        }
    }

    /// Decodes `<name id=".." value="..">` with optional extension children.
    fn decode_primitive(
        &self,
        element: XmlNode<'_, '_>,
        data_type: DataType,
        path: &str,
        depth: usize,
    ) -> Result<PrimitiveNode> {
        reject_attributes(element, &[ID_ATTRIBUTE, VALUE_ATTRIBUTE])?;
        let value = element
            .attribute(VALUE_ATTRIBUTE)
            .map(|text| value_from_text(data_type, text))
            .transpose()
            .map_err(|message| SerdeError::decode(path, message))?;
        let id = element.attribute(ID_ATTRIBUTE).map(str::to_string);

        let mut extensions = Vec::new();
        for child in element.children() {
            check_text(child, path)?;
            if !child.is_element() {
                continue;
            }
            if child.tag_name().name() != "extension" {
                return Err(unexpected_element(element, child));
            }
            expect_namespace(child, element.tag_name().name(), FHIR_NAMESPACE)?;
            let path = format!("{}.extension[{}]", path, extensions.len());
            extensions.push(self.decode_complex(child, &datatypes::EXTENSION, &path, depth + 1)?);
        }

        let metadata = Metadata::new(id, extensions).map_err(|e| SerdeError::model(path, e))?;
        PrimitiveNode::from_parts(data_type, value, metadata)
            .map_err(|e| SerdeError::model(path, e))
    }

    /// Keeps the XHTML fragment exactly as written in the source.
    fn decode_div(&self, element: XmlNode<'_, '_>, path: &str) -> Result<PrimitiveNode> {
        let xhtml = &self.source[element.range()];
        PrimitiveNode::new(DataType::Xhtml, PrimitiveValue::String(xhtml.to_string()))
            .map_err(|e| SerdeError::model(path, e))
    }
}

/// The data type an element carries: the selected alternative of a choice,
/// or the declared type of a plain data field.
fn resolved_type(resolved: &ResolvedKey) -> Option<DataType> {
    match (resolved.choice, resolved.field.field_type) {
        (Some(data_type), _) => Some(data_type),
        (None, FieldType::Data(data_type)) => Some(data_type),
        _ => None,
    }
}

fn unexpected_element(parent: XmlNode<'_, '_>, child: XmlNode<'_, '_>) -> SerdeError {
    SerdeError::UnexpectedElement {
        parent: parent.tag_name().name().to_string(),
        element: child.tag_name().name().to_string(),
    }
}

fn expect_namespace(element: XmlNode<'_, '_>, parent: &str, namespace: &str) -> Result<()> {
    if element.tag_name().namespace() == Some(namespace) {
        return Ok(());
    }
    Err(SerdeError::UnexpectedElement {
        parent: parent.to_string(),
        element: match element.tag_name().namespace() {
            Some(ns) => format!("{{{}}}{}", ns, element.tag_name().name()),
            None => element.tag_name().name().to_string(),
        },
    })
}

fn reject_attributes(element: XmlNode<'_, '_>, allowed: &[&str]) -> Result<()> {
    for attribute in element.attributes() {
        if attribute.namespace().is_some() || !allowed.contains(&attribute.name()) {
            return Err(SerdeError::UnexpectedAttribute {
                element: element.tag_name().name().to_string(),
                attribute: attribute.name().to_string(),
            });
        }
    }
    Ok(())
}

/// Character data is only allowed as whitespace between elements.
fn check_text(node: XmlNode<'_, '_>, path: &str) -> Result<()> {
    match node.text() {
        Some(text) if node.is_text() && !text.trim().is_empty() => {
            Err(SerdeError::decode(path, format!("unexpected text {:?}", text.trim())))
        }
        _ => Ok(()),
    }
}
