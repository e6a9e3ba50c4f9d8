//! The uniform node tree.
//!
//! Every value in a resource is a [`Node`]: a primitive (scalar plus optional
//! id/extensions), a complex element laid out by its [`ShapeDescriptor`], or a
//! resource. Nodes are plain owned values. They are built through validated
//! setters, so a tree that exists always matches its shapes: fields exist,
//! cardinality is respected, types agree, and a choice holds exactly one
//! alternative.

use crate::error::{ModelError, Result};
use crate::resource::ResourceNode;
use crate::shape::{FieldDescriptor, FieldType, ShapeDescriptor};
use crate::types::{DataType, PrimitiveValue};
use std::fmt;

/// Id and extensions attached to a primitive.
///
/// Held as `Option<Metadata>` on a primitive, where `Some` is never empty.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Metadata {
    id: Option<String>,
    extensions: Vec<ComplexNode>,
}

impl Metadata {
    /// Builds metadata, returning `None` when there is nothing to hold.
    pub fn new(id: Option<String>, extensions: Vec<ComplexNode>) -> Result<Option<Self>> {
        if let Some(bad) = extensions.iter().find(|e| e.data_type() != Some(DataType::Extension)) {
            return Err(ModelError::NotAnExtension {
                found: bad.type_name(),
            });
        }
        extensions.iter().try_for_each(check_extension_url)?;
        let metadata = Self { id, extensions };
        Ok((!metadata.is_empty()).then_some(metadata))
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            extensions: Vec::new(),
        }
    }

    pub fn with_extension(extension: ComplexNode) -> Result<Self> {
        let metadata = Metadata::new(None, vec![extension])?;
        Ok(metadata.unwrap_or_default())
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub(crate) fn id_string(&self) -> Option<&String> {
        self.id.as_ref()
    }

    pub fn extensions(&self) -> &[ComplexNode] {
        &self.extensions
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.extensions.is_empty()
    }
}

/// A primitive value and its metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimitiveNode {
    data_type: DataType,
    value: Option<PrimitiveValue>,
    metadata: Option<Metadata>,
}

impl PrimitiveNode {
    pub fn new(data_type: DataType, value: impl Into<PrimitiveValue>) -> Result<Self> {
        Self::from_parts(data_type, Some(value.into()), None)
    }

    /// A primitive with metadata but no value, e.g. a `_birthDate` carrying
    /// only a data-absent-reason extension.
    pub fn metadata_only(data_type: DataType, metadata: Metadata) -> Result<Self> {
        Self::from_parts(data_type, None, Some(metadata))
    }

    pub fn from_parts(
        data_type: DataType,
        value: Option<PrimitiveValue>,
        metadata: Option<Metadata>,
    ) -> Result<Self> {
        if let Some(value) = &value {
            data_type.check_value(value)?;
        } else if !data_type.is_primitive() {
            return Err(ModelError::ValueKind {
                data_type: data_type.name(),
                found: "primitive",
            });
        }
        let metadata = metadata.filter(|m| !m.is_empty());
        if metadata.is_some() && data_type.is_system() {
            return Err(ModelError::MetadataNotAllowed {
                data_type: data_type.name(),
            });
        }
        if value.is_none() && metadata.is_none() {
            return Err(ModelError::EmptyPrimitive {
                data_type: data_type.name(),
            });
        }
        Ok(Self {
            data_type,
            value,
            metadata,
        })
    }

    pub fn with_metadata(self, metadata: Metadata) -> Result<Self> {
        Self::from_parts(self.data_type, self.value, Some(metadata))
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn value(&self) -> Option<&PrimitiveValue> {
        self.value.as_ref()
    }

    pub fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_ref()
    }

    pub fn id(&self) -> Option<&str> {
        self.metadata.as_ref().and_then(Metadata::id)
    }

    pub fn extensions(&self) -> &[ComplexNode] {
        self.metadata
            .as_ref()
            .map(Metadata::extensions)
            .unwrap_or_default()
    }
}

impl fmt::Display for PrimitiveNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(PrimitiveValue::String(s)) => write!(f, "{:?}", s)?,
            Some(value) => write!(f, "{}", value)?,
            None => f.write_str("null")?,
        }
        if let Some(metadata) = &self.metadata {
            f.write_str(" (")?;
            if let Some(id) = &metadata.id {
                write!(f, "id={:?}", id)?;
                if !metadata.extensions.is_empty() {
                    f.write_str(", ")?;
                }
            }
            for (i, extension) in metadata.extensions.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}", extension)?;
            }
            f.write_str(")")?;
        }
        Ok(())
    }
}

/// The alternative stored in a `[x]` field.
#[derive(Debug, Clone, PartialEq)]
pub struct Choice {
    data_type: DataType,
    value: Box<Node>,
}

impl Choice {
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn value(&self) -> &Node {
        &self.value
    }

    pub fn into_value(self) -> Node {
        *self.value
    }
}

/// The content of a populated field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Single(Node),
    List(Vec<Node>),
    Choice(Choice),
}

impl FieldValue {
    /// Nodes held by this field, in order.
    pub fn nodes(&self) -> &[Node] {
        match self {
            FieldValue::Single(node) => std::slice::from_ref(node),
            FieldValue::List(nodes) => nodes,
            FieldValue::Choice(choice) => std::slice::from_ref(&*choice.value),
        }
    }

    pub fn as_choice(&self) -> Option<&Choice> {
        match self {
            FieldValue::Choice(choice) => Some(choice),
            _ => None,
        }
    }
}

/// Any node of the tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Primitive(PrimitiveNode),
    Complex(ComplexNode),
    Resource(Box<ResourceNode>),
}

impl Node {
    /// The data type of a primitive or complex data type node. Backbone
    /// elements and resources have none.
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Node::Primitive(p) => Some(p.data_type()),
            Node::Complex(c) => c.data_type(),
            Node::Resource(_) => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Node::Primitive(p) => p.data_type().name(),
            Node::Complex(c) => c.type_name(),
            Node::Resource(r) => r.resource_type().name(),
        }
    }

    pub fn as_primitive(&self) -> Option<&PrimitiveNode> {
        match self {
            Node::Primitive(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_complex(&self) -> Option<&ComplexNode> {
        match self {
            Node::Complex(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_resource(&self) -> Option<&ResourceNode> {
        match self {
            Node::Resource(r) => Some(&**r),
            _ => None,
        }
    }
}

impl From<PrimitiveNode> for Node {
    fn from(node: PrimitiveNode) -> Self {
        Node::Primitive(node)
    }
}

impl From<ComplexNode> for Node {
    fn from(node: ComplexNode) -> Self {
        Node::Complex(node)
    }
}

impl From<ResourceNode> for Node {
    fn from(node: ResourceNode) -> Self {
        Node::Resource(Box::new(node))
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Primitive(p) => fmt::Display::fmt(p, f),
            Node::Complex(c) => fmt::Display::fmt(c, f),
            Node::Resource(r) => fmt::Display::fmt(r, f),
        }
    }
}

/// A complex element: one slot per declared field, in schema order.
#[derive(Clone, PartialEq)]
pub struct ComplexNode {
    shape: &'static ShapeDescriptor,
    fields: Vec<Option<FieldValue>>,
}

/// An `Extension` is meaningless without its url.
fn check_extension_url(node: &ComplexNode) -> Result<()> {
    if node.data_type() == Some(DataType::Extension) && node.get("url").is_none() {
        return Err(ModelError::MissingExtensionUrl);
    }
    Ok(())
}

impl ComplexNode {
    pub fn new(shape: &'static ShapeDescriptor) -> Self {
        Self {
            shape,
            fields: vec![None; shape.fields.len()],
        }
    }

    /// An empty instance of a complex data type.
    pub fn of(data_type: DataType) -> Result<Self> {
        data_type
            .shape()
            .map(ComplexNode::new)
            .ok_or(ModelError::ValueKind {
                data_type: data_type.name(),
                found: "complex",
            })
    }

    /// An `Extension` with its url set.
    pub fn extension(url: impl Into<String>) -> Result<Self> {
        let mut extension = ComplexNode::of(DataType::Extension)?;
        extension.set_value("url", url.into())?;
        Ok(extension)
    }

    pub fn shape(&self) -> &'static ShapeDescriptor {
        self.shape
    }

    pub fn type_name(&self) -> &'static str {
        self.shape.type_name()
    }

    pub fn data_type(&self) -> Option<DataType> {
        self.shape.data_type()
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        let (index, _) = self.shape.field(name)?;
        self.fields[index].as_ref()
    }

    /// Populated fields in schema order.
    pub fn populated(&self) -> impl Iterator<Item = (&'static FieldDescriptor, &FieldValue)> {
        self.shape
            .fields
            .iter()
            .zip(self.fields.iter())
            .filter_map(|(descriptor, value)| value.as_ref().map(|v| (descriptor, v)))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.iter().all(Option::is_none)
    }

    /// The element id, or the logical id of a resource.
    pub fn id(&self) -> Option<&str> {
        match self.get("id")? {
            FieldValue::Single(Node::Primitive(p)) => p.value().and_then(PrimitiveValue::as_str),
            _ => None,
        }
    }

    pub fn extensions(&self) -> impl Iterator<Item = &ComplexNode> {
        self.get("extension")
            .map(FieldValue::nodes)
            .unwrap_or_default()
            .iter()
            .filter_map(Node::as_complex)
    }

    fn lookup(&self, name: &str) -> Result<(usize, &'static FieldDescriptor)> {
        self.shape.field(name).ok_or_else(|| ModelError::UnknownField {
            shape: self.shape.name,
            field: name.to_string(),
        })
    }

    fn cardinality(&self, field: &'static FieldDescriptor) -> ModelError {
        let actual = if field.is_choice() {
            "a choice"
        } else if field.repeated {
            "repeated"
        } else {
            "single"
        };
        ModelError::Cardinality {
            shape: self.shape.name,
            field: field.name,
            actual,
        }
    }

    fn check(&self, field: &'static FieldDescriptor, node: &Node) -> Result<()> {
        let accepted = match (&field.field_type, node) {
            (FieldType::Data(t), Node::Primitive(p)) => p.data_type() == *t,
            (FieldType::Data(t), Node::Complex(c)) => c.data_type() == Some(*t),
            (FieldType::Backbone(shape), Node::Complex(c)) => c.shape() == *shape,
            (FieldType::Resource, Node::Resource(_)) => true,
            (FieldType::Choice(types), node) => {
                node.data_type().is_some_and(|t| types.contains(&t))
            }
            _ => false,
        };
        if accepted {
            match node {
                Node::Complex(c) => check_extension_url(c),
                _ => Ok(()),
            }
        } else {
            Err(ModelError::TypeMismatch {
                shape: self.shape.name,
                field: field.name,
                expected: field.field_type.to_string(),
                found: node.type_name().to_string(),
            })
        }
    }

    /// Sets a single-valued, non-choice field.
    pub fn set(&mut self, name: &str, node: impl Into<Node>) -> Result<&mut Self> {
        let node = node.into();
        let (index, field) = self.lookup(name)?;
        if field.repeated || field.is_choice() {
            return Err(self.cardinality(field));
        }
        self.check(field, &node)?;
        self.fields[index] = Some(FieldValue::Single(node));
        Ok(self)
    }

    /// Appends to a repeated field.
    pub fn push(&mut self, name: &str, node: impl Into<Node>) -> Result<&mut Self> {
        let node = node.into();
        let (index, field) = self.lookup(name)?;
        if !field.repeated {
            return Err(self.cardinality(field));
        }
        self.check(field, &node)?;
        match &mut self.fields[index] {
            Some(FieldValue::List(nodes)) => nodes.push(node),
            slot => *slot = Some(FieldValue::List(vec![node])),
        }
        Ok(self)
    }

    /// Replaces a repeated field. An empty list clears it.
    pub fn set_list(&mut self, name: &str, nodes: Vec<Node>) -> Result<&mut Self> {
        let (index, field) = self.lookup(name)?;
        if !field.repeated {
            return Err(self.cardinality(field));
        }
        for node in &nodes {
            self.check(field, node)?;
        }
        self.fields[index] = (!nodes.is_empty()).then_some(FieldValue::List(nodes));
        Ok(self)
    }

    /// Selects the alternative of a choice field matching the node's type,
    /// replacing whatever alternative was stored before.
    pub fn set_choice(&mut self, name: &str, node: impl Into<Node>) -> Result<&mut Self> {
        let node = node.into();
        let (index, field) = self.lookup(name)?;
        if !field.is_choice() {
            return Err(self.cardinality(field));
        }
        self.check(field, &node)?;
        let Some(data_type) = node.data_type() else {
            return Err(self.cardinality(field));
        };
        self.fields[index] = Some(FieldValue::Choice(Choice {
            data_type,
            value: Box::new(node),
        }));
        Ok(self)
    }

    /// Sets a primitive field from a bare value, using the field's declared type.
    pub fn set_value(&mut self, name: &str, value: impl Into<PrimitiveValue>) -> Result<&mut Self> {
        let (_, field) = self.lookup(name)?;
        if field.repeated || field.is_choice() {
            return Err(self.cardinality(field));
        }
        let data_type = self.primitive_type(field)?;
        let node = PrimitiveNode::new(data_type, value)?;
        self.set(name, node)
    }

    /// Appends a bare value to a repeated primitive field.
    pub fn push_value(
        &mut self,
        name: &str,
        value: impl Into<PrimitiveValue>,
    ) -> Result<&mut Self> {
        let (_, field) = self.lookup(name)?;
        if !field.repeated {
            return Err(self.cardinality(field));
        }
        let data_type = self.primitive_type(field)?;
        let node = PrimitiveNode::new(data_type, value)?;
        self.push(name, node)
    }

    fn primitive_type(&self, field: &'static FieldDescriptor) -> Result<DataType> {
        field
            .field_type
            .primitive()
            .ok_or_else(|| ModelError::TypeMismatch {
                shape: self.shape.name,
                field: field.name,
                expected: field.field_type.to_string(),
                found: "primitive".to_string(),
            })
    }

    /// Removes a field's content, returning it.
    pub fn take(&mut self, name: &str) -> Result<Option<FieldValue>> {
        let (index, _) = self.lookup(name)?;
        Ok(self.fields[index].take())
    }

    pub fn with(mut self, name: &str, node: impl Into<Node>) -> Result<Self> {
        self.set(name, node)?;
        Ok(self)
    }

    pub fn with_value(mut self, name: &str, value: impl Into<PrimitiveValue>) -> Result<Self> {
        self.set_value(name, value)?;
        Ok(self)
    }

    pub fn with_pushed(mut self, name: &str, node: impl Into<Node>) -> Result<Self> {
        self.push(name, node)?;
        Ok(self)
    }

    pub fn with_choice(mut self, name: &str, node: impl Into<Node>) -> Result<Self> {
        self.set_choice(name, node)?;
        Ok(self)
    }
}

impl fmt::Debug for ComplexNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (descriptor, value) in self.populated() {
            map.entry(&descriptor.name, value);
        }
        map.finish()?;
        write!(f, " as {}", self.shape.name)
    }
}

impl fmt::Display for ComplexNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {{", self.type_name())?;
        for (i, (descriptor, value)) in self.populated().enumerate() {
            f.write_str(if i == 0 { " " } else { ", " })?;
            match value {
                FieldValue::Single(node) => write!(f, "{}: {}", descriptor.name, node)?,
                FieldValue::Choice(choice) => write!(
                    f,
                    "{}[{}]: {}",
                    descriptor.name,
                    choice.data_type(),
                    choice.value()
                )?,
                FieldValue::List(nodes) => {
                    write!(f, "{}: [", descriptor.name)?;
                    for (j, node) in nodes.iter().enumerate() {
                        if j > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{}", node)?;
                    }
                    f.write_str("]")?;
                }
            }
        }
        if self.is_empty() {
            f.write_str("}")
        } else {
            f.write_str(" }")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{datatypes, resources};
    use rust_decimal_macros::dec;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_nodes_are_send_and_sync() {
        assert_send_sync::<Node>();
        assert_send_sync::<ComplexNode>();
        assert_send_sync::<ResourceNode>();
    }

    #[test]
    fn test_primitive_requires_value_or_metadata() {
        let err = PrimitiveNode::from_parts(DataType::Date, None, None).unwrap_err();
        assert!(matches!(err, ModelError::EmptyPrimitive { data_type: "date" }));

        let node = PrimitiveNode::metadata_only(DataType::Date, Metadata::with_id("d1")).unwrap();
        assert_eq!(node.value(), None);
        assert_eq!(node.id(), Some("d1"));
    }

    #[test]
    fn test_empty_metadata_is_normalized_away() {
        let node = PrimitiveNode::from_parts(
            DataType::String,
            Some("x".into()),
            Some(Metadata::default()),
        )
        .unwrap();
        assert!(node.metadata().is_none());
        assert_eq!(Metadata::new(None, vec![]).unwrap(), None);
    }

    #[test]
    fn test_system_string_cannot_carry_metadata() {
        let err = PrimitiveNode::from_parts(
            DataType::SystemString,
            Some("x".into()),
            Some(Metadata::with_id("a")),
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::MetadataNotAllowed { .. }));
    }

    #[test]
    fn test_metadata_rejects_non_extensions() {
        let coding = ComplexNode::new(&datatypes::CODING);
        let err = Metadata::new(None, vec![coding]).unwrap_err();
        assert!(matches!(err, ModelError::NotAnExtension { found: "Coding" }));
    }

    #[test]
    fn test_set_validates_field_and_type() {
        let mut coding = ComplexNode::new(&datatypes::CODING);
        coding.set_value("code", "8867-4").unwrap();
        assert!(matches!(
            coding.set_value("codez", "x"),
            Err(ModelError::UnknownField { .. })
        ));
        let boolean = PrimitiveNode::new(DataType::Boolean, true).unwrap();
        assert!(matches!(
            coding.set("code", boolean),
            Err(ModelError::TypeMismatch { .. })
        ));
        assert!(matches!(
            coding.set_value("userSelected", "yes"),
            Err(ModelError::ValueKind { .. })
        ));
    }

    #[test]
    fn test_cardinality_is_enforced() {
        let mut name = ComplexNode::new(&datatypes::HUMAN_NAME);
        assert!(matches!(
            name.set_value("given", "Peter"),
            Err(ModelError::Cardinality { actual: "repeated", .. })
        ));
        name.push_value("given", "Peter").unwrap();
        name.push_value("given", "James").unwrap();
        assert_eq!(name.get("given").map(|f| f.nodes().len()), Some(2));
    }

    #[test]
    fn test_choice_holds_exactly_one_alternative() {
        let mut observation = ComplexNode::new(&resources::OBSERVATION);
        let quantity = ComplexNode::of(DataType::Quantity)
            .unwrap()
            .with_value("value", dec!(72.5))
            .unwrap();
        observation.set_choice("value", quantity).unwrap();
        observation
            .set_choice("value", PrimitiveNode::new(DataType::String, "normal").unwrap())
            .unwrap();

        let choice = observation.get("value").and_then(FieldValue::as_choice).unwrap();
        assert_eq!(choice.data_type(), DataType::String);

        let coding = ComplexNode::new(&datatypes::CODING);
        assert!(matches!(
            observation.set_choice("value", coding),
            Err(ModelError::TypeMismatch { .. })
        ));
        assert!(matches!(
            observation.set_value("value", "x"),
            Err(ModelError::Cardinality { actual: "a choice", .. })
        ));
        assert!(matches!(
            observation.push_value("value", "x"),
            Err(ModelError::Cardinality { actual: "a choice", .. })
        ));
    }

    #[test]
    fn test_backbone_shape_must_match() {
        let mut patient = ComplexNode::new(&resources::PATIENT);
        let link = ComplexNode::new(&resources::PATIENT_LINK);
        assert!(patient.push("contact", link.clone()).is_err());
        patient.push("link", link).unwrap();
    }

    #[test]
    fn test_extension_requires_url() {
        let bare = ComplexNode::of(DataType::Extension)
            .unwrap()
            .with_choice("value", PrimitiveNode::new(DataType::Boolean, true).unwrap())
            .unwrap();
        let mut patient = ComplexNode::new(&resources::PATIENT);
        assert_eq!(
            patient.push("extension", bare.clone()).unwrap_err(),
            ModelError::MissingExtensionUrl
        );
        assert_eq!(
            patient.set_list("modifierExtension", vec![Node::from(bare.clone())]).unwrap_err(),
            ModelError::MissingExtensionUrl
        );
        assert_eq!(
            Metadata::new(None, vec![bare]).unwrap_err(),
            ModelError::MissingExtensionUrl
        );

        let flagged = ComplexNode::extension("http://example.org/flag").unwrap();
        patient.push("extension", flagged.clone()).unwrap();
        assert!(Metadata::new(None, vec![flagged]).unwrap().is_some());
    }

    #[test]
    fn test_extensions_accessor() {
        let extension = ComplexNode::extension("http://example.org/flag")
            .unwrap()
            .with_choice("value", PrimitiveNode::new(DataType::Boolean, true).unwrap())
            .unwrap();
        let coding = ComplexNode::new(&datatypes::CODING)
            .with_pushed("extension", extension)
            .unwrap();
        let urls: Vec<_> = coding
            .extensions()
            .filter_map(|e| e.get("url"))
            .map(|f| f.nodes()[0].to_string())
            .collect();
        assert_eq!(urls, vec!["\"http://example.org/flag\""]);
    }

    #[test]
    fn test_display_does_not_fail() {
        let node = ComplexNode::new(&datatypes::CODING)
            .with_value("system", "http://loinc.org")
            .unwrap()
            .with_value("code", "8867-4")
            .unwrap();
        assert_eq!(
            node.to_string(),
            "Coding { system: \"http://loinc.org\", code: \"8867-4\" }"
        );
        assert_eq!(ComplexNode::new(&datatypes::PERIOD).to_string(), "Period {}");
    }
}
