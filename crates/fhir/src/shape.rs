//! Static shape declarations.
//!
//! A [`ShapeDescriptor`] is the schema of one complex element, backbone
//! element or resource: its name and the ordered list of its fields. Shapes
//! are plain `static` data so the node model, the codecs and the type adapter
//! all read the same declaration.

use crate::resource::ResourceType;
use crate::types::DataType;
use std::fmt;

/// What kind of element a shape describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    /// A reusable complex data type such as `Coding`.
    DataType(DataType),
    /// An inline element declared inside another shape (`Patient.contact`).
    Backbone,
    Resource(ResourceType),
}

/// How a field is written in XML.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Representation {
    Element,
    /// Carried as an attribute of the parent (`id`, `Extension.url`).
    XmlAttribute,
}

/// The declared type of a field.
#[derive(Debug, Clone, Copy)]
pub enum FieldType {
    Data(DataType),
    /// A `[x]` field: one of several alternative types.
    Choice(&'static [DataType]),
    /// Any resource, resolved by its `resourceType`.
    Resource,
    Backbone(&'static ShapeDescriptor),
}

impl FieldType {
    /// Type names as reported by reflection.
    pub fn type_names(&self) -> Vec<&'static str> {
        match self {
            FieldType::Data(t) => vec![t.name()],
            FieldType::Choice(types) => types.iter().map(|t| t.name()).collect(),
            FieldType::Resource => vec!["Resource"],
            FieldType::Backbone(_) => vec!["BackboneElement"],
        }
    }

    /// The primitive type of a non-choice primitive field.
    pub fn primitive(&self) -> Option<DataType> {
        match self {
            FieldType::Data(t) if t.is_primitive() => Some(*t),
            _ => None,
        }
    }
}

impl PartialEq for FieldType {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FieldType::Data(a), FieldType::Data(b)) => a == b,
            (FieldType::Choice(a), FieldType::Choice(b)) => a == b,
            (FieldType::Resource, FieldType::Resource) => true,
            (FieldType::Backbone(a), FieldType::Backbone(b)) => a.name == b.name,
            _ => false,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Data(t) => f.write_str(t.name()),
            FieldType::Choice(types) => {
                f.write_str("one of ")?;
                for (i, t) in types.iter().enumerate() {
                    if i > 0 {
                        f.write_str("|")?;
                    }
                    f.write_str(t.name())?;
                }
                Ok(())
            }
            FieldType::Resource => f.write_str("Resource"),
            FieldType::Backbone(shape) => f.write_str(shape.name),
        }
    }
}

/// One declared field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldDescriptor {
    /// Base name; choice fields omit the `[x]` suffix.
    pub name: &'static str,
    pub field_type: FieldType,
    pub repeated: bool,
    pub required: bool,
    pub representation: Representation,
}

impl FieldDescriptor {
    pub const fn new(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            field_type,
            repeated: false,
            required: false,
            representation: Representation::Element,
        }
    }

    pub const fn data(name: &'static str, data_type: DataType) -> Self {
        Self::new(name, FieldType::Data(data_type))
    }

    pub const fn choice(name: &'static str, types: &'static [DataType]) -> Self {
        Self::new(name, FieldType::Choice(types))
    }

    pub const fn resource(name: &'static str) -> Self {
        Self::new(name, FieldType::Resource)
    }

    pub const fn backbone(name: &'static str, shape: &'static ShapeDescriptor) -> Self {
        Self::new(name, FieldType::Backbone(shape))
    }

    pub const fn repeated(self) -> Self {
        Self {
            repeated: true,
            ..self
        }
    }

    pub const fn required(self) -> Self {
        Self {
            required: true,
            ..self
        }
    }

    pub const fn attribute(self) -> Self {
        Self {
            representation: Representation::XmlAttribute,
            ..self
        }
    }

    pub fn is_choice(&self) -> bool {
        matches!(self.field_type, FieldType::Choice(_))
    }

    pub fn is_attribute(&self) -> bool {
        self.representation == Representation::XmlAttribute
    }

    /// Allowed alternatives of a choice field.
    pub fn choice_types(&self) -> &'static [DataType] {
        match self.field_type {
            FieldType::Choice(types) => types,
            _ => &[],
        }
    }
}

/// Schema of a complex element or resource.
#[derive(Debug)]
pub struct ShapeDescriptor {
    /// Type name, or `Parent.path` for backbone elements.
    pub name: &'static str,
    pub kind: ShapeKind,
    /// Fields in schema order.
    pub fields: &'static [FieldDescriptor],
}

impl ShapeDescriptor {
    pub const fn new(
        name: &'static str,
        kind: ShapeKind,
        fields: &'static [FieldDescriptor],
    ) -> Self {
        Self { name, kind, fields }
    }

    pub fn field(&self, name: &str) -> Option<(usize, &'static FieldDescriptor)> {
        self.fields
            .iter()
            .enumerate()
            .find(|(_, f)| f.name == name)
    }

    /// Name reported to the type adapter.
    pub fn type_name(&self) -> &'static str {
        match self.kind {
            ShapeKind::DataType(t) => t.name(),
            ShapeKind::Backbone => "BackboneElement",
            ShapeKind::Resource(r) => r.name(),
        }
    }

    pub fn lineage(&self) -> &'static [&'static str] {
        match self.kind {
            ShapeKind::DataType(t) => t.lineage(),
            ShapeKind::Backbone => &["Element", "Base"],
            ShapeKind::Resource(r) => r.lineage(),
        }
    }

    pub fn data_type(&self) -> Option<DataType> {
        match self.kind {
            ShapeKind::DataType(t) => Some(t),
            _ => None,
        }
    }

    pub fn is_resource(&self) -> bool {
        matches!(self.kind, ShapeKind::Resource(_))
    }
}

impl PartialEq for ShapeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for ShapeDescriptor {}
