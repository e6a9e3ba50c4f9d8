//! The shape catalog.
//!
//! Declarations follow the FHIR R4 element definitions for the types this
//! crate ships. Every element shape starts with `id` and `extension`;
//! backbone elements and domain resources also carry `modifierExtension`.

pub mod datatypes;
pub mod resources;

use crate::shape::FieldDescriptor;
use crate::types::DataType;

/// `Element.id`: a System string written as an XML attribute.
pub const ELEMENT_ID: FieldDescriptor =
    FieldDescriptor::data("id", DataType::SystemString).attribute();
pub const ELEMENT_EXTENSION: FieldDescriptor =
    FieldDescriptor::data("extension", DataType::Extension).repeated();
pub const MODIFIER_EXTENSION: FieldDescriptor =
    FieldDescriptor::data("modifierExtension", DataType::Extension).repeated();

/// Alternatives allowed for `Extension.value[x]`.
pub const EXTENSION_VALUE_TYPES: &[DataType] = &[
    DataType::Base64Binary,
    DataType::Boolean,
    DataType::Canonical,
    DataType::Code,
    DataType::Date,
    DataType::DateTime,
    DataType::Decimal,
    DataType::Id,
    DataType::Instant,
    DataType::Integer,
    DataType::Markdown,
    DataType::Oid,
    DataType::PositiveInt,
    DataType::String,
    DataType::Time,
    DataType::UnsignedInt,
    DataType::Uri,
    DataType::Url,
    DataType::Uuid,
    DataType::Address,
    DataType::Annotation,
    DataType::CodeableConcept,
    DataType::Coding,
    DataType::ContactPoint,
    DataType::HumanName,
    DataType::Identifier,
    DataType::Meta,
    DataType::Period,
    DataType::Quantity,
    DataType::Range,
    DataType::Reference,
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ResourceType;
    use crate::shape::{FieldType, ShapeDescriptor};
    use std::collections::HashSet;

    fn check_shape(shape: &ShapeDescriptor, seen: &mut HashSet<&'static str>) {
        if !seen.insert(shape.name) {
            return;
        }
        let mut names = HashSet::new();
        for field in shape.fields {
            assert!(names.insert(field.name), "{} repeats {}", shape.name, field.name);
            match field.field_type {
                FieldType::Data(t) => {
                    if let Some(inner) = t.shape() {
                        check_shape(inner, seen);
                    }
                }
                FieldType::Backbone(inner) => check_shape(inner, seen),
                FieldType::Choice(types) => assert!(!types.is_empty()),
                FieldType::Resource => {}
            }
        }
        if !shape.is_resource() {
            assert_eq!(shape.fields[0], ELEMENT_ID, "{} must start with id", shape.name);
            assert_eq!(shape.fields[1], ELEMENT_EXTENSION, "{} must declare extension", shape.name);
        }
    }

    #[test]
    fn test_catalog_shapes_are_well_formed() {
        let mut seen = HashSet::new();
        for resource_type in ResourceType::ALL {
            check_shape(resource_type.shape(), &mut seen);
        }
        for data_type in DataType::ALL {
            if let Some(shape) = data_type.shape() {
                check_shape(shape, &mut seen);
            }
        }
    }

    #[test]
    fn test_extension_values_exclude_system_types() {
        assert!(!EXTENSION_VALUE_TYPES.contains(&DataType::SystemString));
        assert!(!EXTENSION_VALUE_TYPES.contains(&DataType::Extension));
    }
}
