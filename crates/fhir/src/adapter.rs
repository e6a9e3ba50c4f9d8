//! [`TypeAdapter`] implementations for the node tree.

use crate::node::{ComplexNode, FieldValue, Node, PrimitiveNode};
use crate::resource::ResourceNode;
use crate::shape::FieldDescriptor;
use crate::types::{DataType, PrimitiveValue};
use arbor_fhirpath_support::{
    ConversionError, DEFAULT_UNIT, ElementInfo, FHIR_NAMESPACE, PartialDate, PartialDateTime,
    PartialTime, Quantity, SystemValue, TypeAdapter, TypeInfo,
};

fn wanted(filter: Option<&[&str]>, name: &str) -> bool {
    filter.is_none_or(|names| names.contains(&name))
}

/// Whether a field answers to any name in the filter. A choice field answers
/// to its base name and to the key of the alternative it holds.
fn field_wanted(filter: Option<&[&str]>, descriptor: &FieldDescriptor, value: &FieldValue) -> bool {
    let Some(names) = filter else {
        return true;
    };
    names.iter().any(|name| {
        *name == descriptor.name
            || value
                .as_choice()
                .is_some_and(|choice| choice.data_type().choice_key(descriptor.name) == *name)
    })
}

impl TypeAdapter for PrimitiveNode {
    fn children(&self, filter: Option<&[&str]>) -> Vec<&dyn TypeAdapter> {
        let mut children: Vec<&dyn TypeAdapter> = Vec::new();
        let Some(metadata) = self.metadata() else {
            return children;
        };
        if wanted(filter, "id")
            && let Some(id) = metadata.id_string()
        {
            children.push(id);
        }
        if wanted(filter, "extension") {
            children.extend(metadata.extensions().iter().map(|e| e as &dyn TypeAdapter));
        }
        children
    }

    fn system_value(&self) -> Result<Option<SystemValue>, ConversionError> {
        let Some(value) = self.value() else {
            return Ok(None);
        };
        let system = match (self.data_type(), value) {
            (_, PrimitiveValue::Boolean(b)) => SystemValue::Boolean(*b),
            (_, PrimitiveValue::Integer(i)) => SystemValue::Integer(*i),
            (_, PrimitiveValue::Decimal(d)) => SystemValue::Decimal(*d),
            (DataType::Date, PrimitiveValue::String(s)) => {
                SystemValue::Date(PartialDate::parse(s)?)
            }
            (DataType::DateTime | DataType::Instant, PrimitiveValue::String(s)) => {
                SystemValue::DateTime(PartialDateTime::parse(s)?)
            }
            (DataType::Time, PrimitiveValue::String(s)) => {
                SystemValue::Time(PartialTime::parse(s)?)
            }
            (_, PrimitiveValue::String(s)) => SystemValue::String(s.clone()),
        };
        Ok(Some(system))
    }

    fn type_info(&self) -> TypeInfo {
        let data_type = self.data_type();
        if data_type.is_system() {
            return TypeInfo::system("String");
        }
        TypeInfo {
            namespace: FHIR_NAMESPACE,
            name: data_type.name(),
            lineage: data_type.lineage(),
            elements: vec![
                ElementInfo {
                    name: "id",
                    types: vec![DataType::SystemString.name()],
                    repeated: false,
                },
                ElementInfo {
                    name: "extension",
                    types: vec![DataType::Extension.name()],
                    repeated: true,
                },
            ],
        }
    }
}

impl ComplexNode {
    fn primitive_field(&self, name: &str) -> Option<&PrimitiveValue> {
        match self.get(name)? {
            FieldValue::Single(Node::Primitive(p)) => p.value(),
            _ => None,
        }
    }

    /// A FHIR `Quantity` projects to a System quantity. The unit is the
    /// coded unit when present, then the human-readable one.
    fn quantity_value(&self) -> Option<SystemValue> {
        let value = match self.primitive_field("value")? {
            PrimitiveValue::Decimal(d) => *d,
            _ => return None,
        };
        let unit = self
            .primitive_field("code")
            .or_else(|| self.primitive_field("unit"))
            .and_then(PrimitiveValue::as_str)
            .unwrap_or(DEFAULT_UNIT);
        Some(SystemValue::Quantity(Quantity::new(value, unit)))
    }
}

impl TypeAdapter for ComplexNode {
    fn children(&self, filter: Option<&[&str]>) -> Vec<&dyn TypeAdapter> {
        self.populated()
            .filter(|(descriptor, value)| field_wanted(filter, descriptor, value))
            .flat_map(|(_, value)| value.nodes().iter().map(|n| n as &dyn TypeAdapter))
            .collect()
    }

    fn system_value(&self) -> Result<Option<SystemValue>, ConversionError> {
        if self.data_type() == Some(DataType::Quantity) {
            return Ok(self.quantity_value());
        }
        Ok(None)
    }

    fn type_info(&self) -> TypeInfo {
        let shape = self.shape();
        TypeInfo {
            namespace: FHIR_NAMESPACE,
            name: shape.type_name(),
            lineage: shape.lineage(),
            elements: shape
                .fields
                .iter()
                .map(|field| ElementInfo {
                    name: field.name,
                    types: field.field_type.type_names(),
                    repeated: field.repeated,
                })
                .collect(),
        }
    }
}

impl TypeAdapter for ResourceNode {
    fn children(&self, filter: Option<&[&str]>) -> Vec<&dyn TypeAdapter> {
        self.content().children(filter)
    }

    fn system_value(&self) -> Result<Option<SystemValue>, ConversionError> {
        Ok(None)
    }

    fn type_info(&self) -> TypeInfo {
        self.content().type_info()
    }
}

impl TypeAdapter for Node {
    fn children(&self, filter: Option<&[&str]>) -> Vec<&dyn TypeAdapter> {
        match self {
            Node::Primitive(p) => p.children(filter),
            Node::Complex(c) => c.children(filter),
            Node::Resource(r) => r.children(filter),
        }
    }

    fn system_value(&self) -> Result<Option<SystemValue>, ConversionError> {
        match self {
            Node::Primitive(p) => p.system_value(),
            Node::Complex(c) => c.system_value(),
            Node::Resource(r) => r.system_value(),
        }
    }

    fn type_info(&self) -> TypeInfo {
        match self {
            Node::Primitive(p) => p.type_info(),
            Node::Complex(c) => c.type_info(),
            Node::Resource(r) => r.type_info(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::datatypes;
    use crate::node::Metadata;
    use rust_decimal_macros::dec;

    #[test]
    fn test_primitive_projection_by_type() {
        let date = PrimitiveNode::new(DataType::Date, "2012-04").unwrap();
        assert!(matches!(date.system_value(), Ok(Some(SystemValue::Date(_)))));

        let code = PrimitiveNode::new(DataType::Code, "final").unwrap();
        assert_eq!(
            code.system_value(),
            Ok(Some(SystemValue::String("final".to_string())))
        );
    }

    #[test]
    fn test_malformed_date_text_is_an_error() {
        let date = PrimitiveNode::new(DataType::Date, "2012-13-01").unwrap();
        assert!(date.to_date(false).is_err());
    }

    #[test]
    fn test_metadata_only_primitive_converts_to_nothing() {
        let node = PrimitiveNode::metadata_only(DataType::Boolean, Metadata::with_id("b")).unwrap();
        assert_eq!(node.to_boolean(false), Ok(None));
        let children = node.children(None);
        assert_eq!(children.len(), 1);
        assert!(children[0].type_info().is("System.String"));
    }

    #[test]
    fn test_quantity_projects_to_system_quantity() {
        let quantity = ComplexNode::new(&datatypes::QUANTITY)
            .with_value("value", dec!(72))
            .unwrap()
            .with_value("unit", "beats/minute")
            .unwrap()
            .with_value("code", "/min")
            .unwrap();
        assert_eq!(
            quantity.to_quantity(false),
            Ok(Some(Quantity::new(dec!(72), "/min")))
        );
    }

    #[test]
    fn test_type_info_lineage() {
        let uri = PrimitiveNode::new(DataType::Url, "http://x").unwrap();
        let info = uri.type_info();
        assert!(info.is("url"));
        assert!(info.is("FHIR.uri"));
        assert!(!info.is("string"));
    }
}
