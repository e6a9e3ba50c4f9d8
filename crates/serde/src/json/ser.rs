//! JSON encoding of the node tree.
//!
//! Encoding to a `serde_json::Value` is total for any tree the node builders
//! accept; the only fallible step is re-reading a decimal's text as a JSON
//! number.

use super::de::RESOURCE_TYPE;
use crate::choice::encode_key;
use crate::error::Result;
use arbor_fhir::{ComplexNode, FieldValue, Node, PrimitiveNode, PrimitiveValue, ResourceNode};
use arbor_serde_support::{IdAndExtension, PrimitiveParts, split_repeated, split_single};
use serde_json::{Map, Value};

/// Encodes a resource as an object with `resourceType` first.
pub(crate) fn resource_to_value(resource: &ResourceNode) -> Result<Value> {
    let mut object = Map::new();
    object.insert(
        RESOURCE_TYPE.to_string(),
        Value::String(resource.resource_type().name().to_string()),
    );
    write_fields(resource.content(), &mut object)?;
    Ok(Value::Object(object))
}

/// Encodes an element as an object.
pub(crate) fn element_to_value(node: &ComplexNode) -> Result<Value> {
    let mut object = Map::new();
    write_fields(node, &mut object)?;
    Ok(Value::Object(object))
}

fn write_fields(node: &ComplexNode, object: &mut Map<String, Value>) -> Result<()> {
    for (field, value) in node.populated() {
        match value {
            FieldValue::Single(node) => write_node(object, field.name, node)?,
            FieldValue::Choice(choice) => {
                let key = encode_key(field, Some(choice.data_type()));
                tracing::trace!(field = field.name, key = key.as_str(), "encoding choice");
                write_node(object, &key, choice.value())?;
            }
            FieldValue::List(nodes) => write_list(object, field.name, nodes)?,
        }
    }
    Ok(())
}

fn write_node(object: &mut Map<String, Value>, key: &str, node: &Node) -> Result<()> {
    match node {
        Node::Primitive(primitive) => {
            let (value, shadow) = split_single(&primitive_parts(primitive)?)?;
            insert_channels(object, key, value, shadow);
        }
        Node::Complex(complex) => {
            object.insert(key.to_string(), element_to_value(complex)?);
        }
        Node::Resource(resource) => {
            object.insert(key.to_string(), resource_to_value(resource)?);
        }
    }
    Ok(())
}

fn write_list(object: &mut Map<String, Value>, key: &str, nodes: &[Node]) -> Result<()> {
    let primitives: Vec<&PrimitiveNode> = nodes.iter().filter_map(Node::as_primitive).collect();
    if !primitives.is_empty() {
        let parts = primitives
            .into_iter()
            .map(primitive_parts)
            .collect::<Result<Vec<_>>>()?;
        let (values, shadows) = split_repeated(&parts)?;
        insert_channels(object, key, values, shadows);
        return Ok(());
    }

    let mut items = Vec::with_capacity(nodes.len());
    for node in nodes {
        items.push(match node {
            Node::Resource(resource) => resource_to_value(resource)?,
            Node::Complex(complex) => element_to_value(complex)?,
            Node::Primitive(_) => continue,
        });
    }
    object.insert(key.to_string(), Value::Array(items));
    Ok(())
}

/// Writes `key` and `_key` next to each other.
fn insert_channels(
    object: &mut Map<String, Value>,
    key: &str,
    value: Option<Value>,
    shadow: Option<Value>,
) {
    if let Some(value) = value {
        object.insert(key.to_string(), value);
    }
    if let Some(shadow) = shadow {
        object.insert(format!("_{}", key), shadow);
    }
}

fn primitive_parts(primitive: &PrimitiveNode) -> Result<PrimitiveParts> {
    let value = primitive.value().map(primitive_to_value).transpose()?;
    let metadata = match primitive.metadata() {
        Some(metadata) => Some(IdAndExtension {
            id: metadata.id().map(str::to_string),
            extension: metadata
                .extensions()
                .iter()
                .map(element_to_value)
                .collect::<Result<Vec<_>>>()?,
        }),
        None => None,
    };
    Ok(PrimitiveParts { value, metadata })
}

/// Converts a primitive value to its JSON scalar. Decimals keep their scale.
fn primitive_to_value(value: &PrimitiveValue) -> Result<Value> {
    Ok(match value {
        PrimitiveValue::Boolean(b) => Value::Bool(*b),
        PrimitiveValue::Integer(i) => Value::from(*i),
        PrimitiveValue::Decimal(d) => serde_json::from_str(&d.to_string())?,
        PrimitiveValue::String(s) => Value::String(s.clone()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_fhir::catalog::datatypes;
    use arbor_fhir::{DataType, Metadata};
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_decimal_scale_survives() {
        let value = primitive_to_value(&PrimitiveValue::Decimal(dec!(1.50))).unwrap();
        assert_eq!(serde_json::to_string(&value).unwrap(), "1.50");
    }

    #[test]
    fn test_sparse_metadata_on_repeated_primitive() {
        let name = ComplexNode::new(&datatypes::HUMAN_NAME)
            .with_pushed("given", PrimitiveNode::new(DataType::String, "A").unwrap())
            .unwrap()
            .with_pushed(
                "given",
                PrimitiveNode::metadata_only(DataType::String, Metadata::with_id("g2")).unwrap(),
            )
            .unwrap()
            .with_pushed("given", PrimitiveNode::new(DataType::String, "C").unwrap())
            .unwrap();
        assert_eq!(
            element_to_value(&name).unwrap(),
            json!({
                "given": ["A", null, "C"],
                "_given": [null, {"id": "g2"}, null]
            })
        );
    }

    #[test]
    fn test_value_and_shadow_are_adjacent() {
        let coding = ComplexNode::new(&datatypes::CODING)
            .with(
                "code",
                PrimitiveNode::new(DataType::Code, "x")
                    .unwrap()
                    .with_metadata(Metadata::with_id("c1"))
                    .unwrap(),
            )
            .unwrap()
            .with_value("display", "X")
            .unwrap();
        let text = serde_json::to_string(&element_to_value(&coding).unwrap()).unwrap();
        assert_eq!(text, r#"{"code":"x","_code":{"id":"c1"},"display":"X"}"#);
    }
}
