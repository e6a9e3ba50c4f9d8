//! JSON decoding into the node tree.

use crate::choice::{ChoiceTracker, ResolvedKey, resolve_key};
use crate::config::DecodeOptions;
use crate::error::{Result, SerdeError};
use crate::value::parse_decimal;
use arbor_fhir::catalog::datatypes;
use arbor_fhir::{
    ComplexNode, DataType, FieldDescriptor, FieldType, Metadata, Node, PrimitiveNode,
    PrimitiveValue, ResourceNode, ResourceType, ShapeDescriptor, ValueKind,
};
use arbor_serde_support::{IdAndExtension, PrimitiveParts, kind_of, merge_repeated, merge_single};
use serde_json::{Map, Value};

/// Key of the resource discriminator.
pub(crate) const RESOURCE_TYPE: &str = "resourceType";

/// Both channels of one declared field, as found in an object.
struct FieldInput<'a> {
    key: &'a str,
    resolved: ResolvedKey,
    value: Option<&'a Value>,
    shadow: Option<&'a Value>,
}

/// Walks a parsed JSON document against the shape catalog.
pub(crate) struct JsonDecoder<'o> {
    options: &'o DecodeOptions,
}

impl<'o> JsonDecoder<'o> {
    pub(crate) fn new(options: &'o DecodeOptions) -> Self {
        Self { options }
    }

    /// Decodes any resource, selecting its shape by `resourceType`.
    pub(crate) fn decode_resource(
        &self,
        value: &Value,
        path: &str,
        depth: usize,
    ) -> Result<ResourceNode> {
        self.options.check_depth(depth)?;
        let object = value.as_object().ok_or_else(|| {
            let found = kind_of(value);
            SerdeError::decode(path, format!("expected a resource object, found {}", found))
        })?;
        let tag = match object.get(RESOURCE_TYPE) {
            Some(Value::String(tag)) => tag,
            Some(other) => {
                return Err(SerdeError::decode(
                    path,
                    format!("resourceType must be a string, found {}", kind_of(other)),
                ));
            }
            None => return Err(SerdeError::decode(path, "missing resourceType")),
        };
        let resource_type = ResourceType::from_name(tag)
            .ok_or_else(|| SerdeError::UnknownResourceType(tag.clone()))?;
        tracing::trace!(resource_type = tag.as_str(), path, "resolved resource container");

        let path = if path.is_empty() { tag.as_str() } else { path };
        let content = self.decode_object(object, resource_type.shape(), path, depth, true)?;
        ResourceNode::from_content(content).map_err(|e| SerdeError::model(path, e))
    }

    /// Decodes an element of a known shape.
    pub(crate) fn decode_element(
        &self,
        value: &Value,
        shape: &'static ShapeDescriptor,
        path: &str,
        depth: usize,
    ) -> Result<ComplexNode> {
        self.options.check_depth(depth)?;
        let object = value.as_object().ok_or_else(|| {
            SerdeError::decode(
                path,
                format!("{} must be an object, found {}", shape.name, kind_of(value)),
            )
        })?;
        self.decode_object(object, shape, path, depth, false)
    }

    fn decode_object(
        &self,
        object: &Map<String, Value>,
        shape: &'static ShapeDescriptor,
        path: &str,
        depth: usize,
        is_resource: bool,
    ) -> Result<ComplexNode> {
        let mut inputs: Vec<Option<FieldInput<'_>>> = Vec::new();
        inputs.resize_with(shape.fields.len(), || None);
        let mut choices = ChoiceTracker::new();

        for (key, value) in object {
            if is_resource && key == RESOURCE_TYPE {
                continue;
            }
            let (base, is_shadow) = match key.strip_prefix('_') {
                Some(base) => (base, true),
                None => (key.as_str(), false),
            };
            let resolved = resolve_key(shape, base)
                .filter(|r| !is_shadow || accepts_shadow(r))
                .ok_or_else(|| {
                    SerdeError::decode(path, format!("unknown field {:?} in {}", key, shape.name))
                })?;
            // A null alternative with no shadow is absent, not a competing choice.
            if resolved.choice.is_some()
                && !is_shadow
                && value.is_null()
                && !object.contains_key(&format!("_{}", base))
            {
                continue;
            }
            choices.record(&resolved)?;

            let input = inputs[resolved.index].get_or_insert_with(|| FieldInput {
                key: base,
                resolved,
                value: None,
                shadow: None,
            });
            if is_shadow {
                input.shadow = Some(value);
            } else {
                input.value = Some(value);
            }
        }

        let mut node = ComplexNode::new(shape);
        for input in inputs.into_iter().flatten() {
            self.decode_field(&mut node, input, path, depth)?;
        }
        Ok(node)
    }

    fn decode_field(
        &self,
        node: &mut ComplexNode,
        input: FieldInput<'_>,
        path: &str,
        depth: usize,
    ) -> Result<()> {
        let field = input.resolved.field;
        let path = format!("{}.{}", path, input.key);
        let model = |e| SerdeError::model(&path, e);

        if let Some(data_type) = input.resolved.choice {
            let value = if data_type.is_primitive() {
                self.single_primitive(data_type, input.value, input.shadow, &path, depth)?
                    .map(Node::from)
            } else {
                match input.value {
                    Some(value) => {
                        Some(Node::from(self.complex(data_type, value, &path, depth)?))
                    }
                    None => None,
                }
            };
            if let Some(value) = value {
                node.set_choice(field.name, value).map_err(model)?;
            }
            return Ok(());
        }

        match field.field_type {
            FieldType::Data(data_type) if data_type.is_primitive() => {
                let (value, shadow) = (input.value, input.shadow);
                if field.repeated {
                    let nodes = self.repeated_primitive(data_type, value, shadow, &path, depth)?;
                    node.set_list(field.name, nodes).map_err(model)?;
                } else if let Some(value) =
                    self.single_primitive(data_type, value, shadow, &path, depth)?
                {
                    node.set(field.name, value).map_err(model)?;
                }
            }
            FieldType::Data(data_type) => {
                self.decode_nested(node, field, input.value, &path, |value, path| {
                    self.complex(data_type, value, path, depth).map(Node::from)
                })?;
            }
            FieldType::Backbone(shape) => {
                self.decode_nested(node, field, input.value, &path, |value, path| {
                    self.decode_element(value, shape, path, depth + 1)
                        .map(Node::from)
                })?;
            }
            FieldType::Resource => {
                self.decode_nested(node, field, input.value, &path, |value, path| {
                    self.decode_resource(value, path, depth + 1).map(Node::from)
                })?;
            }
            FieldType::Choice(_) => {
                return Err(SerdeError::decode(&path, "choice field without a type suffix"));
            }
        }
        Ok(())
    }

    fn complex(
        &self,
        data_type: DataType,
        value: &Value,
        path: &str,
        depth: usize,
    ) -> Result<ComplexNode> {
        let shape = data_type
            .shape()
            .ok_or_else(|| SerdeError::decode(path, format!("{} is not complex", data_type)))?;
        self.decode_element(value, shape, path, depth + 1)
    }

    /// Decodes a single or repeated non-primitive field.
    fn decode_nested<F>(
        &self,
        node: &mut ComplexNode,
        field: &FieldDescriptor,
        value: Option<&Value>,
        path: &str,
        decode: F,
    ) -> Result<()>
    where
        F: Fn(&Value, &str) -> Result<Node>,
    {
        let Some(value) = value else {
            return Ok(());
        };
        let model = |e| SerdeError::model(path, e);
        if !field.repeated {
            node.set(field.name, decode(value, path)?).map_err(model)?;
            return Ok(());
        }
        let items = value.as_array().ok_or_else(|| {
            SerdeError::decode(path, format!("expected an array, found {}", kind_of(value)))
        })?;
        if items.is_empty() {
            return Err(SerdeError::decode(path, "array must not be empty"));
        }
        let nodes = items
            .iter()
            .enumerate()
            .map(|(i, item)| decode(item, &format!("{}[{}]", path, i)))
            .collect::<Result<Vec<_>>>()?;
        node.set_list(field.name, nodes).map_err(model)?;
        Ok(())
    }

    fn single_primitive(
        &self,
        data_type: DataType,
        value: Option<&Value>,
        shadow: Option<&Value>,
        path: &str,
        depth: usize,
    ) -> Result<Option<PrimitiveNode>> {
        let parts: Option<PrimitiveParts> =
            merge_single(value, shadow).map_err(|e| SerdeError::shadow(path, e))?;
        parts
            .map(|parts| self.primitive(data_type, parts, path, depth))
            .transpose()
    }

    fn repeated_primitive(
        &self,
        data_type: DataType,
        values: Option<&Value>,
        shadows: Option<&Value>,
        path: &str,
        depth: usize,
    ) -> Result<Vec<Node>> {
        let merged: Vec<PrimitiveParts> =
            merge_repeated(values, shadows).map_err(|e| SerdeError::shadow(path, e))?;
        if merged.is_empty() {
            return Err(SerdeError::decode(path, "array must not be empty"));
        }
        tracing::trace!(path, elements = merged.len(), "merged shadow array");
        merged
            .into_iter()
            .enumerate()
            .map(|(i, parts)| {
                self.primitive(data_type, parts, &format!("{}[{}]", path, i), depth)
                    .map(Node::from)
            })
            .collect()
    }

    fn primitive(
        &self,
        data_type: DataType,
        parts: PrimitiveParts,
        path: &str,
        depth: usize,
    ) -> Result<PrimitiveNode> {
        let value = parts
            .value
            .as_ref()
            .map(|v| primitive_value(data_type, v, path))
            .transpose()?;
        let metadata = match parts.metadata {
            Some(metadata) => self.metadata(metadata, path, depth)?,
            None => None,
        };
        PrimitiveNode::from_parts(data_type, value, metadata)
            .map_err(|e| SerdeError::model(path, e))
    }

    fn metadata(
        &self,
        metadata: IdAndExtension,
        path: &str,
        depth: usize,
    ) -> Result<Option<Metadata>> {
        let path = format!("{}.extension", path);
        let extensions = metadata
            .extension
            .iter()
            .enumerate()
            .map(|(i, e)| {
                let path = format!("{}[{}]", path, i);
                self.decode_element(e, &datatypes::EXTENSION, &path, depth + 1)
            })
            .collect::<Result<Vec<_>>>()?;
        Metadata::new(metadata.id, extensions).map_err(|e| SerdeError::model(&path, e))
    }
}

/// Whether a field accepts a `_field` shadow key: FHIR primitives do, the
/// System strings behind element ids and extension urls do not.
fn accepts_shadow(resolved: &ResolvedKey) -> bool {
    let data_type = match (resolved.choice, resolved.field.field_type) {
        (Some(t), _) => t,
        (None, FieldType::Data(t)) => t,
        _ => return false,
    };
    data_type.is_primitive() && !data_type.is_system()
}

/// Converts a JSON scalar to a primitive value of the given type.
pub(crate) fn primitive_value(
    data_type: DataType,
    value: &Value,
    path: &str,
) -> Result<PrimitiveValue> {
    let mismatch = || {
        let expected = expected(data_type.value_kind());
        let found = kind_of(value);
        SerdeError::decode(path, format!("{} expects {}, found {}", data_type, expected, found))
    };
    match (data_type.value_kind(), value) {
        (ValueKind::Boolean, Value::Bool(b)) => Ok(PrimitiveValue::Boolean(*b)),
        (ValueKind::Integer, Value::Number(n)) => n
            .as_i64()
            .map(PrimitiveValue::Integer)
            .ok_or_else(|| {
                SerdeError::decode(path, format!("{} is not a valid {}", n, data_type))
            }),
        (ValueKind::Decimal, Value::Number(n)) => {
            let text = n.to_string();
            parse_decimal(&text)
                .map(PrimitiveValue::Decimal)
                .ok_or_else(|| SerdeError::decode(path, format!("{} is not a valid decimal", text)))
        }
        (ValueKind::String, Value::String(s)) => Ok(PrimitiveValue::String(s.clone())),
        _ => Err(mismatch()),
    }
}

fn expected(kind: ValueKind) -> &'static str {
    match kind {
        ValueKind::Boolean => "a boolean",
        ValueKind::Integer => "an integer",
        ValueKind::Decimal => "a number",
        ValueKind::String => "a string",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_primitive_value_kinds() {
        assert_eq!(
            primitive_value(DataType::Boolean, &json!(true), "x").unwrap(),
            PrimitiveValue::Boolean(true)
        );
        assert_eq!(
            primitive_value(DataType::UnsignedInt, &json!(7), "x").unwrap(),
            PrimitiveValue::Integer(7)
        );
        assert!(primitive_value(DataType::Integer, &json!(1.5), "x").is_err());
        assert!(primitive_value(DataType::Boolean, &json!("true"), "x").is_err());
        assert!(primitive_value(DataType::Code, &json!(1), "x").is_err());
    }

    #[test]
    fn test_decimal_keeps_textual_precision() {
        let value: Value = serde_json::from_str("1.50").unwrap();
        let decoded = primitive_value(DataType::Decimal, &value, "x").unwrap();
        assert_eq!(decoded, PrimitiveValue::Decimal(dec!(1.50)));
        assert_eq!(decoded.to_string(), "1.50");
    }

    #[test]
    fn test_shadow_keys_only_on_primitives() {
        let options = DecodeOptions::default();
        let decoder = JsonDecoder::new(&options);
        let err = decoder
            .decode_element(
                &json!({"_coding": {"id": "c"}}),
                &datatypes::CODEABLE_CONCEPT,
                "cc",
                1,
            )
            .unwrap_err();
        assert!(matches!(err, SerdeError::Decode { .. }));

        let err = decoder
            .decode_element(&json!({"id": "a", "_id": {"id": "b"}}), &datatypes::CODING, "c", 1)
            .unwrap_err();
        assert!(matches!(err, SerdeError::Decode { .. }));
    }
}
