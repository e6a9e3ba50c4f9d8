//! Resolution of wire keys to declared fields, including `[x]` choice keys.
//!
//! Each alternative `T` of a choice field `F` is written under the key
//! `F + PascalCase(T)`: `value` + `CodeableConcept` gives
//! `valueCodeableConcept`, `value` + `dateTime` gives `valueDateTime`.

use crate::error::{Result, SerdeError};
use arbor_fhir::{DataType, FieldDescriptor, ShapeDescriptor};

/// A wire key matched against a shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedKey {
    /// Position of the field in the shape.
    pub index: usize,
    pub field: &'static FieldDescriptor,
    /// The selected alternative when the field is a choice.
    pub choice: Option<DataType>,
}

/// Finds the field a wire key names.
///
/// A plain field matches its own name only. A choice field matches the keys
/// of its declared alternatives; its bare name and keys naming undeclared
/// types match nothing.
pub fn resolve_key(shape: &'static ShapeDescriptor, key: &str) -> Option<ResolvedKey> {
    for (index, field) in shape.fields.iter().enumerate() {
        if !field.is_choice() {
            if field.name == key {
                return Some(ResolvedKey {
                    index,
                    field,
                    choice: None,
                });
            }
            continue;
        }
        let Some(suffix) = key.strip_prefix(field.name) else {
            continue;
        };
        if suffix.is_empty() {
            continue;
        }
        if let Some(data_type) = field
            .choice_types()
            .iter()
            .copied()
            .find(|t| t.choice_key(field.name) == key)
        {
            tracing::trace!(
                shape = shape.name,
                key,
                data_type = data_type.name(),
                "resolved choice key"
            );
            return Some(ResolvedKey {
                index,
                field,
                choice: Some(data_type),
            });
        }
    }
    None
}

/// The wire key of a field holding a value of the given type.
pub fn encode_key(field: &FieldDescriptor, data_type: Option<DataType>) -> String {
    match data_type {
        Some(t) if field.is_choice() => t.choice_key(field.name),
        _ => field.name.to_string(),
    }
}

/// Tracks which alternative of each choice field has been seen while
/// decoding one element.
#[derive(Debug, Default)]
pub struct ChoiceTracker {
    seen: Vec<(usize, DataType)>,
}

impl ChoiceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an alternative. A second, different alternative of the same
    /// field is ambiguous; the same alternative again is not reported here.
    pub fn record(&mut self, resolved: &ResolvedKey) -> Result<()> {
        let Some(data_type) = resolved.choice else {
            return Ok(());
        };
        match self.seen.iter().find(|(index, _)| *index == resolved.index) {
            Some((_, previous)) if *previous != data_type => {
                tracing::trace!(
                    field = resolved.field.name,
                    first = previous.name(),
                    second = data_type.name(),
                    "ambiguous choice"
                );
                Err(SerdeError::AmbiguousChoice {
                    field: format!("{}[x]", resolved.field.name),
                })
            }
            Some(_) => Ok(()),
            None => {
                self.seen.push((resolved.index, data_type));
                Ok(())
            }
        }
    }
}
