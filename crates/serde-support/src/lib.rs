// Shadow-channel helpers for FHIR JSON primitives.
//
// FHIR JSON stores a primitive's value under `field` and its id/extensions
// under `_field`. These helpers split a primitive into the two channels on the
// way out and merge them back on the way in; nothing here knows about the
// concrete primitive types, which stay as raw `serde_json::Value`s.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// The `_field` object: an element id and its extensions.
///
/// # Example
/// ```json
/// {
///   "status": "active",
///   "_status": {
///     "id": "status-1",
///     "extension": [...]
///   }
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields, bound(deserialize = "E: DeserializeOwned"))]
pub struct IdAndExtension<E = Value> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<E>,
}

impl<E> IdAndExtension<E> {
    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.extension.is_empty()
    }

    fn non_empty(self) -> Option<Self> {
        (!self.is_empty()).then_some(self)
    }
}

/// One primitive as seen from the wire: the raw value and its metadata.
///
/// `metadata` is `None` rather than an empty `IdAndExtension`.
#[derive(Clone, Debug, PartialEq)]
pub struct PrimitiveParts<E = Value> {
    pub value: Option<Value>,
    pub metadata: Option<IdAndExtension<E>>,
}

impl<E> PrimitiveParts<E> {
    pub fn is_empty(&self) -> bool {
        self.value.is_none() && self.metadata.is_none()
    }
}

/// Ways the value and shadow channels can disagree.
#[derive(Error, Debug)]
pub enum ShadowError {
    #[error("expected an object in the shadow channel, found {found}")]
    ExpectedObject { found: &'static str },

    #[error("expected an array in the {channel} channel, found {found}")]
    ExpectedArray {
        channel: &'static str,
        found: &'static str,
    },

    #[error("shadow array has {shadows} entries but the value array has {values}")]
    ShadowShorter { values: usize, shadows: usize },

    #[error("element {index} has neither a value nor metadata")]
    EmptyElement { index: usize },

    #[error("element {index} value must be a JSON scalar, found {found}")]
    NotScalar { index: usize, found: &'static str },

    #[error("invalid metadata: {0}")]
    Metadata(#[from] serde_json::Error),
}

/// Short name of a JSON value's kind, for error messages.
pub fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn scalar(value: &Value, index: usize) -> Result<Option<Value>, ShadowError> {
    match value {
        Value::Null => Ok(None),
        Value::Array(_) | Value::Object(_) => Err(ShadowError::NotScalar {
            index,
            found: kind_of(value),
        }),
        other => Ok(Some(other.clone())),
    }
}

fn metadata<E: DeserializeOwned>(
    shadow: &Value,
    allow_null: bool,
) -> Result<Option<IdAndExtension<E>>, ShadowError> {
    match shadow {
        Value::Null if allow_null => Ok(None),
        Value::Object(_) => {
            let parsed: IdAndExtension<E> = IdAndExtension::deserialize(shadow)?;
            Ok(parsed.non_empty())
        }
        other => Err(ShadowError::ExpectedObject {
            found: kind_of(other),
        }),
    }
}

/// Merges the `field` / `_field` pair of a single-valued primitive.
///
/// Returns `Ok(None)` when neither key is present. A present pair that
/// carries neither a value nor metadata is an error.
pub fn merge_single<E: DeserializeOwned>(
    value: Option<&Value>,
    shadow: Option<&Value>,
) -> Result<Option<PrimitiveParts<E>>, ShadowError> {
    if value.is_none() && shadow.is_none() {
        return Ok(None);
    }
    let value = match value {
        Some(v) => scalar(v, 0)?,
        None => None,
    };
    let metadata = match shadow {
        Some(s) => metadata(s, false)?,
        None => None,
    };
    let parts = PrimitiveParts { value, metadata };
    if parts.is_empty() {
        return Err(ShadowError::EmptyElement { index: 0 });
    }
    Ok(Some(parts))
}

fn as_array<'a>(
    value: Option<&'a Value>,
    channel: &'static str,
) -> Result<Option<&'a [Value]>, ShadowError> {
    match value {
        None => Ok(None),
        Some(Value::Array(items)) => Ok(Some(items.as_slice())),
        Some(other) => Err(ShadowError::ExpectedArray {
            channel,
            found: kind_of(other),
        }),
    }
}

/// Merges the parallel `field` / `_field` arrays of a repeated primitive.
///
/// Entries are zipped by index. A shadow array longer than the value array is
/// accepted: the extra entries become metadata-only elements (trailing
/// metadata). A shadow array shorter than the value array is rejected.
pub fn merge_repeated<E: DeserializeOwned>(
    values: Option<&Value>,
    shadows: Option<&Value>,
) -> Result<Vec<PrimitiveParts<E>>, ShadowError> {
    let values = as_array(values, "value")?.unwrap_or_default();
    let shadows = as_array(shadows, "shadow")?;
    if let Some(shadows) = shadows
        && shadows.len() < values.len()
    {
        return Err(ShadowError::ShadowShorter {
            values: values.len(),
            shadows: shadows.len(),
        });
    }
    let shadows = shadows.unwrap_or_default();

    let len = values.len().max(shadows.len());
    let mut merged = Vec::with_capacity(len);
    for index in 0..len {
        let value = match values.get(index) {
            Some(v) => scalar(v, index)?,
            None => None,
        };
        let metadata = match shadows.get(index) {
            Some(s) => metadata(s, true)?,
            None => None,
        };
        let parts = PrimitiveParts { value, metadata };
        if parts.is_empty() {
            return Err(ShadowError::EmptyElement { index });
        }
        merged.push(parts);
    }
    Ok(merged)
}

/// Splits a single primitive into its `field` and `_field` values.
pub fn split_single<E: Serialize>(
    parts: &PrimitiveParts<E>,
) -> Result<(Option<Value>, Option<Value>), serde_json::Error> {
    let shadow = parts
        .metadata
        .as_ref()
        .map(serde_json::to_value)
        .transpose()?;
    Ok((parts.value.clone(), shadow))
}

/// Splits a repeated primitive into parallel `field` and `_field` arrays.
///
/// Each array is emitted only when at least one element contributes to it;
/// other positions are `null` so the two arrays stay aligned.
pub fn split_repeated<E: Serialize>(
    parts: &[PrimitiveParts<E>],
) -> Result<(Option<Value>, Option<Value>), serde_json::Error> {
    let values = parts
        .iter()
        .any(|p| p.value.is_some())
        .then(|| {
            Value::Array(
                parts
                    .iter()
                    .map(|p| p.value.clone().unwrap_or(Value::Null))
                    .collect(),
            )
        });

    let shadows = if parts.iter().any(|p| p.metadata.is_some()) {
        let mut entries = Vec::with_capacity(parts.len());
        for p in parts {
            entries.push(match &p.metadata {
                Some(m) => serde_json::to_value(m)?,
                None => Value::Null,
            });
        }
        Some(Value::Array(entries))
    } else {
        None
    };

    Ok((values, shadows))
}
