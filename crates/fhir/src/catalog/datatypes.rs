//! Complex data type shapes.

use super::{ELEMENT_EXTENSION, ELEMENT_ID, EXTENSION_VALUE_TYPES};
use crate::shape::{FieldDescriptor as F, ShapeDescriptor, ShapeKind};
use crate::types::DataType;

pub static EXTENSION: ShapeDescriptor = ShapeDescriptor::new(
    "Extension",
    ShapeKind::DataType(DataType::Extension),
    &[
        ELEMENT_ID,
        ELEMENT_EXTENSION,
        F::data("url", DataType::SystemString).attribute().required(),
        F::choice("value", EXTENSION_VALUE_TYPES),
    ],
);

pub static CODING: ShapeDescriptor = ShapeDescriptor::new(
    "Coding",
    ShapeKind::DataType(DataType::Coding),
    &[
        ELEMENT_ID,
        ELEMENT_EXTENSION,
        F::data("system", DataType::Uri),
        F::data("version", DataType::String),
        F::data("code", DataType::Code),
        F::data("display", DataType::String),
        F::data("userSelected", DataType::Boolean),
    ],
);

pub static CODEABLE_CONCEPT: ShapeDescriptor = ShapeDescriptor::new(
    "CodeableConcept",
    ShapeKind::DataType(DataType::CodeableConcept),
    &[
        ELEMENT_ID,
        ELEMENT_EXTENSION,
        F::data("coding", DataType::Coding).repeated(),
        F::data("text", DataType::String),
    ],
);

pub static QUANTITY: ShapeDescriptor = ShapeDescriptor::new(
    "Quantity",
    ShapeKind::DataType(DataType::Quantity),
    &[
        ELEMENT_ID,
        ELEMENT_EXTENSION,
        F::data("value", DataType::Decimal),
        F::data("comparator", DataType::Code),
        F::data("unit", DataType::String),
        F::data("system", DataType::Uri),
        F::data("code", DataType::Code),
    ],
);

pub static RANGE: ShapeDescriptor = ShapeDescriptor::new(
    "Range",
    ShapeKind::DataType(DataType::Range),
    &[
        ELEMENT_ID,
        ELEMENT_EXTENSION,
        F::data("low", DataType::Quantity),
        F::data("high", DataType::Quantity),
    ],
);

pub static PERIOD: ShapeDescriptor = ShapeDescriptor::new(
    "Period",
    ShapeKind::DataType(DataType::Period),
    &[
        ELEMENT_ID,
        ELEMENT_EXTENSION,
        F::data("start", DataType::DateTime),
        F::data("end", DataType::DateTime),
    ],
);

pub static REFERENCE: ShapeDescriptor = ShapeDescriptor::new(
    "Reference",
    ShapeKind::DataType(DataType::Reference),
    &[
        ELEMENT_ID,
        ELEMENT_EXTENSION,
        F::data("reference", DataType::String),
        F::data("type", DataType::Uri),
        F::data("identifier", DataType::Identifier),
        F::data("display", DataType::String),
    ],
);

pub static IDENTIFIER: ShapeDescriptor = ShapeDescriptor::new(
    "Identifier",
    ShapeKind::DataType(DataType::Identifier),
    &[
        ELEMENT_ID,
        ELEMENT_EXTENSION,
        F::data("use", DataType::Code),
        F::data("type", DataType::CodeableConcept),
        F::data("system", DataType::Uri),
        F::data("value", DataType::String),
        F::data("period", DataType::Period),
        F::data("assigner", DataType::Reference),
    ],
);

pub static HUMAN_NAME: ShapeDescriptor = ShapeDescriptor::new(
    "HumanName",
    ShapeKind::DataType(DataType::HumanName),
    &[
        ELEMENT_ID,
        ELEMENT_EXTENSION,
        F::data("use", DataType::Code),
        F::data("text", DataType::String),
        F::data("family", DataType::String),
        F::data("given", DataType::String).repeated(),
        F::data("prefix", DataType::String).repeated(),
        F::data("suffix", DataType::String).repeated(),
        F::data("period", DataType::Period),
    ],
);

pub static CONTACT_POINT: ShapeDescriptor = ShapeDescriptor::new(
    "ContactPoint",
    ShapeKind::DataType(DataType::ContactPoint),
    &[
        ELEMENT_ID,
        ELEMENT_EXTENSION,
        F::data("system", DataType::Code),
        F::data("value", DataType::String),
        F::data("use", DataType::Code),
        F::data("rank", DataType::PositiveInt),
        F::data("period", DataType::Period),
    ],
);

pub static ADDRESS: ShapeDescriptor = ShapeDescriptor::new(
    "Address",
    ShapeKind::DataType(DataType::Address),
    &[
        ELEMENT_ID,
        ELEMENT_EXTENSION,
        F::data("use", DataType::Code),
        F::data("type", DataType::Code),
        F::data("text", DataType::String),
        F::data("line", DataType::String).repeated(),
        F::data("city", DataType::String),
        F::data("district", DataType::String),
        F::data("state", DataType::String),
        F::data("postalCode", DataType::String),
        F::data("country", DataType::String),
        F::data("period", DataType::Period),
    ],
);

pub static ANNOTATION: ShapeDescriptor = ShapeDescriptor::new(
    "Annotation",
    ShapeKind::DataType(DataType::Annotation),
    &[
        ELEMENT_ID,
        ELEMENT_EXTENSION,
        F::choice("author", &[DataType::Reference, DataType::String]),
        F::data("time", DataType::DateTime),
        F::data("text", DataType::Markdown).required(),
    ],
);

pub static META: ShapeDescriptor = ShapeDescriptor::new(
    "Meta",
    ShapeKind::DataType(DataType::Meta),
    &[
        ELEMENT_ID,
        ELEMENT_EXTENSION,
        F::data("versionId", DataType::Id),
        F::data("lastUpdated", DataType::Instant),
        F::data("source", DataType::Uri),
        F::data("profile", DataType::Canonical).repeated(),
        F::data("security", DataType::Coding).repeated(),
        F::data("tag", DataType::Coding).repeated(),
    ],
);

pub static NARRATIVE: ShapeDescriptor = ShapeDescriptor::new(
    "Narrative",
    ShapeKind::DataType(DataType::Narrative),
    &[
        ELEMENT_ID,
        ELEMENT_EXTENSION,
        F::data("status", DataType::Code).required(),
        F::data("div", DataType::Xhtml).required(),
    ],
);
