//! Resource shapes and their backbone elements.

use super::{ELEMENT_EXTENSION, ELEMENT_ID, MODIFIER_EXTENSION};
use crate::resource::ResourceType;
use crate::shape::{FieldDescriptor as F, ShapeDescriptor, ShapeKind};
use crate::types::DataType;

const RESOURCE_ID: F = F::data("id", DataType::Id);
const META: F = F::data("meta", DataType::Meta);
const IMPLICIT_RULES: F = F::data("implicitRules", DataType::Uri);
const LANGUAGE: F = F::data("language", DataType::Code);
const TEXT: F = F::data("text", DataType::Narrative);
const CONTAINED: F = F::resource("contained").repeated();

// Patient

pub static PATIENT: ShapeDescriptor = ShapeDescriptor::new(
    "Patient",
    ShapeKind::Resource(ResourceType::Patient),
    &[
        RESOURCE_ID,
        META,
        IMPLICIT_RULES,
        LANGUAGE,
        TEXT,
        CONTAINED,
        ELEMENT_EXTENSION,
        MODIFIER_EXTENSION,
        F::data("identifier", DataType::Identifier).repeated(),
        F::data("active", DataType::Boolean),
        F::data("name", DataType::HumanName).repeated(),
        F::data("telecom", DataType::ContactPoint).repeated(),
        F::data("gender", DataType::Code),
        F::data("birthDate", DataType::Date),
        F::choice("deceased", &[DataType::Boolean, DataType::DateTime]),
        F::data("address", DataType::Address).repeated(),
        F::data("maritalStatus", DataType::CodeableConcept),
        F::choice("multipleBirth", &[DataType::Boolean, DataType::Integer]),
        F::backbone("contact", &PATIENT_CONTACT).repeated(),
        F::backbone("communication", &PATIENT_COMMUNICATION).repeated(),
        F::data("generalPractitioner", DataType::Reference).repeated(),
        F::data("managingOrganization", DataType::Reference),
        F::backbone("link", &PATIENT_LINK).repeated(),
    ],
);

pub static PATIENT_CONTACT: ShapeDescriptor = ShapeDescriptor::new(
    "Patient.contact",
    ShapeKind::Backbone,
    &[
        ELEMENT_ID,
        ELEMENT_EXTENSION,
        MODIFIER_EXTENSION,
        F::data("relationship", DataType::CodeableConcept).repeated(),
        F::data("name", DataType::HumanName),
        F::data("telecom", DataType::ContactPoint).repeated(),
        F::data("address", DataType::Address),
        F::data("gender", DataType::Code),
        F::data("organization", DataType::Reference),
        F::data("period", DataType::Period),
    ],
);

pub static PATIENT_COMMUNICATION: ShapeDescriptor = ShapeDescriptor::new(
    "Patient.communication",
    ShapeKind::Backbone,
    &[
        ELEMENT_ID,
        ELEMENT_EXTENSION,
        MODIFIER_EXTENSION,
        F::data("language", DataType::CodeableConcept).required(),
        F::data("preferred", DataType::Boolean),
    ],
);

pub static PATIENT_LINK: ShapeDescriptor = ShapeDescriptor::new(
    "Patient.link",
    ShapeKind::Backbone,
    &[
        ELEMENT_ID,
        ELEMENT_EXTENSION,
        MODIFIER_EXTENSION,
        F::data("other", DataType::Reference).required(),
        F::data("type", DataType::Code).required(),
    ],
);

// Observation

/// Alternatives for `Observation.value[x]` and `Observation.component.value[x]`.
pub const OBSERVATION_VALUE_TYPES: &[DataType] = &[
    DataType::Quantity,
    DataType::CodeableConcept,
    DataType::String,
    DataType::Boolean,
    DataType::Integer,
    DataType::Range,
    DataType::Time,
    DataType::DateTime,
    DataType::Period,
];

pub static OBSERVATION: ShapeDescriptor = ShapeDescriptor::new(
    "Observation",
    ShapeKind::Resource(ResourceType::Observation),
    &[
        RESOURCE_ID,
        META,
        IMPLICIT_RULES,
        LANGUAGE,
        TEXT,
        CONTAINED,
        ELEMENT_EXTENSION,
        MODIFIER_EXTENSION,
        F::data("identifier", DataType::Identifier).repeated(),
        F::data("basedOn", DataType::Reference).repeated(),
        F::data("partOf", DataType::Reference).repeated(),
        F::data("status", DataType::Code).required(),
        F::data("category", DataType::CodeableConcept).repeated(),
        F::data("code", DataType::CodeableConcept).required(),
        F::data("subject", DataType::Reference),
        F::data("focus", DataType::Reference).repeated(),
        F::data("encounter", DataType::Reference),
        F::choice(
            "effective",
            &[DataType::DateTime, DataType::Period, DataType::Instant],
        ),
        F::data("issued", DataType::Instant),
        F::data("performer", DataType::Reference).repeated(),
        F::choice("value", OBSERVATION_VALUE_TYPES),
        F::data("dataAbsentReason", DataType::CodeableConcept),
        F::data("interpretation", DataType::CodeableConcept).repeated(),
        F::data("note", DataType::Annotation).repeated(),
        F::data("bodySite", DataType::CodeableConcept),
        F::data("method", DataType::CodeableConcept),
        F::data("specimen", DataType::Reference),
        F::data("device", DataType::Reference),
        F::backbone("referenceRange", &OBSERVATION_REFERENCE_RANGE).repeated(),
        F::data("hasMember", DataType::Reference).repeated(),
        F::data("derivedFrom", DataType::Reference).repeated(),
        F::backbone("component", &OBSERVATION_COMPONENT).repeated(),
    ],
);

pub static OBSERVATION_REFERENCE_RANGE: ShapeDescriptor = ShapeDescriptor::new(
    "Observation.referenceRange",
    ShapeKind::Backbone,
    &[
        ELEMENT_ID,
        ELEMENT_EXTENSION,
        MODIFIER_EXTENSION,
        F::data("low", DataType::Quantity),
        F::data("high", DataType::Quantity),
        F::data("type", DataType::CodeableConcept),
        F::data("appliesTo", DataType::CodeableConcept).repeated(),
        F::data("age", DataType::Range),
        F::data("text", DataType::String),
    ],
);

pub static OBSERVATION_COMPONENT: ShapeDescriptor = ShapeDescriptor::new(
    "Observation.component",
    ShapeKind::Backbone,
    &[
        ELEMENT_ID,
        ELEMENT_EXTENSION,
        MODIFIER_EXTENSION,
        F::data("code", DataType::CodeableConcept).required(),
        F::choice("value", OBSERVATION_VALUE_TYPES),
        F::data("dataAbsentReason", DataType::CodeableConcept),
        F::data("interpretation", DataType::CodeableConcept).repeated(),
        F::backbone("referenceRange", &OBSERVATION_REFERENCE_RANGE).repeated(),
    ],
);

// Practitioner and Organization

pub static PRACTITIONER: ShapeDescriptor = ShapeDescriptor::new(
    "Practitioner",
    ShapeKind::Resource(ResourceType::Practitioner),
    &[
        RESOURCE_ID,
        META,
        IMPLICIT_RULES,
        LANGUAGE,
        TEXT,
        CONTAINED,
        ELEMENT_EXTENSION,
        MODIFIER_EXTENSION,
        F::data("identifier", DataType::Identifier).repeated(),
        F::data("active", DataType::Boolean),
        F::data("name", DataType::HumanName).repeated(),
        F::data("telecom", DataType::ContactPoint).repeated(),
        F::data("address", DataType::Address).repeated(),
        F::data("gender", DataType::Code),
        F::data("birthDate", DataType::Date),
        F::data("communication", DataType::CodeableConcept).repeated(),
    ],
);

pub static ORGANIZATION: ShapeDescriptor = ShapeDescriptor::new(
    "Organization",
    ShapeKind::Resource(ResourceType::Organization),
    &[
        RESOURCE_ID,
        META,
        IMPLICIT_RULES,
        LANGUAGE,
        TEXT,
        CONTAINED,
        ELEMENT_EXTENSION,
        MODIFIER_EXTENSION,
        F::data("identifier", DataType::Identifier).repeated(),
        F::data("active", DataType::Boolean),
        F::data("type", DataType::CodeableConcept).repeated(),
        F::data("name", DataType::String),
        F::data("alias", DataType::String).repeated(),
        F::data("telecom", DataType::ContactPoint).repeated(),
        F::data("address", DataType::Address).repeated(),
        F::data("partOf", DataType::Reference),
    ],
);

// Bundle

pub static BUNDLE: ShapeDescriptor = ShapeDescriptor::new(
    "Bundle",
    ShapeKind::Resource(ResourceType::Bundle),
    &[
        RESOURCE_ID,
        META,
        IMPLICIT_RULES,
        LANGUAGE,
        F::data("identifier", DataType::Identifier),
        F::data("type", DataType::Code).required(),
        F::data("timestamp", DataType::Instant),
        F::data("total", DataType::UnsignedInt),
        F::backbone("link", &BUNDLE_LINK).repeated(),
        F::backbone("entry", &BUNDLE_ENTRY).repeated(),
    ],
);

pub static BUNDLE_LINK: ShapeDescriptor = ShapeDescriptor::new(
    "Bundle.link",
    ShapeKind::Backbone,
    &[
        ELEMENT_ID,
        ELEMENT_EXTENSION,
        MODIFIER_EXTENSION,
        F::data("relation", DataType::String).required(),
        F::data("url", DataType::Uri).required(),
    ],
);

pub static BUNDLE_ENTRY: ShapeDescriptor = ShapeDescriptor::new(
    "Bundle.entry",
    ShapeKind::Backbone,
    &[
        ELEMENT_ID,
        ELEMENT_EXTENSION,
        MODIFIER_EXTENSION,
        F::backbone("link", &BUNDLE_LINK).repeated(),
        F::data("fullUrl", DataType::Uri),
        F::resource("resource"),
        F::backbone("search", &BUNDLE_ENTRY_SEARCH),
        F::backbone("request", &BUNDLE_ENTRY_REQUEST),
        F::backbone("response", &BUNDLE_ENTRY_RESPONSE),
    ],
);

pub static BUNDLE_ENTRY_SEARCH: ShapeDescriptor = ShapeDescriptor::new(
    "Bundle.entry.search",
    ShapeKind::Backbone,
    &[
        ELEMENT_ID,
        ELEMENT_EXTENSION,
        MODIFIER_EXTENSION,
        F::data("mode", DataType::Code),
        F::data("score", DataType::Decimal),
    ],
);

pub static BUNDLE_ENTRY_REQUEST: ShapeDescriptor = ShapeDescriptor::new(
    "Bundle.entry.request",
    ShapeKind::Backbone,
    &[
        ELEMENT_ID,
        ELEMENT_EXTENSION,
        MODIFIER_EXTENSION,
        F::data("method", DataType::Code).required(),
        F::data("url", DataType::Uri).required(),
        F::data("ifNoneMatch", DataType::String),
        F::data("ifModifiedSince", DataType::Instant),
        F::data("ifMatch", DataType::String),
        F::data("ifNoneExist", DataType::String),
    ],
);

pub static BUNDLE_ENTRY_RESPONSE: ShapeDescriptor = ShapeDescriptor::new(
    "Bundle.entry.response",
    ShapeKind::Backbone,
    &[
        ELEMENT_ID,
        ELEMENT_EXTENSION,
        MODIFIER_EXTENSION,
        F::data("status", DataType::String).required(),
        F::data("location", DataType::Uri),
        F::data("etag", DataType::String),
        F::data("lastModified", DataType::Instant),
        F::resource("outcome"),
    ],
);
