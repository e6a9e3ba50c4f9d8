//! The resource registry and resource nodes.

use crate::catalog::resources;
use crate::error::{ModelError, Result};
use crate::node::{ComplexNode, FieldValue, Node};
use crate::shape::ShapeDescriptor;
use std::fmt;
use std::str::FromStr;

/// Every resource type the registry knows.
///
/// This is the closed set of `resourceType` discriminators accepted by the
/// codecs; anything else is an unknown resource type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceType {
    Bundle,
    Observation,
    Organization,
    Patient,
    Practitioner,
}

impl ResourceType {
    pub const ALL: &'static [ResourceType] = &[
        ResourceType::Bundle,
        ResourceType::Observation,
        ResourceType::Organization,
        ResourceType::Patient,
        ResourceType::Practitioner,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            ResourceType::Bundle => "Bundle",
            ResourceType::Observation => "Observation",
            ResourceType::Organization => "Organization",
            ResourceType::Patient => "Patient",
            ResourceType::Practitioner => "Practitioner",
        }
    }

    pub fn from_name(name: &str) -> Option<ResourceType> {
        match name {
            "Bundle" => Some(ResourceType::Bundle),
            "Observation" => Some(ResourceType::Observation),
            "Organization" => Some(ResourceType::Organization),
            "Patient" => Some(ResourceType::Patient),
            "Practitioner" => Some(ResourceType::Practitioner),
            _ => None,
        }
    }

    pub fn shape(self) -> &'static ShapeDescriptor {
        match self {
            ResourceType::Bundle => &resources::BUNDLE,
            ResourceType::Observation => &resources::OBSERVATION,
            ResourceType::Organization => &resources::ORGANIZATION,
            ResourceType::Patient => &resources::PATIENT,
            ResourceType::Practitioner => &resources::PRACTITIONER,
        }
    }

    pub const fn lineage(self) -> &'static [&'static str] {
        match self {
            ResourceType::Bundle => &["Resource"],
            _ => &["DomainResource", "Resource"],
        }
    }
}

impl FromStr for ResourceType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        ResourceType::from_name(s).ok_or_else(|| ModelError::UnknownResourceType(s.to_string()))
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A resource: its type tag and its content.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceNode {
    resource_type: ResourceType,
    content: ComplexNode,
}

impl ResourceNode {
    pub fn new(resource_type: ResourceType) -> Self {
        Self {
            resource_type,
            content: ComplexNode::new(resource_type.shape()),
        }
    }

    /// Wraps content built against a resource shape.
    pub fn from_content(content: ComplexNode) -> Result<Self> {
        match content.shape().kind {
            crate::shape::ShapeKind::Resource(resource_type) => Ok(Self {
                resource_type,
                content,
            }),
            _ => Err(ModelError::UnknownResourceType(content.type_name().to_string())),
        }
    }

    pub fn resource_type(&self) -> ResourceType {
        self.resource_type
    }

    /// The logical id, if set.
    pub fn resource_id(&self) -> Option<&str> {
        match self.content.get("id") {
            Some(FieldValue::Single(Node::Primitive(id))) => id.value().and_then(|v| v.as_str()),
            _ => None,
        }
    }

    pub fn content(&self) -> &ComplexNode {
        &self.content
    }

    pub fn content_mut(&mut self) -> &mut ComplexNode {
        &mut self.content
    }

    pub fn into_content(self) -> ComplexNode {
        self.content
    }

    /// Builder-style field setter; see [`ComplexNode::set`].
    pub fn with(mut self, field: &str, value: impl Into<Node>) -> Result<Self> {
        self.content.set(field, value)?;
        Ok(self)
    }
}

impl fmt::Display for ResourceNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.content, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::PrimitiveNode;
    use crate::types::DataType;

    #[test]
    fn test_registry_is_closed() {
        for resource_type in ResourceType::ALL {
            assert_eq!(ResourceType::from_name(resource_type.name()), Some(*resource_type));
            assert_eq!(resource_type.shape().type_name(), resource_type.name());
        }
        assert_eq!(ResourceType::from_name("patient"), None);
        assert!(matches!(
            "Medication".parse::<ResourceType>(),
            Err(ModelError::UnknownResourceType(name)) if name == "Medication"
        ));
    }

    #[test]
    fn test_resource_id() {
        let patient = ResourceNode::new(ResourceType::Patient)
            .with("id", PrimitiveNode::new(DataType::Id, "example").unwrap())
            .unwrap();
        assert_eq!(patient.resource_id(), Some("example"));
        assert_eq!(ResourceNode::new(ResourceType::Bundle).resource_id(), None);
    }
}
