//! Reflective type descriptors handed to the evaluator for `is`/`as` tests.

use std::fmt;

/// Namespace for FHIR model types.
pub const FHIR_NAMESPACE: &str = "FHIR";
/// Namespace for FHIRPath system types.
pub const SYSTEM_NAMESPACE: &str = "System";

/// One declared element of a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementInfo {
    pub name: &'static str,
    /// Allowed type names. More than one entry means a choice element.
    pub types: Vec<&'static str>,
    pub repeated: bool,
}

impl ElementInfo {
    pub fn is_choice(&self) -> bool {
        self.types.len() > 1
    }
}

/// Reflective descriptor of a node's type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeInfo {
    pub namespace: &'static str,
    pub name: &'static str,
    /// Base types, nearest first (e.g. `["DomainResource", "Resource"]`).
    pub lineage: &'static [&'static str],
    pub elements: Vec<ElementInfo>,
}

impl TypeInfo {
    pub fn system(name: &'static str) -> Self {
        Self {
            namespace: SYSTEM_NAMESPACE,
            name,
            lineage: &[],
            elements: Vec::new(),
        }
    }

    /// True when this type is `type_name` or derives from it.
    ///
    /// Accepts both bare (`Patient`) and qualified (`FHIR.Patient`) names.
    pub fn is(&self, type_name: &str) -> bool {
        let (namespace, name) = match type_name.split_once('.') {
            Some((namespace, name)) => (Some(namespace), name),
            None => (None, type_name),
        };
        if namespace.is_some_and(|ns| ns != self.namespace) {
            return false;
        }
        self.name == name || self.lineage.contains(&name)
    }

    pub fn element(&self, name: &str) -> Option<&ElementInfo> {
        self.elements.iter().find(|e| e.name == name)
    }

    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_follows_lineage() {
        let patient = TypeInfo {
            namespace: FHIR_NAMESPACE,
            name: "Patient",
            lineage: &["DomainResource", "Resource"],
            elements: vec![],
        };
        assert!(patient.is("Patient"));
        assert!(patient.is("FHIR.Resource"));
        assert!(!patient.is("System.Patient"));
        assert!(!patient.is("Observation"));
    }
}
