//! # Arbor FHIR Model
//!
//! A uniform, shape-driven representation of FHIR resources.
//!
//! Instead of one Rust struct per FHIR type, every value is a [`Node`]:
//!
//! - [`PrimitiveNode`]: a scalar of a FHIR primitive type, with optional
//!   [`Metadata`] (element id and extensions). Either part may be absent, but
//!   not both.
//! - [`ComplexNode`]: an element whose fields are laid out by a static
//!   [`ShapeDescriptor`] from the [`catalog`].
//! - [`ResourceNode`]: a complex node tagged with its [`ResourceType`].
//!
//! Choice (`[x]`) fields hold a [`Choice`], which records the selected
//! alternative's [`DataType`] alongside its value.
//!
//! ```
//! use arbor_fhir::{ComplexNode, DataType, PrimitiveNode, ResourceNode, ResourceType};
//!
//! let name = ComplexNode::of(DataType::HumanName)?
//!     .with_value("family", "Chalmers")?
//!     .with_pushed("given", PrimitiveNode::new(DataType::String, "Peter")?)?;
//!
//! let patient = ResourceNode::new(ResourceType::Patient)
//!     .with("id", PrimitiveNode::new(DataType::Id, "example")?)?;
//! let mut patient = patient;
//! patient.content_mut().push("name", name)?;
//! assert_eq!(patient.resource_id(), Some("example"));
//! # Ok::<(), arbor_fhir::ModelError>(())
//! ```
//!
//! All node types implement [`arbor_fhirpath_support::TypeAdapter`], so a
//! FHIRPath evaluator can walk and compare any tree without knowing its
//! concrete shape.

mod adapter;
pub mod catalog;
pub mod error;
pub mod node;
pub mod resource;
pub mod shape;
pub mod types;
pub mod xhtml;

pub use error::{ModelError, Result};
pub use node::{Choice, ComplexNode, FieldValue, Metadata, Node, PrimitiveNode};
pub use resource::{ResourceNode, ResourceType};
pub use shape::{FieldDescriptor, FieldType, Representation, ShapeDescriptor, ShapeKind};
pub use types::{DataType, PrimitiveValue, ValueKind};

pub use arbor_fhirpath_support::TypeAdapter;
