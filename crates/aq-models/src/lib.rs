//! # aq-models
//!
//! Domain models for Aquaplan.
//!
//! Templates and networks mirror the resource store's JSON shapes; model
//! records are local to this service.

pub use aq_core::traits::{Id, Identifiable, ProjectScoped};
pub use aq_core::types::{ModelScope, ResourceKind};

pub mod template;
pub mod network;
pub mod model;

/// Free-form layout object carried by templates, types and networks
pub type Layout = serde_json::Map<String, serde_json::Value>;

pub use template::{Template, TemplateOwner, TemplateType, TypeAttr};
pub use network::{layout_id, Link, Network, Node, Resource, ResourceAttribute, ResourceType};
pub use model::{Model, NetworkModel, NewModel};
