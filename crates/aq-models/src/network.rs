//! Network models
//!
//! A network is a graph of nodes and links scoped to a project. Every
//! resource carries its type assignments (one per template) and its
//! attribute bindings.

use serde::{Deserialize, Serialize};

use crate::{Id, Identifiable, Layout, ProjectScoped, ResourceKind, TemplateType};

/// Layout key holding the id of the template the network is displayed with
pub const ACTIVE_TEMPLATE_KEY: &str = "active_template_id";

/// Id stored in a layout entry
///
/// Accepts a number, a numeric string, or an object carrying an `id`
/// (older records store the whole template there).
pub fn layout_id(value: &serde_json::Value) -> Option<Id> {
    match value {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        serde_json::Value::Object(obj) => match obj.get("id")? {
            serde_json::Value::Object(_) => None,
            id => layout_id(id),
        },
        _ => None,
    }
}

/// Network entity
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Network {
    pub id: Option<Id>,
    pub project_id: Option<Id>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub layout: Layout,
    /// Network-level type assignments
    #[serde(default)]
    pub types: Vec<ResourceType>,
    #[serde(default)]
    pub attributes: Vec<ResourceAttribute>,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub links: Vec<Link>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Node {
    pub id: Option<Id>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub layout: Layout,
    #[serde(default)]
    pub types: Vec<ResourceType>,
    #[serde(default)]
    pub attributes: Vec<ResourceAttribute>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Link {
    pub id: Option<Id>,
    pub name: String,
    pub node_1_id: Option<Id>,
    pub node_2_id: Option<Id>,
    #[serde(default)]
    pub layout: Layout,
    #[serde(default)]
    pub types: Vec<ResourceType>,
    #[serde(default)]
    pub attributes: Vec<ResourceAttribute>,
}

/// Assignment of a template type to a resource
///
/// `id` is the id of the template type, not of the assignment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceType {
    pub id: Id,
    pub template_id: Id,
    pub name: String,
}

/// Attribute binding on a resource instance
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResourceAttribute {
    #[serde(default)]
    pub id: Option<Id>,
    pub attr_id: Id,
    #[serde(default)]
    pub attr_is_var: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

impl ResourceType {
    /// Assignment pointing at a stored template type
    pub fn for_type(templatetype: &TemplateType) -> Option<Self> {
        Some(Self {
            id: templatetype.id?,
            template_id: templatetype.template_id?,
            name: templatetype.name.clone(),
        })
    }
}

impl ResourceAttribute {
    /// Empty binding for an attribute the resource does not have yet
    pub fn empty(attr_id: Id, attr_is_var: bool) -> Self {
        Self {
            id: None,
            attr_id,
            attr_is_var,
            value: None,
        }
    }
}

/// Common access to nodes and links
pub trait Resource {
    const KIND: ResourceKind;

    fn name(&self) -> &str;
    fn types(&self) -> &[ResourceType];
    fn types_mut(&mut self) -> &mut Vec<ResourceType>;
    fn attributes(&self) -> &[ResourceAttribute];
    fn attributes_mut(&mut self) -> &mut Vec<ResourceAttribute>;

    /// The resource's type assignment within a template, if any
    fn type_in(&self, template_id: Id) -> Option<&ResourceType> {
        self.types().iter().find(|rt| rt.template_id == template_id)
    }
}

impl Resource for Node {
    const KIND: ResourceKind = ResourceKind::Node;

    fn name(&self) -> &str {
        &self.name
    }
    fn types(&self) -> &[ResourceType] {
        &self.types
    }
    fn types_mut(&mut self) -> &mut Vec<ResourceType> {
        &mut self.types
    }
    fn attributes(&self) -> &[ResourceAttribute] {
        &self.attributes
    }
    fn attributes_mut(&mut self) -> &mut Vec<ResourceAttribute> {
        &mut self.attributes
    }
}

impl Resource for Link {
    const KIND: ResourceKind = ResourceKind::Link;

    fn name(&self) -> &str {
        &self.name
    }
    fn types(&self) -> &[ResourceType] {
        &self.types
    }
    fn types_mut(&mut self) -> &mut Vec<ResourceType> {
        &mut self.types
    }
    fn attributes(&self) -> &[ResourceAttribute] {
        &self.attributes
    }
    fn attributes_mut(&mut self) -> &mut Vec<ResourceAttribute> {
        &mut self.attributes
    }
}

impl Identifiable for Network {
    fn id(&self) -> Option<Id> {
        self.id
    }
}

impl ProjectScoped for Network {
    fn project_id(&self) -> Option<Id> {
        self.project_id
    }
}

impl Network {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Active template id from the layout
    pub fn active_template_id(&self) -> Option<Id> {
        self.layout.get(ACTIVE_TEMPLATE_KEY).and_then(layout_id)
    }

    pub fn set_active_template_id(&mut self, template_id: Id) {
        self.layout
            .insert(ACTIVE_TEMPLATE_KEY.to_string(), template_id.into());
    }

    /// Merge layout entries, overwriting existing keys
    pub fn merge_layout(&mut self, layout: &Layout) {
        for (key, value) in layout {
            self.layout.insert(key.clone(), value.clone());
        }
    }
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_type(mut self, rt: ResourceType) -> Self {
        self.types.push(rt);
        self
    }

    pub fn with_attribute(mut self, ra: ResourceAttribute) -> Self {
        self.attributes.push(ra);
        self
    }
}

impl Link {
    pub fn new(name: impl Into<String>, node_1_id: Id, node_2_id: Id) -> Self {
        Self {
            name: name.into(),
            node_1_id: Some(node_1_id),
            node_2_id: Some(node_2_id),
            ..Default::default()
        }
    }

    pub fn with_type(mut self, rt: ResourceType) -> Self {
        self.types.push(rt);
        self
    }

    pub fn with_attribute(mut self, ra: ResourceAttribute) -> Self {
        self.attributes.push(ra);
        self
    }
}
