//! Template models
//!
//! A template is a reusable schema of resource types. Each type is scoped to
//! a resource kind and declares the attributes resources of that type carry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{Id, Identifiable, Layout, ResourceKind};

/// Template entity
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default, PartialEq)]
pub struct Template {
    pub id: Option<Id>,

    #[validate(length(min = 1, max = 200))]
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub layout: Layout,

    /// Types defined by this template, in definition order
    #[serde(default, alias = "types")]
    #[validate]
    pub templatetypes: Vec<TemplateType>,

    #[serde(default)]
    pub owners: Vec<TemplateOwner>,

    #[serde(default, rename = "cr_date", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Ownership entry on a template
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TemplateOwner {
    pub user_id: Id,
    #[serde(default)]
    pub view: bool,
    #[serde(default)]
    pub edit: bool,
}

/// A resource type defined by a template (e.g. "Reservoir")
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct TemplateType {
    pub id: Option<Id>,

    pub template_id: Option<Id>,

    #[validate(length(min = 1, max = 200))]
    pub name: String,

    pub resource_type: ResourceKind,

    #[serde(default)]
    pub layout: Layout,

    #[serde(default)]
    pub typeattrs: Vec<TypeAttr>,

    #[serde(default, rename = "cr_date", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// An attribute declared by a template type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TypeAttr {
    /// Global attribute id; `None` until the store resolves `attr_name`
    pub attr_id: Option<Id>,

    #[serde(default)]
    pub type_id: Option<Id>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attr_name: Option<String>,

    /// Output (variable) rather than input
    #[serde(default, alias = "is_var")]
    pub attr_is_var: bool,

    #[serde(default, rename = "cr_date", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Identifiable for Template {
    fn id(&self) -> Option<Id> {
        self.id
    }
}

impl Identifiable for TemplateType {
    fn id(&self) -> Option<Id> {
        self.id
    }
}

impl Template {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_type(mut self, templatetype: TemplateType) -> Self {
        self.templatetypes.push(templatetype);
        self
    }

    /// Types scoped to the given resource kind
    pub fn types_of(&self, kind: ResourceKind) -> impl Iterator<Item = &TemplateType> {
        self.templatetypes
            .iter()
            .filter(move |tt| tt.resource_type == kind)
    }

    pub fn find_type(&self, id: Id) -> Option<&TemplateType> {
        self.templatetypes.iter().find(|tt| tt.id == Some(id))
    }

    /// Strip store-assigned identity so the template can be added as new
    pub fn detach(&mut self) {
        self.id = None;
        self.created_at = None;
        self.owners.clear();
        for tt in &mut self.templatetypes {
            tt.id = None;
            tt.template_id = None;
            tt.created_at = None;
            for ta in &mut tt.typeattrs {
                ta.type_id = None;
                ta.created_at = None;
            }
        }
    }
}

impl TemplateType {
    pub fn new(name: impl Into<String>, resource_type: ResourceKind) -> Self {
        Self {
            id: None,
            template_id: None,
            name: name.into(),
            resource_type,
            layout: Layout::new(),
            typeattrs: Vec::new(),
            created_at: None,
        }
    }

    pub fn with_attr(mut self, typeattr: TypeAttr) -> Self {
        self.typeattrs.push(typeattr);
        self
    }

    pub fn with_layout(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.layout.insert(key.into(), value);
        self
    }

    /// Lookup key used when matching types across templates
    pub fn name_key(&self) -> (ResourceKind, String) {
        (self.resource_type, self.name.to_lowercase())
    }

    /// Copy of this type re-homed under another template
    ///
    /// Identity fields are dropped. Attributes that carry a name lose their
    /// id so the store re-resolves them; unnamed ones keep theirs.
    pub fn detach_for(&self, template_id: Id) -> TemplateType {
        let mut cloned = self.clone();
        cloned.id = None;
        cloned.created_at = None;
        cloned.template_id = Some(template_id);
        for ta in &mut cloned.typeattrs {
            ta.type_id = None;
            ta.created_at = None;
            if ta.attr_name.is_some() {
                ta.attr_id = None;
            }
        }
        cloned
    }

    pub fn attr_ids(&self) -> impl Iterator<Item = Id> + '_ {
        self.typeattrs.iter().filter_map(|ta| ta.attr_id)
    }
}

impl TypeAttr {
    pub fn new(attr_id: Id, attr_is_var: bool) -> Self {
        Self {
            attr_id: Some(attr_id),
            type_id: None,
            attr_name: None,
            attr_is_var,
            created_at: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.attr_name = Some(name.into());
        self
    }
}
