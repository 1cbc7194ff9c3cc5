//! State carried through one template migration

use std::collections::{HashMap, HashSet};

use aq_core::{Id, ResourceKind};
use aq_models::{ResourceAttribute, ResourceType, Template, TemplateType};
use serde::Serialize;

use super::reconcile::ReconcileError;
use crate::models::ModelBinding;

type NameKey = (ResourceKind, String);

/// How a resource ended up with its type in the new template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// Already bound to a type of the new template
    Kept,
    /// Matched by kind and case-insensitive name
    Matched,
    /// Old type copied into the new template
    Cloned,
    /// Assigned the UNKNOWN type
    Unknown,
}

/// Outcome of a migration, for logging and API responses
#[derive(Debug, Default)]
pub struct MigrationReport {
    pub kept: usize,
    pub matched: usize,
    pub cloned: usize,
    pub unknown: usize,
    pub network_types_attached: usize,
    pub attributes_added: usize,
    /// Types copied from the old template, in creation order
    pub cloned_types: Vec<TemplateType>,
    /// UNKNOWN types created during this migration
    pub unknown_types: Vec<TemplateType>,
    /// Recovered failures (`NoTypeMappingAvailable`)
    pub recovered: Vec<ReconcileError>,
    pub old_template_unavailable: bool,
    pub model: Option<ModelBinding>,
    /// Set when model association failed; the migration still persists
    pub model_error: Option<String>,
}

impl MigrationReport {
    pub fn record(&mut self, resolution: Resolution) {
        match resolution {
            Resolution::Kept => self.kept += 1,
            Resolution::Matched => self.matched += 1,
            Resolution::Cloned => self.cloned += 1,
            Resolution::Unknown => self.unknown += 1,
        }
    }

    /// Nothing was rebound or synthesized
    pub fn is_noop(&self) -> bool {
        self.matched == 0
            && self.cloned == 0
            && self.unknown == 0
            && self.network_types_attached == 0
            && self.attributes_added == 0
    }
}

/// Explicit per-migration state
///
/// Holds the destination template (grown with every type synthesized along
/// the way), indexes over it, and the lazily loaded index of the old
/// template. Name indexes keep the first entry registered for a key, so the
/// oldest type wins when names collide.
pub struct MigrationContext {
    pub old_template_id: Option<Id>,
    template: Template,
    by_name: HashMap<NameKey, TemplateType>,
    by_id: HashMap<Id, TemplateType>,
    old_types: Option<HashMap<NameKey, TemplateType>>,
    pub report: MigrationReport,
}

fn index_by_name(template: &Template) -> HashMap<NameKey, TemplateType> {
    let mut index = HashMap::new();
    for tt in &template.templatetypes {
        index.entry(tt.name_key()).or_insert_with(|| tt.clone());
    }
    index
}

impl MigrationContext {
    pub fn new(old_template_id: Option<Id>, template: Template) -> Self {
        let by_name = index_by_name(&template);
        let by_id = template
            .templatetypes
            .iter()
            .filter_map(|tt| tt.id.map(|id| (id, tt.clone())))
            .collect();

        Self {
            old_template_id,
            template,
            by_name,
            by_id,
            old_types: None,
            report: MigrationReport::default(),
        }
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn template_id(&self) -> Id {
        self.template.id.unwrap_or_default()
    }

    pub fn into_parts(self) -> (Template, MigrationReport) {
        (self.template, self.report)
    }

    pub fn type_by_id(&self, id: Id) -> Option<&TemplateType> {
        self.by_id.get(&id)
    }

    pub fn lookup(&self, kind: ResourceKind, name: &str) -> Option<&TemplateType> {
        self.by_name.get(&(kind, name.to_lowercase()))
    }

    /// First of the given assignments, newest first, whose name exists in the new template
    pub fn match_by_name(&self, kind: ResourceKind, types: &[ResourceType]) -> Option<&TemplateType> {
        types.iter().rev().find_map(|rt| self.lookup(kind, &rt.name))
    }

    /// Add a type created during the migration to the destination indexes
    pub fn register(&mut self, templatetype: TemplateType) {
        if let Some(id) = templatetype.id {
            self.by_id.insert(id, templatetype.clone());
        }
        self.by_name
            .entry(templatetype.name_key())
            .or_insert_with(|| templatetype.clone());
        self.template.templatetypes.push(templatetype);
    }

    pub fn old_types_loaded(&self) -> bool {
        self.old_types.is_some()
    }

    pub fn set_old_template(&mut self, template: Option<&Template>) {
        self.old_types = Some(template.map(index_by_name).unwrap_or_default());
    }

    /// Type of the old template matching one of the given assignments, newest first
    pub fn match_in_old(&self, kind: ResourceKind, types: &[ResourceType]) -> Option<&TemplateType> {
        let old_types = self.old_types.as_ref()?;
        types
            .iter()
            .rev()
            .find_map(|rt| old_types.get(&(kind, rt.name.to_lowercase())))
    }
}

/// Add empty bindings for every attribute of `templatetype` the resource lacks
///
/// Attributes not declared by the type are left untouched.
pub fn complete_attributes(
    attributes: &mut Vec<ResourceAttribute>,
    templatetype: &TemplateType,
) -> usize {
    let mut present: HashSet<Id> = attributes.iter().map(|ra| ra.attr_id).collect();
    let before = attributes.len();
    for ta in &templatetype.typeattrs {
        if let Some(attr_id) = ta.attr_id {
            if present.insert(attr_id) {
                attributes.push(ResourceAttribute::empty(attr_id, ta.attr_is_var));
            }
        }
    }
    attributes.len() - before
}
