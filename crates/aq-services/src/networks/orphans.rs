//! Orphaned attribute report
//!
//! Template changes never delete attribute values, so resources collect
//! attributes their current type no longer declares. This lists them.

use std::collections::HashSet;

use aq_core::{Id, ResourceKind};
use aq_models::{Network, Resource, Template};
use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OrphanedAttribute {
    pub resource_kind: ResourceKind,
    pub resource_id: Option<Id>,
    pub resource_name: String,
    /// Type of the resource in the template, if it has one there
    pub type_id: Option<Id>,
    pub attr_id: Id,
    pub resource_attr_id: Option<Id>,
    pub has_value: bool,
}

fn collect<R: Resource>(
    resource: &R,
    resource_id: Option<Id>,
    template: &Template,
    orphans: &mut Vec<OrphanedAttribute>,
) {
    let template_id = template.id.unwrap_or_default();
    let templatetype = resource
        .type_in(template_id)
        .and_then(|rt| template.find_type(rt.id));
    let declared: HashSet<Id> = templatetype
        .map(|tt| tt.attr_ids().collect())
        .unwrap_or_default();

    for ra in resource.attributes() {
        if !declared.contains(&ra.attr_id) {
            orphans.push(OrphanedAttribute {
                resource_kind: R::KIND,
                resource_id,
                resource_name: resource.name().to_string(),
                type_id: templatetype.and_then(|tt| tt.id),
                attr_id: ra.attr_id,
                resource_attr_id: ra.id,
                has_value: ra.value.is_some(),
            });
        }
    }
}

/// Node and link attributes not declared by the resource's type in `template`
///
/// Resources without a type in the template report all their attributes.
pub fn orphaned_attributes(network: &Network, template: &Template) -> Vec<OrphanedAttribute> {
    let mut orphans = Vec::new();
    for node in &network.nodes {
        collect(node, node.id, template, &mut orphans);
    }
    for link in &network.links {
        collect(link, link.id, template, &mut orphans);
    }
    orphans
}
