//! Switching a network's active template
//!
//! Every node and link must end up with a type from the new template. A
//! resource keeps its type if it already has one there, otherwise it is
//! matched by name, otherwise its old type is cloned into the new template,
//! and as a last resort it gets the UNKNOWN type. Missing attributes of the
//! resulting type are added empty; existing attribute values are never
//! dropped. The network is persisted once at the end.

use std::sync::Arc;

use aq_core::{AqError, Id, ModelScope, ResourceKind};
use aq_models::{Network, Resource, ResourceType, Template, TemplateType};
use aq_store::{ModelStore, ResourceStore, StoreError};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use super::context::{complete_attributes, MigrationContext, MigrationReport, Resolution};
use super::unknown::{unknown_type, UNKNOWN_TYPE_NAME};
use crate::models::ModelAssociation;

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("Template {0} not found")]
    TemplateNotFound(Id),

    /// Recovered with the UNKNOWN type; only reported, never returned
    #[error("No type mapping available for {kind} '{resource}'")]
    NoTypeMappingAvailable { kind: ResourceKind, resource: String },

    #[error("Failed to persist network: {0}")]
    PersistFailed(#[source] StoreError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<ReconcileError> for AqError {
    fn from(err: ReconcileError) -> Self {
        match err {
            ReconcileError::TemplateNotFound(id) => AqError::not_found("Template", id),
            ReconcileError::PersistFailed(source) | ReconcileError::Store(source) => source.into(),
            other @ ReconcileError::NoTypeMappingAvailable { .. } => {
                AqError::Internal(other.to_string())
            }
        }
    }
}

/// Result of a successful template change
#[derive(Debug)]
pub struct Migration {
    /// The network as persisted
    pub network: Network,
    /// The destination template, including types created by the migration
    pub template: Template,
    pub report: MigrationReport,
}

/// Template reconciliation engine
pub struct TemplateReconciler {
    resources: Arc<dyn ResourceStore>,
    models: ModelAssociation,
}

impl TemplateReconciler {
    pub fn new(resources: Arc<dyn ResourceStore>, models: Arc<dyn ModelStore>) -> Self {
        Self {
            resources,
            models: ModelAssociation::new(models),
        }
    }

    /// Scope of model stubs created while associating the network
    pub fn with_model_scope(mut self, scope: ModelScope) -> Self {
        self.models = self.models.with_scope(scope);
        self
    }

    pub fn models(&self) -> &ModelAssociation {
        &self.models
    }

    /// Rebind `network` to `new_template_id` and persist it
    ///
    /// The network is taken by value; if anything fails before the final
    /// write the stored network is untouched.
    #[instrument(skip(self, network), fields(network_id = ?network.id))]
    pub async fn change_active_template(
        &self,
        network: Network,
        new_template_id: Id,
    ) -> Result<Migration, ReconcileError> {
        let template = match self.resources.get_template(new_template_id).await {
            Ok(template) => template,
            Err(err) if err.is_not_found() => {
                return Err(ReconcileError::TemplateNotFound(new_template_id))
            }
            Err(err) => return Err(ReconcileError::Store(err)),
        };

        let old_template_id = network
            .active_template_id()
            .filter(|id| *id != new_template_id);
        let mut ctx = MigrationContext::new(old_template_id, template);
        let mut network = network;

        attach_network_types(&mut network, &mut ctx);
        for node in &mut network.nodes {
            self.reconcile_resource(node, &mut ctx).await?;
        }
        for link in &mut network.links {
            self.reconcile_resource(link, &mut ctx).await?;
        }
        network.set_active_template_id(new_template_id);

        match self.models.associate(&network, ctx.template()).await {
            Ok(binding) => ctx.report.model = binding,
            Err(err) => {
                warn!(error = %err, "Model association failed");
                ctx.report.model_error = Some(err.to_string());
            }
        }

        let network = self
            .resources
            .update_network(network)
            .await
            .map_err(ReconcileError::PersistFailed)?;

        let (template, report) = ctx.into_parts();
        info!(
            template_id = new_template_id,
            old_template_id = ?old_template_id,
            kept = report.kept,
            matched = report.matched,
            cloned = report.cloned,
            unknown = report.unknown,
            attributes_added = report.attributes_added,
            "Active template changed"
        );

        Ok(Migration {
            network,
            template,
            report,
        })
    }

    async fn reconcile_resource<R>(
        &self,
        resource: &mut R,
        ctx: &mut MigrationContext,
    ) -> Result<Resolution, ReconcileError>
    where
        R: Resource + Send + Sync,
    {
        let template_id = ctx.template_id();
        let kind = R::KIND;

        let kept = resource
            .type_in(template_id)
            .and_then(|rt| ctx.type_by_id(rt.id))
            .cloned();
        let (templatetype, resolution) = if let Some(tt) = kept {
            (tt, Resolution::Kept)
        } else if let Some(tt) = ctx.match_by_name(kind, resource.types()).cloned() {
            (tt, Resolution::Matched)
        } else if let Some(tt) = self.clone_old_type(kind, resource.types(), ctx).await {
            (tt, Resolution::Cloned)
        } else {
            ctx.report.recovered.push(ReconcileError::NoTypeMappingAvailable {
                kind,
                resource: resource.name().to_string(),
            });
            (self.unknown_type(kind, ctx).await?, Resolution::Unknown)
        };

        if resolution != Resolution::Kept {
            let assignment = ResourceType::for_type(&templatetype).ok_or_else(|| {
                StoreError::Invalid(format!("type '{}' has no id", templatetype.name))
            })?;
            let types = resource.types_mut();
            types.retain(|rt| rt.template_id != template_id);
            types.push(assignment);
        }

        ctx.report.attributes_added += complete_attributes(resource.attributes_mut(), &templatetype);
        ctx.report.record(resolution);
        debug!(%kind, resource = resource.name(), ?resolution, "Resource reconciled");
        Ok(resolution)
    }

    /// Copy the resource's type from the old template into the new one
    async fn clone_old_type(
        &self,
        kind: ResourceKind,
        types: &[ResourceType],
        ctx: &mut MigrationContext,
    ) -> Option<TemplateType> {
        let old_template_id = ctx.old_template_id?;
        if !ctx.old_types_loaded() {
            match self.resources.get_template(old_template_id).await {
                Ok(old) => ctx.set_old_template(Some(&old)),
                Err(err) => {
                    warn!(old_template_id, error = %err, "Old template unavailable");
                    ctx.report.old_template_unavailable = true;
                    ctx.set_old_template(None);
                }
            }
        }

        let definition = ctx.match_in_old(kind, types)?.detach_for(ctx.template_id());
        let name = definition.name.clone();
        match self.resources.add_templatetype(definition).await {
            Ok(created) => {
                info!(kind = %kind, name = %created.name, type_id = ?created.id, "Type cloned into template");
                ctx.report.cloned_types.push(created.clone());
                ctx.register(created.clone());
                Some(created)
            }
            Err(err) => {
                warn!(kind = %kind, name = %name, error = %err, "Could not clone type");
                None
            }
        }
    }

    /// The UNKNOWN type of `kind`, created on first use
    async fn unknown_type(
        &self,
        kind: ResourceKind,
        ctx: &mut MigrationContext,
    ) -> Result<TemplateType, ReconcileError> {
        if let Some(existing) = ctx.lookup(kind, UNKNOWN_TYPE_NAME) {
            return Ok(existing.clone());
        }

        let created = self
            .resources
            .add_templatetype(unknown_type(kind, ctx.template_id()))
            .await?;
        info!(kind = %kind, type_id = ?created.id, "UNKNOWN type created");
        ctx.report.unknown_types.push(created.clone());
        ctx.register(created.clone());
        Ok(created)
    }
}

/// Give the network every network-level type of the new template
///
/// A network-level type of another template with the same name is repointed
/// rather than duplicated.
fn attach_network_types(network: &mut Network, ctx: &mut MigrationContext) {
    let template_id = ctx.template_id();
    let network_types: Vec<TemplateType> = ctx
        .template()
        .types_of(ResourceKind::Network)
        .cloned()
        .collect();

    for tt in network_types {
        let Some(assignment) = ResourceType::for_type(&tt) else {
            continue;
        };

        if !network.types.iter().any(|rt| rt.id == assignment.id) {
            match network
                .types
                .iter_mut()
                .find(|rt| rt.template_id != template_id && rt.name == tt.name)
            {
                Some(existing) => *existing = assignment,
                None => network.types.push(assignment),
            }
            ctx.report.network_types_attached += 1;
        }
        ctx.report.attributes_added += complete_attributes(&mut network.attributes, &tt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;
    use aq_models::{Node, ResourceAttribute};
    use aq_store::MemoryModelStore;
    use serde_json::json;

    fn reconciler(fixture: &Fixture) -> TemplateReconciler {
        TemplateReconciler::new(fixture.resources.clone(), fixture.models.clone())
    }

    fn node<'a>(network: &'a Network, name: &str) -> &'a Node {
        network.nodes.iter().find(|n| n.name == name).unwrap()
    }

    #[tokio::test]
    async fn test_rebinds_by_name_and_keeps_values() {
        let fixture = fixture().await;
        let migration = reconciler(&fixture)
            .change_active_template(fixture.network.clone(), NEW_TEMPLATE)
            .await
            .unwrap();

        let r1 = node(&migration.network, "R1");
        let rt = r1.type_in(NEW_TEMPLATE).unwrap();
        assert_eq!(rt.id, 21);
        assert_eq!(rt.name, "reservoir");
        // the old assignment is kept for the old template
        assert!(r1.type_in(OLD_TEMPLATE).is_some());

        let storage = r1.attributes.iter().find(|ra| ra.attr_id == STORAGE).unwrap();
        assert_eq!(storage.value, Some(json!(42.0)));
        assert!(r1.attributes.iter().any(|ra| ra.attr_id == INITIAL_STORAGE));

        let river = &migration.network.links[0];
        assert_eq!(river.type_in(NEW_TEMPLATE).map(|rt| rt.id), Some(22));
        assert_eq!(migration.network.active_template_id(), Some(NEW_TEMPLATE));
    }

    #[tokio::test]
    async fn test_clones_old_type_once() {
        let fixture = fixture().await;
        let migration = reconciler(&fixture)
            .change_active_template(fixture.network.clone(), NEW_TEMPLATE)
            .await
            .unwrap();

        assert_eq!(migration.report.cloned_types.len(), 1);
        let clone = &migration.report.cloned_types[0];
        assert_eq!(clone.name, "Diversion");
        assert_eq!(clone.template_id, Some(NEW_TEMPLATE));
        // named attribute re-resolved to the same global id
        assert_eq!(
            clone.attr_ids().collect::<Vec<_>>(),
            vec![DIVERSION_CAPACITY, DIVERTED_FLOW]
        );

        let d1 = node(&migration.network, "D1").type_in(NEW_TEMPLATE).unwrap();
        let d2 = node(&migration.network, "D2").type_in(NEW_TEMPLATE).unwrap();
        assert_eq!(Some(d1.id), clone.id);
        assert_eq!(d1, d2);
        assert_eq!(node(&migration.network, "D2").attributes.len(), 2);

        let stored = fixture.resources.get_template(NEW_TEMPLATE).await.unwrap();
        assert_eq!(
            stored.types_of(ResourceKind::Node).filter(|tt| tt.name == "Diversion").count(),
            1
        );
    }

    #[tokio::test]
    async fn test_unknown_created_once_for_unmapped_resources() {
        let fixture = fixture().await;
        let migration = reconciler(&fixture)
            .change_active_template(fixture.network.clone(), NEW_TEMPLATE)
            .await
            .unwrap();

        let report = &migration.report;
        assert_eq!(report.unknown_types.len(), 1);
        assert_eq!(report.unknown, 2);
        assert_eq!(report.recovered.len(), 2);
        assert!(matches!(
            &report.recovered[0],
            ReconcileError::NoTypeMappingAvailable { kind: ResourceKind::Node, resource } if resource == "G1"
        ));

        let unknown_id = report.unknown_types[0].id.unwrap();
        for name in ["G1", "G2"] {
            let rt = node(&migration.network, name).type_in(NEW_TEMPLATE).unwrap();
            assert_eq!(rt.id, unknown_id);
            assert_eq!(rt.name, UNKNOWN_TYPE_NAME);
        }
        assert!(report.unknown_types[0].layout.contains_key("svg"));
    }

    #[tokio::test]
    async fn test_every_resource_ends_up_typed() {
        let fixture = fixture().await;
        let migration = reconciler(&fixture)
            .change_active_template(fixture.network.clone(), NEW_TEMPLATE)
            .await
            .unwrap();

        let network = &migration.network;
        assert!(network.nodes.iter().all(|n| n.type_in(NEW_TEMPLATE).is_some()));
        assert!(network.links.iter().all(|l| l.type_in(NEW_TEMPLATE).is_some()));

        assert_eq!(network.types.len(), 1);
        assert_eq!(network.types[0].id, 23);
        assert!(network.attributes.iter().any(|ra| ra.attr_id == DISCOUNT_RATE));

        let stored = fixture.resources.get_network(NETWORK).await.unwrap();
        assert_eq!(&stored, network);
    }

    #[tokio::test]
    async fn test_second_run_is_a_noop() {
        let fixture = fixture().await;
        let engine = reconciler(&fixture);
        let first = engine
            .change_active_template(fixture.network.clone(), NEW_TEMPLATE)
            .await
            .unwrap();
        let type_count = first.template.templatetypes.len();

        let second = engine
            .change_active_template(first.network.clone(), NEW_TEMPLATE)
            .await
            .unwrap();

        assert!(second.report.is_noop());
        assert_eq!(second.report.kept, 6);
        assert_eq!(second.network, first.network);
        assert_eq!(second.template.templatetypes.len(), type_count);
    }

    #[tokio::test]
    async fn test_null_old_template_falls_back_to_unknown() {
        let fixture = fixture().await;
        let mut network = Network {
            id: Some(80),
            ..Network::new("Lower Basin")
        };
        network.nodes.push(
            Node::new("Gauge").with_type(assignment(99, OLD_TEMPLATE, "SpecialGauge")),
        );
        network
            .nodes
            .push(Node::new("Lake").with_type(assignment(11, OLD_TEMPLATE, "Reservoir")));
        let network = fixture.resources.insert_network(network).await.unwrap();

        let migration = reconciler(&fixture)
            .change_active_template(network, NEW_TEMPLATE)
            .await
            .unwrap();

        assert_eq!(
            node(&migration.network, "Gauge").type_in(NEW_TEMPLATE).map(|rt| rt.name.as_str()),
            Some(UNKNOWN_TYPE_NAME)
        );
        assert_eq!(
            node(&migration.network, "Lake").type_in(NEW_TEMPLATE).map(|rt| rt.id),
            Some(21)
        );
        assert!(migration.report.cloned_types.is_empty());
        assert!(!migration.report.old_template_unavailable);
    }

    #[tokio::test]
    async fn test_untyped_resource_gets_unknown() {
        let fixture = fixture().await;
        let mut network = fixture.network.clone();
        network.nodes.push(Node::new("Bare"));
        let network = fixture.resources.update_network(network).await.unwrap();

        let migration = reconciler(&fixture)
            .change_active_template(network, NEW_TEMPLATE)
            .await
            .unwrap();

        let bare = node(&migration.network, "Bare");
        assert_eq!(bare.types.len(), 1);
        assert_eq!(bare.types[0].name, UNKNOWN_TYPE_NAME);
    }

    #[tokio::test]
    async fn test_missing_old_template_is_tolerated() {
        let fixture = fixture().await;
        let mut network = fixture.network.clone();
        network.set_active_template_id(777);

        let migration = reconciler(&fixture)
            .change_active_template(network, NEW_TEMPLATE)
            .await
            .unwrap();

        assert!(migration.report.old_template_unavailable);
        assert!(migration.report.cloned_types.is_empty());
        assert_eq!(
            node(&migration.network, "D1").type_in(NEW_TEMPLATE).map(|rt| rt.name.as_str()),
            Some(UNKNOWN_TYPE_NAME)
        );
    }

    #[tokio::test]
    async fn test_missing_template_leaves_store_unchanged() {
        let fixture = fixture().await;
        let err = reconciler(&fixture)
            .change_active_template(fixture.network.clone(), 999)
            .await
            .unwrap_err();

        assert!(matches!(err, ReconcileError::TemplateNotFound(999)));
        assert_eq!(
            fixture.resources.get_network(NETWORK).await.unwrap(),
            fixture.network
        );
        assert_eq!(fixture.resources.get_templates().await.unwrap().len(), 2);
        assert!(fixture.models.models().await.is_empty());

        let api_error: AqError = err.into();
        assert_eq!(api_error.status_code(), 404);
    }

    #[tokio::test]
    async fn test_persist_failure_is_reported() {
        let mut resources = MockResources::new();
        resources
            .expect_get_template()
            .withf(|id| *id == NEW_TEMPLATE)
            .returning(|_| Ok(new_template()));
        resources
            .expect_update_network()
            .times(1)
            .returning(|_| Err(StoreError::Backend("connection reset".into())));

        let mut network = Network {
            id: Some(NETWORK),
            ..Network::new("Upper Basin")
        };
        network
            .nodes
            .push(Node::new("R1").with_type(assignment(11, OLD_TEMPLATE, "Reservoir")));

        let engine = TemplateReconciler::new(Arc::new(resources), Arc::new(MemoryModelStore::new()));
        let err = engine
            .change_active_template(network, NEW_TEMPLATE)
            .await
            .unwrap_err();

        assert!(matches!(err, ReconcileError::PersistFailed(StoreError::Backend(_))));
    }

    #[tokio::test]
    async fn test_model_failure_does_not_block_migration() {
        let fixture = fixture().await;
        let mut models = MockModels::new();
        models
            .expect_get_network_model()
            .returning(|_| Err(StoreError::Backend("models offline".into())));

        let engine = TemplateReconciler::new(fixture.resources.clone(), Arc::new(models));
        let migration = engine
            .change_active_template(fixture.network.clone(), NEW_TEMPLATE)
            .await
            .unwrap();

        assert!(migration.report.model.is_none());
        assert!(migration.report.model_error.as_deref().unwrap().contains("models offline"));
        assert_eq!(
            fixture.resources.get_network(NETWORK).await.unwrap().active_template_id(),
            Some(NEW_TEMPLATE)
        );
    }

    #[tokio::test]
    async fn test_network_is_bound_to_template_model() {
        let fixture = fixture().await;
        let migration = reconciler(&fixture)
            .with_model_scope(ModelScope::Private)
            .change_active_template(fixture.network.clone(), NEW_TEMPLATE)
            .await
            .unwrap();

        let binding = migration.report.model.unwrap();
        assert_eq!(binding.model.name, "WaterLP");
        assert_eq!(binding.model.project_id, Some(PROJECT));
        assert_eq!(binding.model.scope, ModelScope::Private);
        assert_eq!(binding.binding.network_id, NETWORK);
    }

    #[tokio::test]
    async fn test_existing_network_type_is_repointed() {
        let fixture = fixture().await;
        let mut network = fixture.network.clone();
        network
            .types
            .push(assignment(30, OLD_TEMPLATE, "WaterLP Network"));
        network.attributes.push(ResourceAttribute::empty(DISCOUNT_RATE, false));

        let migration = reconciler(&fixture)
            .change_active_template(network, NEW_TEMPLATE)
            .await
            .unwrap();

        assert_eq!(migration.network.types, vec![assignment(23, NEW_TEMPLATE, "WaterLP Network")]);
        assert_eq!(migration.network.attributes.len(), 1);
    }
}
