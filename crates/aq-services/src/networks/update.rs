//! Network updates

use std::sync::Arc;

use aq_core::{AqResult, Id, ModelScope, ValidationErrors};
use aq_models::network::ACTIVE_TEMPLATE_KEY;
use aq_models::{layout_id, Layout, Network};
use aq_store::{ModelStore, ResourceStore};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, instrument};
use validator::Validate;

use super::orphans::{orphaned_attributes, OrphanedAttribute};
use crate::templates::{Migration, TemplateReconciler};
use crate::validation::validate;

/// Layout key holding the id of the network's model
pub const MODEL_ID_KEY: &str = "model_id";

/// Layout key holding free-form run settings
pub const SETTINGS_KEY: &str = "settings";

/// Partial update of a network
///
/// A non-empty layout is merged key by key; otherwise the top-level fields
/// are applied.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct NetworkPatch {
    #[serde(default)]
    pub layout: Option<Layout>,
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkSettingsUpdate {
    pub network_id: Id,
    #[serde(default)]
    pub layout: Option<Layout>,
    #[serde(default)]
    pub settings: Option<Layout>,
    #[serde(default)]
    pub model_id: Option<Id>,
}

/// Layout update with its id entries normalised
///
/// Template and model ids may arrive as numbers, numeric strings or `{id}`
/// objects; they are stored as numbers. A `null` id means no change and is
/// not written.
#[derive(Debug, Default)]
struct LayoutUpdate {
    template_id: Option<Id>,
    model_id: Option<Id>,
    entries: Layout,
}

impl LayoutUpdate {
    fn parse(layout: &Layout) -> AqResult<Self> {
        let mut errors = ValidationErrors::new();
        let mut update = Self::default();

        for (key, value) in layout {
            let slot = match key.as_str() {
                ACTIVE_TEMPLATE_KEY => &mut update.template_id,
                MODEL_ID_KEY => &mut update.model_id,
                _ => {
                    update.entries.insert(key.clone(), value.clone());
                    continue;
                }
            };
            if value.is_null() {
                continue;
            }
            match layout_id(value) {
                Some(id) => {
                    *slot = Some(id);
                    update.entries.insert(key.clone(), id.into());
                }
                None => errors.add(key.clone(), format!("'{value}' is not an id")),
            }
        }

        if errors.is_empty() {
            Ok(update)
        } else {
            Err(errors.into())
        }
    }

    /// Requested template, if it differs from the network's current one
    fn template_change(&self, network: &Network) -> Option<Id> {
        self.template_id
            .filter(|id| Some(*id) != network.active_template_id())
    }

    fn model_change(&self, network: &Network) -> Option<Id> {
        self.model_id
            .filter(|id| Some(*id) != network.layout.get(MODEL_ID_KEY).and_then(layout_id))
    }
}

pub struct NetworkService {
    resources: Arc<dyn ResourceStore>,
    reconciler: TemplateReconciler,
}

impl NetworkService {
    pub fn new(resources: Arc<dyn ResourceStore>, models: Arc<dyn ModelStore>) -> Self {
        Self {
            reconciler: TemplateReconciler::new(resources.clone(), models),
            resources,
        }
    }

    pub fn with_model_scope(mut self, scope: ModelScope) -> Self {
        self.reconciler = self.reconciler.with_model_scope(scope);
        self
    }

    pub async fn get(&self, id: Id) -> AqResult<Network> {
        Ok(self.resources.get_network(id).await?)
    }

    /// Switch the network to another template
    pub async fn change_template(&self, network_id: Id, template_id: Id) -> AqResult<Migration> {
        let network = self.get(network_id).await?;
        Ok(self
            .reconciler
            .change_active_template(network, template_id)
            .await?)
    }

    #[instrument(skip(self, patch))]
    pub async fn patch(&self, network_id: Id, patch: NetworkPatch) -> AqResult<Network> {
        validate(&patch)?;
        let mut network = self.get(network_id).await?;

        match patch.layout.filter(|layout| !layout.is_empty()) {
            Some(layout) => {
                let update = LayoutUpdate::parse(&layout)?;
                if let Some(template_id) = update.template_change(&network) {
                    network = self
                        .reconciler
                        .change_active_template(network, template_id)
                        .await?
                        .network;
                }
                if let Some(model_id) = update.model_change(&network) {
                    self.reconciler.models().rebind(network_id, model_id).await?;
                }
                network.merge_layout(&update.entries);
            }
            None => {
                if let Some(name) = patch.name {
                    network.name = name;
                }
                if patch.description.is_some() {
                    network.description = patch.description;
                }
            }
        }

        let network = self.resources.update_network(network).await?;
        info!(network_id, "Network updated");
        Ok(network)
    }

    #[instrument(skip(self, update), fields(network_id = update.network_id))]
    pub async fn update_settings(&self, update: NetworkSettingsUpdate) -> AqResult<Network> {
        let network_id = update.network_id;
        let mut network = self.get(network_id).await?;
        let layout = update
            .layout
            .filter(|layout| !layout.is_empty())
            .map(|layout| LayoutUpdate::parse(&layout))
            .transpose()?;
        let settings = update.settings.filter(|settings| !settings.is_empty());

        if let Some(layout) = &layout {
            if let Some(template_id) = layout.template_change(&network) {
                network = self
                    .reconciler
                    .change_active_template(network, template_id)
                    .await?
                    .network;
            }
            network.merge_layout(&layout.entries);
        }

        if let Some(settings) = &settings {
            let current = network
                .layout
                .entry(SETTINGS_KEY)
                .or_insert_with(|| Value::Object(Layout::new()));
            if !current.is_object() {
                *current = Value::Object(Layout::new());
            }
            if let Value::Object(current) = current {
                for (key, value) in settings {
                    current.insert(key.clone(), value.clone());
                }
            }
        }

        if let Some(model_id) = update.model_id {
            self.reconciler.models().rebind(network_id, model_id).await?;
        }

        if layout.is_some() || settings.is_some() {
            network = self.resources.update_network(network).await?;
            info!(network_id, "Network settings updated");
        } else {
            debug!(network_id, "No layout or settings to store");
        }
        Ok(network)
    }

    /// Attributes not declared by the resources' types in the active template
    #[instrument(skip(self))]
    pub async fn orphaned_attributes(&self, network_id: Id) -> AqResult<Vec<OrphanedAttribute>> {
        let network = self.get(network_id).await?;
        let Some(template_id) = network.active_template_id() else {
            return Ok(Vec::new());
        };
        let template = self.resources.get_template(template_id).await?;
        Ok(orphaned_attributes(&network, &template))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;
    use aq_models::{NewModel, Resource};
    use serde_json::json;

    fn service(fixture: &Fixture) -> NetworkService {
        NetworkService::new(fixture.resources.clone(), fixture.models.clone())
    }

    fn layout(value: Value) -> Layout {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    #[tokio::test]
    async fn test_patch_with_new_template_persists_migration() {
        let fixture = fixture().await;
        let patch = NetworkPatch {
            layout: Some(layout(json!({"active_template_id": NEW_TEMPLATE, "zoom": 9}))),
            ..Default::default()
        };

        let network = service(&fixture).patch(NETWORK, patch).await.unwrap();
        assert_eq!(network.active_template_id(), Some(NEW_TEMPLATE));
        assert_eq!(network.layout["zoom"], json!(9));

        let stored = fixture.resources.get_network(NETWORK).await.unwrap();
        assert!(stored.nodes.iter().all(|n| n.type_in(NEW_TEMPLATE).is_some()));
        assert_eq!(stored, network);
    }

    #[tokio::test]
    async fn test_patch_null_template_changes_nothing() {
        let fixture = fixture().await;
        let patch = NetworkPatch {
            layout: Some(layout(json!({"active_template_id": null, "color": "teal"}))),
            ..Default::default()
        };

        let network = service(&fixture).patch(NETWORK, patch).await.unwrap();
        assert_eq!(network.active_template_id(), Some(OLD_TEMPLATE));
        assert_eq!(network.layout["color"], json!("teal"));
        assert!(network.nodes.iter().all(|n| n.type_in(NEW_TEMPLATE).is_none()));
    }

    #[tokio::test]
    async fn test_patch_accepts_string_template_id() {
        let fixture = fixture().await;
        let patch = NetworkPatch {
            layout: Some(layout(json!({"active_template_id": NEW_TEMPLATE.to_string()}))),
            ..Default::default()
        };

        let network = service(&fixture).patch(NETWORK, patch).await.unwrap();
        assert_eq!(network.layout[ACTIVE_TEMPLATE_KEY], json!(NEW_TEMPLATE));
        assert_eq!(network.active_template_id(), Some(NEW_TEMPLATE));

        let stored = fixture.resources.get_network(NETWORK).await.unwrap();
        assert_eq!(stored.active_template_id(), Some(NEW_TEMPLATE));
        assert!(stored.nodes.iter().all(|n| n.type_in(NEW_TEMPLATE).is_some()));
        assert!(stored.links.iter().all(|l| l.type_in(NEW_TEMPLATE).is_some()));
    }

    #[tokio::test]
    async fn test_patch_accepts_template_object() {
        let fixture = fixture().await;
        let patch = NetworkPatch {
            layout: Some(layout(
                json!({"active_template_id": {"id": NEW_TEMPLATE, "name": "WaterLP"}}),
            )),
            ..Default::default()
        };

        let network = service(&fixture).patch(NETWORK, patch).await.unwrap();
        assert_eq!(network.layout[ACTIVE_TEMPLATE_KEY], json!(NEW_TEMPLATE));

        let stored = fixture.resources.get_network(NETWORK).await.unwrap();
        assert_eq!(stored.active_template_id(), Some(NEW_TEMPLATE));
        assert!(stored.nodes.iter().all(|n| n.type_in(NEW_TEMPLATE).is_some()));
    }

    #[tokio::test]
    async fn test_patch_same_template_as_object_is_noop() {
        let fixture = fixture().await;
        let patch = NetworkPatch {
            layout: Some(layout(json!({"active_template_id": {"id": OLD_TEMPLATE}}))),
            ..Default::default()
        };

        let network = service(&fixture).patch(NETWORK, patch).await.unwrap();
        assert_eq!(network.layout[ACTIVE_TEMPLATE_KEY], json!(OLD_TEMPLATE));
        assert!(network.nodes.iter().all(|n| n.type_in(NEW_TEMPLATE).is_none()));
    }

    #[tokio::test]
    async fn test_patch_rejects_unparseable_ids() {
        let fixture = fixture().await;
        let patch = NetworkPatch {
            layout: Some(layout(
                json!({"active_template_id": "waterlp", "model_id": [1], "zoom": 3}),
            )),
            ..Default::default()
        };

        let err = service(&fixture).patch(NETWORK, patch).await.unwrap_err();
        assert_eq!(err.status_code(), 422);
        match err {
            aq_core::AqError::Validation(errors) => {
                assert!(errors.has_error(ACTIVE_TEMPLATE_KEY));
                assert!(errors.has_error(MODEL_ID_KEY));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(
            fixture.resources.get_network(NETWORK).await.unwrap(),
            fixture.network
        );
    }

    #[tokio::test]
    async fn test_patch_string_model_id_is_stored_as_number() {
        let fixture = fixture().await;
        let model = fixture
            .models
            .add_model(NewModel::new("pywr", Some(PROJECT)), OLD_TEMPLATE)
            .await
            .unwrap();
        let patch = NetworkPatch {
            layout: Some(layout(json!({"model_id": model.id.to_string()}))),
            ..Default::default()
        };

        let network = service(&fixture).patch(NETWORK, patch).await.unwrap();
        assert_eq!(network.layout[MODEL_ID_KEY], json!(model.id));
        let binding = fixture.models.get_network_model(NETWORK).await.unwrap().unwrap();
        assert_eq!(binding.model_id, model.id);
    }

    #[tokio::test]
    async fn test_patch_without_layout_applies_fields() {
        let fixture = fixture().await;
        let patch = NetworkPatch {
            name: Some("Lower Basin".into()),
            description: Some("after the dam".into()),
            ..Default::default()
        };

        let network = service(&fixture).patch(NETWORK, patch).await.unwrap();
        assert_eq!(network.name, "Lower Basin");
        assert_eq!(network.description.as_deref(), Some("after the dam"));

        let invalid = NetworkPatch {
            name: Some(String::new()),
            ..Default::default()
        };
        let err = service(&fixture).patch(NETWORK, invalid).await.unwrap_err();
        assert_eq!(err.status_code(), 422);
    }

    #[tokio::test]
    async fn test_patch_model_id_rebinds_model() {
        let fixture = fixture().await;
        let model = fixture
            .models
            .add_model(NewModel::new("pywr", Some(PROJECT)), OLD_TEMPLATE)
            .await
            .unwrap();
        let patch = NetworkPatch {
            layout: Some(layout(json!({"model_id": model.id}))),
            ..Default::default()
        };

        let network = service(&fixture).patch(NETWORK, patch).await.unwrap();
        assert_eq!(network.layout[MODEL_ID_KEY], json!(model.id));
        let binding = fixture.models.get_network_model(NETWORK).await.unwrap().unwrap();
        assert_eq!(binding.model_id, model.id);
    }

    #[tokio::test]
    async fn test_patch_unknown_template_is_not_found() {
        let fixture = fixture().await;
        let patch = NetworkPatch {
            layout: Some(layout(json!({"active_template_id": 999}))),
            ..Default::default()
        };

        let err = service(&fixture).patch(NETWORK, patch).await.unwrap_err();
        assert_eq!(err.status_code(), 404);
        assert_eq!(
            fixture.resources.get_network(NETWORK).await.unwrap(),
            fixture.network
        );
    }

    #[tokio::test]
    async fn test_update_settings_merges() {
        let fixture = fixture().await;
        let mut network = fixture.network.clone();
        network
            .layout
            .insert(SETTINGS_KEY.into(), json!({"timestep": "month", "start": "2000-01"}));
        fixture.resources.update_network(network).await.unwrap();

        let update = NetworkSettingsUpdate {
            network_id: NETWORK,
            layout: Some(layout(json!({"active_template_id": NEW_TEMPLATE}))),
            settings: Some(layout(json!({"timestep": "day"}))),
            model_id: None,
        };
        let network = service(&fixture).update_settings(update).await.unwrap();

        assert_eq!(network.active_template_id(), Some(NEW_TEMPLATE));
        assert_eq!(
            network.layout[SETTINGS_KEY],
            json!({"timestep": "day", "start": "2000-01"})
        );
        assert!(network.links[0].type_in(NEW_TEMPLATE).is_some());
    }

    #[tokio::test]
    async fn test_update_settings_accepts_string_template_id() {
        let fixture = fixture().await;
        let update = NetworkSettingsUpdate {
            network_id: NETWORK,
            layout: Some(layout(json!({"active_template_id": NEW_TEMPLATE.to_string()}))),
            settings: None,
            model_id: None,
        };

        let network = service(&fixture).update_settings(update).await.unwrap();
        assert_eq!(network.active_template_id(), Some(NEW_TEMPLATE));
        assert!(network.nodes.iter().all(|n| n.type_in(NEW_TEMPLATE).is_some()));
        assert_eq!(fixture.resources.get_network(NETWORK).await.unwrap(), network);
    }

    #[tokio::test]
    async fn test_update_settings_model_only_does_not_write_network() {
        let fixture = fixture().await;
        let model = fixture
            .models
            .add_model(NewModel::new("pywr", Some(PROJECT)), OLD_TEMPLATE)
            .await
            .unwrap();

        let update = NetworkSettingsUpdate {
            network_id: NETWORK,
            layout: None,
            settings: None,
            model_id: Some(model.id),
        };
        let network = service(&fixture).update_settings(update).await.unwrap();

        assert_eq!(network, fixture.network);
        let binding = fixture.models.get_network_model(NETWORK).await.unwrap().unwrap();
        assert_eq!(binding.model_id, model.id);
    }

    #[tokio::test]
    async fn test_orphans_after_template_change() {
        let fixture = fixture().await;
        let service = service(&fixture);
        assert!(service.orphaned_attributes(NETWORK).await.unwrap().is_empty());

        let mut network = fixture.network.clone();
        network.nodes[0]
            .attributes
            .push(aq_models::ResourceAttribute::empty(DIVERSION_CAPACITY, false));
        fixture.resources.update_network(network).await.unwrap();
        service.change_template(NETWORK, NEW_TEMPLATE).await.unwrap();

        let orphans = service.orphaned_attributes(NETWORK).await.unwrap();
        assert_eq!(orphans.len(), 1);
        assert_eq!(orphans[0].resource_name, "R1");
        assert_eq!(orphans[0].attr_id, DIVERSION_CAPACITY);
    }
}
