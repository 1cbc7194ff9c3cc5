//! In-memory stores
//!
//! Used by tests and by the server when it runs from a seed file. Ids come
//! from a single counter per store, so they are unique across entity kinds.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use aq_core::Id;
use aq_models::{Model, Network, NetworkModel, NewModel, Template, TemplateType};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::model::ModelStore;
use crate::resource::ResourceStore;

#[derive(Default)]
struct ResourceState {
    templates: BTreeMap<Id, Template>,
    networks: BTreeMap<Id, Network>,
    /// Global attribute registry: name -> attr id
    attributes: HashMap<String, Id>,
}

/// In-memory resource store
pub struct MemoryResourceStore {
    state: RwLock<ResourceState>,
    next_id: AtomicI64,
}

impl Default for MemoryResourceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryResourceStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(ResourceState::default()),
            next_id: AtomicI64::new(1),
        }
    }

    fn allocate(&self) -> Id {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Keep the counter ahead of an externally supplied id
    fn reserve(&self, id: Id) -> Id {
        self.next_id.fetch_max(id.saturating_add(1), Ordering::SeqCst);
        id
    }

    fn keep_or_allocate(&self, id: Option<Id>) -> Id {
        match id {
            Some(id) => self.reserve(id),
            None => self.allocate(),
        }
    }

    fn resolve_attrs(
        &self,
        attributes: &mut HashMap<String, Id>,
        templatetype: &mut TemplateType,
    ) -> StoreResult<()> {
        for ta in &mut templatetype.typeattrs {
            match (ta.attr_id, ta.attr_name.as_deref()) {
                (Some(id), Some(name)) => {
                    self.reserve(id);
                    attributes.entry(name.to_string()).or_insert(id);
                }
                (Some(id), None) => {
                    self.reserve(id);
                }
                (None, Some(name)) => {
                    let id = match attributes.get(name) {
                        Some(id) => *id,
                        None => {
                            let id = self.allocate();
                            attributes.insert(name.to_string(), id);
                            id
                        }
                    };
                    ta.attr_id = Some(id);
                }
                (None, None) => {
                    return Err(StoreError::Invalid(format!(
                        "type attribute on '{}' has neither id nor name",
                        templatetype.name
                    )));
                }
            }
            ta.type_id = templatetype.id;
        }
        Ok(())
    }

    fn stamp_template(
        &self,
        attributes: &mut HashMap<String, Id>,
        template: &mut Template,
        keep_ids: bool,
    ) -> StoreResult<Id> {
        let template_id = if keep_ids {
            self.keep_or_allocate(template.id)
        } else {
            self.allocate()
        };
        template.id = Some(template_id);

        for tt in &mut template.templatetypes {
            tt.id = Some(if keep_ids {
                self.keep_or_allocate(tt.id)
            } else {
                self.allocate()
            });
            tt.template_id = Some(template_id);
            self.resolve_attrs(attributes, tt)?;
        }
        Ok(template_id)
    }

    fn stamp_network(&self, network: &mut Network) {
        for ra in &mut network.attributes {
            ra.id = Some(self.keep_or_allocate(ra.id));
        }
        for node in &mut network.nodes {
            node.id = Some(self.keep_or_allocate(node.id));
            for ra in &mut node.attributes {
                ra.id = Some(self.keep_or_allocate(ra.id));
            }
        }
        for link in &mut network.links {
            link.id = Some(self.keep_or_allocate(link.id));
            for ra in &mut link.attributes {
                ra.id = Some(self.keep_or_allocate(ra.id));
            }
        }
    }

    /// Insert a template keeping any ids it already carries
    pub async fn insert_template(&self, mut template: Template) -> StoreResult<Template> {
        let mut state = self.state.write().await;
        let id = self.stamp_template(&mut state.attributes, &mut template, true)?;
        state.templates.insert(id, template.clone());
        Ok(template)
    }

    /// Insert a network keeping any ids it already carries
    pub async fn insert_network(&self, mut network: Network) -> StoreResult<Network> {
        let id = self.keep_or_allocate(network.id);
        network.id = Some(id);
        self.stamp_network(&mut network);

        let mut state = self.state.write().await;
        state.networks.insert(id, network.clone());
        Ok(network)
    }

    /// Id of a registered attribute
    pub async fn attribute_id(&self, name: &str) -> Option<Id> {
        self.state.read().await.attributes.get(name).copied()
    }
}

#[async_trait]
impl ResourceStore for MemoryResourceStore {
    async fn get_templates(&self) -> StoreResult<Vec<Template>> {
        let state = self.state.read().await;
        Ok(state.templates.values().cloned().collect())
    }

    async fn get_template(&self, id: Id) -> StoreResult<Template> {
        let state = self.state.read().await;
        state
            .templates
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("Template", id))
    }

    async fn add_template(&self, mut template: Template) -> StoreResult<Template> {
        let mut state = self.state.write().await;
        if state.templates.values().any(|t| t.name == template.name) {
            return Err(StoreError::Duplicate(format!(
                "template name '{}'",
                template.name
            )));
        }

        let ResourceState {
            templates,
            attributes,
            ..
        } = &mut *state;
        let id = self.stamp_template(attributes, &mut template, false)?;
        templates.insert(id, template.clone());

        debug!(template_id = id, name = %template.name, "Template added");
        Ok(template)
    }

    async fn add_templatetype(&self, mut templatetype: TemplateType) -> StoreResult<TemplateType> {
        let template_id = templatetype
            .template_id
            .ok_or_else(|| StoreError::Invalid("template type without template_id".into()))?;

        let mut state = self.state.write().await;
        let ResourceState {
            templates,
            attributes,
            ..
        } = &mut *state;

        let template = templates
            .get_mut(&template_id)
            .ok_or_else(|| StoreError::not_found("Template", template_id))?;

        if template.templatetypes.iter().any(|tt| {
            tt.resource_type == templatetype.resource_type && tt.name == templatetype.name
        }) {
            return Err(StoreError::Duplicate(format!(
                "{} type '{}' in template {}",
                templatetype.resource_type, templatetype.name, template_id
            )));
        }

        templatetype.id = Some(self.allocate());
        self.resolve_attrs(attributes, &mut templatetype)?;
        template.templatetypes.push(templatetype.clone());

        debug!(
            template_id,
            type_id = templatetype.id,
            name = %templatetype.name,
            "Template type added"
        );
        Ok(templatetype)
    }

    async fn get_network(&self, id: Id) -> StoreResult<Network> {
        let state = self.state.read().await;
        state
            .networks
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("Network", id))
    }

    async fn update_network(&self, mut network: Network) -> StoreResult<Network> {
        let id = network
            .id
            .ok_or_else(|| StoreError::Invalid("network without id".into()))?;

        let mut state = self.state.write().await;
        if !state.networks.contains_key(&id) {
            return Err(StoreError::not_found("Network", id));
        }

        self.stamp_network(&mut network);
        state.networks.insert(id, network.clone());
        Ok(network)
    }
}

#[derive(Default)]
struct ModelState {
    models: BTreeMap<Id, Model>,
    bindings: Vec<NetworkModel>,
}

/// In-memory model store
pub struct MemoryModelStore {
    state: RwLock<ModelState>,
    next_id: AtomicI64,
}

impl Default for MemoryModelStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryModelStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(ModelState::default()),
            next_id: AtomicI64::new(1),
        }
    }

    /// All stored models, ordered by id
    pub async fn models(&self) -> Vec<Model> {
        self.state.read().await.models.values().cloned().collect()
    }
}

#[async_trait]
impl ModelStore for MemoryModelStore {
    async fn get_model(&self, id: Id) -> StoreResult<Option<Model>> {
        Ok(self.state.read().await.models.get(&id).cloned())
    }

    async fn find_model(&self, project_id: Option<Id>, name: &str) -> StoreResult<Option<Model>> {
        let state = self.state.read().await;
        Ok(state
            .models
            .values()
            .find(|m| m.project_id == project_id && m.name == name)
            .cloned())
    }

    async fn add_model(&self, model: NewModel, template_id: Id) -> StoreResult<Model> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let model = Model {
            id,
            name: model.name,
            description: model.description,
            project_id: model.project_id,
            scope: model.scope,
            template_ids: vec![template_id],
        };

        self.state.write().await.models.insert(id, model.clone());
        Ok(model)
    }

    async fn get_network_model(&self, network_id: Id) -> StoreResult<Option<NetworkModel>> {
        let state = self.state.read().await;
        let bindings: Vec<&NetworkModel> = state
            .bindings
            .iter()
            .filter(|nm| nm.network_id == network_id)
            .collect();
        Ok(bindings
            .iter()
            .find(|nm| nm.active)
            .or(bindings.first())
            .map(|nm| (*nm).clone()))
    }

    async fn add_network_model(
        &self,
        model_id: Id,
        network_id: Id,
        settings: Option<serde_json::Value>,
    ) -> StoreResult<NetworkModel> {
        let mut state = self.state.write().await;
        if let Some(existing) = state
            .bindings
            .iter()
            .find(|nm| nm.network_id == network_id && nm.model_id == model_id)
        {
            return Ok(existing.clone());
        }

        let active = !state.bindings.iter().any(|nm| nm.network_id == network_id);
        let binding = NetworkModel {
            network_id,
            model_id,
            active,
            settings,
        };
        state.bindings.push(binding.clone());
        Ok(binding)
    }

    async fn update_network_model(&self, network_id: Id, model_id: Id) -> StoreResult<NetworkModel> {
        let mut state = self.state.write().await;

        let mut kept: Option<NetworkModel> = None;
        state.bindings.retain(|nm| {
            if nm.network_id != network_id {
                return true;
            }
            if kept.is_none() {
                kept = Some(nm.clone());
                return true;
            }
            false
        });

        let binding = match kept {
            Some(_) => {
                let binding = state
                    .bindings
                    .iter_mut()
                    .find(|nm| nm.network_id == network_id)
                    .ok_or_else(|| StoreError::not_found("NetworkModel", network_id))?;
                binding.model_id = model_id;
                binding.active = true;
                binding.clone()
            }
            None => {
                let binding = NetworkModel {
                    network_id,
                    model_id,
                    active: true,
                    settings: None,
                };
                state.bindings.push(binding.clone());
                binding
            }
        };
        Ok(binding)
    }
}
