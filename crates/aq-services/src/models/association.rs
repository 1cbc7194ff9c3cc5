//! Network to model association
//!
//! After a template change the network must point at a model able to run the
//! new template. Resolution order:
//!
//! 1. the model the network is already bound to
//! 2. a model named after the template in the network's project
//! 3. a new model stub linked to the template

use std::sync::Arc;

use aq_core::{Id, ModelScope};
use aq_models::{Model, Network, NetworkModel, NewModel, Template};
use aq_store::{ModelStore, StoreError, StoreResult};
use serde::Serialize;
use tracing::{debug, info, instrument};

/// Where the associated model came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelSource {
    Bound,
    ByTemplateName,
    Created,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelBinding {
    pub model: Model,
    pub source: ModelSource,
    pub binding: NetworkModel,
}

/// Binds networks to models
pub struct ModelAssociation {
    models: Arc<dyn ModelStore>,
    scope: ModelScope,
}

impl ModelAssociation {
    pub fn new(models: Arc<dyn ModelStore>) -> Self {
        Self {
            models,
            scope: ModelScope::default(),
        }
    }

    /// Scope given to model stubs created on the fly
    pub fn with_scope(mut self, scope: ModelScope) -> Self {
        self.scope = scope;
        self
    }

    /// Make sure the network is bound to a model for `template`
    ///
    /// Returns `None` for networks that have not been stored yet.
    #[instrument(skip(self, network, template), fields(network_id = ?network.id, template_id = ?template.id))]
    pub async fn associate(
        &self,
        network: &Network,
        template: &Template,
    ) -> StoreResult<Option<ModelBinding>> {
        let Some(network_id) = network.id else {
            debug!("Network has no id, skipping model association");
            return Ok(None);
        };
        let template_id = template
            .id
            .ok_or_else(|| StoreError::Invalid("template without id".into()))?;

        let existing = self.models.get_network_model(network_id).await?;
        if let Some(binding) = &existing {
            if let Some(model) = self.models.get_model(binding.model_id).await? {
                return Ok(Some(ModelBinding {
                    model,
                    source: ModelSource::Bound,
                    binding: binding.clone(),
                }));
            }
        }

        let (model, source) = match self
            .models
            .find_model(network.project_id, &template.name)
            .await?
        {
            Some(model) => (model, ModelSource::ByTemplateName),
            None => {
                let stub = NewModel::new(template.name.clone(), network.project_id)
                    .with_scope(self.scope);
                let model = self.models.add_model(stub, template_id).await?;
                info!(model_id = model.id, name = %model.name, "Model stub created");
                (model, ModelSource::Created)
            }
        };

        // a binding to a model that no longer exists is repointed
        let binding = match existing {
            Some(_) => self.models.update_network_model(network_id, model.id).await?,
            None => self.models.add_network_model(model.id, network_id, None).await?,
        };

        info!(network_id, model_id = model.id, ?source, "Network bound to model");
        Ok(Some(ModelBinding { model, source, binding }))
    }

    /// Point the network at another model
    #[instrument(skip(self))]
    pub async fn rebind(&self, network_id: Id, model_id: Id) -> StoreResult<NetworkModel> {
        if self.models.get_model(model_id).await?.is_none() {
            return Err(StoreError::not_found("Model", model_id));
        }
        let binding = self.models.update_network_model(network_id, model_id).await?;
        info!(network_id, model_id, "Network model updated");
        Ok(binding)
    }
}
