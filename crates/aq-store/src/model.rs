//! Model store interface

use async_trait::async_trait;
use aq_core::Id;
use aq_models::{Model, NetworkModel, NewModel};

use crate::error::StoreResult;

#[async_trait]
pub trait ModelStore: Send + Sync {
    async fn get_model(&self, id: Id) -> StoreResult<Option<Model>>;

    /// Find a model by name within a project
    async fn find_model(&self, project_id: Option<Id>, name: &str) -> StoreResult<Option<Model>>;

    /// Create a model linked to a template
    async fn add_model(&self, model: NewModel, template_id: Id) -> StoreResult<Model>;

    /// The active binding for a network (or its first binding)
    async fn get_network_model(&self, network_id: Id) -> StoreResult<Option<NetworkModel>>;

    /// Bind a model to a network; existing identical bindings are returned as-is
    async fn add_network_model(
        &self,
        model_id: Id,
        network_id: Id,
        settings: Option<serde_json::Value>,
    ) -> StoreResult<NetworkModel>;

    /// Point the network's single binding at another model
    async fn update_network_model(&self, network_id: Id, model_id: Id) -> StoreResult<NetworkModel>;
}
