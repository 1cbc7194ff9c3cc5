//! Resource store interface
//!
//! Templates and networks live in an external data service. Only the calls
//! the services need are modelled here; the wire client is out of scope.

use async_trait::async_trait;
use aq_core::Id;
use aq_models::{Network, Template, TemplateType};

use crate::error::StoreResult;

#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// All templates visible to the caller
    async fn get_templates(&self) -> StoreResult<Vec<Template>>;

    /// Fetch a template with its types
    async fn get_template(&self, id: Id) -> StoreResult<Template>;

    /// Add a new template; fails with `Duplicate` if the name is taken
    async fn add_template(&self, template: Template) -> StoreResult<Template>;

    /// Register a new type under `templatetype.template_id`
    async fn add_templatetype(&self, templatetype: TemplateType) -> StoreResult<TemplateType>;

    /// Fetch a network with its resources
    async fn get_network(&self, id: Id) -> StoreResult<Network>;

    /// Replace a stored network
    async fn update_network(&self, network: Network) -> StoreResult<Network>;
}
