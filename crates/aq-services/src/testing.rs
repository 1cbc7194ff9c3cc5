//! Shared fixtures for service tests

use std::sync::Arc;

use async_trait::async_trait;
use aq_core::Id;
use aq_models::{
    Link, Model, Network, NetworkModel, NewModel, Node, ResourceAttribute, ResourceKind,
    ResourceType, Template, TemplateType, TypeAttr,
};
use aq_store::{MemoryModelStore, MemoryResourceStore, ModelStore, ResourceStore, StoreResult};
use mockall::mock;
use serde_json::json;

pub const OLD_TEMPLATE: Id = 1;
pub const NEW_TEMPLATE: Id = 2;
pub const NETWORK: Id = 50;
pub const PROJECT: Id = 3;

pub const STORAGE: Id = 100;
pub const DIVERSION_CAPACITY: Id = 101;
pub const DIVERTED_FLOW: Id = 102;
pub const FLOW_CAPACITY: Id = 103;
pub const INITIAL_STORAGE: Id = 104;
pub const DISCOUNT_RATE: Id = 105;

mock! {
    pub Resources {}

    #[async_trait]
    impl ResourceStore for Resources {
        async fn get_templates(&self) -> StoreResult<Vec<Template>>;
        async fn get_template(&self, id: Id) -> StoreResult<Template>;
        async fn add_template(&self, template: Template) -> StoreResult<Template>;
        async fn add_templatetype(&self, templatetype: TemplateType) -> StoreResult<TemplateType>;
        async fn get_network(&self, id: Id) -> StoreResult<Network>;
        async fn update_network(&self, network: Network) -> StoreResult<Network>;
    }
}

mock! {
    pub Models {}

    #[async_trait]
    impl ModelStore for Models {
        async fn get_model(&self, id: Id) -> StoreResult<Option<Model>>;
        async fn find_model(&self, project_id: Option<Id>, name: &str) -> StoreResult<Option<Model>>;
        async fn add_model(&self, model: NewModel, template_id: Id) -> StoreResult<Model>;
        async fn get_network_model(&self, network_id: Id) -> StoreResult<Option<NetworkModel>>;
        async fn add_network_model(
            &self,
            model_id: Id,
            network_id: Id,
            settings: Option<serde_json::Value>,
        ) -> StoreResult<NetworkModel>;
        async fn update_network_model(&self, network_id: Id, model_id: Id) -> StoreResult<NetworkModel>;
    }
}

fn stored_type(id: Id, template_id: Id, name: &str, kind: ResourceKind) -> TemplateType {
    let mut tt = TemplateType::new(name, kind);
    tt.id = Some(id);
    tt.template_id = Some(template_id);
    tt
}

pub fn assignment(id: Id, template_id: Id, name: &str) -> ResourceType {
    ResourceType {
        id,
        template_id,
        name: name.into(),
    }
}

/// The template networks start out with
pub fn old_template() -> Template {
    let mut template = Template::new("Basin Planning")
        .with_type(
            stored_type(11, OLD_TEMPLATE, "Reservoir", ResourceKind::Node)
                .with_attr(TypeAttr::new(STORAGE, false).named("storage")),
        )
        .with_type(
            stored_type(12, OLD_TEMPLATE, "Diversion", ResourceKind::Node)
                .with_attr(TypeAttr::new(DIVERSION_CAPACITY, false).named("diversion_capacity"))
                .with_attr(TypeAttr::new(DIVERTED_FLOW, true)),
        )
        .with_type(
            stored_type(13, OLD_TEMPLATE, "River", ResourceKind::Link)
                .with_attr(TypeAttr::new(FLOW_CAPACITY, false).named("flow_capacity")),
        );
    template.id = Some(OLD_TEMPLATE);
    template
}

/// The template networks are switched to
pub fn new_template() -> Template {
    let mut template = Template::new("WaterLP")
        .with_type(
            stored_type(21, NEW_TEMPLATE, "reservoir", ResourceKind::Node)
                .with_attr(TypeAttr::new(STORAGE, false).named("storage"))
                .with_attr(TypeAttr::new(INITIAL_STORAGE, false).named("initial_storage")),
        )
        .with_type(
            stored_type(22, NEW_TEMPLATE, "River", ResourceKind::Link)
                .with_attr(TypeAttr::new(FLOW_CAPACITY, false).named("flow_capacity")),
        )
        .with_type(
            stored_type(23, NEW_TEMPLATE, "WaterLP Network", ResourceKind::Network)
                .with_attr(TypeAttr::new(DISCOUNT_RATE, false).named("discount_rate")),
        );
    template.id = Some(NEW_TEMPLATE);
    template
}

/// Network displayed with the old template
///
/// R1 has a counterpart in the new template, D1 and D2 need the Diversion
/// type cloned, G1 and G2 carry a type neither template knows.
pub fn basin() -> Network {
    let mut network = Network {
        id: Some(NETWORK),
        project_id: Some(PROJECT),
        ..Network::new("Upper Basin")
    };
    network.set_active_template_id(OLD_TEMPLATE);

    let mut r1 = Node::new("R1")
        .with_type(assignment(11, OLD_TEMPLATE, "Reservoir"))
        .with_attribute(ResourceAttribute {
            id: Some(200),
            attr_id: STORAGE,
            attr_is_var: false,
            value: Some(json!(42.0)),
        });
    r1.id = Some(60);
    network.nodes.push(r1);

    for (id, name) in [(61, "D1"), (62, "D2")] {
        let mut node = Node::new(name).with_type(assignment(12, OLD_TEMPLATE, "Diversion"));
        node.id = Some(id);
        network.nodes.push(node);
    }
    for (id, name) in [(63, "G1"), (64, "G2")] {
        let mut node = Node::new(name).with_type(assignment(99, OLD_TEMPLATE, "SpecialGauge"));
        node.id = Some(id);
        network.nodes.push(node);
    }

    let mut river = Link::new("L1", 60, 61).with_type(assignment(13, OLD_TEMPLATE, "River"));
    river.id = Some(70);
    network.links.push(river);

    network
}

pub struct Fixture {
    pub resources: Arc<MemoryResourceStore>,
    pub models: Arc<MemoryModelStore>,
    pub network: Network,
}

/// Memory stores holding both templates and the basin network
pub async fn fixture() -> Fixture {
    let resources = Arc::new(MemoryResourceStore::new());
    resources.insert_template(old_template()).await.unwrap();
    resources.insert_template(new_template()).await.unwrap();
    let network = resources.insert_network(basin()).await.unwrap();

    Fixture {
        resources,
        models: Arc::new(MemoryModelStore::new()),
        network,
    }
}
