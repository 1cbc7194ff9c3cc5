//! Seed data for the in-memory resource store

use serde::Deserialize;
use std::path::Path;
use tracing::info;

use aq_models::{Network, Template};

use crate::error::{StoreError, StoreResult};
use crate::memory::MemoryResourceStore;

/// Templates and networks loaded at startup
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub templates: Vec<Template>,
    #[serde(default)]
    pub networks: Vec<Network>,
}

impl SeedData {
    pub fn from_json(json: &str) -> StoreResult<Self> {
        serde_json::from_str(json).map_err(|e| StoreError::Invalid(format!("seed data: {}", e)))
    }

    pub async fn from_file(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| StoreError::Backend(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&content)
    }

    /// Insert everything into a store, keeping the seed's ids
    pub async fn load_into(self, store: &MemoryResourceStore) -> StoreResult<()> {
        let (templates, networks) = (self.templates.len(), self.networks.len());
        for template in self.templates {
            store.insert_template(template).await?;
        }
        for network in self.networks {
            store.insert_network(network).await?;
        }
        info!(templates, networks, "Resource store seeded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ResourceStore;

    const SEED: &str = r#"{
        "templates": [
            {"id": 1, "name": "WaterLP", "templatetypes": [
                {"id": 2, "template_id": 1, "name": "Reservoir", "resource_type": "NODE",
                 "typeattrs": [{"attr_id": 3, "attr_name": "storage"}]}
            ]}
        ],
        "networks": [
            {"id": 10, "project_id": 1, "name": "Basin",
             "layout": {"active_template_id": 1},
             "nodes": [{"id": 11, "name": "R1",
                        "types": [{"id": 2, "template_id": 1, "name": "Reservoir"}]}]}
        ]
    }"#;

    #[tokio::test]
    async fn test_seed_keeps_ids() {
        let store = MemoryResourceStore::new();
        SeedData::from_json(SEED).unwrap().load_into(&store).await.unwrap();

        let network = store.get_network(10).await.unwrap();
        assert_eq!(network.active_template_id(), Some(1));
        assert_eq!(network.nodes[0].id, Some(11));

        let template = store.get_template(1).await.unwrap();
        assert_eq!(template.templatetypes[0].id, Some(2));
        assert_eq!(store.attribute_id("storage").await, Some(3));
    }

    #[test]
    fn test_invalid_seed() {
        assert!(matches!(
            SeedData::from_json("{not json"),
            Err(StoreError::Invalid(_))
        ));
    }
}
