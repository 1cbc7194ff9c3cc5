//! Compute model records
//!
//! A model is the engine a network is dispatched to for runs. Networks are
//! bound to at most one active model through a [`NetworkModel`] record.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{Id, Identifiable, ModelScope, ProjectScoped};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Model {
    pub id: Id,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub project_id: Option<Id>,
    #[serde(default)]
    pub scope: ModelScope,
    /// Templates this model can run
    #[serde(default)]
    pub template_ids: Vec<Id>,
}

/// Input for creating a model
#[derive(Debug, Clone, Serialize, Deserialize, Validate, Default)]
pub struct NewModel {
    #[validate(length(min = 1, max = 80))]
    pub name: String,
    pub description: Option<String>,
    pub project_id: Option<Id>,
    #[serde(default)]
    pub scope: ModelScope,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkModel {
    pub network_id: Id,
    pub model_id: Id,
    pub active: bool,
    #[serde(default)]
    pub settings: Option<serde_json::Value>,
}

impl Identifiable for Model {
    fn id(&self) -> Option<Id> {
        Some(self.id)
    }
}

impl ProjectScoped for Model {
    fn project_id(&self) -> Option<Id> {
        self.project_id
    }
}

impl NewModel {
    pub fn new(name: impl Into<String>, project_id: Option<Id>) -> Self {
        Self {
            name: name.into(),
            project_id,
            ..Default::default()
        }
    }

    pub fn with_scope(mut self, scope: ModelScope) -> Self {
        self.scope = scope;
        self
    }
}
