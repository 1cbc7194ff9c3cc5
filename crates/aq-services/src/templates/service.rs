//! Template service
//!
//! Reads templates through the resource store and adds new templates and
//! types to it.

use std::sync::Arc;

use aq_core::{AqError, AqResult, Id};
use aq_models::{Template, TemplateType};
use aq_store::{ResourceStore, StoreError};
use tracing::{debug, info, instrument};

use super::defaults::{default_types, DefaultTypeNames, DefaultTypes};
use super::import::{candidate_names, fork_template, prepare_for_import, MAX_NAME_ATTEMPTS};
use crate::validation::validate;

pub struct TemplateService {
    resources: Arc<dyn ResourceStore>,
    default_names: DefaultTypeNames,
}

impl TemplateService {
    pub fn new(resources: Arc<dyn ResourceStore>) -> Self {
        Self {
            resources,
            default_names: DefaultTypeNames::default(),
        }
    }

    pub fn with_default_names(mut self, names: DefaultTypeNames) -> Self {
        self.default_names = names;
        self
    }

    pub async fn list(&self) -> AqResult<Vec<Template>> {
        Ok(self.resources.get_templates().await?)
    }

    pub async fn get(&self, id: Id) -> AqResult<Template> {
        Ok(self.resources.get_template(id).await?)
    }

    /// Add an uploaded template, or a fork of a stored one
    #[instrument(skip(self, template), fields(name = %template.name))]
    pub async fn import(&self, mut template: Template, fork: bool) -> AqResult<Template> {
        if fork {
            fork_template(&mut template);
        } else {
            prepare_for_import(&mut template);
        }
        validate(&template)?;

        let original_name = template.name.clone();
        for name in candidate_names(&original_name) {
            template.name = name;
            match self.resources.add_template(template.clone()).await {
                Ok(added) => {
                    info!(template_id = ?added.id, name = %added.name, fork, "Template imported");
                    return Ok(added);
                }
                Err(StoreError::Duplicate(reason)) => {
                    debug!(name = %template.name, %reason, "Template name taken");
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(AqError::Conflict {
            message: format!(
                "no free name for template '{original_name}' after {MAX_NAME_ATTEMPTS} attempts"
            ),
        })
    }

    /// Register a single type in an existing template
    #[instrument(skip(self, templatetype), fields(name = %templatetype.name))]
    pub async fn add_type(&self, mut templatetype: TemplateType) -> AqResult<TemplateType> {
        validate(&templatetype)?;
        if templatetype.template_id.is_none() {
            let mut errors = aq_core::ValidationErrors::new();
            errors.add("template_id", "can't be blank");
            return Err(errors.into());
        }
        templatetype.id = None;
        templatetype.created_at = None;

        let added = self.resources.add_templatetype(templatetype).await?;
        info!(type_id = ?added.id, template_id = ?added.template_id, "Template type added");
        Ok(added)
    }

    pub async fn default_types(&self, template_id: Id) -> AqResult<DefaultTypes> {
        let template = self.get(template_id).await?;
        Ok(default_types(&template, &self.default_names))
    }
}
