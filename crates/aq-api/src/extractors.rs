//! Shared handler state and extractors

use std::sync::Arc;

use aq_core::config::AppConfig;
use aq_core::ModelScope;
use aq_services::{DefaultTypeNames, NetworkService, TemplateService};
use aq_store::{ModelStore, ResourceStore};
use axum::extract::{rejection::JsonRejection, FromRequest, Request};
use axum::{async_trait, Json};
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub networks: Arc<NetworkService>,
    pub templates: Arc<TemplateService>,
}

impl AppState {
    pub fn new(
        resources: Arc<dyn ResourceStore>,
        models: Arc<dyn ModelStore>,
        config: &AppConfig,
    ) -> Self {
        let model_scope = ModelScope::parse(&config.models.default_scope);
        let networks = NetworkService::new(resources.clone(), models).with_model_scope(model_scope);
        let templates = TemplateService::new(resources)
            .with_default_names(DefaultTypeNames::from(&config.templates));

        Self {
            networks: Arc::new(networks),
            templates: Arc::new(templates),
        }
    }
}

/// JSON body extractor answering malformed bodies with the API error shape
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(rejection_to_error(rejection)),
        }
    }
}

fn rejection_to_error(rejection: JsonRejection) -> ApiError {
    ApiError::bad_request(rejection.body_text())
}
