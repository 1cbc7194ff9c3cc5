//! Template API handlers

use aq_core::Id;
use aq_models::{Template, TemplateType};
use aq_services::templates::DefaultTypes;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;
use crate::extractors::{AppState, JsonBody};

#[derive(Serialize)]
pub struct TemplatesResponse {
    pub templates: Vec<Template>,
}

#[derive(Serialize, Deserialize)]
pub struct TemplateBody {
    pub template: Template,
}

#[derive(Serialize, Deserialize)]
pub struct TemplateTypeBody {
    pub templatetype: TemplateType,
}

#[derive(Serialize)]
pub struct DefaultTypesResponse {
    pub default_types: DefaultTypes,
}

#[derive(Debug, Default, Deserialize)]
pub struct ImportParams {
    #[serde(default)]
    pub fork: bool,
}

/// GET /api/templates
pub async fn list_templates(State(state): State<AppState>) -> ApiResult<Json<TemplatesResponse>> {
    let templates = state.templates.list().await?;
    Ok(Json(TemplatesResponse { templates }))
}

/// GET /api/templates/:id
pub async fn get_template(
    State(state): State<AppState>,
    Path(id): Path<Id>,
) -> ApiResult<Json<TemplateBody>> {
    let template = state.templates.get(id).await?;
    Ok(Json(TemplateBody { template }))
}

/// POST /api/templates
///
/// `?fork=true` adds a copy of an existing template pointing back at it.
pub async fn create_template(
    State(state): State<AppState>,
    Query(params): Query<ImportParams>,
    JsonBody(body): JsonBody<TemplateBody>,
) -> ApiResult<(StatusCode, Json<TemplateBody>)> {
    let template = state.templates.import(body.template, params.fork).await?;
    Ok((StatusCode::CREATED, Json(TemplateBody { template })))
}

/// GET /api/templates/:id/default_types
pub async fn default_types(
    State(state): State<AppState>,
    Path(id): Path<Id>,
) -> ApiResult<Json<DefaultTypesResponse>> {
    let default_types = state.templates.default_types(id).await?;
    Ok(Json(DefaultTypesResponse { default_types }))
}

/// POST /api/templatetypes
pub async fn create_templatetype(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<TemplateTypeBody>,
) -> ApiResult<(StatusCode, Json<TemplateTypeBody>)> {
    let templatetype = state.templates.add_type(body.templatetype).await?;
    Ok((StatusCode::CREATED, Json(TemplateTypeBody { templatetype })))
}
