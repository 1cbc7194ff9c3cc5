//! Network API handlers

use aq_core::Id;
use aq_models::Network;
use aq_services::{NetworkPatch, NetworkSettingsUpdate, OrphanedAttribute};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::error::ApiResult;
use crate::extractors::{AppState, JsonBody};

#[derive(Serialize)]
pub struct NetworkResponse {
    pub network: Network,
}

#[derive(Serialize)]
pub struct OrphanedAttributesResponse {
    pub network_id: Id,
    pub orphaned_attributes: Vec<OrphanedAttribute>,
}

/// GET /api/networks/:id
pub async fn get_network(
    State(state): State<AppState>,
    Path(id): Path<Id>,
) -> ApiResult<Json<NetworkResponse>> {
    let network = state.networks.get(id).await?;
    Ok(Json(NetworkResponse { network }))
}

/// PATCH /api/networks/:id
///
/// A changed `layout.active_template_id` migrates the network to that template.
pub async fn patch_network(
    State(state): State<AppState>,
    Path(id): Path<Id>,
    JsonBody(patch): JsonBody<NetworkPatch>,
) -> ApiResult<StatusCode> {
    state.networks.patch(id, patch).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/network/settings
pub async fn update_network_settings(
    State(state): State<AppState>,
    JsonBody(update): JsonBody<NetworkSettingsUpdate>,
) -> ApiResult<StatusCode> {
    state.networks.update_settings(update).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/networks/:id/orphaned_attributes
pub async fn orphaned_attributes(
    State(state): State<AppState>,
    Path(id): Path<Id>,
) -> ApiResult<Json<OrphanedAttributesResponse>> {
    let orphaned_attributes = state.networks.orphaned_attributes(id).await?;
    Ok(Json(OrphanedAttributesResponse {
        network_id: id,
        orphaned_attributes,
    }))
}
