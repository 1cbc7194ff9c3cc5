//! API routes

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::extractors::AppState;
use crate::handlers::{networks, templates};

/// Create the complete API router
pub fn router() -> Router<AppState> {
    Router::new().nest("/api", api_router())
}

fn api_router() -> Router<AppState> {
    Router::new()
        .nest("/networks", networks_router())
        .route("/network/settings", put(networks::update_network_settings))
        .nest("/templates", templates_router())
        .route("/templatetypes", post(templates::create_templatetype))
}

fn networks_router() -> Router<AppState> {
    Router::new()
        .route(
            "/:id",
            get(networks::get_network).patch(networks::patch_network),
        )
        .route("/:id/orphaned_attributes", get(networks::orphaned_attributes))
}

fn templates_router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(templates::list_templates).post(templates::create_template),
        )
        .route("/:id", get(templates::get_template))
        .route("/:id/default_types", get(templates::default_types))
}
