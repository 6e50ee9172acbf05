// libs/catalog-cell/src/router.rs
use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};

use shared_database::AppState;

use crate::handlers;

/// `GET /services` for anonymous and patient callers.
pub fn public_catalog_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/services", get(handlers::list_public_services))
        .with_state(state)
}

/// Catalog management. The caller is expected to layer admin auth on top.
pub fn admin_catalog_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/services",
            get(handlers::list_all_services).post(handlers::create_service),
        )
        .route("/services/assign", post(handlers::assign_service))
        .route(
            "/services/{service_id}",
            get(handlers::get_service)
                .put(handlers::update_service)
                .delete(handlers::delete_service),
        )
        .route("/dentists/{dentist_id}/services", get(handlers::get_dentist_services))
        .route(
            "/dentists/{dentist_id}/services/{service_id}",
            delete(handlers::remove_dentist_service),
        )
        .with_state(state)
}
