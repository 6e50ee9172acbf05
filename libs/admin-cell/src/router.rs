// libs/admin-cell/src/router.rs
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, put},
    Router,
};

use catalog_cell::router::admin_catalog_routes;
use shared_database::AppState;
use shared_utils::extractor::{auth_middleware, require_admin};

use crate::handlers;

/// Everything under `/admin`, including catalog management.
pub fn admin_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/users/stats", get(handlers::get_user_stats))
        .route("/users", get(handlers::list_users))
        .route("/users/{user_id}", get(handlers::get_user).delete(handlers::delete_user))
        .route("/users/{user_id}/role", put(handlers::update_user_role))
        .route("/users/{user_id}/status", put(handlers::update_user_status))
        .route(
            "/dentists",
            get(handlers::list_dentists).post(handlers::create_dentist),
        )
        .route(
            "/dentists/{dentist_id}",
            put(handlers::update_dentist).delete(handlers::delete_dentist),
        )
        .route("/patients", get(handlers::list_patients))
        .with_state(state.clone())
        .merge(admin_catalog_routes(state.clone()))
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn_with_state(state.config.clone(), auth_middleware))
}
