use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, put},
    Router,
};

use shared_database::AppState;
use shared_utils::extractor::{auth_middleware, require_dentist};

use crate::handlers;

/// `GET /dentists` directory, mounted at the root and under `/patients`.
pub fn public_dentist_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/dentists", get(handlers::list_dentists))
        .with_state(state)
}

/// Routes for the signed-in dentist, nested under `/dentists`.
pub fn dentist_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/profile", get(handlers::get_profile).put(handlers::update_profile))
        .route("/working-hours", put(handlers::update_working_hours))
        .route(
            "/availability",
            get(handlers::get_availability).post(handlers::set_availability),
        )
        .route("/availability/{date}", delete(handlers::delete_availability))
        .route("/patients", get(handlers::get_patients))
        .route("/all-patients", get(handlers::get_all_patients))
        .route("/services", get(handlers::get_services))
        .route(
            "/appointments",
            get(handlers::get_appointments).post(handlers::create_appointment),
        )
        .route("/appointments/{appointment_id}", put(handlers::update_appointment))
        .route(
            "/appointments/{appointment_id}/status",
            put(handlers::update_appointment_status),
        )
        .layer(middleware::from_fn(require_dentist))
        .layer(middleware::from_fn_with_state(state.config.clone(), auth_middleware))
        .with_state(state)
}
