use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, patch},
    Router,
};

use appointment_cell::router::availability_routes;
use catalog_cell::router::public_catalog_routes;
use dentist_cell::router::public_dentist_routes;
use shared_database::AppState;
use shared_utils::extractor::{auth_middleware, require_patient};

use crate::handlers;

/// Routes for the signed-in patient, nested under `/patients`. The public
/// lookups are mirrored here behind the same guard.
pub fn patient_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/profile", get(handlers::get_profile).put(handlers::update_profile))
        .route(
            "/appointments",
            get(handlers::get_appointments).post(handlers::book_appointment),
        )
        .route(
            "/appointments/{appointment_id}/cancel",
            patch(handlers::cancel_appointment),
        )
        .route(
            "/appointments/{appointment_id}/reschedule",
            patch(handlers::reschedule_appointment),
        )
        .with_state(state.clone())
        .merge(public_dentist_routes(state.clone()))
        .merge(public_catalog_routes(state.clone()))
        .merge(availability_routes(state.clone()))
        .layer(middleware::from_fn(require_patient))
        .layer(middleware::from_fn_with_state(state.config.clone(), auth_middleware))
}
