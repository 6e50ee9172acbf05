// libs/appointment-cell/src/router.rs
use std::sync::Arc;

use axum::{routing::get, Router};

use shared_database::AppState;

use crate::handlers;

/// Public availability lookups. Mounted at the root and under `/patients`.
pub fn availability_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/doctor-availability", get(handlers::get_doctor_availability))
        .route("/available-slots", get(handlers::get_available_slots))
        .with_state(state)
}
