// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};

use shared_database::AppState;
use shared_models::error::AppError;

use crate::models::{AvailabilityQuery, SlotsQuery};
use crate::services::availability::AvailabilityService;

#[axum::debug_handler]
pub async fn get_available_slots(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SlotsQuery>,
) -> Result<Json<Value>, AppError> {
    let availability = AvailabilityService::new(&state);
    let day = availability.available_slots(query.dentist_id, query.date).await?;

    Ok(Json(json!({
        "success": true,
        "availability": day
    })))
}

#[axum::debug_handler]
pub async fn get_doctor_availability(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Value>, AppError> {
    let availability = AvailabilityService::new(&state);
    let range = availability
        .doctor_availability(
            query.dentist_id,
            query.start_date,
            query.end_date,
            Utc::now().date_naive(),
        )
        .await?;

    Ok(Json(json!({
        "success": true,
        "availability": range
    })))
}
