use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde_json::{json, Value};
use uuid::Uuid;

use appointment_cell::models::{CreateAppointmentRequest, UpdateAppointmentRequest, UpdateStatusRequest};
use appointment_cell::services::booking::AppointmentBookingService;
use catalog_cell::services::catalog::CatalogService;
use shared_database::AppState;
use shared_models::appointment::AppointmentFilter;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::extractor::user_id;

use crate::models::{AvailabilityOverrideRequest, UpdateDentistProfileRequest, WorkingHoursRequest};
use crate::services::patients::DentistPatientService;
use crate::services::profile::DentistProfileService;

// ==============================================================================
// PUBLIC HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_dentists(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let dentists = DentistProfileService::new(&state).list_available().await?;

    Ok(Json(json!({
        "success": true,
        "dentists": dentists
    })))
}

// ==============================================================================
// PROFILE
// ==============================================================================

#[axum::debug_handler]
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let profile = DentistProfileService::new(&state).get_profile(user_id(&user)?).await?;

    Ok(Json(json!({
        "success": true,
        "data": profile
    })))
}

#[axum::debug_handler]
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateDentistProfileRequest>,
) -> Result<Json<Value>, AppError> {
    let profile = DentistProfileService::new(&state)
        .update_profile(user_id(&user)?, request)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": profile,
        "message": "Profile updated successfully"
    })))
}

#[axum::debug_handler]
pub async fn update_working_hours(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Json(request): Json<WorkingHoursRequest>,
) -> Result<Json<Value>, AppError> {
    let hours = DentistProfileService::new(&state)
        .set_working_hours(user_id(&user)?, request)
        .await?;

    Ok(Json(json!({
        "success": true,
        "workingHours": hours,
        "message": "Working hours updated successfully"
    })))
}

#[axum::debug_handler]
pub async fn get_availability(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let overrides = DentistProfileService::new(&state)
        .list_overrides(user_id(&user)?)
        .await?;

    Ok(Json(json!({
        "success": true,
        "availability": overrides
    })))
}

#[axum::debug_handler]
pub async fn set_availability(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Json(request): Json<AvailabilityOverrideRequest>,
) -> Result<Json<Value>, AppError> {
    let day = DentistProfileService::new(&state)
        .upsert_override(user_id(&user)?, request)
        .await?;

    Ok(Json(json!({
        "success": true,
        "availability": day,
        "message": "Availability updated successfully"
    })))
}

#[axum::debug_handler]
pub async fn delete_availability(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path(date): Path<NaiveDate>,
) -> Result<Json<Value>, AppError> {
    DentistProfileService::new(&state)
        .remove_override(user_id(&user)?, date)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Availability override removed"
    })))
}

// ==============================================================================
// PATIENTS AND SERVICES
// ==============================================================================

#[axum::debug_handler]
pub async fn get_patients(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let patients = DentistPatientService::new(&state)
        .patients_of(user_id(&user)?)
        .await?;

    Ok(Json(json!({
        "success": true,
        "patients": patients
    })))
}

#[axum::debug_handler]
pub async fn get_all_patients(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let patients = DentistPatientService::new(&state).all_patients().await?;

    Ok(Json(json!({
        "success": true,
        "patients": patients
    })))
}

#[axum::debug_handler]
pub async fn get_services(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let services = CatalogService::new(&state)
        .offerings_for_dentist(user_id(&user)?)
        .await?;

    Ok(Json(json!({
        "success": true,
        "services": services
    })))
}

// ==============================================================================
// APPOINTMENTS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_appointments(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Query(filter): Query<AppointmentFilter>,
) -> Result<Json<Value>, AppError> {
    let appointments = AppointmentBookingService::new(&state)
        .list_for_dentist(user_id(&user)?, &filter)
        .await?;

    Ok(Json(json!({
        "success": true,
        "appointments": appointments
    })))
}

#[axum::debug_handler]
pub async fn create_appointment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateAppointmentRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let appointment = AppointmentBookingService::new(&state)
        .create_for_dentist(user_id(&user)?, request)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": appointment,
            "message": "Appointment created successfully"
        })),
    ))
}

#[axum::debug_handler]
pub async fn update_appointment(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<UpdateAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = AppointmentBookingService::new(&state)
        .update_for_dentist(user_id(&user)?, appointment_id, request)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": appointment,
        "message": "Appointment updated successfully"
    })))
}

#[axum::debug_handler]
pub async fn update_appointment_status(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = AppointmentBookingService::new(&state)
        .update_status_for_dentist(user_id(&user)?, appointment_id, request.status)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": appointment,
        "message": "Appointment status updated successfully"
    })))
}
