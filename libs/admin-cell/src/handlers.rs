// libs/admin-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_database::AppState;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_models::pagination::PageQuery;
use shared_utils::extractor::user_id;

use crate::models::{
    CreateDentistRequest, UpdateDentistRequest, UpdateRoleRequest, UpdateStatusRequest, UserListQuery,
};
use crate::services::dentists::DentistAdminService;
use crate::services::users::UserAdminService;

// ==============================================================================
// USERS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_user_stats(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let stats = UserAdminService::new(&state).stats().await?;

    Ok(Json(json!({
        "success": true,
        "stats": stats
    })))
}

#[axum::debug_handler]
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UserListQuery>,
) -> Result<Json<Value>, AppError> {
    let page = PageQuery { page: query.page, limit: query.limit }
        .validate()
        .map_err(AppError::ValidationError)?;
    let role = query.role()?;

    let (users, pagination) = UserAdminService::new(&state).list_users(role, page).await?;

    Ok(Json(json!({
        "success": true,
        "users": users,
        "pagination": pagination
    })))
}

#[axum::debug_handler]
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let user = UserAdminService::new(&state).get_user(id).await?;

    Ok(Json(json!({
        "success": true,
        "user": user
    })))
}

#[axum::debug_handler]
pub async fn update_user_role(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<User>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateRoleRequest>,
) -> Result<Json<Value>, AppError> {
    let role = request.role()?;
    let user = UserAdminService::new(&state)
        .update_role(user_id(&admin)?, id, role)
        .await?;

    Ok(Json(json!({
        "success": true,
        "user": user
    })))
}

#[axum::debug_handler]
pub async fn update_user_status(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<User>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let user = UserAdminService::new(&state)
        .set_active(user_id(&admin)?, id, request.is_active)
        .await?;

    Ok(Json(json!({
        "success": true,
        "user": user
    })))
}

#[axum::debug_handler]
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<User>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    UserAdminService::new(&state).delete_user(user_id(&admin)?, id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "User deleted successfully"
    })))
}

#[axum::debug_handler]
pub async fn list_patients(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Value>, AppError> {
    let page = query.validate().map_err(AppError::ValidationError)?;
    let (patients, pagination) = UserAdminService::new(&state).list_patients(page).await?;

    Ok(Json(json!({
        "success": true,
        "patients": patients,
        "pagination": pagination
    })))
}

// ==============================================================================
// DENTISTS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_dentists(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Value>, AppError> {
    let page = query.validate().map_err(AppError::ValidationError)?;
    let (dentists, pagination) = DentistAdminService::new(&state).list(page).await?;

    Ok(Json(json!({
        "success": true,
        "dentists": dentists,
        "pagination": pagination
    })))
}

#[axum::debug_handler]
pub async fn create_dentist(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateDentistRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let dentist = DentistAdminService::new(&state).create(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "user": dentist
        })),
    ))
}

#[axum::debug_handler]
pub async fn update_dentist(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateDentistRequest>,
) -> Result<Json<Value>, AppError> {
    let dentist = DentistAdminService::new(&state).update(id, request).await?;

    Ok(Json(json!({
        "success": true,
        "user": dentist
    })))
}

#[axum::debug_handler]
pub async fn delete_dentist(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    DentistAdminService::new(&state).delete(id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Dentist deleted successfully"
    })))
}
