// libs/catalog-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_database::AppState;
use shared_models::error::AppError;
use shared_models::pagination::PageQuery;

use crate::models::{AssignServiceRequest, CreateServiceRequest, ServiceListQuery, UpdateServiceRequest};
use crate::services::catalog::CatalogService;

async fn list(state: &AppState, query: ServiceListQuery, active_only: bool) -> Result<Json<Value>, AppError> {
    let page = PageQuery { page: query.page, limit: query.limit }
        .validate()
        .map_err(AppError::ValidationError)?;
    let category = query.category()?;

    let (services, pagination) = CatalogService::new(state)
        .list_services(category, active_only, page)
        .await?;

    Ok(Json(json!({
        "success": true,
        "services": services,
        "pagination": pagination
    })))
}

/// Active services only.
#[axum::debug_handler]
pub async fn list_public_services(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ServiceListQuery>,
) -> Result<Json<Value>, AppError> {
    list(&state, query, true).await
}

#[axum::debug_handler]
pub async fn list_all_services(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ServiceListQuery>,
) -> Result<Json<Value>, AppError> {
    list(&state, query, false).await
}

#[axum::debug_handler]
pub async fn get_service(
    State(state): State<Arc<AppState>>,
    Path(service_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = CatalogService::new(&state).get_service(service_id).await?;

    Ok(Json(json!({
        "success": true,
        "data": service
    })))
}

#[axum::debug_handler]
pub async fn create_service(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateServiceRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let service = CatalogService::new(&state).create_service(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": service,
            "message": "Service created successfully"
        })),
    ))
}

#[axum::debug_handler]
pub async fn update_service(
    State(state): State<Arc<AppState>>,
    Path(service_id): Path<Uuid>,
    Json(request): Json<UpdateServiceRequest>,
) -> Result<Json<Value>, AppError> {
    let service = CatalogService::new(&state).update_service(service_id, request).await?;

    Ok(Json(json!({
        "success": true,
        "data": service,
        "message": "Service updated successfully"
    })))
}

#[axum::debug_handler]
pub async fn delete_service(
    State(state): State<Arc<AppState>>,
    Path(service_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    CatalogService::new(&state).delete_service(service_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Service deleted successfully"
    })))
}

#[axum::debug_handler]
pub async fn assign_service(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AssignServiceRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let offered = CatalogService::new(&state).assign_to_dentist(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": offered,
            "message": "Service assigned to dentist successfully"
        })),
    ))
}

#[axum::debug_handler]
pub async fn get_dentist_services(
    State(state): State<Arc<AppState>>,
    Path(dentist_id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Value>, AppError> {
    let page = query.validate().map_err(AppError::ValidationError)?;
    let (services, pagination) = CatalogService::new(&state)
        .dentist_services(dentist_id, page)
        .await?;

    Ok(Json(json!({
        "success": true,
        "services": services,
        "pagination": pagination
    })))
}

#[axum::debug_handler]
pub async fn remove_dentist_service(
    State(state): State<Arc<AppState>>,
    Path((dentist_id, service_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Value>, AppError> {
    CatalogService::new(&state)
        .remove_from_dentist(dentist_id, service_id)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Service removed from dentist successfully"
    })))
}
