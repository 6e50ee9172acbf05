use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::debug;

use shared_database::AppState;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_utils::extractor::user_id;

use crate::models::{
    AuthSession, ChangePasswordRequest, LoginRequest, RefreshRequest, RegisterRequest, UpdateAccountRequest,
};
use crate::services::account::AuthService;

fn session_body(session: AuthSession) -> Json<Value> {
    Json(json!({
        "success": true,
        "token": session.token,
        "refreshToken": session.refresh_token,
        "user": session.user
    }))
}

#[axum::debug_handler]
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let session = AuthService::new(&state).register(request).await?;
    Ok((StatusCode::CREATED, session_body(session)))
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<Value>, AppError> {
    let session = AuthService::new(&state).login(request).await?;
    Ok(session_body(session))
}

/// Tokens are stateless; the client discards its copy.
pub async fn logout() -> Json<Value> {
    debug!("Logout requested");
    Json(json!({
        "success": true,
        "message": "User logged out successfully"
    }))
}

#[axum::debug_handler]
pub async fn me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let account = AuthService::new(&state).current(user_id(&user)?).await?;

    Ok(Json(json!({
        "success": true,
        "user": account
    })))
}

#[axum::debug_handler]
pub async fn update_account(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateAccountRequest>,
) -> Result<Json<Value>, AppError> {
    let account = AuthService::new(&state)
        .update_account(user_id(&user)?, request)
        .await?;

    Ok(Json(json!({
        "success": true,
        "user": account
    })))
}

#[axum::debug_handler]
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<Value>, AppError> {
    AuthService::new(&state)
        .change_password(user_id(&user)?, request)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Password updated successfully"
    })))
}

#[axum::debug_handler]
pub async fn refresh_token(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<Value>, AppError> {
    let session = AuthService::new(&state).refresh(request).await?;
    Ok(session_body(session))
}
