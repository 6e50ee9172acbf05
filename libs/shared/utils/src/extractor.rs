use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;
use shared_models::user::Role;

use crate::jwt::validate_token;

/// Validates the bearer token and stores the principal in request extensions.
pub async fn auth_middleware(
    State(config): State<Arc<AppConfig>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get("Authorization")
        .ok_or_else(|| AppError::Auth("Missing authorization header".to_string()))?;

    let auth_value = auth_header
        .to_str()
        .map_err(|_| AppError::Auth("Invalid authorization header format".to_string()))?;

    let token = auth_value
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Auth("Invalid authorization header format".to_string()))?;

    let user = validate_token(token, &config.jwt_secret).map_err(AppError::Auth)?;

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

async fn require_role(role: Role, request: Request<Body>, next: Next) -> Result<Response, AppError> {
    // Same lookup as `extract_user`, done synchronously: holding `&Request<Body>`
    // across an await makes this future `!Send` (`Body` is not `Sync`).
    let user = request
        .extensions()
        .get::<User>()
        .cloned()
        .ok_or_else(|| AppError::Auth("User not found in request extensions".to_string()))?;
    if !user.has_role(role) {
        return Err(AppError::Forbidden(format!(
            "User role {} is not authorized to access this route",
            user.role.as_deref().unwrap_or("unknown")
        )));
    }
    Ok(next.run(request).await)
}

// Layer these inside `auth_middleware` so the principal is already present.

pub async fn require_patient(request: Request<Body>, next: Next) -> Result<Response, AppError> {
    require_role(Role::Patient, request, next).await
}

pub async fn require_dentist(request: Request<Body>, next: Next) -> Result<Response, AppError> {
    require_role(Role::Dentist, request, next).await
}

pub async fn require_admin(request: Request<Body>, next: Next) -> Result<Response, AppError> {
    require_role(Role::Admin, request, next).await
}

pub async fn extract_user<B>(request: &Request<B>) -> Result<User, AppError> {
    request
        .extensions()
        .get::<User>()
        .cloned()
        .ok_or_else(|| AppError::Auth("User not found in request extensions".to_string()))
}

/// The principal's id as a `Uuid`.
pub fn user_id(user: &User) -> Result<Uuid, AppError> {
    Uuid::parse_str(&user.id).map_err(|_| AppError::Auth("Invalid user id in token".to_string()))
}
