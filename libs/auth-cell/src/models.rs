use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_database::StoreError;
use shared_models::error::AppError;
use shared_models::patient::Gender;
use shared_models::user::{Role, RoleProfile, UserAccount};
use shared_utils::validation;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
    #[serde(default)]
    pub birthdate: Option<NaiveDate>,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub address: Option<String>,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), AuthError> {
        validation::validate_name(&self.name).map_err(AuthError::Validation)?;
        validation::validate_email(&self.email).map_err(AuthError::Validation)?;
        validation::validate_password(&self.password).map_err(AuthError::Validation)?;
        validation::validate_phone(&self.phone).map_err(AuthError::Validation)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAccountRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl UpdateAccountRequest {
    pub fn validate(&self) -> Result<(), AuthError> {
        if let Some(name) = &self.name {
            validation::validate_name(name).map_err(AuthError::Validation)?;
        }
        if let Some(email) = &self.email {
            validation::validate_email(email).map_err(AuthError::Validation)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

/// The account fields returned alongside a token.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub is_active: bool,
}

impl From<&UserAccount> for AccountSummary {
    fn from(user: &UserAccount) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            is_active: user.is_active,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub token: String,
    pub refresh_token: String,
    pub user: AccountSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct CurrentAccount {
    #[serde(flatten)]
    pub account: AccountSummary,
    pub profile: Option<RoleProfile>,
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account is deactivated. Please contact support.")]
    Deactivated,

    #[error("Not authorized to access this route")]
    NotAuthorized,

    #[error("Refresh token is required")]
    MissingRefreshToken,

    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    #[error("User already exists with this email")]
    EmailTaken,

    #[error("User already exists with this phone number")]
    PhoneTaken,

    #[error("Current password is incorrect")]
    WrongPassword,

    #[error("{0}")]
    Validation(String),

    #[error("Failed to issue token: {0}")]
    Token(String),

    #[error("Failed to hash password")]
    PasswordHash,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials
            | AuthError::Deactivated
            | AuthError::NotAuthorized
            | AuthError::MissingRefreshToken
            | AuthError::InvalidRefreshToken => AppError::Auth(err.to_string()),
            AuthError::EmailTaken | AuthError::PhoneTaken => AppError::Conflict(err.to_string()),
            AuthError::WrongPassword => AppError::BadRequest(err.to_string()),
            AuthError::Validation(msg) => AppError::ValidationError(msg),
            AuthError::Token(_) | AuthError::PasswordHash => AppError::Internal(err.to_string()),
            AuthError::Store(e) => AppError::from(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration() -> RegisterRequest {
        RegisterRequest {
            name: "Jamie Rivera".to_string(),
            email: "jamie@example.com".to_string(),
            password: "secret1".to_string(),
            phone: "+15550001234".to_string(),
            birthdate: None,
            gender: None,
            address: None,
        }
    }

    #[test]
    fn registration_checks_each_field() {
        assert!(registration().validate().is_ok());

        let short = RegisterRequest { password: "12345".to_string(), ..registration() };
        assert_eq!(
            short.validate().unwrap_err().to_string(),
            "Password must be at least 6 characters"
        );

        let phone = RegisterRequest { phone: "call me".to_string(), ..registration() };
        assert!(phone.validate().is_err());
    }

    #[test]
    fn credential_failures_are_401() {
        let err: AppError = AuthError::InvalidCredentials.into();
        assert_eq!(err.status_code(), axum::http::StatusCode::UNAUTHORIZED);

        let err: AppError = AuthError::WrongPassword.into();
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }
}
