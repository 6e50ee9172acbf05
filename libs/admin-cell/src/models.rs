use serde::{Deserialize, Serialize};
use thiserror::Error;

use dentist_cell::models::{DentistError, UpdateDentistProfileRequest};
use shared_database::StoreError;
use shared_models::dentist::{Education, Specialization};
use shared_models::error::AppError;
use shared_models::user::{Role, RoleProfile, UserAccount};
use shared_utils::validation;

// ==============================================================================
// QUERIES
// ==============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub role: Option<String>,
}

impl UserListQuery {
    /// `None` for a missing role or `all`.
    pub fn role(&self) -> Result<Option<Role>, AdminError> {
        match self.role.as_deref() {
            None | Some("all") => Ok(None),
            Some(raw) => raw.parse().map(Some).map_err(|_| {
                AdminError::Validation("Role must be patient, dentist, admin, or all".to_string())
            }),
        }
    }
}

// ==============================================================================
// USER REQUESTS
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: String,
}

impl UpdateRoleRequest {
    pub fn role(&self) -> Result<Role, AdminError> {
        self.role
            .parse()
            .map_err(|_| AdminError::Validation("Role must be patient, dentist, or admin".to_string()))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub is_active: bool,
}

// ==============================================================================
// DENTIST REQUESTS
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDentistRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub license_number: String,
    pub specialization: Vec<Specialization>,
    #[serde(default)]
    pub experience: u32,
    #[serde(default)]
    pub education: Vec<Education>,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub consultation_fee: f64,
}

impl CreateDentistRequest {
    pub fn validate(&self) -> Result<(), AdminError> {
        validation::validate_name(&self.name).map_err(AdminError::Validation)?;
        validation::validate_email(&self.email).map_err(AdminError::Validation)?;
        validate_staff_password(&self.password)?;

        if self.license_number.trim().is_empty() {
            return Err(AdminError::Validation("License number is required".to_string()));
        }
        if self.specialization.is_empty() {
            return Err(AdminError::Validation(
                "At least one specialization is required".to_string(),
            ));
        }

        self.profile_fields().validate()?;
        Ok(())
    }

    /// The profile half of the request, in the shape the dentist cell validates.
    pub fn profile_fields(&self) -> UpdateDentistProfileRequest {
        UpdateDentistProfileRequest {
            license_number: Some(self.license_number.clone()),
            specialization: Some(self.specialization.clone()),
            experience: Some(self.experience),
            consultation_fee: Some(self.consultation_fee),
            bio: Some(self.bio.clone()),
            education: Some(self.education.clone()),
        }
    }
}

/// Staff accounts need mixed case and a digit on top of the length rule.
fn validate_staff_password(password: &str) -> Result<(), AdminError> {
    validation::validate_password(password).map_err(AdminError::Validation)?;

    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !(has_lower && has_upper && has_digit) {
        return Err(AdminError::Validation(
            "Password must contain at least one uppercase letter, one lowercase letter, and one number"
                .to_string(),
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDentistRequest {
    pub name: Option<String>,
    pub is_active: Option<bool>,
    #[serde(flatten)]
    pub profile: UpdateDentistProfileRequest,
}

impl UpdateDentistRequest {
    pub fn validate(&self) -> Result<(), AdminError> {
        if let Some(name) = &self.name {
            validation::validate_name(name).map_err(AdminError::Validation)?;
        }
        self.profile.validate()?;
        Ok(())
    }
}

// ==============================================================================
// RESPONSES
// ==============================================================================

/// An account with whatever role profile it carries.
#[derive(Debug, Clone, Serialize)]
pub struct UserWithProfile<P = RoleProfile> {
    #[serde(flatten)]
    pub user: UserAccount,
    pub profile: Option<P>,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug)]
pub enum AdminError {
    #[error("User not found")]
    UserNotFound,

    #[error("Dentist not found")]
    DentistNotFound,

    #[error("Cannot {0}")]
    OwnAccount(&'static str),

    #[error("User already exists with this email")]
    EmailTaken,

    #[error("License number already exists")]
    LicenseTaken,

    #[error("{0}")]
    Validation(String),

    #[error("Failed to hash password")]
    PasswordHash,

    #[error(transparent)]
    Dentist(#[from] DentistError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<AdminError> for AppError {
    fn from(err: AdminError) -> Self {
        match err {
            AdminError::UserNotFound | AdminError::DentistNotFound => AppError::NotFound(err.to_string()),
            AdminError::OwnAccount(_) => AppError::BadRequest(err.to_string()),
            AdminError::EmailTaken | AdminError::LicenseTaken => AppError::Conflict(err.to_string()),
            AdminError::Validation(msg) => AppError::ValidationError(msg),
            AdminError::PasswordHash => AppError::Internal(err.to_string()),
            AdminError::Dentist(e) => AppError::from(e),
            AdminError::Store(e) => AppError::from(e),
        }
    }
}
