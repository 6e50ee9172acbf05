use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_database::StoreError;
use shared_models::error::AppError;
use shared_models::patient::{EmergencyContact, Gender, PatientProfile};
use shared_models::user::{Role, UserAccount};
use shared_utils::validation;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePatientProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub birthdate: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub address: Option<String>,
    pub emergency_contact: Option<EmergencyContact>,
}

impl UpdatePatientProfileRequest {
    pub fn validate(&self) -> Result<(), PatientError> {
        if let Some(name) = &self.name {
            validation::validate_name(name).map_err(PatientError::Validation)?;
        }
        if let Some(email) = &self.email {
            validation::validate_email(email).map_err(PatientError::Validation)?;
        }
        if let Some(phone) = &self.phone {
            validation::validate_phone(phone).map_err(PatientError::Validation)?;
        }
        if self.birthdate.is_some_and(|d| d > Utc::now().date_naive()) {
            return Err(PatientError::Validation(
                "Please provide a valid date of birth".to_string(),
            ));
        }
        if self.address.as_deref().is_some_and(|a| a.trim().is_empty()) {
            return Err(PatientError::Validation("Address cannot be empty".to_string()));
        }
        if let Some(contact) = &self.emergency_contact {
            if contact.name.trim().is_empty() {
                return Err(PatientError::Validation(
                    "Emergency contact name cannot be empty".to_string(),
                ));
            }
            if !validation::is_valid_phone(contact.phone.trim()) {
                return Err(PatientError::Validation(
                    "Please provide a valid emergency contact phone number".to_string(),
                ));
            }
            if contact.relationship.trim().is_empty() {
                return Err(PatientError::Validation(
                    "Emergency contact relationship cannot be empty".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Profile fields only; account fields go through `UserChanges`.
    pub fn apply(&self, profile: &mut PatientProfile) {
        if let Some(phone) = &self.phone {
            profile.phone = Some(phone.trim().to_string());
        }
        if let Some(birthdate) = self.birthdate {
            profile.birthdate = Some(birthdate);
        }
        if let Some(gender) = self.gender {
            profile.gender = Some(gender);
        }
        if let Some(address) = &self.address {
            profile.address = Some(address.trim().to_string());
        }
        if let Some(contact) = &self.emergency_contact {
            profile.emergency_contact = Some(contact.clone());
        }
        profile.updated_at = Utc::now();
    }
}

/// Account and profile merged into one record.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientProfileView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub phone: Option<String>,
    pub birthdate: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub address: Option<String>,
    pub emergency_contact: Option<EmergencyContact>,
}

impl PatientProfileView {
    pub fn new(user: &UserAccount, profile: Option<&PatientProfile>) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            is_active: user.is_active,
            created_at: user.created_at,
            phone: profile.and_then(|p| p.phone.clone()),
            birthdate: profile.and_then(|p| p.birthdate),
            gender: profile.and_then(|p| p.gender),
            address: profile.and_then(|p| p.address.clone()),
            emergency_contact: profile.and_then(|p| p.emergency_contact.clone()),
        }
    }
}

#[derive(Error, Debug)]
pub enum PatientError {
    #[error("User not found")]
    UserNotFound,

    #[error("Email is already in use")]
    EmailTaken,

    #[error("Phone number is already registered")]
    PhoneTaken,

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<PatientError> for AppError {
    fn from(err: PatientError) -> Self {
        match err {
            PatientError::UserNotFound => AppError::NotFound(err.to_string()),
            PatientError::EmailTaken | PatientError::PhoneTaken => AppError::Conflict(err.to_string()),
            PatientError::Validation(msg) => AppError::ValidationError(msg),
            PatientError::Store(e) => AppError::from(e),
        }
    }
}
