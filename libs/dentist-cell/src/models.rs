use chrono::{DateTime, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_database::StoreError;
use shared_models::dentist::{DentistProfile, Education, Specialization};
use shared_models::error::AppError;
use shared_models::patient::{Gender, PatientProfile};
use shared_models::user::UserAccount;

// ==============================================================================
// PROFILE
// ==============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDentistProfileRequest {
    pub license_number: Option<String>,
    pub specialization: Option<Vec<Specialization>>,
    pub experience: Option<u32>,
    pub consultation_fee: Option<f64>,
    pub bio: Option<String>,
    pub education: Option<Vec<Education>>,
}

impl UpdateDentistProfileRequest {
    pub fn validate(&self) -> Result<(), DentistError> {
        if let Some(license) = &self.license_number {
            let len = license.trim().len();
            if !(3..=50).contains(&len) {
                return Err(DentistError::Validation(
                    "License number must be between 3 and 50 characters".to_string(),
                ));
            }
        }
        if self.experience.is_some_and(|years| years > 50) {
            return Err(DentistError::Validation(
                "Experience must be between 0 and 50 years".to_string(),
            ));
        }
        if self
            .consultation_fee
            .is_some_and(|fee| !fee.is_finite() || fee < 0.0)
        {
            return Err(DentistError::Validation(
                "Consultation fee must be a positive number".to_string(),
            ));
        }
        if self.bio.as_deref().is_some_and(|bio| bio.trim().chars().count() > 1000) {
            return Err(DentistError::Validation("Bio cannot exceed 1000 characters".to_string()));
        }
        Ok(())
    }

    pub fn apply(&self, profile: &mut DentistProfile) {
        if let Some(license) = &self.license_number {
            profile.license_number = license.trim().to_string();
        }
        if let Some(specialization) = &self.specialization {
            profile.specialization = specialization.clone();
        }
        if let Some(experience) = self.experience {
            profile.experience = experience;
        }
        if let Some(fee) = self.consultation_fee {
            profile.consultation_fee = fee;
        }
        if let Some(bio) = &self.bio {
            profile.bio = bio.trim().to_string();
        }
        if let Some(education) = &self.education {
            profile.education = education.clone();
        }
        profile.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub is_active: bool,
}

impl From<&UserAccount> for UserSummary {
    fn from(user: &UserAccount) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            is_active: user.is_active,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DentistProfileView {
    #[serde(flatten)]
    pub profile: DentistProfile,
    pub user: UserSummary,
}

/// Public card shown to patients choosing a dentist.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DentistCard {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub specialization: Vec<Specialization>,
    pub license_number: String,
    pub experience: u32,
    pub bio: String,
    pub consultation_fee: f64,
    pub is_available: bool,
}

impl DentistCard {
    pub fn new(user: &UserAccount, profile: &DentistProfile) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            specialization: profile.specialization.clone(),
            license_number: profile.license_number.clone(),
            experience: profile.experience,
            bio: profile.bio.clone(),
            consultation_fee: profile.consultation_fee,
            is_available: profile.is_active && user.is_active,
        }
    }
}

// ==============================================================================
// SCHEDULE
// ==============================================================================

/// One weekday as submitted. Every field is optional so the validator can
/// name the exact field that is missing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayInput {
    pub start: Option<String>,
    pub end: Option<String>,
    pub is_working: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkingHoursInput {
    pub monday: Option<DayInput>,
    pub tuesday: Option<DayInput>,
    pub wednesday: Option<DayInput>,
    pub thursday: Option<DayInput>,
    pub friday: Option<DayInput>,
    pub saturday: Option<DayInput>,
    pub sunday: Option<DayInput>,
}

impl WorkingHoursInput {
    pub fn day(&self, weekday: Weekday) -> Option<&DayInput> {
        match weekday {
            Weekday::Mon => self.monday.as_ref(),
            Weekday::Tue => self.tuesday.as_ref(),
            Weekday::Wed => self.wednesday.as_ref(),
            Weekday::Thu => self.thursday.as_ref(),
            Weekday::Fri => self.friday.as_ref(),
            Weekday::Sat => self.saturday.as_ref(),
            Weekday::Sun => self.sunday.as_ref(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkingHoursRequest {
    pub working_hours: Option<WorkingHoursInput>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideSlotInput {
    pub start: String,
    pub end: String,
    #[serde(default = "default_true")]
    pub is_available: bool,
}

fn default_true() -> bool {
    true
}

/// Replaces the override for `date`; an empty slot list blocks nothing but
/// still records the date.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityOverrideRequest {
    pub date: NaiveDate,
    #[serde(default)]
    pub time_slots: Vec<OverrideSlotInput>,
}

// ==============================================================================
// PATIENTS
// ==============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientContact {
    pub phone: Option<String>,
    pub birthdate: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub address: Option<String>,
}

impl From<&PatientProfile> for PatientContact {
    fn from(profile: &PatientProfile) -> Self {
        Self {
            phone: profile.phone.clone(),
            birthdate: profile.birthdate,
            gender: profile.gender,
            address: profile.address.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub profile: Option<PatientContact>,
}

impl PatientSummary {
    pub fn new(user: &UserAccount, profile: Option<&PatientProfile>) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            is_active: user.is_active,
            created_at: user.created_at,
            profile: profile.map(PatientContact::from),
        }
    }
}

/// A patient seen by the requesting dentist.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DentistPatient {
    #[serde(flatten)]
    pub patient: PatientSummary,
    pub total_appointments: usize,
    pub last_visit: Option<NaiveDate>,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug)]
pub enum DentistError {
    #[error("Dentist profile not found")]
    ProfileNotFound,

    #[error("License number already exists")]
    LicenseTaken,

    #[error("No availability override for {0}")]
    OverrideNotFound(NaiveDate),

    #[error("{0}")]
    InvalidWorkingHours(String),

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<DentistError> for AppError {
    fn from(err: DentistError) -> Self {
        match err {
            DentistError::ProfileNotFound | DentistError::OverrideNotFound(_) => {
                AppError::NotFound(err.to_string())
            }
            DentistError::LicenseTaken => AppError::Conflict(err.to_string()),
            DentistError::InvalidWorkingHours(msg) | DentistError::Validation(msg) => {
                AppError::ValidationError(msg)
            }
            DentistError::Store(e) => AppError::from(e),
        }
    }
}
