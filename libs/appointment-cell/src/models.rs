// libs/appointment-cell/src/models.rs
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_database::StoreError;
use shared_models::appointment::{Appointment, AppointmentStatus};
use shared_models::clock::{format_12h, format_hhmm, parse_hhmm};
use shared_models::error::AppError;

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

/// Patient-initiated booking. The patient is the authenticated principal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookAppointmentRequest {
    pub dentist_id: Uuid,
    pub service_id: Uuid,
    pub date: NaiveDate,
    pub time: String,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RescheduleAppointmentRequest {
    pub date: NaiveDate,
    pub time: String,
}

/// Dentist-initiated booking on behalf of a patient.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointmentRequest {
    pub patient_id: Uuid,
    pub service_id: Uuid,
    pub date: NaiveDate,
    pub time: String,
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAppointmentRequest {
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotsQuery {
    pub dentist_id: Option<Uuid>,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityQuery {
    pub dentist_id: Option<Uuid>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

pub const MAX_NOTES_LENGTH: usize = 500;

/// Trims free-text notes and enforces the length cap.
pub fn clean_notes(notes: Option<String>) -> Result<Option<String>, AppointmentError> {
    let notes = notes.map(|n| n.trim().to_string());
    if notes.as_ref().is_some_and(|n| n.chars().count() > MAX_NOTES_LENGTH) {
        return Err(AppointmentError::ValidationError(format!(
            "Notes cannot exceed {} characters",
            MAX_NOTES_LENGTH
        )));
    }
    Ok(notes)
}

/// Parses a wall-clock `HH:MM` field from a request body.
pub fn parse_time_field(raw: &str) -> Result<NaiveTime, AppointmentError> {
    parse_hhmm(raw).ok_or_else(|| {
        AppointmentError::ValidationError("Please provide a valid time in HH:MM format".to_string())
    })
}

// ==============================================================================
// AVAILABILITY MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DayStatus {
    Unavailable,
    FullyBooked,
    Limited,
    Available,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotView {
    pub time: String,
    pub display: String,
    pub is_available: bool,
}

impl SlotView {
    pub fn new(time: NaiveTime, is_available: bool) -> Self {
        Self {
            time: format_hhmm(time),
            display: format_12h(time),
            is_available,
        }
    }
}

/// Bookable positions for one dentist on one date.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayAvailability {
    pub date: NaiveDate,
    pub day_of_week: String,
    pub status: DayStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub slots: Vec<SlotView>,
    pub total_slots: usize,
    pub available_slots: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySummary {
    pub date: NaiveDate,
    pub day_of_week: String,
    pub status: DayStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub total_slots: usize,
    pub available_slots: usize,
}

impl From<DayAvailability> for DaySummary {
    fn from(day: DayAvailability) -> Self {
        Self {
            date: day.date,
            day_of_week: day.day_of_week,
            status: day.status,
            reason: day.reason,
            total_slots: day.total_slots,
            available_slots: day.available_slots,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeTotals {
    pub total_days: usize,
    pub available_days: usize,
    pub limited_days: usize,
    pub fully_booked_days: usize,
    pub unavailable_days: usize,
    pub total_slots: usize,
    pub available_slots: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityRange {
    pub dentist_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: Vec<DaySummary>,
    pub summary: RangeTotals,
}

// ==============================================================================
// RESPONSE MODELS
// ==============================================================================

/// An appointment with the names of the people and service it references.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentDetails {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub patient_name: Option<String>,
    pub patient_email: Option<String>,
    pub dentist_name: Option<String>,
    pub service_name: Option<String>,
}

// ==============================================================================
// ERROR MODELS
// ==============================================================================

#[derive(Error, Debug)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Dentist not found")]
    DentistNotFound,

    #[error("Patient not found")]
    PatientNotFound,

    #[error("Service not found")]
    ServiceNotFound,

    #[error("Service not available for this dentist")]
    ServiceNotOffered,

    #[error("You already have an appointment at this time slot")]
    AlreadyBooked,

    #[error("This time slot is already booked")]
    SlotTaken,

    #[error("Cannot change appointment status from {from} to {to}")]
    InvalidStatusTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Cannot {action} a {status} appointment")]
    TerminalState {
        action: &'static str,
        status: AppointmentStatus,
    },

    #[error("Appointments can only be {action} more than 24 hours before the scheduled time")]
    OutsideChangeWindow { action: &'static str },

    #[error("{0}")]
    ValidationError(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::NotFound
            | AppointmentError::DentistNotFound
            | AppointmentError::PatientNotFound
            | AppointmentError::ServiceNotFound => AppError::NotFound(err.to_string()),
            AppointmentError::AlreadyBooked | AppointmentError::SlotTaken => {
                AppError::Conflict(err.to_string())
            }
            AppointmentError::ServiceNotOffered
            | AppointmentError::InvalidStatusTransition { .. }
            | AppointmentError::TerminalState { .. } => AppError::BadRequest(err.to_string()),
            AppointmentError::OutsideChangeWindow { .. } => AppError::ValidationError(err.to_string()),
            AppointmentError::ValidationError(msg) => AppError::ValidationError(msg),
            AppointmentError::Store(e) => AppError::from(e),
        }
    }
}
