use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_database::StoreError;
use shared_models::catalog::{
    is_valid_duration, DentistServiceOffering, Service, ServiceCategory, MAX_DURATION_MINUTES,
    MIN_DURATION_MINUTES,
};
use shared_models::error::AppError;

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateServiceRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: ServiceCategory,
    pub default_duration: u32,
    pub default_price: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateServiceRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<ServiceCategory>,
    pub default_duration: Option<u32>,
    pub default_price: Option<f64>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignServiceRequest {
    pub dentist_id: Uuid,
    pub service_id: Uuid,
    pub custom_price: Option<f64>,
    pub custom_duration: Option<u32>,
}

/// `?page=&limit=&category=`; a category of `all` disables the filter.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub category: Option<String>,
}

impl ServiceListQuery {
    pub fn category(&self) -> Result<Option<ServiceCategory>, CatalogError> {
        match self.category.as_deref() {
            None | Some("") | Some("all") => Ok(None),
            Some(raw) => serde_json::from_value(serde_json::Value::String(raw.to_string()))
                .map(Some)
                .map_err(|_| CatalogError::Validation(format!("Invalid service category: {}", raw))),
        }
    }
}

// ==============================================================================
// RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSummary {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub category: ServiceCategory,
    pub default_price: f64,
    pub default_duration: u32,
}

impl From<&Service> for ServiceSummary {
    fn from(service: &Service) -> Self {
        Self {
            id: service.id,
            name: service.name.clone(),
            description: service.description.clone(),
            category: service.category,
            default_price: service.default_price,
            default_duration: service.default_duration,
        }
    }
}

/// An offering joined with the catalog entry it refers to.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferedService {
    pub id: Uuid,
    pub dentist_id: Uuid,
    pub service: ServiceSummary,
    pub price: f64,
    pub duration: u32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl OfferedService {
    pub fn new(offering: &DentistServiceOffering, service: &Service) -> Self {
        Self {
            id: offering.id,
            dentist_id: offering.dentist_id,
            service: ServiceSummary::from(service),
            price: offering.custom_price.unwrap_or(service.default_price),
            duration: offering.custom_duration.unwrap_or(service.default_duration),
            is_active: offering.is_active,
            created_at: offering.created_at,
        }
    }
}

// ==============================================================================
// VALIDATION
// ==============================================================================

pub fn validate_name(name: &str) -> Result<(), CatalogError> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed.len() > 100 {
        return Err(CatalogError::Validation(
            "Service name must be between 1 and 100 characters".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_duration(minutes: u32) -> Result<(), CatalogError> {
    if !is_valid_duration(minutes) {
        return Err(CatalogError::Validation(format!(
            "Duration must be between {} and {} minutes",
            MIN_DURATION_MINUTES, MAX_DURATION_MINUTES
        )));
    }
    Ok(())
}

pub fn validate_price(price: f64) -> Result<(), CatalogError> {
    if !price.is_finite() || price < 0.0 {
        return Err(CatalogError::Validation("Price must be a positive number".to_string()));
    }
    Ok(())
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Service not found")]
    ServiceNotFound,

    #[error("Dentist not found")]
    DentistNotFound,

    #[error("Service assignment not found")]
    AssignmentNotFound,

    #[error("Service with this name already exists")]
    NameTaken,

    #[error("Service is already assigned to this dentist")]
    AlreadyAssigned,

    #[error("Cannot delete service. It is currently assigned to dentists.")]
    ServiceInUse,

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::ServiceNotFound
            | CatalogError::DentistNotFound
            | CatalogError::AssignmentNotFound => AppError::NotFound(err.to_string()),
            CatalogError::NameTaken | CatalogError::AlreadyAssigned => AppError::Conflict(err.to_string()),
            CatalogError::ServiceInUse => AppError::BadRequest(err.to_string()),
            CatalogError::Validation(msg) => AppError::ValidationError(msg),
            CatalogError::Store(e) => AppError::from(e),
        }
    }
}
