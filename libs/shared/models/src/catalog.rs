use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceCategory {
    Preventive,
    Restorative,
    Cosmetic,
    Orthodontic,
    Surgical,
    Emergency,
    Consultation,
}

pub const MIN_DURATION_MINUTES: u32 = 15;
pub const MAX_DURATION_MINUTES: u32 = 480;

pub fn is_valid_duration(minutes: u32) -> bool {
    (MIN_DURATION_MINUTES..=MAX_DURATION_MINUTES).contains(&minutes)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub category: ServiceCategory,
    pub default_duration: u32,
    pub default_price: f64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<ServiceCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl ServiceChanges {
    pub fn apply(&self, service: &mut Service) {
        if let Some(name) = &self.name {
            service.name = name.clone();
        }
        if let Some(description) = &self.description {
            service.description = description.clone();
        }
        if let Some(category) = self.category {
            service.category = category;
        }
        if let Some(duration) = self.default_duration {
            service.default_duration = duration;
        }
        if let Some(price) = self.default_price {
            service.default_price = price;
        }
        if let Some(active) = self.is_active {
            service.is_active = active;
        }
        service.updated_at = Utc::now();
    }
}

/// A dentist offering a catalog service, optionally at a custom price or duration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DentistServiceOffering {
    pub id: Uuid,
    pub dentist_id: Uuid,
    pub service_id: Uuid,
    pub custom_price: Option<f64>,
    pub custom_duration: Option<u32>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Duration used when booking `service` with a dentist's `offering`.
pub fn effective_duration(service: &Service, offering: Option<&DentistServiceOffering>) -> u32 {
    offering
        .filter(|o| o.is_active)
        .and_then(|o| o.custom_duration)
        .unwrap_or(service.default_duration)
}
