use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyContact {
    pub name: String,
    pub phone: String,
    pub relationship: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientProfile {
    pub user_id: Uuid,
    pub phone: Option<String>,
    pub birthdate: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub address: Option<String>,
    pub emergency_contact: Option<EmergencyContact>,
    pub updated_at: DateTime<Utc>,
}

impl PatientProfile {
    pub fn empty(user_id: Uuid) -> Self {
        Self {
            user_id,
            phone: None,
            birthdate: None,
            gender: None,
            address: None,
            emergency_contact: None,
            updated_at: Utc::now(),
        }
    }
}
