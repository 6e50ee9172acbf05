use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CancelledBy {
    Patient,
    Dentist,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "kind")]
pub enum NotificationKind {
    NewAppointmentToDentist,
    ApprovedToPatient,
    CompletedThankYou,
    NoShowReschedule,
    CancellationConfirmation { by: CancelledBy },
    RescheduleToDentist,
    RescheduleToPatient,
}

/// Values substituted into notification templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationData {
    pub recipient_name: String,
    pub patient_name: String,
    pub dentist_name: String,
    pub service_name: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub duration: u32,
    pub notes: String,
    pub previous_date: Option<NaiveDate>,
    pub previous_time: Option<NaiveTime>,
}

#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("Template error: {0}")]
    Template(String),

    #[error("Invalid address: {0}")]
    Address(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Notification timed out")]
    Timeout,
}

/// Outbound notification capability handed to the booking engine.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn notify(
        &self,
        kind: NotificationKind,
        recipient_email: &str,
        data: &NotificationData,
    ) -> Result<(), NotificationError>;

    fn name(&self) -> &'static str;
}
