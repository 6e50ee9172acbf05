// libs/appointment-cell/src/services/conflict.rs
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use tracing::{debug, warn};
use uuid::Uuid;

use shared_database::store::AppointmentStore;
use shared_database::StoreError;
use shared_models::appointment::{Appointment, AppointmentChanges, NewAppointment};

use crate::models::AppointmentError;

/// The slot key an appointment reserves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotKey {
    pub dentist_id: Uuid,
    pub date: NaiveDate,
    pub time: NaiveTime,
}

/// Rejects a booking when its patient already holds the slot, then when anyone does.
pub fn classify_conflicts(conflicts: &[Appointment], patient_id: Uuid) -> Result<(), AppointmentError> {
    if conflicts.iter().any(|a| a.patient_id == patient_id) {
        return Err(AppointmentError::AlreadyBooked);
    }
    if !conflicts.is_empty() {
        return Err(AppointmentError::SlotTaken);
    }
    Ok(())
}

/// Enforces at most one slot-holding appointment per `(dentist, date, time)`.
///
/// The pre-check gives precise messages; the store's own uniqueness rule
/// decides races, after which the conflict is classified again.
pub struct ConflictGuard {
    appointments: Arc<dyn AppointmentStore>,
}

impl ConflictGuard {
    pub fn new(appointments: Arc<dyn AppointmentStore>) -> Self {
        Self { appointments }
    }

    pub async fn check(
        &self,
        patient_id: Uuid,
        key: SlotKey,
        exclude_id: Option<Uuid>,
    ) -> Result<(), AppointmentError> {
        let conflicts = self
            .appointments
            .find_conflicting(key.dentist_id, key.date, key.time, exclude_id)
            .await?;

        debug!(
            "Found {} slot holder(s) for dentist {} at {} {}",
            conflicts.len(),
            key.dentist_id,
            key.date,
            key.time
        );

        classify_conflicts(&conflicts, patient_id).inspect_err(|e| {
            warn!("Booking rejected for patient {}: {}", patient_id, e);
        })
    }

    async fn reclassify(
        &self,
        patient_id: Uuid,
        key: SlotKey,
        exclude_id: Option<Uuid>,
        err: StoreError,
    ) -> AppointmentError {
        match err {
            StoreError::Conflict(_) => {
                warn!(
                    "Store rejected concurrent booking for dentist {} at {} {}",
                    key.dentist_id, key.date, key.time
                );
                match self.check(patient_id, key, exclude_id).await {
                    Err(classified) => classified,
                    Ok(()) => AppointmentError::SlotTaken,
                }
            }
            other => AppointmentError::Store(other),
        }
    }

    pub async fn create(&self, appointment: NewAppointment) -> Result<Appointment, AppointmentError> {
        let key = SlotKey {
            dentist_id: appointment.dentist_id,
            date: appointment.date,
            time: appointment.time,
        };
        let patient_id = appointment.patient_id;

        self.check(patient_id, key, None).await?;

        match self.appointments.create_appointment(appointment).await {
            Ok(created) => Ok(created),
            Err(e) => Err(self.reclassify(patient_id, key, None, e).await),
        }
    }

    /// Applies `changes`, re-checking the slot when the result still holds one
    /// and either moves it or re-reserves it.
    pub async fn update(
        &self,
        current: &Appointment,
        changes: &AppointmentChanges,
    ) -> Result<Appointment, AppointmentError> {
        let mut next = current.clone();
        changes.apply(&mut next);

        let key = SlotKey {
            dentist_id: next.dentist_id,
            date: next.date,
            time: next.time,
        };
        let reclaims = next.status.is_slot_holding()
            && (changes.moves_slot() || !current.status.is_slot_holding());

        if reclaims {
            self.check(current.patient_id, key, Some(current.id)).await?;
        }

        match self.appointments.update_appointment(current.id, changes).await {
            Ok(updated) => Ok(updated),
            Err(StoreError::NotFound(_)) => Err(AppointmentError::NotFound),
            Err(e) => Err(self.reclassify(current.patient_id, key, Some(current.id), e).await),
        }
    }
}
