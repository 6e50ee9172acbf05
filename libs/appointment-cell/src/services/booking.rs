// libs/appointment-cell/src/services/booking.rs
use std::collections::HashMap;
use std::sync::Arc;

use chrono::{NaiveDateTime, Utc};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use shared_database::store::{AppointmentStore, CatalogStore, ProfileStore, UserStore};
use shared_database::AppState;
use shared_models::appointment::{
    Appointment, AppointmentChanges, AppointmentFilter, AppointmentStatus, NewAppointment,
};
use shared_models::catalog::{effective_duration, is_valid_duration, MAX_DURATION_MINUTES, MIN_DURATION_MINUTES};
use shared_models::dentist::DentistProfile;
use shared_models::notification::{CancelledBy, NotificationKind};
use shared_models::user::Role;

use crate::models::{
    clean_notes, parse_time_field, AppointmentDetails, AppointmentError, BookAppointmentRequest,
    CreateAppointmentRequest, RescheduleAppointmentRequest, UpdateAppointmentRequest,
};
use crate::services::availability::ensure_offered;
use crate::services::conflict::ConflictGuard;
use crate::services::lifecycle::{AppointmentLifecycleService, PatientChange};
use crate::services::notify::NotificationDispatcher;

fn ensure_future(date: chrono::NaiveDate, time: chrono::NaiveTime) -> Result<(), AppointmentError> {
    if NaiveDateTime::new(date, time).and_utc() <= Utc::now() {
        return Err(AppointmentError::ValidationError(
            "Appointment must be scheduled for a future time".to_string(),
        ));
    }
    Ok(())
}

fn ensure_duration(minutes: u32) -> Result<(), AppointmentError> {
    if !is_valid_duration(minutes) {
        return Err(AppointmentError::ValidationError(format!(
            "Duration must be between {} and {} minutes",
            MIN_DURATION_MINUTES, MAX_DURATION_MINUTES
        )));
    }
    Ok(())
}

/// The booking engine: creation, patient changes, and dentist-side management.
pub struct AppointmentBookingService {
    users: Arc<dyn UserStore>,
    profiles: Arc<dyn ProfileStore>,
    catalog: Arc<dyn CatalogStore>,
    appointments: Arc<dyn AppointmentStore>,
    guard: ConflictGuard,
    lifecycle: AppointmentLifecycleService,
    notifications: NotificationDispatcher,
}

impl AppointmentBookingService {
    pub fn new(state: &AppState) -> Self {
        Self {
            users: state.users.clone(),
            profiles: state.profiles.clone(),
            catalog: state.catalog.clone(),
            appointments: state.appointments.clone(),
            guard: ConflictGuard::new(state.appointments.clone()),
            lifecycle: AppointmentLifecycleService::new(),
            notifications: NotificationDispatcher::new(state),
        }
    }

    async fn load(&self, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        self.appointments
            .find_appointment(appointment_id)
            .await?
            .ok_or(AppointmentError::NotFound)
    }

    /// Loads an appointment the patient owns. Anyone else's looks missing.
    async fn load_for_patient(&self, patient_id: Uuid, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        let appointment = self.load(appointment_id).await?;
        if appointment.patient_id != patient_id {
            return Err(AppointmentError::NotFound);
        }
        Ok(appointment)
    }

    async fn load_for_dentist(&self, dentist_id: Uuid, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        let appointment = self.load(appointment_id).await?;
        if appointment.dentist_id != dentist_id {
            return Err(AppointmentError::NotFound);
        }
        Ok(appointment)
    }

    async fn bookable_dentist(&self, dentist_id: Uuid) -> Result<DentistProfile, AppointmentError> {
        let user = self.users.find_user_by_id(dentist_id).await?;
        let is_dentist = user.map_or(false, |u| u.role == Role::Dentist && u.is_active);
        let profile = self
            .profiles
            .get_dentist_profile(dentist_id)
            .await?
            .filter(|p| p.is_active);

        match profile {
            Some(profile) if is_dentist => Ok(profile),
            _ => Err(AppointmentError::DentistNotFound),
        }
    }

    // ==========================================================================
    // PATIENT OPERATIONS
    // ==========================================================================

    #[instrument(skip(self, request), fields(dentist_id = %request.dentist_id, date = %request.date))]
    pub async fn book_for_patient(
        &self,
        patient_id: Uuid,
        request: BookAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        let time = parse_time_field(&request.time)?;
        let notes = clean_notes(request.notes)?;
        ensure_future(request.date, time)?;
        let dentist = self.bookable_dentist(request.dentist_id).await?;
        ensure_offered(&dentist, request.date, time)?;

        let service = self
            .catalog
            .get_service(request.service_id)
            .await?
            .filter(|s| s.is_active)
            .ok_or(AppointmentError::ServiceNotFound)?;
        let offering = self
            .catalog
            .get_dentist_service_offering(request.dentist_id, request.service_id)
            .await?;

        let appointment = self
            .guard
            .create(NewAppointment {
                patient_id,
                dentist_id: request.dentist_id,
                service_id: request.service_id,
                date: request.date,
                time,
                duration: effective_duration(&service, offering.as_ref()),
                status: AppointmentStatus::Pending,
                notes: notes.unwrap_or_default(),
            })
            .await?;

        info!(
            "Appointment {} booked by patient {} with dentist {} on {} at {}",
            appointment.id, patient_id, appointment.dentist_id, appointment.date, request.time
        );

        self.notifications
            .dispatch(vec![NotificationKind::NewAppointmentToDentist], appointment.clone(), None);

        Ok(appointment)
    }

    #[instrument(skip(self))]
    pub async fn cancel_for_patient(
        &self,
        patient_id: Uuid,
        appointment_id: Uuid,
    ) -> Result<Appointment, AppointmentError> {
        let appointment = self.load_for_patient(patient_id, appointment_id).await?;
        self.lifecycle
            .ensure_patient_can_change(&appointment, PatientChange::Cancel, Utc::now())?;

        let cancelled = self
            .guard
            .update(&appointment, &AppointmentChanges::status(AppointmentStatus::Cancelled))
            .await?;

        info!("Appointment {} cancelled by patient {}", appointment_id, patient_id);

        self.notifications.dispatch(
            vec![NotificationKind::CancellationConfirmation { by: CancelledBy::Patient }],
            cancelled.clone(),
            None,
        );

        Ok(cancelled)
    }

    #[instrument(skip(self, request), fields(date = %request.date, time = %request.time))]
    pub async fn reschedule_for_patient(
        &self,
        patient_id: Uuid,
        appointment_id: Uuid,
        request: RescheduleAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        let time = parse_time_field(&request.time)?;
        let appointment = self.load_for_patient(patient_id, appointment_id).await?;
        self.lifecycle
            .ensure_patient_can_change(&appointment, PatientChange::Reschedule, Utc::now())?;
        ensure_future(request.date, time)?;
        let dentist = self.bookable_dentist(appointment.dentist_id).await?;
        ensure_offered(&dentist, request.date, time)?;

        let changes = AppointmentChanges {
            date: Some(request.date),
            time: Some(time),
            status: Some(AppointmentStatus::Pending),
            ..AppointmentChanges::default()
        };
        let rescheduled = self.guard.update(&appointment, &changes).await?;

        info!(
            "Appointment {} rescheduled by patient {} from {} {} to {} {}",
            appointment_id, patient_id, appointment.date, appointment.time, rescheduled.date, rescheduled.time
        );

        self.notifications.dispatch(
            vec![NotificationKind::RescheduleToDentist, NotificationKind::RescheduleToPatient],
            rescheduled.clone(),
            Some((appointment.date, appointment.time)),
        );

        Ok(rescheduled)
    }

    pub async fn list_for_patient(&self, patient_id: Uuid) -> Result<Vec<AppointmentDetails>, AppointmentError> {
        let appointments = self.appointments.find_by_patient(patient_id).await?;
        debug!("Found {} appointments for patient {}", appointments.len(), patient_id);
        self.with_details(appointments).await
    }

    // ==========================================================================
    // DENTIST OPERATIONS
    // ==========================================================================

    #[instrument(skip(self, request), fields(patient_id = %request.patient_id, date = %request.date))]
    pub async fn create_for_dentist(
        &self,
        dentist_id: Uuid,
        request: CreateAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        let time = parse_time_field(&request.time)?;
        let notes = clean_notes(request.notes)?;

        let patient = self.users.find_user_by_id(request.patient_id).await?;
        if !patient.map_or(false, |p| p.role == Role::Patient) {
            return Err(AppointmentError::PatientNotFound);
        }

        let offering = self
            .catalog
            .get_dentist_service_offering(dentist_id, request.service_id)
            .await?
            .filter(|o| o.is_active)
            .ok_or(AppointmentError::ServiceNotOffered)?;
        let service = self
            .catalog
            .get_service(request.service_id)
            .await?
            .ok_or(AppointmentError::ServiceNotFound)?;

        let duration = request
            .duration
            .unwrap_or_else(|| effective_duration(&service, Some(&offering)));
        ensure_duration(duration)?;

        let appointment = self
            .guard
            .create(NewAppointment {
                patient_id: request.patient_id,
                dentist_id,
                service_id: request.service_id,
                date: request.date,
                time,
                duration,
                status: AppointmentStatus::Scheduled,
                notes: notes.unwrap_or_default(),
            })
            .await?;

        info!(
            "Appointment {} scheduled by dentist {} for patient {}",
            appointment.id, dentist_id, appointment.patient_id
        );
        Ok(appointment)
    }

    #[instrument(skip(self, request))]
    pub async fn update_for_dentist(
        &self,
        dentist_id: Uuid,
        appointment_id: Uuid,
        request: UpdateAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        let appointment = self.load_for_dentist(dentist_id, appointment_id).await?;
        if appointment.status.is_terminal() {
            return Err(AppointmentError::TerminalState {
                action: "update",
                status: appointment.status,
            });
        }

        let time = request.time.as_deref().map(parse_time_field).transpose()?;
        let notes = clean_notes(request.notes)?;
        if let Some(duration) = request.duration {
            ensure_duration(duration)?;
        }

        let changes = AppointmentChanges {
            date: request.date,
            time,
            duration: request.duration,
            status: None,
            notes,
        };
        let updated = self.guard.update(&appointment, &changes).await?;

        info!("Appointment {} updated by dentist {}", appointment_id, dentist_id);
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn update_status_for_dentist(
        &self,
        dentist_id: Uuid,
        appointment_id: Uuid,
        status: AppointmentStatus,
    ) -> Result<Appointment, AppointmentError> {
        let appointment = self.load_for_dentist(dentist_id, appointment_id).await?;
        self.lifecycle.validate_status_transition(appointment.status, status)?;

        let updated = self
            .guard
            .update(&appointment, &AppointmentChanges::status(status))
            .await?;

        info!(
            "Appointment {} moved from {} to {} by dentist {}",
            appointment_id, appointment.status, status, dentist_id
        );

        let kind = match status {
            AppointmentStatus::Confirmed => Some(NotificationKind::ApprovedToPatient),
            AppointmentStatus::Completed => Some(NotificationKind::CompletedThankYou),
            AppointmentStatus::NoShow => Some(NotificationKind::NoShowReschedule),
            AppointmentStatus::Cancelled => Some(NotificationKind::CancellationConfirmation {
                by: CancelledBy::Dentist,
            }),
            AppointmentStatus::Pending | AppointmentStatus::Scheduled => None,
        };
        if let Some(kind) = kind {
            self.notifications.dispatch(vec![kind], updated.clone(), None);
        }

        Ok(updated)
    }

    pub async fn list_for_dentist(
        &self,
        dentist_id: Uuid,
        filter: &AppointmentFilter,
    ) -> Result<Vec<AppointmentDetails>, AppointmentError> {
        let appointments = self.appointments.find_by_dentist(dentist_id, filter).await?;
        debug!("Found {} appointments for dentist {}", appointments.len(), dentist_id);
        self.with_details(appointments).await
    }

    /// Attaches participant and service names, looking each id up once.
    pub async fn with_details(
        &self,
        appointments: Vec<Appointment>,
    ) -> Result<Vec<AppointmentDetails>, AppointmentError> {
        let mut people = HashMap::new();
        let mut services = HashMap::new();

        for appointment in &appointments {
            for id in [appointment.patient_id, appointment.dentist_id] {
                if !people.contains_key(&id) {
                    let user = self.users.find_user_by_id(id).await?;
                    people.insert(id, user);
                }
            }
            if !services.contains_key(&appointment.service_id) {
                let service = self.catalog.get_service(appointment.service_id).await?;
                services.insert(appointment.service_id, service);
            }
        }

        Ok(appointments
            .into_iter()
            .map(|appointment| {
                let patient = people.get(&appointment.patient_id).and_then(|u| u.as_ref());
                let dentist = people.get(&appointment.dentist_id).and_then(|u| u.as_ref());
                let service = services.get(&appointment.service_id).and_then(|s| s.as_ref());
                if patient.is_none() || dentist.is_none() {
                    warn!("Appointment {} references a missing user", appointment.id);
                }
                AppointmentDetails {
                    patient_name: patient.map(|u| u.name.clone()),
                    patient_email: patient.map(|u| u.email.clone()),
                    dentist_name: dentist.map(|u| u.name.clone()),
                    service_name: service.map(|s| s.name.clone()),
                    appointment,
                }
            })
            .collect())
    }
}
