// libs/appointment-cell/src/services/lifecycle.rs
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use shared_models::appointment::{Appointment, AppointmentStatus};

use crate::models::AppointmentError;

/// Patients may only change an appointment strictly more than this far ahead.
pub const PATIENT_CHANGE_WINDOW_HOURS: i64 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatientChange {
    Cancel,
    Reschedule,
}

impl PatientChange {
    fn verb(&self) -> &'static str {
        match self {
            PatientChange::Cancel => "cancel",
            PatientChange::Reschedule => "reschedule",
        }
    }

    fn past_tense(&self) -> &'static str {
        match self {
            PatientChange::Cancel => "cancelled",
            PatientChange::Reschedule => "rescheduled",
        }
    }
}

#[derive(Debug, Default)]
pub struct AppointmentLifecycleService;

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    /// Validate that a status transition is allowed
    pub fn validate_status_transition(
        &self,
        current_status: AppointmentStatus,
        new_status: AppointmentStatus,
    ) -> Result<(), AppointmentError> {
        debug!("Validating status transition from {} to {}", current_status, new_status);

        if !self.get_valid_transitions(current_status).contains(&new_status) {
            warn!("Invalid status transition attempted: {} -> {}", current_status, new_status);
            return Err(AppointmentError::InvalidStatusTransition {
                from: current_status,
                to: new_status,
            });
        }

        Ok(())
    }

    /// Get all valid next statuses for a given current status
    pub fn get_valid_transitions(&self, current_status: AppointmentStatus) -> Vec<AppointmentStatus> {
        match current_status {
            AppointmentStatus::Pending | AppointmentStatus::Scheduled => vec![
                AppointmentStatus::Confirmed,
                AppointmentStatus::Completed,
                AppointmentStatus::Cancelled,
                AppointmentStatus::NoShow,
            ],
            AppointmentStatus::Confirmed => vec![
                AppointmentStatus::Completed,
                AppointmentStatus::Cancelled,
                AppointmentStatus::NoShow,
            ],
            // Terminal states
            AppointmentStatus::Completed | AppointmentStatus::Cancelled | AppointmentStatus::NoShow => vec![],
        }
    }

    /// Rejects patient-initiated changes to terminal appointments or inside the 24 hour window.
    pub fn ensure_patient_can_change(
        &self,
        appointment: &Appointment,
        change: PatientChange,
        now: DateTime<Utc>,
    ) -> Result<(), AppointmentError> {
        if appointment.status.is_terminal() {
            return Err(AppointmentError::TerminalState {
                action: change.verb(),
                status: appointment.status,
            });
        }

        let lead_time = appointment.starts_at() - now;
        if lead_time <= Duration::hours(PATIENT_CHANGE_WINDOW_HOURS) {
            warn!(
                "Patient {} attempted to {} appointment {} only {} minutes ahead",
                appointment.patient_id,
                change.verb(),
                appointment.id,
                lead_time.num_minutes()
            );
            return Err(AppointmentError::OutsideChangeWindow {
                action: change.past_tense(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::Timelike;
    use shared_models::appointment::NewAppointment;
    use uuid::Uuid;

    fn appointment_at(start: DateTime<Utc>, status: AppointmentStatus) -> Appointment {
        let start = start.with_second(0).unwrap().with_nanosecond(0).unwrap();
        NewAppointment {
            patient_id: Uuid::new_v4(),
            dentist_id: Uuid::new_v4(),
            service_id: Uuid::new_v4(),
            date: start.date_naive(),
            time: start.time(),
            duration: 30,
            status,
            notes: String::new(),
        }
        .into_appointment(Uuid::new_v4())
    }

    #[test]
    fn terminal_states_accept_nothing() {
        let lifecycle = AppointmentLifecycleService::new();
        let all = [
            AppointmentStatus::Pending,
            AppointmentStatus::Scheduled,
            AppointmentStatus::Confirmed,
            AppointmentStatus::Completed,
            AppointmentStatus::Cancelled,
            AppointmentStatus::NoShow,
        ];

        for terminal in [
            AppointmentStatus::Completed,
            AppointmentStatus::Cancelled,
            AppointmentStatus::NoShow,
        ] {
            for next in all {
                assert_matches!(
                    lifecycle.validate_status_transition(terminal, next),
                    Err(AppointmentError::InvalidStatusTransition { .. })
                );
            }
        }
    }

    #[test]
    fn reserved_can_be_confirmed_or_closed() {
        let lifecycle = AppointmentLifecycleService::new();
        for reserved in [AppointmentStatus::Pending, AppointmentStatus::Scheduled] {
            assert!(lifecycle.validate_status_transition(reserved, AppointmentStatus::Confirmed).is_ok());
            assert!(lifecycle.validate_status_transition(reserved, AppointmentStatus::NoShow).is_ok());
        }
        assert!(lifecycle
            .validate_status_transition(AppointmentStatus::Confirmed, AppointmentStatus::Completed)
            .is_ok());
    }

    #[test]
    fn same_status_and_backwards_moves_are_rejected() {
        let lifecycle = AppointmentLifecycleService::new();
        assert!(lifecycle
            .validate_status_transition(AppointmentStatus::Confirmed, AppointmentStatus::Confirmed)
            .is_err());
        assert!(lifecycle
            .validate_status_transition(AppointmentStatus::Confirmed, AppointmentStatus::Pending)
            .is_err());
        assert!(lifecycle
            .validate_status_transition(AppointmentStatus::Pending, AppointmentStatus::Scheduled)
            .is_err());
    }

    #[test]
    fn change_window_is_strictly_more_than_a_day() {
        let lifecycle = AppointmentLifecycleService::new();
        let now = Utc::now();

        let soon = appointment_at(now + Duration::hours(23), AppointmentStatus::Pending);
        assert_matches!(
            lifecycle.ensure_patient_can_change(&soon, PatientChange::Cancel, now),
            Err(AppointmentError::OutsideChangeWindow { action: "cancelled" })
        );

        let later = appointment_at(now + Duration::hours(25), AppointmentStatus::Confirmed);
        assert!(lifecycle
            .ensure_patient_can_change(&later, PatientChange::Reschedule, now)
            .is_ok());
    }

    #[test]
    fn terminal_appointments_cannot_be_changed_by_patient() {
        let lifecycle = AppointmentLifecycleService::new();
        let now = Utc::now();
        let done = appointment_at(now + Duration::days(3), AppointmentStatus::Completed);

        assert_matches!(
            lifecycle.ensure_patient_can_change(&done, PatientChange::Cancel, now),
            Err(AppointmentError::TerminalState { action: "cancel", .. })
        );
    }
}
