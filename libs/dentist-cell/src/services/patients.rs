// libs/dentist-cell/src/services/patients.rs
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::NaiveDate;
use futures::future::try_join_all;
use tracing::debug;
use uuid::Uuid;

use shared_database::store::{AppointmentStore, ProfileStore, UserStore};
use shared_database::AppState;
use shared_models::appointment::{Appointment, AppointmentFilter, AppointmentStatus};
use shared_models::patient::PatientProfile;
use shared_models::user::{Role, UserAccount};

use crate::models::{DentistError, DentistPatient, PatientSummary};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct VisitStats {
    pub total_appointments: usize,
    pub last_visit: Option<NaiveDate>,
}

/// Per-patient appointment count and latest completed date.
pub fn visit_stats(appointments: &[Appointment]) -> BTreeMap<Uuid, VisitStats> {
    let mut stats: BTreeMap<Uuid, VisitStats> = BTreeMap::new();
    for appointment in appointments {
        let entry = stats.entry(appointment.patient_id).or_default();
        entry.total_appointments += 1;
        if appointment.status == AppointmentStatus::Completed {
            entry.last_visit = entry.last_visit.max(Some(appointment.date));
        }
    }
    stats
}

pub struct DentistPatientService {
    users: Arc<dyn UserStore>,
    profiles: Arc<dyn ProfileStore>,
    appointments: Arc<dyn AppointmentStore>,
}

impl DentistPatientService {
    pub fn new(state: &AppState) -> Self {
        Self {
            users: Arc::clone(&state.users),
            profiles: Arc::clone(&state.profiles),
            appointments: Arc::clone(&state.appointments),
        }
    }

    async fn profiles_by_user(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, PatientProfile>, DentistError> {
        Ok(self
            .profiles
            .list_patient_profiles(ids)
            .await?
            .into_iter()
            .map(|p| (p.user_id, p))
            .collect())
    }

    /// Patients who have at least one appointment with `dentist_id`, by name.
    pub async fn patients_of(&self, dentist_id: Uuid) -> Result<Vec<DentistPatient>, DentistError> {
        let appointments = self
            .appointments
            .find_by_dentist(dentist_id, &AppointmentFilter::default())
            .await?;
        let stats = visit_stats(&appointments);
        let ids: Vec<Uuid> = stats.keys().copied().collect();

        let users: Vec<UserAccount> = try_join_all(ids.iter().map(|id| self.users.find_user_by_id(*id)))
            .await?
            .into_iter()
            .flatten()
            .filter(|u| u.role == Role::Patient)
            .collect();
        let profiles = self.profiles_by_user(&ids).await?;

        let mut patients: Vec<DentistPatient> = users
            .iter()
            .map(|user| {
                let visits = stats.get(&user.id).copied().unwrap_or_default();
                DentistPatient {
                    patient: PatientSummary::new(user, profiles.get(&user.id)),
                    total_appointments: visits.total_appointments,
                    last_visit: visits.last_visit,
                }
            })
            .collect();
        patients.sort_by(|a, b| a.patient.name.cmp(&b.patient.name));

        debug!("Dentist {} has {} patients", dentist_id, patients.len());
        Ok(patients)
    }

    /// Every patient account, for picking one when scheduling.
    pub async fn all_patients(&self) -> Result<Vec<PatientSummary>, DentistError> {
        let users = self.users.find_users_by_role(Role::Patient).await?;
        let ids: Vec<Uuid> = users.iter().map(|u| u.id).collect();
        let profiles = self.profiles_by_user(&ids).await?;

        Ok(users
            .iter()
            .map(|u| PatientSummary::new(u, profiles.get(&u.id)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, Utc};

    fn appointment(patient_id: Uuid, day: u32, status: AppointmentStatus) -> Appointment {
        Appointment {
            id: Uuid::new_v4(),
            patient_id,
            dentist_id: Uuid::new_v4(),
            service_id: Uuid::new_v4(),
            date: NaiveDate::from_ymd_opt(2030, 5, day).unwrap(),
            time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            duration: 30,
            status,
            notes: String::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn last_visit_is_latest_completed_date() {
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let stats = visit_stats(&[
            appointment(alice, 3, AppointmentStatus::Completed),
            appointment(alice, 20, AppointmentStatus::Pending),
            appointment(alice, 9, AppointmentStatus::Completed),
            appointment(bob, 4, AppointmentStatus::Cancelled),
        ]);

        assert_eq!(stats[&alice].total_appointments, 3);
        assert_eq!(stats[&alice].last_visit, NaiveDate::from_ymd_opt(2030, 5, 9));
        assert_eq!(stats[&bob].total_appointments, 1);
        assert_eq!(stats[&bob].last_visit, None);
    }
}
