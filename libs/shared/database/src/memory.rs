use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use shared_models::appointment::{Appointment, AppointmentChanges, AppointmentFilter, NewAppointment};
use shared_models::catalog::{DentistServiceOffering, Service, ServiceChanges};
use shared_models::dentist::DentistProfile;
use shared_models::pagination::Page;
use shared_models::patient::PatientProfile;
use shared_models::user::{Role, UserAccount, UserChanges, UserFilter, UserStats};

use crate::error::{StoreError, StoreResult};
use crate::store::{
    AppointmentStore, CatalogStore, ProfileStore, UserStore, PHONE_TAKEN_MESSAGE, SLOT_TAKEN_MESSAGE,
};

/// Process-local store used when no database is configured and in tests.
#[derive(Default)]
pub struct InMemoryStore {
    users: RwLock<HashMap<Uuid, UserAccount>>,
    dentists: RwLock<HashMap<Uuid, DentistProfile>>,
    patients: RwLock<HashMap<Uuid, PatientProfile>>,
    services: RwLock<HashMap<Uuid, Service>>,
    offerings: RwLock<HashMap<Uuid, DentistServiceOffering>>,
    appointments: RwLock<HashMap<Uuid, Appointment>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

// ==============================================================================
// USERS
// ==============================================================================

#[async_trait]
impl UserStore for InMemoryStore {
    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<UserAccount>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<UserAccount>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_users_by_role(&self, role: Role) -> StoreResult<Vec<UserAccount>> {
        let users = self.users.read().await;
        let mut found: Vec<UserAccount> = users.values().filter(|u| u.role == role).cloned().collect();
        found.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(found)
    }

    async fn list_users(&self, filter: &UserFilter, page: Page) -> StoreResult<(Vec<UserAccount>, u64)> {
        let users = self.users.read().await;
        let mut matching: Vec<&UserAccount> = users.values().filter(|u| filter.matches(u)).collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(page.offset())
            .take(page.limit())
            .cloned()
            .collect();
        Ok((items, total))
    }

    async fn insert_user(&self, user: UserAccount) -> StoreResult<UserAccount> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict("User with this email already exists".to_string()));
        }
        users.insert(user.id, user.clone());
        debug!("Inserted user {}", user.id);
        Ok(user)
    }

    async fn update_user(&self, id: Uuid, changes: &UserChanges) -> StoreResult<UserAccount> {
        let mut users = self.users.write().await;
        if let Some(email) = &changes.email {
            if users.values().any(|u| u.id != id && &u.email == email) {
                return Err(StoreError::Conflict("Email is already in use".to_string()));
            }
        }
        let user = users.get_mut(&id).ok_or_else(|| StoreError::NotFound("User".to_string()))?;
        changes.apply(user);
        Ok(user.clone())
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<()> {
        self.users
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound("User".to_string()))
    }

    async fn user_stats(&self) -> StoreResult<UserStats> {
        Ok(UserStats::from_users(self.users.read().await.values()))
    }
}

// ==============================================================================
// PROFILES
// ==============================================================================

#[async_trait]
impl ProfileStore for InMemoryStore {
    async fn get_dentist_profile(&self, user_id: Uuid) -> StoreResult<Option<DentistProfile>> {
        Ok(self.dentists.read().await.get(&user_id).cloned())
    }

    async fn list_dentist_profiles(&self, active_only: bool) -> StoreResult<Vec<DentistProfile>> {
        let dentists = self.dentists.read().await;
        Ok(dentists
            .values()
            .filter(|d| !active_only || d.is_active)
            .cloned()
            .collect())
    }

    async fn find_dentist_by_license(&self, license_number: &str) -> StoreResult<Option<DentistProfile>> {
        let dentists = self.dentists.read().await;
        Ok(dentists.values().find(|d| d.license_number == license_number).cloned())
    }

    async fn save_dentist_profile(&self, profile: DentistProfile) -> StoreResult<DentistProfile> {
        let mut dentists = self.dentists.write().await;
        if dentists
            .values()
            .any(|d| d.user_id != profile.user_id && d.license_number == profile.license_number)
        {
            return Err(StoreError::Conflict("License number already exists".to_string()));
        }
        dentists.insert(profile.user_id, profile.clone());
        Ok(profile)
    }

    async fn replace_dentist_profile(
        &self,
        profile: DentistProfile,
        seen: DateTime<Utc>,
    ) -> StoreResult<Option<DentistProfile>> {
        let mut dentists = self.dentists.write().await;
        match dentists.get(&profile.user_id) {
            Some(current) if current.updated_at == seen => {}
            _ => {
                debug!("Dentist profile {} changed since {}", profile.user_id, seen);
                return Ok(None);
            }
        }
        if dentists
            .values()
            .any(|d| d.user_id != profile.user_id && d.license_number == profile.license_number)
        {
            return Err(StoreError::Conflict("License number already exists".to_string()));
        }
        dentists.insert(profile.user_id, profile.clone());
        Ok(Some(profile))
    }

    async fn delete_dentist_profile(&self, user_id: Uuid) -> StoreResult<()> {
        self.dentists.write().await.remove(&user_id);
        Ok(())
    }

    async fn get_patient_profile(&self, user_id: Uuid) -> StoreResult<Option<PatientProfile>> {
        Ok(self.patients.read().await.get(&user_id).cloned())
    }

    async fn find_patient_by_phone(&self, phone: &str) -> StoreResult<Option<PatientProfile>> {
        let patients = self.patients.read().await;
        Ok(patients
            .values()
            .find(|p| p.phone.as_deref() == Some(phone))
            .cloned())
    }

    async fn list_patient_profiles(&self, user_ids: &[Uuid]) -> StoreResult<Vec<PatientProfile>> {
        let patients = self.patients.read().await;
        Ok(user_ids.iter().filter_map(|id| patients.get(id).cloned()).collect())
    }

    async fn save_patient_profile(&self, profile: PatientProfile) -> StoreResult<PatientProfile> {
        let mut patients = self.patients.write().await;
        if let Some(phone) = profile.phone.as_deref() {
            if patients
                .values()
                .any(|p| p.user_id != profile.user_id && p.phone.as_deref() == Some(phone))
            {
                return Err(StoreError::Conflict(PHONE_TAKEN_MESSAGE.to_string()));
            }
        }
        patients.insert(profile.user_id, profile.clone());
        Ok(profile)
    }

    async fn delete_patient_profile(&self, user_id: Uuid) -> StoreResult<()> {
        self.patients.write().await.remove(&user_id);
        Ok(())
    }
}

// ==============================================================================
// CATALOG
// ==============================================================================

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn get_service(&self, id: Uuid) -> StoreResult<Option<Service>> {
        Ok(self.services.read().await.get(&id).cloned())
    }

    async fn find_service_by_name(&self, name: &str) -> StoreResult<Option<Service>> {
        let services = self.services.read().await;
        Ok(services
            .values()
            .find(|s| s.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    async fn list_services(&self, active_only: bool) -> StoreResult<Vec<Service>> {
        let services = self.services.read().await;
        let mut found: Vec<Service> = services
            .values()
            .filter(|s| !active_only || s.is_active)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(found)
    }

    async fn insert_service(&self, service: Service) -> StoreResult<Service> {
        let mut services = self.services.write().await;
        if services.values().any(|s| s.name.eq_ignore_ascii_case(&service.name)) {
            return Err(StoreError::Conflict("Service with this name already exists".to_string()));
        }
        services.insert(service.id, service.clone());
        Ok(service)
    }

    async fn update_service(&self, id: Uuid, changes: &ServiceChanges) -> StoreResult<Service> {
        let mut services = self.services.write().await;
        if let Some(name) = &changes.name {
            if services.values().any(|s| s.id != id && s.name.eq_ignore_ascii_case(name)) {
                return Err(StoreError::Conflict("Service with this name already exists".to_string()));
            }
        }
        let service = services.get_mut(&id).ok_or_else(|| StoreError::NotFound("Service".to_string()))?;
        changes.apply(service);
        Ok(service.clone())
    }

    async fn delete_service(&self, id: Uuid) -> StoreResult<()> {
        self.services
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound("Service".to_string()))
    }

    async fn get_dentist_service_offering(
        &self,
        dentist_id: Uuid,
        service_id: Uuid,
    ) -> StoreResult<Option<DentistServiceOffering>> {
        let offerings = self.offerings.read().await;
        Ok(offerings
            .values()
            .find(|o| o.dentist_id == dentist_id && o.service_id == service_id)
            .cloned())
    }

    async fn list_offerings_for_dentist(&self, dentist_id: Uuid) -> StoreResult<Vec<DentistServiceOffering>> {
        let offerings = self.offerings.read().await;
        let mut found: Vec<DentistServiceOffering> = offerings
            .values()
            .filter(|o| o.dentist_id == dentist_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn count_offerings_for_service(&self, service_id: Uuid) -> StoreResult<u64> {
        let offerings = self.offerings.read().await;
        Ok(offerings.values().filter(|o| o.service_id == service_id).count() as u64)
    }

    async fn insert_offering(&self, offering: DentistServiceOffering) -> StoreResult<DentistServiceOffering> {
        let mut offerings = self.offerings.write().await;
        if offerings
            .values()
            .any(|o| o.dentist_id == offering.dentist_id && o.service_id == offering.service_id)
        {
            return Err(StoreError::Conflict("Service is already assigned to this dentist".to_string()));
        }
        offerings.insert(offering.id, offering.clone());
        Ok(offering)
    }

    async fn delete_offering(&self, dentist_id: Uuid, service_id: Uuid) -> StoreResult<()> {
        let mut offerings = self.offerings.write().await;
        let id = offerings
            .values()
            .find(|o| o.dentist_id == dentist_id && o.service_id == service_id)
            .map(|o| o.id)
            .ok_or_else(|| StoreError::NotFound("Service assignment".to_string()))?;
        offerings.remove(&id);
        Ok(())
    }
}

// ==============================================================================
// APPOINTMENTS
// ==============================================================================

#[async_trait]
impl AppointmentStore for InMemoryStore {
    async fn find_appointment(&self, id: Uuid) -> StoreResult<Option<Appointment>> {
        Ok(self.appointments.read().await.get(&id).cloned())
    }

    async fn find_conflicting(
        &self,
        dentist_id: Uuid,
        date: NaiveDate,
        time: NaiveTime,
        exclude_id: Option<Uuid>,
    ) -> StoreResult<Vec<Appointment>> {
        let appointments = self.appointments.read().await;
        Ok(appointments
            .values()
            .filter(|a| Some(a.id) != exclude_id && a.holds_slot(dentist_id, date, time))
            .cloned()
            .collect())
    }

    async fn find_slot_holders_on(&self, dentist_id: Uuid, date: NaiveDate) -> StoreResult<Vec<Appointment>> {
        let appointments = self.appointments.read().await;
        Ok(appointments
            .values()
            .filter(|a| a.dentist_id == dentist_id && a.date == date && a.status.is_slot_holding())
            .cloned()
            .collect())
    }

    async fn create_appointment(&self, appointment: NewAppointment) -> StoreResult<Appointment> {
        // Check and insert under the same write guard.
        let mut appointments = self.appointments.write().await;
        if appointment.status.is_slot_holding()
            && appointments
                .values()
                .any(|a| a.holds_slot(appointment.dentist_id, appointment.date, appointment.time))
        {
            return Err(StoreError::Conflict(SLOT_TAKEN_MESSAGE.to_string()));
        }
        let created = appointment.into_appointment(Uuid::new_v4());
        appointments.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_appointment(&self, id: Uuid, changes: &AppointmentChanges) -> StoreResult<Appointment> {
        let mut appointments = self.appointments.write().await;
        let mut updated = appointments
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound("Appointment".to_string()))?;
        changes.apply(&mut updated);

        if updated.status.is_slot_holding()
            && appointments
                .values()
                .any(|a| a.id != id && a.holds_slot(updated.dentist_id, updated.date, updated.time))
        {
            return Err(StoreError::Conflict(SLOT_TAKEN_MESSAGE.to_string()));
        }
        appointments.insert(id, updated.clone());
        Ok(updated)
    }

    async fn find_by_patient(&self, patient_id: Uuid) -> StoreResult<Vec<Appointment>> {
        let appointments = self.appointments.read().await;
        let mut found: Vec<Appointment> = appointments
            .values()
            .filter(|a| a.patient_id == patient_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| (b.date, b.time).cmp(&(a.date, a.time)));
        Ok(found)
    }

    async fn find_by_dentist(&self, dentist_id: Uuid, filter: &AppointmentFilter) -> StoreResult<Vec<Appointment>> {
        let appointments = self.appointments.read().await;
        let mut found: Vec<Appointment> = appointments
            .values()
            .filter(|a| a.dentist_id == dentist_id && filter.matches(a))
            .cloned()
            .collect();
        found.sort_by(|a, b| (a.date, a.time).cmp(&(b.date, b.time)));
        Ok(found)
    }
}
