//! Persistence contracts consumed by the cells.
//!
//! `AppointmentStore::create_appointment` and `update_appointment` must reject
//! a write that would leave two slot-holding appointments on the same
//! `(dentist_id, date, time)` with `StoreError::Conflict`, atomically with the
//! write itself.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

use shared_models::appointment::{Appointment, AppointmentChanges, AppointmentFilter, NewAppointment};
use shared_models::catalog::{DentistServiceOffering, Service, ServiceChanges};
use shared_models::dentist::DentistProfile;
use shared_models::pagination::Page;
use shared_models::patient::PatientProfile;
use shared_models::user::{Role, UserAccount, UserChanges, UserFilter, UserStats};

use crate::error::StoreResult;

pub const SLOT_TAKEN_MESSAGE: &str = "This time slot is already booked";
pub const PHONE_TAKEN_MESSAGE: &str = "Phone number is already registered";

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<UserAccount>>;

    /// Lookup by normalized (lowercase) email.
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<UserAccount>>;

    async fn find_users_by_role(&self, role: Role) -> StoreResult<Vec<UserAccount>>;

    /// Newest first, with the total number of matches.
    async fn list_users(&self, filter: &UserFilter, page: Page) -> StoreResult<(Vec<UserAccount>, u64)>;

    async fn insert_user(&self, user: UserAccount) -> StoreResult<UserAccount>;

    async fn update_user(&self, id: Uuid, changes: &UserChanges) -> StoreResult<UserAccount>;

    async fn delete_user(&self, id: Uuid) -> StoreResult<()>;

    async fn user_stats(&self) -> StoreResult<UserStats>;
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_dentist_profile(&self, user_id: Uuid) -> StoreResult<Option<DentistProfile>>;

    async fn list_dentist_profiles(&self, active_only: bool) -> StoreResult<Vec<DentistProfile>>;

    async fn find_dentist_by_license(&self, license_number: &str) -> StoreResult<Option<DentistProfile>>;

    /// Inserts or replaces the whole profile in one write.
    async fn save_dentist_profile(&self, profile: DentistProfile) -> StoreResult<DentistProfile>;

    /// Replaces an existing profile only while its stored `updated_at` is still
    /// `seen`. `Ok(None)` means another write landed first, or the profile is gone.
    async fn replace_dentist_profile(
        &self,
        profile: DentistProfile,
        seen: DateTime<Utc>,
    ) -> StoreResult<Option<DentistProfile>>;

    async fn delete_dentist_profile(&self, user_id: Uuid) -> StoreResult<()>;

    async fn get_patient_profile(&self, user_id: Uuid) -> StoreResult<Option<PatientProfile>>;

    async fn find_patient_by_phone(&self, phone: &str) -> StoreResult<Option<PatientProfile>>;

    async fn list_patient_profiles(&self, user_ids: &[Uuid]) -> StoreResult<Vec<PatientProfile>>;

    async fn save_patient_profile(&self, profile: PatientProfile) -> StoreResult<PatientProfile>;

    async fn delete_patient_profile(&self, user_id: Uuid) -> StoreResult<()>;
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn get_service(&self, id: Uuid) -> StoreResult<Option<Service>>;

    /// Case-insensitive name lookup.
    async fn find_service_by_name(&self, name: &str) -> StoreResult<Option<Service>>;

    async fn list_services(&self, active_only: bool) -> StoreResult<Vec<Service>>;

    async fn insert_service(&self, service: Service) -> StoreResult<Service>;

    async fn update_service(&self, id: Uuid, changes: &ServiceChanges) -> StoreResult<Service>;

    async fn delete_service(&self, id: Uuid) -> StoreResult<()>;

    async fn get_dentist_service_offering(
        &self,
        dentist_id: Uuid,
        service_id: Uuid,
    ) -> StoreResult<Option<DentistServiceOffering>>;

    async fn list_offerings_for_dentist(&self, dentist_id: Uuid) -> StoreResult<Vec<DentistServiceOffering>>;

    async fn count_offerings_for_service(&self, service_id: Uuid) -> StoreResult<u64>;

    async fn insert_offering(&self, offering: DentistServiceOffering) -> StoreResult<DentistServiceOffering>;

    async fn delete_offering(&self, dentist_id: Uuid, service_id: Uuid) -> StoreResult<()>;
}

#[async_trait]
pub trait AppointmentStore: Send + Sync {
    async fn find_appointment(&self, id: Uuid) -> StoreResult<Option<Appointment>>;

    /// Slot-holding appointments on `(dentist_id, date, time)`, minus `exclude_id`.
    async fn find_conflicting(
        &self,
        dentist_id: Uuid,
        date: NaiveDate,
        time: NaiveTime,
        exclude_id: Option<Uuid>,
    ) -> StoreResult<Vec<Appointment>>;

    /// Slot-holding appointments for a dentist on one date.
    async fn find_slot_holders_on(&self, dentist_id: Uuid, date: NaiveDate) -> StoreResult<Vec<Appointment>>;

    async fn create_appointment(&self, appointment: NewAppointment) -> StoreResult<Appointment>;

    async fn update_appointment(&self, id: Uuid, changes: &AppointmentChanges) -> StoreResult<Appointment>;

    /// Most recent first.
    async fn find_by_patient(&self, patient_id: Uuid) -> StoreResult<Vec<Appointment>>;

    /// Chronological.
    async fn find_by_dentist(&self, dentist_id: Uuid, filter: &AppointmentFilter) -> StoreResult<Vec<Appointment>>;
}
