//! Store implementation over Supabase's PostgREST API.
//!
//! The `appointments` table carries a partial unique index on
//! `("dentistId", "date", "time")` for slot-holding statuses
//! (see `migrations/0001_init.sql`); a racing insert surfaces as HTTP 409.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::appointment::{
    Appointment, AppointmentChanges, AppointmentFilter, NewAppointment, SLOT_HOLDING_STATUSES,
};
use shared_models::catalog::{DentistServiceOffering, Service, ServiceChanges};
use shared_models::clock::format_hhmm;
use shared_models::dentist::DentistProfile;
use shared_models::pagination::Page;
use shared_models::patient::PatientProfile;
use shared_models::user::{Role, UserAccount, UserChanges, UserFilter, UserStats};

use crate::error::{StoreError, StoreResult};
use crate::store::{
    AppointmentStore, CatalogStore, ProfileStore, UserStore, PHONE_TAKEN_MESSAGE, SLOT_TAKEN_MESSAGE,
};
use crate::supabase::SupabaseClient;

pub struct PostgrestStore {
    supabase: Arc<SupabaseClient>,
}

impl PostgrestStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
        }
    }

    async fn select<T: DeserializeOwned>(&self, table: &str, query: &str) -> StoreResult<Vec<T>> {
        let path = format!("/rest/v1/{}?{}", table, query);
        self.supabase.request(Method::GET, &path, None).await
    }

    async fn select_one<T: DeserializeOwned>(&self, table: &str, query: &str) -> StoreResult<Option<T>> {
        let rows: Vec<T> = self.select(table, &format!("{}&limit=1", query)).await?;
        Ok(rows.into_iter().next())
    }

    async fn insert<T: DeserializeOwned>(&self, table: &str, row: Value) -> StoreResult<T> {
        let path = format!("/rest/v1/{}", table);
        let rows: Vec<T> = self.supabase.request(Method::POST, &path, Some(row)).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::Backend(format!("Insert into {} returned no rows", table)))
    }

    async fn upsert<T: DeserializeOwned>(&self, table: &str, on_conflict: &str, row: Value) -> StoreResult<T> {
        let path = format!("/rest/v1/{}?on_conflict={}", table, on_conflict);
        let rows: Vec<T> = self
            .supabase
            .request_with_headers(
                Method::POST,
                &path,
                Some(row),
                &[("prefer", "return=representation,resolution=merge-duplicates")],
            )
            .await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::Backend(format!("Upsert into {} returned no rows", table)))
    }

    async fn patch<T: DeserializeOwned>(&self, table: &str, query: &str, body: Value, what: &str) -> StoreResult<T> {
        let path = format!("/rest/v1/{}?{}", table, query);
        let rows: Vec<T> = self.supabase.request(Method::PATCH, &path, Some(body)).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::NotFound(what.to_string()))
    }

    async fn delete(&self, table: &str, query: &str, what: &str) -> StoreResult<()> {
        let path = format!("/rest/v1/{}?{}", table, query);
        let rows: Vec<Value> = self.supabase.request(Method::DELETE, &path, None).await?;
        if rows.is_empty() {
            return Err(StoreError::NotFound(what.to_string()));
        }
        Ok(())
    }
}

fn to_row<T: Serialize>(value: &T) -> StoreResult<Value> {
    serde_json::to_value(value).map_err(|e| StoreError::Backend(format!("Failed to encode row: {}", e)))
}

fn with_conflict_message<T>(result: StoreResult<T>, message: &str) -> StoreResult<T> {
    result.map_err(|e| match e {
        StoreError::Conflict(_) => StoreError::Conflict(message.to_string()),
        other => other,
    })
}

fn slot_holding_filter() -> String {
    let statuses: Vec<&str> = SLOT_HOLDING_STATUSES.iter().map(|s| s.as_str()).collect();
    format!("status=in.({})", statuses.join(","))
}

fn id_list(ids: &[Uuid]) -> String {
    ids.iter().map(Uuid::to_string).collect::<Vec<_>>().join(",")
}

// ==============================================================================
// USERS
// ==============================================================================

#[async_trait]
impl UserStore for PostgrestStore {
    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<UserAccount>> {
        self.select_one("users", &format!("id=eq.{}", id)).await
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<UserAccount>> {
        self.select_one("users", &format!("email=eq.{}", urlencoding::encode(email)))
            .await
    }

    async fn find_users_by_role(&self, role: Role) -> StoreResult<Vec<UserAccount>> {
        self.select("users", &format!("role=eq.{}&order=name.asc", role)).await
    }

    async fn list_users(&self, filter: &UserFilter, page: Page) -> StoreResult<(Vec<UserAccount>, u64)> {
        let mut query = format!(
            "order=createdAt.desc&offset={}&limit={}",
            page.offset(),
            page.limit()
        );
        if let Some(role) = filter.role {
            query.push_str(&format!("&role=eq.{}", role));
        }
        if let Some(active) = filter.is_active {
            query.push_str(&format!("&isActive=eq.{}", active));
        }

        debug!("Listing users with query: {}", query);
        self.supabase
            .request_with_count(&format!("/rest/v1/users?{}", query))
            .await
    }

    async fn insert_user(&self, user: UserAccount) -> StoreResult<UserAccount> {
        let mut row = to_row(&user)?;
        row["passwordHash"] = json!(user.password_hash);

        let created = with_conflict_message(
            self.insert("users", row).await,
            "User with this email already exists",
        )?;
        info!("Created user {}", user.id);
        Ok(created)
    }

    async fn update_user(&self, id: Uuid, changes: &UserChanges) -> StoreResult<UserAccount> {
        let mut body = to_row(changes)?;
        body["updatedAt"] = json!(Utc::now());
        with_conflict_message(
            self.patch("users", &format!("id=eq.{}", id), body, "User").await,
            "Email is already in use",
        )
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<()> {
        self.delete("users", &format!("id=eq.{}", id), "User").await
    }

    async fn user_stats(&self) -> StoreResult<UserStats> {
        let users: Vec<Value> = self.select("users", "select=role,isActive").await?;
        let mut stats = UserStats::default();
        for user in &users {
            stats.total_users += 1;
            match user.get("role").and_then(Value::as_str) {
                Some("patient") => stats.total_patients += 1,
                Some("dentist") => stats.total_dentists += 1,
                Some("admin") => stats.total_admins += 1,
                _ => {}
            }
            if user.get("isActive").and_then(Value::as_bool).unwrap_or(false) {
                stats.active_users += 1;
            } else {
                stats.inactive_users += 1;
            }
        }
        Ok(stats)
    }
}

// ==============================================================================
// PROFILES
// ==============================================================================

#[async_trait]
impl ProfileStore for PostgrestStore {
    async fn get_dentist_profile(&self, user_id: Uuid) -> StoreResult<Option<DentistProfile>> {
        self.select_one("dentist_profiles", &format!("userId=eq.{}", user_id)).await
    }

    async fn list_dentist_profiles(&self, active_only: bool) -> StoreResult<Vec<DentistProfile>> {
        let query = if active_only { "isActive=eq.true" } else { "select=*" };
        self.select("dentist_profiles", query).await
    }

    async fn find_dentist_by_license(&self, license_number: &str) -> StoreResult<Option<DentistProfile>> {
        self.select_one(
            "dentist_profiles",
            &format!("licenseNumber=eq.{}", urlencoding::encode(license_number)),
        )
        .await
    }

    async fn save_dentist_profile(&self, profile: DentistProfile) -> StoreResult<DentistProfile> {
        let row = to_row(&profile)?;
        with_conflict_message(
            self.upsert("dentist_profiles", "userId", row).await,
            "License number already exists",
        )
    }

    async fn replace_dentist_profile(
        &self,
        profile: DentistProfile,
        seen: DateTime<Utc>,
    ) -> StoreResult<Option<DentistProfile>> {
        let path = format!(
            "/rest/v1/dentist_profiles?userId=eq.{}&updatedAt=eq.{}",
            profile.user_id,
            urlencoding::encode(&seen.to_rfc3339_opts(SecondsFormat::Micros, true)),
        );
        let row = to_row(&profile)?;
        let rows: Vec<DentistProfile> = with_conflict_message(
            self.supabase.request(Method::PATCH, &path, Some(row)).await,
            "License number already exists",
        )?;
        Ok(rows.into_iter().next())
    }

    async fn delete_dentist_profile(&self, user_id: Uuid) -> StoreResult<()> {
        let path = format!("/rest/v1/dentist_profiles?userId=eq.{}", user_id);
        let _: Vec<Value> = self.supabase.request(Method::DELETE, &path, None).await?;
        Ok(())
    }

    async fn get_patient_profile(&self, user_id: Uuid) -> StoreResult<Option<PatientProfile>> {
        self.select_one("patient_profiles", &format!("userId=eq.{}", user_id)).await
    }

    async fn find_patient_by_phone(&self, phone: &str) -> StoreResult<Option<PatientProfile>> {
        self.select_one("patient_profiles", &format!("phone=eq.{}", urlencoding::encode(phone)))
            .await
    }

    async fn list_patient_profiles(&self, user_ids: &[Uuid]) -> StoreResult<Vec<PatientProfile>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        self.select("patient_profiles", &format!("userId=in.({})", id_list(user_ids)))
            .await
    }

    async fn save_patient_profile(&self, profile: PatientProfile) -> StoreResult<PatientProfile> {
        let row = to_row(&profile)?;
        with_conflict_message(
            self.upsert("patient_profiles", "userId", row).await,
            PHONE_TAKEN_MESSAGE,
        )
    }

    async fn delete_patient_profile(&self, user_id: Uuid) -> StoreResult<()> {
        let path = format!("/rest/v1/patient_profiles?userId=eq.{}", user_id);
        let _: Vec<Value> = self.supabase.request(Method::DELETE, &path, None).await?;
        Ok(())
    }
}

// ==============================================================================
// CATALOG
// ==============================================================================

#[async_trait]
impl CatalogStore for PostgrestStore {
    async fn get_service(&self, id: Uuid) -> StoreResult<Option<Service>> {
        self.select_one("services", &format!("id=eq.{}", id)).await
    }

    async fn find_service_by_name(&self, name: &str) -> StoreResult<Option<Service>> {
        self.select_one("services", &format!("name=ilike.{}", urlencoding::encode(name)))
            .await
    }

    async fn list_services(&self, active_only: bool) -> StoreResult<Vec<Service>> {
        let query = if active_only {
            "isActive=eq.true&order=name.asc"
        } else {
            "order=name.asc"
        };
        self.select("services", query).await
    }

    async fn insert_service(&self, service: Service) -> StoreResult<Service> {
        let row = to_row(&service)?;
        with_conflict_message(
            self.insert("services", row).await,
            "Service with this name already exists",
        )
    }

    async fn update_service(&self, id: Uuid, changes: &ServiceChanges) -> StoreResult<Service> {
        let mut body = to_row(changes)?;
        body["updatedAt"] = json!(Utc::now());
        with_conflict_message(
            self.patch("services", &format!("id=eq.{}", id), body, "Service").await,
            "Service with this name already exists",
        )
    }

    async fn delete_service(&self, id: Uuid) -> StoreResult<()> {
        self.delete("services", &format!("id=eq.{}", id), "Service").await
    }

    async fn get_dentist_service_offering(
        &self,
        dentist_id: Uuid,
        service_id: Uuid,
    ) -> StoreResult<Option<DentistServiceOffering>> {
        self.select_one(
            "dentist_services",
            &format!("dentistId=eq.{}&serviceId=eq.{}", dentist_id, service_id),
        )
        .await
    }

    async fn list_offerings_for_dentist(&self, dentist_id: Uuid) -> StoreResult<Vec<DentistServiceOffering>> {
        self.select(
            "dentist_services",
            &format!("dentistId=eq.{}&order=createdAt.desc", dentist_id),
        )
        .await
    }

    async fn count_offerings_for_service(&self, service_id: Uuid) -> StoreResult<u64> {
        let path = format!(
            "/rest/v1/dentist_services?serviceId=eq.{}&select=id&limit=1",
            service_id
        );
        let (_, total): (Vec<Value>, u64) = self.supabase.request_with_count(&path).await?;
        Ok(total)
    }

    async fn insert_offering(&self, offering: DentistServiceOffering) -> StoreResult<DentistServiceOffering> {
        let row = to_row(&offering)?;
        with_conflict_message(
            self.insert("dentist_services", row).await,
            "Service is already assigned to this dentist",
        )
    }

    async fn delete_offering(&self, dentist_id: Uuid, service_id: Uuid) -> StoreResult<()> {
        self.delete(
            "dentist_services",
            &format!("dentistId=eq.{}&serviceId=eq.{}", dentist_id, service_id),
            "Service assignment",
        )
        .await
    }
}

// ==============================================================================
// APPOINTMENTS
// ==============================================================================

#[async_trait]
impl AppointmentStore for PostgrestStore {
    async fn find_appointment(&self, id: Uuid) -> StoreResult<Option<Appointment>> {
        self.select_one("appointments", &format!("id=eq.{}", id)).await
    }

    async fn find_conflicting(
        &self,
        dentist_id: Uuid,
        date: NaiveDate,
        time: NaiveTime,
        exclude_id: Option<Uuid>,
    ) -> StoreResult<Vec<Appointment>> {
        let mut query = format!(
            "dentistId=eq.{}&date=eq.{}&time=eq.{}&{}",
            dentist_id,
            date,
            format_hhmm(time),
            slot_holding_filter()
        );
        if let Some(id) = exclude_id {
            query.push_str(&format!("&id=neq.{}", id));
        }
        self.select("appointments", &query).await
    }

    async fn find_slot_holders_on(&self, dentist_id: Uuid, date: NaiveDate) -> StoreResult<Vec<Appointment>> {
        self.select(
            "appointments",
            &format!("dentistId=eq.{}&date=eq.{}&{}", dentist_id, date, slot_holding_filter()),
        )
        .await
    }

    async fn create_appointment(&self, appointment: NewAppointment) -> StoreResult<Appointment> {
        let row = to_row(&appointment.into_appointment(Uuid::new_v4()))?;
        with_conflict_message(self.insert("appointments", row).await, SLOT_TAKEN_MESSAGE)
    }

    async fn update_appointment(&self, id: Uuid, changes: &AppointmentChanges) -> StoreResult<Appointment> {
        let mut body = to_row(changes)?;
        body["updatedAt"] = json!(Utc::now());
        with_conflict_message(
            self.patch("appointments", &format!("id=eq.{}", id), body, "Appointment").await,
            SLOT_TAKEN_MESSAGE,
        )
    }

    async fn find_by_patient(&self, patient_id: Uuid) -> StoreResult<Vec<Appointment>> {
        self.select(
            "appointments",
            &format!("patientId=eq.{}&order=date.desc,time.desc", patient_id),
        )
        .await
    }

    async fn find_by_dentist(&self, dentist_id: Uuid, filter: &AppointmentFilter) -> StoreResult<Vec<Appointment>> {
        let mut query = format!("dentistId=eq.{}&order=date.asc,time.asc", dentist_id);
        if let Some(date) = filter.date {
            query.push_str(&format!("&date=eq.{}", date));
        }
        if let Some(status) = filter.status {
            query.push_str(&format!("&status=eq.{}", status));
        }
        self.select("appointments", &query).await
    }
}
