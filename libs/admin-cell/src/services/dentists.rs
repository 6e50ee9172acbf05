// libs/admin-cell/src/services/dentists.rs
use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use dentist_cell::models::DentistError;
use dentist_cell::services::profile::DentistProfileService;
use shared_database::store::{ProfileStore, UserStore};
use shared_database::{AppState, StoreError};
use shared_models::dentist::DentistProfile;
use shared_models::pagination::{Page, Pagination};
use shared_models::user::{normalize_email, Role, UserAccount, UserChanges, UserFilter};
use shared_utils::password::hash_password;

use crate::models::{AdminError, CreateDentistRequest, UpdateDentistRequest, UserWithProfile};

pub type DentistAccount = UserWithProfile<DentistProfile>;

/// Staff management for dentist accounts and their profiles.
pub struct DentistAdminService {
    users: Arc<dyn UserStore>,
    profiles: Arc<dyn ProfileStore>,
    dentists: DentistProfileService,
}

impl DentistAdminService {
    pub fn new(state: &AppState) -> Self {
        Self {
            users: Arc::clone(&state.users),
            profiles: Arc::clone(&state.profiles),
            dentists: DentistProfileService::new(state),
        }
    }

    pub async fn list(&self, page: Page) -> Result<(Vec<DentistAccount>, Pagination), AdminError> {
        let filter = UserFilter { role: Some(Role::Dentist), ..Default::default() };
        let (users, total) = self.users.list_users(&filter, page).await?;

        let mut profiles: HashMap<Uuid, DentistProfile> = self
            .profiles
            .list_dentist_profiles(false)
            .await?
            .into_iter()
            .map(|p| (p.user_id, p))
            .collect();

        let dentists: Vec<DentistAccount> = users
            .into_iter()
            .map(|user| {
                let profile = profiles.remove(&user.id);
                UserWithProfile { user, profile }
            })
            .collect();

        debug!("Listed {} of {} dentists", dentists.len(), total);
        Ok((dentists, Pagination::new(page, total)))
    }

    /// Creates the login and the dentist profile together.
    pub async fn create(&self, request: CreateDentistRequest) -> Result<DentistAccount, AdminError> {
        request.validate()?;

        let email = normalize_email(&request.email);
        if self.users.find_user_by_email(&email).await?.is_some() {
            return Err(AdminError::EmailTaken);
        }
        let license = request.license_number.trim();
        if self.profiles.find_dentist_by_license(license).await?.is_some() {
            return Err(AdminError::LicenseTaken);
        }

        let password_hash = hash_password(&request.password).map_err(|e| {
            error!("Failed to hash dentist password: {}", e);
            AdminError::PasswordHash
        })?;

        let now = Utc::now();
        let user = self
            .users
            .insert_user(UserAccount {
                id: Uuid::new_v4(),
                name: request.name.trim().to_string(),
                email,
                password_hash,
                role: Role::Dentist,
                is_active: true,
                created_at: now,
                updated_at: now,
            })
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => AdminError::EmailTaken,
                other => AdminError::Store(other),
            })?;

        let mut profile = DentistProfile::new(user.id, license.to_string());
        request.profile_fields().apply(&mut profile);

        let profile = match self.profiles.save_dentist_profile(profile).await {
            Ok(profile) => profile,
            Err(e) => {
                warn!("Rolling back dentist account {} after profile failure: {}", user.id, e);
                self.users.delete_user(user.id).await?;
                return Err(match e {
                    StoreError::Conflict(_) => AdminError::LicenseTaken,
                    other => AdminError::Store(other),
                });
            }
        };

        info!("Created dentist {} with license {}", user.id, profile.license_number);
        Ok(UserWithProfile { user, profile: Some(profile) })
    }

    pub async fn update(&self, id: Uuid, request: UpdateDentistRequest) -> Result<DentistAccount, AdminError> {
        request.validate()?;

        let mut user = self.load_dentist(id).await?;
        let profile = self
            .profiles
            .get_dentist_profile(id)
            .await?
            .ok_or(AdminError::Dentist(DentistError::ProfileNotFound))?;

        if let Some(license) = &request.profile.license_number {
            let license = license.trim();
            if license != profile.license_number
                && self.profiles.find_dentist_by_license(license).await?.is_some()
            {
                return Err(AdminError::LicenseTaken);
            }
        }

        if let Some(name) = &request.name {
            let changes = UserChanges { name: Some(name.trim().to_string()), ..Default::default() };
            user = self.users.update_user(id, &changes).await?;
        }

        let profile = self
            .dentists
            .modify_profile(id, |profile| {
                request.profile.apply(profile);
                if let Some(active) = request.is_active {
                    profile.is_active = active;
                }
                Ok(())
            })
            .await
            .map_err(|e| match e {
                DentistError::LicenseTaken => AdminError::LicenseTaken,
                other => AdminError::Dentist(other),
            })?;

        info!("Admin updated dentist {}", id);
        Ok(UserWithProfile { user, profile: Some(profile) })
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AdminError> {
        self.load_dentist(id).await?;
        self.profiles.delete_dentist_profile(id).await?;
        self.users.delete_user(id).await?;

        info!("Deleted dentist {}", id);
        Ok(())
    }

    async fn load_dentist(&self, id: Uuid) -> Result<UserAccount, AdminError> {
        self.users
            .find_user_by_id(id)
            .await?
            .filter(|u| u.role == Role::Dentist)
            .ok_or(AdminError::DentistNotFound)
    }
}
