// libs/admin-cell/src/services/users.rs
use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_database::store::{ProfileStore, UserStore};
use shared_database::{AppState, StoreError};
use shared_models::pagination::{Page, Pagination};
use shared_models::patient::PatientProfile;
use shared_models::user::{Role, RoleProfile, UserAccount, UserChanges, UserFilter, UserStats};

use crate::models::{AdminError, UserWithProfile};

pub struct UserAdminService {
    users: Arc<dyn UserStore>,
    profiles: Arc<dyn ProfileStore>,
}

impl UserAdminService {
    pub fn new(state: &AppState) -> Self {
        Self {
            users: Arc::clone(&state.users),
            profiles: Arc::clone(&state.profiles),
        }
    }

    pub async fn stats(&self) -> Result<UserStats, AdminError> {
        Ok(self.users.user_stats().await?)
    }

    /// Newest accounts first.
    pub async fn list_users(
        &self,
        role: Option<Role>,
        page: Page,
    ) -> Result<(Vec<UserAccount>, Pagination), AdminError> {
        let filter = UserFilter { role, ..Default::default() };
        let (users, total) = self.users.list_users(&filter, page).await?;

        debug!("Listed {} of {} users (role filter: {:?})", users.len(), total, role);
        Ok((users, Pagination::new(page, total)))
    }

    pub async fn get_user(&self, id: Uuid) -> Result<UserWithProfile, AdminError> {
        let user = self.load(id).await?;
        let profile = match user.role {
            Role::Dentist => self.profiles.get_dentist_profile(id).await?.map(RoleProfile::Dentist),
            Role::Patient => self.profiles.get_patient_profile(id).await?.map(RoleProfile::Patient),
            Role::Admin => None,
        };
        Ok(UserWithProfile { user, profile })
    }

    pub async fn update_role(&self, actor: Uuid, id: Uuid, role: Role) -> Result<UserAccount, AdminError> {
        if actor == id {
            warn!("Admin {} attempted to change their own role", actor);
            return Err(AdminError::OwnAccount("change your own role"));
        }

        let changes = UserChanges { role: Some(role), ..Default::default() };
        let user = self.update(id, &changes).await?;

        info!("User {} is now {}", id, role);
        Ok(user)
    }

    pub async fn set_active(&self, actor: Uuid, id: Uuid, is_active: bool) -> Result<UserAccount, AdminError> {
        if actor == id {
            warn!("Admin {} attempted to change their own status", actor);
            return Err(AdminError::OwnAccount("change your own status"));
        }

        let changes = UserChanges { is_active: Some(is_active), ..Default::default() };
        let user = self.update(id, &changes).await?;

        info!("User {} {}", id, if is_active { "activated" } else { "deactivated" });
        Ok(user)
    }

    /// Removes the account and any profile it accumulated, including one left
    /// over from an earlier role.
    pub async fn delete_user(&self, actor: Uuid, id: Uuid) -> Result<(), AdminError> {
        if actor == id {
            warn!("Admin {} attempted to delete their own account", actor);
            return Err(AdminError::OwnAccount("delete your own account"));
        }

        let user = self.load(id).await?;
        self.profiles.delete_dentist_profile(id).await?;
        self.profiles.delete_patient_profile(id).await?;
        self.users.delete_user(id).await?;

        info!("Deleted {} account {}", user.role, id);
        Ok(())
    }

    pub async fn list_patients(
        &self,
        page: Page,
    ) -> Result<(Vec<UserWithProfile<PatientProfile>>, Pagination), AdminError> {
        let filter = UserFilter { role: Some(Role::Patient), ..Default::default() };
        let (users, total) = self.users.list_users(&filter, page).await?;

        let ids: Vec<Uuid> = users.iter().map(|u| u.id).collect();
        let mut profiles: HashMap<Uuid, PatientProfile> = self
            .profiles
            .list_patient_profiles(&ids)
            .await?
            .into_iter()
            .map(|p| (p.user_id, p))
            .collect();

        let patients = users
            .into_iter()
            .map(|user| {
                let profile = profiles.remove(&user.id);
                UserWithProfile { user, profile }
            })
            .collect();

        Ok((patients, Pagination::new(page, total)))
    }

    async fn load(&self, id: Uuid) -> Result<UserAccount, AdminError> {
        self.users
            .find_user_by_id(id)
            .await?
            .ok_or(AdminError::UserNotFound)
    }

    async fn update(&self, id: Uuid, changes: &UserChanges) -> Result<UserAccount, AdminError> {
        self.users.update_user(id, changes).await.map_err(|e| match e {
            StoreError::NotFound(_) => AdminError::UserNotFound,
            other => AdminError::Store(other),
        })
    }
}
