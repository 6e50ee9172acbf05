// libs/auth-cell/src/services/account.rs
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use shared_database::store::{ProfileStore, UserStore};
use shared_database::{AppState, StoreError};
use shared_models::patient::PatientProfile;
use shared_models::user::{normalize_email, Role, RoleProfile, UserAccount, UserChanges};
use shared_utils::jwt::{issue_refresh_token, issue_token, validate_refresh_token};
use shared_utils::password::{hash_password, verify_password};

use crate::models::{
    AccountSummary, AuthError, AuthSession, ChangePasswordRequest, CurrentAccount, LoginRequest,
    RefreshRequest, RegisterRequest, UpdateAccountRequest,
};

pub struct AuthService {
    users: Arc<dyn UserStore>,
    profiles: Arc<dyn ProfileStore>,
    jwt_secret: String,
    token_hours: i64,
    refresh_secret: String,
    refresh_hours: i64,
}

impl AuthService {
    pub fn new(state: &AppState) -> Self {
        Self {
            users: Arc::clone(&state.users),
            profiles: Arc::clone(&state.profiles),
            jwt_secret: state.config.jwt_secret.clone(),
            token_hours: state.config.jwt_expires_in_hours,
            refresh_secret: state.config.refresh_secret().to_string(),
            refresh_hours: state.config.jwt_refresh_expires_in_hours,
        }
    }

    /// Self-service sign-up. Always creates a patient.
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthSession, AuthError> {
        request.validate()?;

        let email = normalize_email(&request.email);
        let phone = request.phone.trim().to_string();
        if self.users.find_user_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }
        if self.profiles.find_patient_by_phone(&phone).await?.is_some() {
            return Err(AuthError::PhoneTaken);
        }

        let now = Utc::now();
        let user = self
            .users
            .insert_user(UserAccount {
                id: Uuid::new_v4(),
                name: request.name.trim().to_string(),
                email,
                password_hash: self.hash(&request.password)?,
                role: Role::Patient,
                is_active: true,
                created_at: now,
                updated_at: now,
            })
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => AuthError::EmailTaken,
                other => AuthError::Store(other),
            })?;

        let profile = PatientProfile {
            phone: Some(phone),
            birthdate: request.birthdate,
            gender: request.gender,
            address: request.address.map(|a| a.trim().to_string()),
            ..PatientProfile::empty(user.id)
        };
        if let Err(e) = self.profiles.save_patient_profile(profile).await {
            // Without a profile the account is unusable, so it goes too.
            if let Err(rollback) = self.users.delete_user(user.id).await {
                error!("Failed to roll back account {}: {}", user.id, rollback);
            }
            return Err(match e {
                StoreError::Conflict(_) => AuthError::PhoneTaken,
                other => AuthError::Store(other),
            });
        }

        info!("Registered patient {}", user.id);
        self.session(&user)
    }

    pub async fn login(&self, request: LoginRequest) -> Result<AuthSession, AuthError> {
        let email = normalize_email(&request.email);
        let user = self
            .users
            .find_user_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !user.is_active {
            warn!("Login attempt for deactivated account {}", user.id);
            return Err(AuthError::Deactivated);
        }

        let matches = verify_password(&request.password, &user.password_hash).unwrap_or_else(|e| {
            warn!("Stored password hash for {} is unreadable: {}", user.id, e);
            false
        });
        if !matches {
            warn!("Failed login for {}", user.id);
            return Err(AuthError::InvalidCredentials);
        }

        info!("User {} logged in", user.id);
        self.session(&user)
    }

    /// The signed-in account with its role profile.
    pub async fn current(&self, user_id: Uuid) -> Result<CurrentAccount, AuthError> {
        let user = self.active_user(user_id).await?;
        let profile = match user.role {
            Role::Patient => self.profiles.get_patient_profile(user_id).await?.map(RoleProfile::Patient),
            Role::Dentist => self.profiles.get_dentist_profile(user_id).await?.map(RoleProfile::Dentist),
            Role::Admin => None,
        };

        debug!("Loaded current account {}", user_id);
        Ok(CurrentAccount {
            account: AccountSummary::from(&user),
            profile,
        })
    }

    pub async fn update_account(
        &self,
        user_id: Uuid,
        request: UpdateAccountRequest,
    ) -> Result<AccountSummary, AuthError> {
        request.validate()?;
        self.active_user(user_id).await?;

        let changes = UserChanges {
            name: request.name.map(|n| n.trim().to_string()),
            email: request.email.as_deref().map(normalize_email),
            ..Default::default()
        };
        let user = self.users.update_user(user_id, &changes).await.map_err(|e| match e {
            StoreError::Conflict(_) => AuthError::EmailTaken,
            StoreError::NotFound(_) => AuthError::NotAuthorized,
            other => AuthError::Store(other),
        })?;

        info!("User {} updated their account", user_id);
        Ok(AccountSummary::from(&user))
    }

    pub async fn change_password(&self, user_id: Uuid, request: ChangePasswordRequest) -> Result<(), AuthError> {
        shared_utils::validation::validate_password(&request.new_password).map_err(AuthError::Validation)?;

        let user = self.active_user(user_id).await?;
        if !verify_password(&request.current_password, &user.password_hash).unwrap_or(false) {
            warn!("User {} supplied a wrong current password", user_id);
            return Err(AuthError::WrongPassword);
        }

        let changes = UserChanges {
            password_hash: Some(self.hash(&request.new_password)?),
            ..Default::default()
        };
        self.users.update_user(user_id, &changes).await?;

        info!("User {} changed their password", user_id);
        Ok(())
    }

    /// Issues a fresh session for the holder of a still-valid refresh token.
    /// Access tokens are refused here.
    pub async fn refresh(&self, request: RefreshRequest) -> Result<AuthSession, AuthError> {
        let token = request.refresh_token.ok_or(AuthError::MissingRefreshToken)?;
        let principal = validate_refresh_token(&token, &self.refresh_secret).map_err(|e| {
            debug!("Refresh rejected: {}", e);
            AuthError::InvalidRefreshToken
        })?;
        let user_id = Uuid::parse_str(&principal.id).map_err(|_| AuthError::InvalidRefreshToken)?;

        let user = self
            .active_user(user_id)
            .await
            .map_err(|_| AuthError::InvalidRefreshToken)?;

        debug!("Refreshed token for {}", user_id);
        self.session(&user)
    }

    async fn active_user(&self, user_id: Uuid) -> Result<UserAccount, AuthError> {
        self.users
            .find_user_by_id(user_id)
            .await?
            .filter(|u| u.is_active)
            .ok_or(AuthError::NotAuthorized)
    }

    fn hash(&self, password: &str) -> Result<String, AuthError> {
        hash_password(password).map_err(|e| {
            error!("Failed to hash password: {}", e);
            AuthError::PasswordHash
        })
    }

    fn session(&self, user: &UserAccount) -> Result<AuthSession, AuthError> {
        let token = issue_token(user, &self.jwt_secret, self.token_hours).map_err(AuthError::Token)?;
        let refresh_token =
            issue_refresh_token(user, &self.refresh_secret, self.refresh_hours).map_err(AuthError::Token)?;
        Ok(AuthSession {
            token,
            refresh_token,
            user: AccountSummary::from(user),
        })
    }
}
