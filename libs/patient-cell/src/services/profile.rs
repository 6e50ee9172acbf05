// libs/patient-cell/src/services/profile.rs
use std::sync::Arc;

use tracing::{debug, error, info};
use uuid::Uuid;

use shared_database::store::{ProfileStore, UserStore};
use shared_database::{AppState, StoreError};
use shared_models::patient::PatientProfile;
use shared_models::user::{normalize_email, UserChanges};

use crate::models::{PatientError, PatientProfileView, UpdatePatientProfileRequest};

pub struct PatientProfileService {
    users: Arc<dyn UserStore>,
    profiles: Arc<dyn ProfileStore>,
}

impl PatientProfileService {
    pub fn new(state: &AppState) -> Self {
        Self {
            users: Arc::clone(&state.users),
            profiles: Arc::clone(&state.profiles),
        }
    }

    pub async fn get_profile(&self, patient_id: Uuid) -> Result<PatientProfileView, PatientError> {
        let user = self
            .users
            .find_user_by_id(patient_id)
            .await?
            .ok_or(PatientError::UserNotFound)?;
        let profile = self.profiles.get_patient_profile(patient_id).await?;

        debug!("Loaded profile for patient {}", patient_id);
        Ok(PatientProfileView::new(&user, profile.as_ref()))
    }

    /// Updates account fields and the patient profile, creating the profile
    /// if the account never had one.
    pub async fn update_profile(
        &self,
        patient_id: Uuid,
        request: UpdatePatientProfileRequest,
    ) -> Result<PatientProfileView, PatientError> {
        request.validate()?;

        if let Some(phone) = &request.phone {
            if let Some(holder) = self.profiles.find_patient_by_phone(phone.trim()).await? {
                if holder.user_id != patient_id {
                    return Err(PatientError::PhoneTaken);
                }
            }
        }

        let previous = self.profiles.get_patient_profile(patient_id).await?;
        let mut profile = previous.clone().unwrap_or_else(|| PatientProfile::empty(patient_id));
        request.apply(&mut profile);
        let profile = self
            .profiles
            .save_patient_profile(profile)
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => PatientError::PhoneTaken,
                other => PatientError::Store(other),
            })?;

        let changes = UserChanges {
            name: request.name.as_ref().map(|n| n.trim().to_string()),
            email: request.email.as_deref().map(normalize_email),
            ..Default::default()
        };
        let user = match self.users.update_user(patient_id, &changes).await {
            Ok(user) => user,
            Err(e) => {
                self.restore_profile(patient_id, previous).await;
                return Err(match e {
                    StoreError::NotFound(_) => PatientError::UserNotFound,
                    StoreError::Conflict(_) => PatientError::EmailTaken,
                    other => PatientError::Store(other),
                });
            }
        };

        info!("Updated profile for patient {}", patient_id);
        Ok(PatientProfileView::new(&user, Some(&profile)))
    }

    /// Puts the profile back the way it was after the account write failed.
    async fn restore_profile(&self, patient_id: Uuid, previous: Option<PatientProfile>) {
        let restored = match previous {
            Some(profile) => self.profiles.save_patient_profile(profile).await.map(|_| ()),
            None => self.profiles.delete_patient_profile(patient_id).await,
        };
        if let Err(e) = restored {
            error!("Failed to restore profile for patient {}: {}", patient_id, e);
        }
    }
}
