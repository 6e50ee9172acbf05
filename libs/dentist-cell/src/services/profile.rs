// libs/dentist-cell/src/services/profile.rs
use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_database::store::{ProfileStore, UserStore};
use shared_database::{AppState, StoreError};
use shared_models::dentist::{DayAvailabilityOverride, DentistProfile, WorkingHours};
use shared_models::user::Role;

use crate::models::{
    AvailabilityOverrideRequest, DentistCard, DentistError, DentistProfileView, UpdateDentistProfileRequest,
    UserSummary, WorkingHoursRequest,
};
use crate::services::working_hours::{validate_override, validate_working_hours};

const EDIT_ATTEMPTS: usize = 8;

/// Profile, weekly schedule and per-date overrides of a dentist.
pub struct DentistProfileService {
    users: Arc<dyn UserStore>,
    profiles: Arc<dyn ProfileStore>,
}

impl DentistProfileService {
    pub fn new(state: &AppState) -> Self {
        Self {
            users: Arc::clone(&state.users),
            profiles: Arc::clone(&state.profiles),
        }
    }

    async fn load(&self, dentist_id: Uuid) -> Result<DentistProfile, DentistError> {
        self.profiles
            .get_dentist_profile(dentist_id)
            .await?
            .ok_or(DentistError::ProfileNotFound)
    }

    /// Loads the profile, applies `change` and writes it back only if nobody
    /// wrote in between; otherwise starts over from a fresh copy.
    pub async fn modify_profile(
        &self,
        dentist_id: Uuid,
        mut change: impl FnMut(&mut DentistProfile) -> Result<(), DentistError>,
    ) -> Result<DentistProfile, DentistError> {
        for attempt in 1..=EDIT_ATTEMPTS {
            let mut profile = self.load(dentist_id).await?;
            let seen = profile.updated_at;
            change(&mut profile)?;
            profile.updated_at = Utc::now().max(seen + Duration::microseconds(1));

            let saved = self
                .profiles
                .replace_dentist_profile(profile, seen)
                .await
                .map_err(|e| match e {
                    StoreError::Conflict(_) => DentistError::LicenseTaken,
                    other => DentistError::Store(other),
                })?;
            match saved {
                Some(saved) => return Ok(saved),
                None => debug!("Profile of dentist {} moved on, attempt {}", dentist_id, attempt),
            }
        }

        warn!("Gave up editing profile of dentist {} after {} attempts", dentist_id, EDIT_ATTEMPTS);
        Err(DentistError::Store(StoreError::Conflict(
            "Profile was modified concurrently, please retry".to_string(),
        )))
    }

    pub async fn get_profile(&self, dentist_id: Uuid) -> Result<DentistProfileView, DentistError> {
        let profile = self.load(dentist_id).await?;
        let user = self
            .users
            .find_user_by_id(dentist_id)
            .await?
            .ok_or(DentistError::ProfileNotFound)?;

        Ok(DentistProfileView {
            profile,
            user: UserSummary::from(&user),
        })
    }

    pub async fn update_profile(
        &self,
        dentist_id: Uuid,
        request: UpdateDentistProfileRequest,
    ) -> Result<DentistProfileView, DentistError> {
        request.validate()?;

        if let Some(license) = &request.license_number {
            if let Some(holder) = self.profiles.find_dentist_by_license(license.trim()).await? {
                if holder.user_id != dentist_id {
                    warn!("Dentist {} tried to claim license held by {}", dentist_id, holder.user_id);
                    return Err(DentistError::LicenseTaken);
                }
            }
        }

        self.modify_profile(dentist_id, |profile| {
            request.apply(profile);
            Ok(())
        })
        .await?;

        info!("Updated profile of dentist {}", dentist_id);
        self.get_profile(dentist_id).await
    }

    /// Replaces the weekly schedule. Nothing is written unless every day validates.
    pub async fn set_working_hours(
        &self,
        dentist_id: Uuid,
        request: WorkingHoursRequest,
    ) -> Result<WorkingHours, DentistError> {
        let input = request
            .working_hours
            .ok_or_else(|| DentistError::InvalidWorkingHours("workingHours is required".to_string()))?;

        let saved = self
            .modify_profile(dentist_id, |profile| {
                profile.working_hours = validate_working_hours(&input, &profile.working_hours).inspect_err(|e| {
                    warn!("Rejected working hours for dentist {}: {}", dentist_id, e);
                })?;
                Ok(())
            })
            .await?;

        info!("Updated working hours of dentist {}", dentist_id);
        Ok(saved.working_hours)
    }

    // ==============================================================================
    // AVAILABILITY OVERRIDES
    // ==============================================================================

    pub async fn list_overrides(&self, dentist_id: Uuid) -> Result<Vec<DayAvailabilityOverride>, DentistError> {
        let mut overrides = self.load(dentist_id).await?.availability;
        overrides.sort_by_key(|o| o.date);
        Ok(overrides)
    }

    /// Stores the override for its date, replacing any previous one.
    pub async fn upsert_override(
        &self,
        dentist_id: Uuid,
        request: AvailabilityOverrideRequest,
    ) -> Result<DayAvailabilityOverride, DentistError> {
        let day = validate_override(&request)?;

        self.modify_profile(dentist_id, |profile| {
            profile.availability.retain(|o| o.date != day.date);
            profile.availability.push(day.clone());
            profile.availability.sort_by_key(|o| o.date);
            Ok(())
        })
        .await?;

        info!("Set availability override for dentist {} on {}", dentist_id, day.date);
        Ok(day)
    }

    pub async fn remove_override(&self, dentist_id: Uuid, date: NaiveDate) -> Result<(), DentistError> {
        self.modify_profile(dentist_id, |profile| {
            let before = profile.availability.len();
            profile.availability.retain(|o| o.date != date);
            if profile.availability.len() == before {
                return Err(DentistError::OverrideNotFound(date));
            }
            Ok(())
        })
        .await?;

        info!("Removed availability override for dentist {} on {}", dentist_id, date);
        Ok(())
    }

    // ==============================================================================
    // PUBLIC DIRECTORY
    // ==============================================================================

    /// Active dentists with an active profile, by name.
    pub async fn list_available(&self) -> Result<Vec<DentistCard>, DentistError> {
        let users = self.users.find_users_by_role(Role::Dentist).await?;
        let profiles: HashMap<Uuid, DentistProfile> = self
            .profiles
            .list_dentist_profiles(true)
            .await?
            .into_iter()
            .map(|p| (p.user_id, p))
            .collect();

        let cards: Vec<DentistCard> = users
            .iter()
            .filter(|u| u.is_active)
            .filter_map(|u| profiles.get(&u.id).map(|p| DentistCard::new(u, p)))
            .collect();

        debug!("Listing {} available dentists", cards.len());
        Ok(cards)
    }
}
