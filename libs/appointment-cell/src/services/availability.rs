// libs/appointment-cell/src/services/availability.rs
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDate, NaiveTime};
use tracing::{debug, instrument};
use uuid::Uuid;

use shared_database::store::{AppointmentStore, ProfileStore};
use shared_database::AppState;
use shared_models::appointment::AppointmentFilter;
use shared_models::dentist::DentistProfile;

use crate::models::{
    AppointmentError, AvailabilityRange, DayAvailability, DayStatus, DaySummary, RangeTotals, SlotView,
};
use crate::services::slots::generate_slots;

pub const DEFAULT_RANGE_DAYS: i64 = 7;
pub const MAX_RANGE_DAYS: i64 = 62;
/// A day is `limited` when at most this share of its slots is still free.
pub const LIMITED_THRESHOLD_PERCENT: usize = 30;

pub fn classify_day(available: usize, total: usize) -> DayStatus {
    if available == 0 {
        DayStatus::FullyBooked
    } else if available * 100 <= total * LIMITED_THRESHOLD_PERCENT {
        DayStatus::Limited
    } else {
        DayStatus::Available
    }
}

fn unavailable(date: NaiveDate, reason: String) -> DayAvailability {
    DayAvailability {
        date,
        day_of_week: date.format("%A").to_string(),
        status: DayStatus::Unavailable,
        reason: Some(reason),
        slots: Vec::new(),
        total_slots: 0,
        available_slots: 0,
    }
}

/// The day's start positions and whether the schedule opens each one, or
/// the reason the dentist takes no appointments that day.
fn scheduled_positions(profile: &DentistProfile, date: NaiveDate) -> Result<Vec<(NaiveTime, bool)>, String> {
    if !profile.is_active {
        return Err("Dentist is not currently accepting appointments".to_string());
    }

    let schedule = profile.working_hours.day(date.weekday());
    if !schedule.is_working {
        return Err(format!("Dentist does not work on {}", date.format("%A")));
    }

    let day_override = profile.override_for(date);
    Ok(generate_slots(schedule.start, schedule.end)
        .into_iter()
        .map(|time| {
            let open = day_override
                .and_then(|o| o.availability_at(time))
                .unwrap_or(true);
            (time, open)
        })
        .collect())
}

/// Rejects a start time that is not one of the dentist's open positions on
/// `date`. Bookings are not considered here.
pub fn ensure_offered(profile: &DentistProfile, date: NaiveDate, time: NaiveTime) -> Result<(), AppointmentError> {
    let positions = scheduled_positions(profile, date).map_err(AppointmentError::ValidationError)?;
    if positions.iter().any(|&(position, open)| open && position == time) {
        return Ok(());
    }
    Err(AppointmentError::ValidationError(format!(
        "{} is not an available time for this dentist on {}",
        time.format("%H:%M"),
        date
    )))
}

/// Resolves one day from the dentist's weekly hours, the date's override,
/// and the start times already reserved on that date.
pub fn resolve_day(profile: &DentistProfile, date: NaiveDate, booked: &HashSet<NaiveTime>) -> DayAvailability {
    let positions = match scheduled_positions(profile, date) {
        Ok(positions) => positions,
        Err(reason) => return unavailable(date, reason),
    };

    let slots: Vec<SlotView> = positions
        .into_iter()
        .map(|(time, open)| SlotView::new(time, open && !booked.contains(&time)))
        .collect();

    let total_slots = slots.len();
    let available_slots = slots.iter().filter(|s| s.is_available).count();

    DayAvailability {
        date,
        day_of_week: date.format("%A").to_string(),
        status: classify_day(available_slots, total_slots),
        reason: None,
        slots,
        total_slots,
        available_slots,
    }
}

pub struct AvailabilityService {
    profiles: Arc<dyn ProfileStore>,
    appointments: Arc<dyn AppointmentStore>,
}

impl AvailabilityService {
    pub fn new(state: &AppState) -> Self {
        Self {
            profiles: state.profiles.clone(),
            appointments: state.appointments.clone(),
        }
    }

    async fn dentist_profile(&self, dentist_id: Uuid) -> Result<DentistProfile, AppointmentError> {
        self.profiles
            .get_dentist_profile(dentist_id)
            .await?
            .ok_or(AppointmentError::DentistNotFound)
    }

    /// Slot-by-slot view of a single date.
    #[instrument(skip(self))]
    pub async fn available_slots(
        &self,
        dentist_id: Option<Uuid>,
        date: Option<NaiveDate>,
    ) -> Result<DayAvailability, AppointmentError> {
        let (dentist_id, date) = match (dentist_id, date) {
            (Some(id), Some(date)) => (id, date),
            _ => {
                return Err(AppointmentError::ValidationError(
                    "Dentist ID and date are required".to_string(),
                ))
            }
        };

        let profile = self.dentist_profile(dentist_id).await?;
        let booked: HashSet<NaiveTime> = self
            .appointments
            .find_slot_holders_on(dentist_id, date)
            .await?
            .into_iter()
            .map(|a| a.time)
            .collect();

        let day = resolve_day(&profile, date, &booked);
        debug!(
            "Dentist {} on {}: {:?}, {}/{} slots free",
            dentist_id, date, day.status, day.available_slots, day.total_slots
        );
        Ok(day)
    }

    /// Per-day summary over an inclusive date range, defaulting to the week from `today`.
    #[instrument(skip(self))]
    pub async fn doctor_availability(
        &self,
        dentist_id: Option<Uuid>,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
        today: NaiveDate,
    ) -> Result<AvailabilityRange, AppointmentError> {
        let dentist_id = dentist_id
            .ok_or_else(|| AppointmentError::ValidationError("Dentist ID is required".to_string()))?;

        let start = start_date.unwrap_or(today);
        let end = end_date.unwrap_or(start + Duration::days(DEFAULT_RANGE_DAYS - 1));
        if end < start {
            return Err(AppointmentError::ValidationError(
                "End date must be on or after start date".to_string(),
            ));
        }
        if (end - start).num_days() + 1 > MAX_RANGE_DAYS {
            return Err(AppointmentError::ValidationError(format!(
                "Date range cannot exceed {} days",
                MAX_RANGE_DAYS
            )));
        }

        let profile = self.dentist_profile(dentist_id).await?;

        let mut booked: HashMap<NaiveDate, HashSet<NaiveTime>> = HashMap::new();
        for appointment in self
            .appointments
            .find_by_dentist(dentist_id, &AppointmentFilter::default())
            .await?
        {
            if appointment.status.is_slot_holding() && appointment.date >= start && appointment.date <= end {
                booked.entry(appointment.date).or_default().insert(appointment.time);
            }
        }

        let empty = HashSet::new();
        let mut totals = RangeTotals::default();
        let days: Vec<DaySummary> = start
            .iter_days()
            .take_while(|date| *date <= end)
            .map(|date| {
                let day = resolve_day(&profile, date, booked.get(&date).unwrap_or(&empty));
                totals.total_days += 1;
                totals.total_slots += day.total_slots;
                totals.available_slots += day.available_slots;
                match day.status {
                    DayStatus::Available => totals.available_days += 1,
                    DayStatus::Limited => totals.limited_days += 1,
                    DayStatus::FullyBooked => totals.fully_booked_days += 1,
                    DayStatus::Unavailable => totals.unavailable_days += 1,
                }
                DaySummary::from(day)
            })
            .collect();

        Ok(AvailabilityRange {
            dentist_id,
            start_date: start,
            end_date: end,
            days,
            summary: totals,
        })
    }
}
