// libs/dentist-cell/src/services/working_hours.rs
use chrono::NaiveTime;

use shared_models::clock::parse_hhmm;
use shared_models::dentist::{
    weekday_name, DayAvailabilityOverride, DaySchedule, OverrideSlot, WorkingHours, WEEKDAYS,
};

use crate::models::{AvailabilityOverrideRequest, DentistError, WorkingHoursInput};

fn invalid(message: String) -> DentistError {
    DentistError::InvalidWorkingHours(message)
}

/// Validates a full week and builds the schedule to persist.
///
/// Days are checked Monday to Sunday and the first violation is returned.
/// A non-working day keeps whatever well-formed times it was sent, falling
/// back to the `current` schedule for that day.
pub fn validate_working_hours(
    input: &WorkingHoursInput,
    current: &WorkingHours,
) -> Result<WorkingHours, DentistError> {
    let mut hours = current.clone();

    for weekday in WEEKDAYS {
        let name = weekday_name(weekday);
        let day = input
            .day(weekday)
            .ok_or_else(|| invalid(format!("workingHours.{} is required", name)))?;
        let is_working = day.is_working.unwrap_or(false);
        let previous = *current.day(weekday);

        let schedule = if is_working {
            let start = required_time(day.start.as_deref(), name, "start")?;
            let end = required_time(day.end.as_deref(), name, "end")?;
            if start >= end {
                return Err(invalid(format!("workingHours.{}.end must be after start", name)));
            }
            DaySchedule { start, end, is_working }
        } else {
            DaySchedule {
                start: day.start.as_deref().and_then(parse_hhmm).unwrap_or(previous.start),
                end: day.end.as_deref().and_then(parse_hhmm).unwrap_or(previous.end),
                is_working,
            }
        };

        *hours.day_mut(weekday) = schedule;
    }

    Ok(hours)
}

fn required_time(raw: Option<&str>, day: &str, field: &str) -> Result<NaiveTime, DentistError> {
    let raw = raw.ok_or_else(|| invalid(format!("workingHours.{}.{} is required", day, field)))?;
    parse_hhmm(raw).ok_or_else(|| invalid(format!("workingHours.{}.{} must be in HH:MM format", day, field)))
}

/// Slots of one override must be well-formed, non-empty and non-overlapping.
pub fn validate_override(request: &AvailabilityOverrideRequest) -> Result<DayAvailabilityOverride, DentistError> {
    let mut slots = Vec::with_capacity(request.time_slots.len());

    for (i, slot) in request.time_slots.iter().enumerate() {
        let start = parse_hhmm(&slot.start).ok_or_else(|| {
            DentistError::Validation(format!("timeSlots[{}].start must be in HH:MM format", i))
        })?;
        let end = parse_hhmm(&slot.end).ok_or_else(|| {
            DentistError::Validation(format!("timeSlots[{}].end must be in HH:MM format", i))
        })?;
        if start >= end {
            return Err(DentistError::Validation(format!(
                "timeSlots[{}].end must be after start",
                i
            )));
        }
        slots.push(OverrideSlot {
            start,
            end,
            is_available: slot.is_available,
        });
    }

    slots.sort_by_key(|s| s.start);
    if slots.windows(2).any(|pair| pair[1].start < pair[0].end) {
        return Err(DentistError::Validation("Time slots must not overlap".to_string()));
    }

    Ok(DayAvailabilityOverride {
        date: request.date,
        time_slots: slots,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DayInput, OverrideSlotInput};
    use assert_matches::assert_matches;
    use chrono::NaiveDate;

    fn day(start: &str, end: &str, working: bool) -> Option<DayInput> {
        Some(DayInput {
            start: Some(start.to_string()),
            end: Some(end.to_string()),
            is_working: Some(working),
        })
    }

    fn full_week() -> WorkingHoursInput {
        WorkingHoursInput {
            monday: day("08:00", "16:00", true),
            tuesday: day("08:00", "16:00", true),
            wednesday: day("08:00", "12:00", true),
            thursday: day("08:00", "16:00", true),
            friday: day("08:00", "14:00", true),
            saturday: day("09:00", "13:00", false),
            sunday: day("00:00", "00:00", false),
        }
    }

    fn message(err: DentistError) -> String {
        match err {
            DentistError::InvalidWorkingHours(msg) => msg,
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn accepts_a_full_week() {
        let hours = validate_working_hours(&full_week(), &WorkingHours::default()).unwrap();
        assert_eq!(hours.monday.start, NaiveTime::from_hms_opt(8, 0, 0).unwrap());
        assert_eq!(hours.wednesday.end, NaiveTime::from_hms_opt(12, 0, 0).unwrap());
        assert!(!hours.saturday.is_working);
    }

    #[test]
    fn rejects_end_before_start() {
        let mut week = full_week();
        week.monday = day("18:00", "09:00", true);
        let err = validate_working_hours(&week, &WorkingHours::default()).unwrap_err();
        assert_eq!(message(err), "workingHours.monday.end must be after start");
    }

    #[test]
    fn rejects_equal_start_and_end() {
        let mut week = full_week();
        week.thursday = day("10:00", "10:00", true);
        let err = validate_working_hours(&week, &WorkingHours::default()).unwrap_err();
        assert_eq!(message(err), "workingHours.thursday.end must be after start");
    }

    #[test]
    fn requires_every_day() {
        let mut week = full_week();
        week.friday = None;
        let err = validate_working_hours(&week, &WorkingHours::default()).unwrap_err();
        assert_eq!(message(err), "workingHours.friday is required");
    }

    #[test]
    fn reports_malformed_times_by_field() {
        let mut week = full_week();
        week.tuesday = day("8am", "16:00", true);
        let err = validate_working_hours(&week, &WorkingHours::default()).unwrap_err();
        assert_eq!(message(err), "workingHours.tuesday.start must be in HH:MM format");

        week.tuesday = Some(DayInput {
            start: Some("08:00".to_string()),
            end: None,
            is_working: Some(true),
        });
        let err = validate_working_hours(&week, &WorkingHours::default()).unwrap_err();
        assert_eq!(message(err), "workingHours.tuesday.end is required");
    }

    #[test]
    fn first_violation_wins() {
        let mut week = full_week();
        week.monday = day("25:00", "09:00", true);
        week.sunday = None;
        let err = validate_working_hours(&week, &WorkingHours::default()).unwrap_err();
        assert_eq!(message(err), "workingHours.monday.start must be in HH:MM format");
    }

    #[test]
    fn non_working_day_ignores_bad_times() {
        let mut week = full_week();
        week.sunday = Some(DayInput {
            start: Some("whenever".to_string()),
            end: None,
            is_working: Some(false),
        });
        let current = WorkingHours::default();
        let hours = validate_working_hours(&week, &current).unwrap();
        assert_eq!(hours.sunday, current.sunday);
    }

    #[test]
    fn override_slots_are_sorted_and_checked_for_overlap() {
        let slot = |start: &str, end: &str, available| OverrideSlotInput {
            start: start.to_string(),
            end: end.to_string(),
            is_available: available,
        };
        let date = NaiveDate::from_ymd_opt(2030, 3, 4).unwrap();

        let ok = validate_override(&AvailabilityOverrideRequest {
            date,
            time_slots: vec![slot("14:00", "15:00", false), slot("09:00", "10:00", false)],
        })
        .unwrap();
        assert_eq!(ok.time_slots[0].start, NaiveTime::from_hms_opt(9, 0, 0).unwrap());

        let overlapping = validate_override(&AvailabilityOverrideRequest {
            date,
            time_slots: vec![slot("09:00", "11:00", false), slot("10:30", "12:00", true)],
        });
        assert_matches!(overlapping, Err(DentistError::Validation(_)));

        let inverted = validate_override(&AvailabilityOverrideRequest {
            date,
            time_slots: vec![slot("12:00", "11:00", false)],
        });
        assert_matches!(inverted, Err(DentistError::Validation(_)));
    }
}
