use chrono::{DateTime, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::hhmm;

pub const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySchedule {
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
    pub is_working: bool,
}

impl DaySchedule {
    fn new(start: (u32, u32), end: (u32, u32), is_working: bool) -> Self {
        Self {
            start: NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap_or(NaiveTime::MIN),
            end: NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap_or(NaiveTime::MIN),
            is_working,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingHours {
    pub monday: DaySchedule,
    pub tuesday: DaySchedule,
    pub wednesday: DaySchedule,
    pub thursday: DaySchedule,
    pub friday: DaySchedule,
    pub saturday: DaySchedule,
    pub sunday: DaySchedule,
}

impl Default for WorkingHours {
    fn default() -> Self {
        let weekday = DaySchedule::new((9, 0), (17, 0), true);
        Self {
            monday: weekday,
            tuesday: weekday,
            wednesday: weekday,
            thursday: weekday,
            friday: weekday,
            saturday: DaySchedule::new((9, 0), (13, 0), false),
            sunday: DaySchedule::new((0, 0), (0, 0), false),
        }
    }
}

impl WorkingHours {
    pub fn day(&self, weekday: Weekday) -> &DaySchedule {
        match weekday {
            Weekday::Mon => &self.monday,
            Weekday::Tue => &self.tuesday,
            Weekday::Wed => &self.wednesday,
            Weekday::Thu => &self.thursday,
            Weekday::Fri => &self.friday,
            Weekday::Sat => &self.saturday,
            Weekday::Sun => &self.sunday,
        }
    }

    pub fn day_mut(&mut self, weekday: Weekday) -> &mut DaySchedule {
        match weekday {
            Weekday::Mon => &mut self.monday,
            Weekday::Tue => &mut self.tuesday,
            Weekday::Wed => &mut self.wednesday,
            Weekday::Thu => &mut self.thursday,
            Weekday::Fri => &mut self.friday,
            Weekday::Sat => &mut self.saturday,
            Weekday::Sun => &mut self.sunday,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideSlot {
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
    pub is_available: bool,
}

/// Exception to the weekly pattern for a single calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayAvailabilityOverride {
    pub date: NaiveDate,
    pub time_slots: Vec<OverrideSlot>,
}

impl DayAvailabilityOverride {
    /// `Some(flag)` when an override slot covers `time`.
    pub fn availability_at(&self, time: NaiveTime) -> Option<bool> {
        self.time_slots
            .iter()
            .find(|slot| slot.start <= time && time < slot.end)
            .map(|slot| slot.is_available)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Specialization {
    #[serde(rename = "General Dentistry")]
    GeneralDentistry,
    Orthodontics,
    Endodontics,
    Periodontics,
    Prosthodontics,
    #[serde(rename = "Oral Surgery")]
    OralSurgery,
    #[serde(rename = "Pediatric Dentistry")]
    PediatricDentistry,
    #[serde(rename = "Cosmetic Dentistry")]
    CosmeticDentistry,
    Implantology,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Education {
    pub degree: String,
    pub university: String,
    pub year: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DentistProfile {
    pub user_id: Uuid,
    pub license_number: String,
    pub specialization: Vec<Specialization>,
    pub experience: u32,
    pub education: Vec<Education>,
    pub bio: String,
    pub consultation_fee: f64,
    pub working_hours: WorkingHours,
    pub availability: Vec<DayAvailabilityOverride>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DentistProfile {
    pub fn new(user_id: Uuid, license_number: String) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            license_number,
            specialization: vec![Specialization::GeneralDentistry],
            experience: 0,
            education: Vec::new(),
            bio: String::new(),
            consultation_fee: 0.0,
            working_hours: WorkingHours::default(),
            availability: Vec::new(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn override_for(&self, date: NaiveDate) -> Option<&DayAvailabilityOverride> {
        self.availability.iter().find(|o| o.date == date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_week_works_monday_to_friday() {
        let hours = WorkingHours::default();
        for day in &WEEKDAYS[..5] {
            assert!(hours.day(*day).is_working, "{} should be working", weekday_name(*day));
        }
        assert!(!hours.saturday.is_working);
        assert!(!hours.sunday.is_working);
    }

    #[test]
    fn working_hours_use_hhmm_on_the_wire() {
        let json = serde_json::to_value(WorkingHours::default()).unwrap();
        assert_eq!(json["monday"]["start"], "09:00");
        assert_eq!(json["saturday"]["end"], "13:00");
        assert_eq!(json["sunday"]["isWorking"], false);
    }

    #[test]
    fn override_slot_covers_half_open_range() {
        let t = |h| NaiveTime::from_hms_opt(h, 0, 0).unwrap();
        let day = DayAvailabilityOverride {
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            time_slots: vec![OverrideSlot { start: t(12), end: t(14), is_available: false }],
        };
        assert_eq!(day.availability_at(t(12)), Some(false));
        assert_eq!(day.availability_at(t(14)), None);
    }
}
