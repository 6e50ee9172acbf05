use chrono::{Duration, NaiveTime};

pub const SLOT_GRANULARITY_MINUTES: i64 = 30;

/// Start positions every 30 minutes from `start`, stopping before `end`.
///
/// Only raw positions are produced; whether an appointment of a given
/// duration fits before `end` is for the caller to decide.
pub fn generate_slots(start: NaiveTime, end: NaiveTime) -> Vec<NaiveTime> {
    let step = Duration::minutes(SLOT_GRANULARITY_MINUTES);
    let mut slots = Vec::new();
    let mut current = start;

    while current < end {
        slots.push(current);
        let (next, wrapped) = current.overflowing_add_signed(step);
        if wrapped != 0 {
            break;
        }
        current = next;
    }

    slots
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn nine_to_five_yields_sixteen_slots() {
        let slots = generate_slots(t(9, 0), t(17, 0));
        assert_eq!(slots.len(), 16);
        assert_eq!(slots.first(), Some(&t(9, 0)));
        assert_eq!(slots.last(), Some(&t(16, 30)));
        assert!(!slots.contains(&t(17, 0)));
    }

    #[test]
    fn empty_when_end_not_after_start() {
        assert!(generate_slots(t(18, 0), t(9, 0)).is_empty());
        assert!(generate_slots(t(9, 0), t(9, 0)).is_empty());
    }

    #[test]
    fn keeps_partial_last_position() {
        let slots = generate_slots(t(9, 0), t(10, 15));
        assert_eq!(slots, vec![t(9, 0), t(9, 30), t(10, 0)]);
    }

    #[test]
    fn stops_at_midnight() {
        let slots = generate_slots(t(23, 0), t(23, 59));
        assert_eq!(slots, vec![t(23, 0), t(23, 30)]);
    }
}
