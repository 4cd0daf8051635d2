//! Exhibition calendar and half-hour slot rules.
//!
//! The exhibition runs on a small fixed set of days. Each day has an operating
//! window `[start, end)` and bookings are placed on 30-minute boundaries inside
//! that window. A [`Slot`] is a `(date, time)` pair that passed those checks.

use crate::error::ValidationError;
use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Length of one bookable slot in minutes.
pub const SLOT_MINUTES: u32 = 30;

/// A wall-clock time rendered as `HH:MM`.
///
/// Accepts `HH:MM` and `HH:MM:SS` on input so values read back from a SQL
/// `TIME`/`TEXT` column round-trip cleanly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotTime(NaiveTime);

impl SlotTime {
    /// Builds a time from hour and minute, `None` when out of range.
    #[must_use]
    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
    }

    /// The underlying chrono time.
    #[must_use]
    pub const fn as_naive(&self) -> NaiveTime {
        self.0
    }

    /// `true` when the time sits on a :00 or :30 boundary.
    #[must_use]
    pub fn is_on_boundary(&self) -> bool {
        self.0.second() == 0 && self.0.minute() % SLOT_MINUTES == 0
    }

    fn plus_slot(self) -> Self {
        Self(self.0 + chrono::Duration::minutes(i64::from(SLOT_MINUTES)))
    }
}

impl fmt::Display for SlotTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}

impl FromStr for SlotTime {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        NaiveTime::parse_from_str(trimmed, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
            .map(Self)
            .map_err(|_| ValidationError::InvalidTime(s.to_string()))
    }
}

impl Serialize for SlotTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SlotTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A validated `(date, time)` pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Slot {
    /// Exhibition day.
    pub date: NaiveDate,
    /// Start of the half-hour slot.
    pub time: SlotTime,
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.date.format("%Y-%m-%d"), self.time)
    }
}

/// Operating hours of one exhibition day, end exclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct OperatingWindow {
    /// First bookable slot.
    pub start: SlotTime,
    /// Closing time; no slot may start at or after it.
    pub end: SlotTime,
}

impl OperatingWindow {
    /// `true` when `start <= time < end`.
    #[must_use]
    pub fn contains(&self, time: SlotTime) -> bool {
        self.start <= time && time < self.end
    }
}

/// One day of the exhibition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ExhibitionDay {
    /// Calendar day.
    pub date: NaiveDate,
    /// Operating hours on that day.
    #[serde(flatten)]
    pub window: OperatingWindow,
}

/// Availability of a single slot on a given day.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SlotAvailability {
    /// Slot start.
    pub time: SlotTime,
    /// `false` when some booking already occupies it.
    pub available: bool,
}

/// The fixed set of exhibition days.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ExhibitionCalendar {
    days: Vec<ExhibitionDay>,
}

impl ExhibitionCalendar {
    /// Builds a calendar from explicit days. Days are kept in date order.
    #[must_use]
    pub fn new(mut days: Vec<ExhibitionDay>) -> Self {
        days.sort_by_key(|d| d.date);
        days.dedup_by_key(|d| d.date);
        Self { days }
    }

    /// The February 2026 show: three full days and a shorter closing day.
    #[must_use]
    pub fn february_2026() -> Self {
        let full = (SlotTime::from_hm(10, 0), SlotTime::from_hm(18, 0));
        let closing = (SlotTime::from_hm(10, 0), SlotTime::from_hm(17, 0));
        let days = [(9, full), (10, full), (11, full), (12, closing)]
            .into_iter()
            .filter_map(|(day, (start, end))| {
                Some(ExhibitionDay {
                    date: NaiveDate::from_ymd_opt(2026, 2, day)?,
                    window: OperatingWindow {
                        start: start?,
                        end: end?,
                    },
                })
            })
            .collect();
        Self::new(days)
    }

    /// All exhibition days in order.
    #[must_use]
    pub fn days(&self) -> &[ExhibitionDay] {
        &self.days
    }

    /// Operating window for `date`, if it is an exhibition day.
    #[must_use]
    pub fn window(&self, date: NaiveDate) -> Option<&OperatingWindow> {
        self.days.iter().find(|d| d.date == date).map(|d| &d.window)
    }

    /// Checks that `(date, time)` is a bookable slot.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::DateNotOffered`] when `date` is not an exhibition day
    /// - [`ValidationError::NotOnSlotBoundary`] when `time` is not on :00 or :30
    /// - [`ValidationError::OutsideOperatingHours`] when `time` falls outside the window
    pub fn validate(&self, date: NaiveDate, time: SlotTime) -> Result<Slot, ValidationError> {
        let window = self
            .window(date)
            .ok_or(ValidationError::DateNotOffered(date))?;
        if !time.is_on_boundary() {
            return Err(ValidationError::NotOnSlotBoundary(time));
        }
        if !window.contains(time) {
            return Err(ValidationError::OutsideOperatingHours { date, time });
        }
        Ok(Slot { date, time })
    }

    /// Every slot start on `date`, in order. Empty for non-exhibition days.
    #[must_use]
    pub fn slots_for(&self, date: NaiveDate) -> Vec<SlotTime> {
        let Some(window) = self.window(date) else {
            return Vec::new();
        };
        let mut slots = Vec::new();
        let mut cursor = window.start;
        while cursor < window.end {
            slots.push(cursor);
            let next = cursor.plus_slot();
            // NaiveTime wraps at midnight
            if next <= cursor {
                break;
            }
            cursor = next;
        }
        slots
    }

    /// Marks each slot of `date` as free or taken given the occupied times.
    #[must_use]
    pub fn availability(
        &self,
        date: NaiveDate,
        occupied: &HashSet<SlotTime>,
    ) -> Vec<SlotAvailability> {
        self.slots_for(date)
            .into_iter()
            .map(|time| SlotAvailability {
                time,
                available: !occupied.contains(&time),
            })
            .collect()
    }
}

impl Default for ExhibitionCalendar {
    fn default() -> Self {
        Self::february_2026()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, day).unwrap()
    }

    fn time(s: &str) -> SlotTime {
        s.parse().unwrap()
    }

    #[test]
    fn parses_and_prints_hh_mm() {
        assert_eq!(time("09:30").to_string(), "09:30");
        assert_eq!(time("14:00:00").to_string(), "14:00");
        assert!("25:00".parse::<SlotTime>().is_err());
        assert!("noon".parse::<SlotTime>().is_err());
    }

    #[test]
    fn serde_uses_hh_mm() {
        let json = serde_json::to_string(&time("10:30")).unwrap();
        assert_eq!(json, "\"10:30\"");
        let back: SlotTime = serde_json::from_str("\"17:00\"").unwrap();
        assert_eq!(back, time("17:00"));
    }

    #[test]
    fn full_days_have_sixteen_slots() {
        let cal = ExhibitionCalendar::default();
        let slots = cal.slots_for(date(9));
        assert_eq!(slots.len(), 16);
        assert_eq!(slots.first(), Some(&time("10:00")));
        assert_eq!(slots.last(), Some(&time("17:30")));
    }

    #[test]
    fn closing_day_ends_an_hour_early() {
        let cal = ExhibitionCalendar::default();
        let slots = cal.slots_for(date(12));
        assert_eq!(slots.len(), 14);
        assert_eq!(slots.last(), Some(&time("16:30")));
        assert!(cal.validate(date(12), time("17:00")).is_err());
    }

    #[test]
    fn unknown_day_has_no_slots() {
        let cal = ExhibitionCalendar::default();
        assert!(cal.slots_for(date(13)).is_empty());
        assert!(matches!(
            cal.validate(date(13), time("10:00")),
            Err(ValidationError::DateNotOffered(_))
        ));
    }

    #[test]
    fn rejects_off_boundary_and_out_of_hours() {
        let cal = ExhibitionCalendar::default();
        assert!(matches!(
            cal.validate(date(10), time("10:15")),
            Err(ValidationError::NotOnSlotBoundary(_))
        ));
        assert!(matches!(
            cal.validate(date(10), time("09:30")),
            Err(ValidationError::OutsideOperatingHours { .. })
        ));
        assert!(matches!(
            cal.validate(date(10), time("18:00")),
            Err(ValidationError::OutsideOperatingHours { .. })
        ));
        assert!(cal.validate(date(10), time("17:30")).is_ok());
    }

    #[test]
    fn availability_marks_occupied_slots() {
        let cal = ExhibitionCalendar::default();
        let occupied: HashSet<_> = [time("10:00"), time("14:30")].into_iter().collect();
        let slots = cal.availability(date(11), &occupied);
        let taken: Vec<_> = slots.iter().filter(|s| !s.available).map(|s| s.time).collect();
        assert_eq!(taken, vec![time("10:00"), time("14:30")]);
        assert_eq!(slots.len(), 16);
    }

    proptest! {
        #[test]
        fn every_enumerated_slot_validates(day in 9u32..=12) {
            let cal = ExhibitionCalendar::default();
            for slot in cal.slots_for(date(day)) {
                prop_assert!(cal.validate(date(day), slot).is_ok());
            }
        }

        #[test]
        fn validate_agrees_with_enumeration(day in 1u32..=28, hour in 0u32..24, minute in 0u32..60) {
            let cal = ExhibitionCalendar::default();
            let t = SlotTime::from_hm(hour, minute).unwrap();
            let listed = cal.slots_for(date(day)).contains(&t);
            prop_assert_eq!(cal.validate(date(day), t).is_ok(), listed);
        }
    }
}
