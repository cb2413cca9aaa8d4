// libs/availability-cell/src/models.rs
use chrono::{NaiveDate, NaiveTime, Timelike, Weekday};
use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

pub const ALLOWED_SLOT_MINUTES: [u32; 4] = [15, 30, 45, 60];

// ==============================================================================
// SLOT MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    Available,
    Booked,
    Pending,
}

impl fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotStatus::Available => write!(f, "available"),
            SlotStatus::Booked => write!(f, "booked"),
            SlotStatus::Pending => write!(f, "pending"),
        }
    }
}

impl FromStr for SlotStatus {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "available" => Ok(SlotStatus::Available),
            "booked" => Ok(SlotStatus::Booked),
            "pending" => Ok(SlotStatus::Pending),
            other => Err(ScheduleError::UnknownStatus(other.to_string())),
        }
    }
}

/// One bookable interval on a given date. Built fresh for every query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeSlot {
    pub id: String,
    /// Wall-clock label, e.g. `09:00 AM`.
    pub time: String,
    pub status: SlotStatus,
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    pub duration_minutes: u32,
}

impl TimeSlot {
    pub fn new(date: NaiveDate, start: NaiveTime, duration_minutes: u32, status: SlotStatus) -> Self {
        Self {
            id: Self::slot_id(date, start),
            time: Self::time_label(start),
            status,
            start,
            duration_minutes,
        }
    }

    /// Ids are unique per date: `2025-06-23T0900`.
    pub fn slot_id(date: NaiveDate, start: NaiveTime) -> String {
        format!("{}T{}", date.format("%Y-%m-%d"), start.format("%H%M"))
    }

    pub fn time_label(start: NaiveTime) -> String {
        start.format("%I:%M %p").to_string()
    }

    pub fn is_available(&self) -> bool {
        self.status == SlotStatus::Available
    }
}

/// Status filter offered next to the slot grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlotFilter {
    #[default]
    All,
    Status(SlotStatus),
}

impl SlotFilter {
    pub fn matches(&self, slot: &TimeSlot) -> bool {
        match self {
            SlotFilter::All => true,
            SlotFilter::Status(status) => slot.status == *status,
        }
    }

    /// Keeps the input order.
    pub fn apply(&self, slots: &[TimeSlot]) -> Vec<TimeSlot> {
        slots.iter().filter(|slot| self.matches(slot)).cloned().collect()
    }
}

impl FromStr for SlotFilter {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(SlotFilter::All);
        }
        s.parse::<SlotStatus>().map(SlotFilter::Status)
    }
}

// ==============================================================================
// SCHEDULE CONFIGURATION MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkingHours {
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
    pub slot_minutes: u32,
}

impl Default for WorkingHours {
    fn default() -> Self {
        Self {
            start: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
            end: NaiveTime::from_hms_opt(17, 0, 0).unwrap_or(NaiveTime::MIN),
            slot_minutes: 30,
        }
    }
}

impl WorkingHours {
    /// Start times of every slot that fits entirely inside the window.
    pub fn slot_starts(&self) -> Vec<NaiveTime> {
        if self.slot_minutes == 0 {
            return Vec::new();
        }

        let start = self.start.num_seconds_from_midnight() / 60;
        let end = self.end.num_seconds_from_midnight() / 60;

        let mut starts = Vec::new();
        let mut current = start;
        while current + self.slot_minutes <= end {
            if let Some(time) = NaiveTime::from_num_seconds_from_midnight_opt(current * 60, 0) {
                starts.push(time);
            }
            current += self.slot_minutes;
        }
        starts
    }
}

/// Slot statuses keyed by slot start (`"HH:MM"` on the wire).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusOverrides(pub BTreeMap<NaiveTime, SlotStatus>);

impl StatusOverrides {
    pub fn get(&self, start: NaiveTime) -> Option<SlotStatus> {
        self.0.get(&start).copied()
    }

    pub fn times(&self) -> impl Iterator<Item = &NaiveTime> {
        self.0.keys()
    }
}

impl Serialize for StatusOverrides {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let raw: BTreeMap<String, SlotStatus> = self
            .0
            .iter()
            .map(|(time, status)| (time.format(hhmm::FORMAT).to_string(), *status))
            .collect();
        raw.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for StatusOverrides {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, SlotStatus>::deserialize(deserializer)?;
        raw.into_iter()
            .map(|(key, status)| {
                NaiveTime::parse_from_str(key.trim(), hhmm::FORMAT)
                    .map(|time| (time, status))
                    .map_err(|_| de::Error::custom(format!("invalid slot time {:?}, expected HH:MM", key)))
            })
            .collect::<Result<BTreeMap<_, _>, _>>()
            .map(StatusOverrides)
    }
}

/// Staff availability as loaded from the schedule file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ScheduleConfig {
    #[serde(default)]
    pub working_hours: WorkingHours,
    /// Recurring statuses per weekday, e.g. every Monday 11:00 booked.
    #[serde(default)]
    pub weekly: HashMap<Weekday, StatusOverrides>,
    /// One-off statuses for a specific date. These win over `weekly`.
    #[serde(default)]
    pub dates: BTreeMap<NaiveDate, StatusOverrides>,
    /// Dates with no availability at all.
    #[serde(default)]
    pub closures: BTreeSet<NaiveDate>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error("Working hours must start before they end ({start} >= {end})")]
    InvalidWorkingHours { start: NaiveTime, end: NaiveTime },

    #[error("Slot length must be one of 15, 30, 45 or 60 minutes, got {0}")]
    InvalidSlotLength(u32),

    #[error("Status override at {time} does not match any slot start")]
    UnknownSlot { time: NaiveTime },

    #[error("Unknown slot status: {0}")]
    UnknownStatus(String),

    #[error("Failed to read schedule file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse schedule: {0}")]
    Parse(#[from] serde_json::Error),
}

/// `"HH:MM"` serde for wall-clock times.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(raw.trim(), FORMAT).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn slot_labels_use_twelve_hour_clock() {
        assert_eq!(TimeSlot::time_label(time(9, 0)), "09:00 AM");
        assert_eq!(TimeSlot::time_label(time(12, 0)), "12:00 PM");
        assert_eq!(TimeSlot::time_label(time(13, 30)), "01:30 PM");
    }

    #[test]
    fn slot_starts_skip_partial_trailing_slot() {
        let hours = WorkingHours { start: time(9, 0), end: time(10, 40), slot_minutes: 45 };
        assert_eq!(hours.slot_starts(), vec![time(9, 0), time(9, 45)]);
    }

    #[test]
    fn slot_starts_do_not_wrap_past_midnight() {
        let hours = WorkingHours { start: time(22, 0), end: time(23, 59), slot_minutes: 60 };
        assert_eq!(hours.slot_starts(), vec![time(22, 0)]);
    }

    #[test]
    fn filter_parses_ui_values() {
        assert_eq!("all".parse::<SlotFilter>().unwrap(), SlotFilter::All);
        assert_eq!(
            "Booked".parse::<SlotFilter>().unwrap(),
            SlotFilter::Status(SlotStatus::Booked)
        );
        assert!("cancelled".parse::<SlotFilter>().is_err());
    }

    #[test]
    fn overrides_reject_malformed_keys() {
        let parsed: Result<StatusOverrides, _> = serde_json::from_str(r#"{"nine": "booked"}"#);
        assert!(parsed.is_err());

        let parsed: StatusOverrides = serde_json::from_str(r#"{"11:00": "booked"}"#).unwrap();
        assert_eq!(parsed.get(time(11, 0)), Some(SlotStatus::Booked));
    }
}
