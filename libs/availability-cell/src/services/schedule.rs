// libs/availability-cell/src/services/schedule.rs
use chrono::{Datelike, NaiveDate, NaiveTime};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::models::{
    ScheduleConfig, ScheduleError, SlotStatus, StatusOverrides, WorkingHours,
    ALLOWED_SLOT_MINUTES,
};

/// Staff availability as seen by the slot provider.
pub trait StaffSchedule: Send + Sync {
    /// Bookable window for `date`, or `None` when staff are not available that day.
    fn working_hours(&self, date: NaiveDate) -> Option<WorkingHours>;

    fn slot_status(&self, date: NaiveDate, start: NaiveTime) -> SlotStatus;
}

impl StaffSchedule for ScheduleConfig {
    fn working_hours(&self, date: NaiveDate) -> Option<WorkingHours> {
        if self.closures.contains(&date) {
            debug!("Schedule closed on {}", date);
            return None;
        }
        Some(self.working_hours)
    }

    fn slot_status(&self, date: NaiveDate, start: NaiveTime) -> SlotStatus {
        self.dates
            .get(&date)
            .and_then(|overrides| overrides.get(start))
            .or_else(|| {
                self.weekly
                    .get(&date.weekday())
                    .and_then(|overrides| overrides.get(start))
            })
            .unwrap_or(SlotStatus::Available)
    }
}

impl ScheduleConfig {
    pub fn from_json(raw: &str) -> Result<Self, ScheduleError> {
        let config: ScheduleConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ScheduleError> {
        let path = path.as_ref();
        debug!("Loading staff schedule from {}", path.display());

        let raw = fs::read_to_string(path)?;
        let config = Self::from_json(&raw)?;

        info!(
            "Loaded staff schedule: {} weekly rules, {} dated rules, {} closures",
            config.weekly.len(),
            config.dates.len(),
            config.closures.len()
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ScheduleError> {
        let hours = &self.working_hours;

        if hours.start >= hours.end {
            return Err(ScheduleError::InvalidWorkingHours {
                start: hours.start,
                end: hours.end,
            });
        }

        if !ALLOWED_SLOT_MINUTES.contains(&hours.slot_minutes) {
            return Err(ScheduleError::InvalidSlotLength(hours.slot_minutes));
        }

        let starts = hours.slot_starts();
        let all_overrides = self.weekly.values().chain(self.dates.values());
        for overrides in all_overrides {
            check_override_times(overrides, &starts)?;
        }

        Ok(())
    }
}

fn check_override_times(overrides: &StatusOverrides, starts: &[NaiveTime]) -> Result<(), ScheduleError> {
    match overrides.times().find(|time| !starts.contains(*time)) {
        Some(time) => Err(ScheduleError::UnknownSlot { time: *time }),
        None => Ok(()),
    }
}
