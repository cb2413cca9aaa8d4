use std::io::Write;
use std::path::PathBuf;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde_json::json;
use tempfile::NamedTempFile;

use shared_config::AppConfig;
use shared_models::UserRole;

pub struct TestDates;

impl TestDates {
    /// Fixed "today" for repeatable runs: Wednesday 2025-06-18.
    pub fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 18).expect("valid fixture date")
    }

    pub fn yesterday() -> NaiveDate {
        Self::today() - Duration::days(1)
    }

    /// First `weekday` strictly after today.
    pub fn next(weekday: Weekday) -> NaiveDate {
        Self::today()
            .iter_days()
            .skip(1)
            .find(|date| date.weekday() == weekday)
            .expect("a matching weekday within a week")
    }

    pub fn next_monday() -> NaiveDate {
        Self::next(Weekday::Mon)
    }

    pub fn next_tuesday() -> NaiveDate {
        Self::next(Weekday::Tue)
    }

    pub fn next_saturday() -> NaiveDate {
        Self::next(Weekday::Sat)
    }
}

pub struct TestConfig {
    pub schedule_path: Option<PathBuf>,
    pub student_max_bookings: Option<u32>,
    pub staff_max_bookings: Option<u32>,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            schedule_path: None,
            student_max_bookings: Some(2),
            staff_max_bookings: None,
        }
    }
}

impl TestConfig {
    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            schedule_path: self.schedule_path.clone(),
            student_max_bookings: self.student_max_bookings,
            staff_max_bookings: self.staff_max_bookings,
        }
    }
}

pub struct TestUser {
    pub role: UserRole,
    pub bookings_made: u32,
}

impl TestUser {
    pub fn student(bookings_made: u32) -> Self {
        Self { role: UserRole::Student, bookings_made }
    }

    pub fn staff() -> Self {
        Self { role: UserRole::Staff, bookings_made: 0 }
    }
}

pub struct ScheduleFixtures;

impl ScheduleFixtures {
    /// Hourly slots 09:00-17:00; Mondays have 11:00 and 15:00 booked and 12:00 pending.
    pub fn hourly_weekdays() -> serde_json::Value {
        json!({
            "working_hours": { "start": "09:00", "end": "17:00", "slot_minutes": 60 },
            "weekly": {
                "Mon": { "11:00": "booked", "12:00": "pending", "15:00": "booked" }
            }
        })
    }

    /// Same as `hourly_weekdays`, plus a dated override and a closure.
    pub fn with_exceptions(override_date: NaiveDate, closed_date: NaiveDate) -> serde_json::Value {
        let mut schedule = Self::hourly_weekdays();
        schedule["dates"] = json!({
            override_date.to_string(): { "09:00": "pending", "11:00": "available" }
        });
        schedule["closures"] = json!([closed_date.to_string()]);
        schedule
    }

    pub fn write_to_temp_file(schedule: &serde_json::Value) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("create temp schedule file");
        file.write_all(schedule.to_string().as_bytes())
            .expect("write temp schedule file");
        file
    }
}
