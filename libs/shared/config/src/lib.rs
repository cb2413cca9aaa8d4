use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::warn;

use shared_models::UserRole;

pub const DEFAULT_STUDENT_MAX_BOOKINGS: u32 = 2;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    /// JSON staff schedule. When unset the default working hours are used.
    pub schedule_path: Option<PathBuf>,
    /// `None` means unbounded.
    pub student_max_bookings: Option<u32>,
    /// `None` means unbounded.
    pub staff_max_bookings: Option<u32>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            schedule_path: None,
            student_max_bookings: Some(DEFAULT_STUDENT_MAX_BOOKINGS),
            staff_max_bookings: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from any key lookup, so tests don't touch the process env.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let schedule_path = match lookup("SCHEDULE_PATH") {
            Some(path) if !path.trim().is_empty() => Some(PathBuf::from(path.trim())),
            _ => {
                warn!("SCHEDULE_PATH not set, using default working hours");
                None
            }
        };

        let config = Self {
            schedule_path,
            student_max_bookings: parse_max_bookings(
                "STUDENT_MAX_BOOKINGS",
                lookup("STUDENT_MAX_BOOKINGS"),
                Some(DEFAULT_STUDENT_MAX_BOOKINGS),
            ),
            staff_max_bookings: parse_max_bookings(
                "STAFF_MAX_BOOKINGS",
                lookup("STAFF_MAX_BOOKINGS"),
                None,
            ),
        };

        if !config.is_configured() {
            warn!("Scheduler not fully configured - running without a staff schedule file");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        self.schedule_path.is_some()
    }

    /// Booking cap for a role; `None` means unbounded.
    pub fn max_bookings_for(&self, role: UserRole) -> Option<u32> {
        match role {
            UserRole::Student => self.student_max_bookings,
            UserRole::Staff => self.staff_max_bookings,
        }
    }
}

fn parse_max_bookings(key: &str, raw: Option<String>, default: Option<u32>) -> Option<u32> {
    let Some(raw) = raw else {
        return default;
    };

    let value = raw.trim();
    if value.eq_ignore_ascii_case("unbounded") || value.eq_ignore_ascii_case("none") {
        return None;
    }

    match value.parse::<u32>() {
        Ok(max) => Some(max),
        Err(_) => {
            warn!("{} has invalid value {:?}, using default", key, value);
            default
        }
    }
}
