use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Who is driving a booking flow. Only students are held to a booking quota.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    #[default]
    Student,
    Staff,
}

impl UserRole {
    pub fn is_quota_bound(&self) -> bool {
        matches!(self, UserRole::Student)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Student => write!(f, "student"),
            UserRole::Staff => write!(f, "staff"),
        }
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "student" => Ok(UserRole::Student),
            "staff" => Ok(UserRole::Staff),
            other => Err(format!("Unknown user role: {}", other)),
        }
    }
}
