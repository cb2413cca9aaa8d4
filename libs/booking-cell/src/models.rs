// libs/booking-cell/src/models.rs
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use availability_cell::{SlotStatus, TimeSlot};
use shared_models::UserRole;

// ==============================================================================
// APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentType {
    #[default]
    Individual,
    Group,
    Emergency,
}

impl fmt::Display for AppointmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentType::Individual => write!(f, "individual"),
            AppointmentType::Group => write!(f, "group"),
            AppointmentType::Emergency => write!(f, "emergency"),
        }
    }
}

impl FromStr for AppointmentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "individual" => Ok(AppointmentType::Individual),
            "group" => Ok(AppointmentType::Group),
            "emergency" => Ok(AppointmentType::Emergency),
            other => Err(format!("Unknown appointment type: {}", other)),
        }
    }
}

/// The in-progress booking. Only `BookingSession` mutates it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingDraft {
    pub date: Option<NaiveDate>,
    pub slot: Option<TimeSlot>,
    pub purpose: String,
    pub notes: String,
    pub appointment_type: AppointmentType,
}

impl BookingDraft {
    pub fn has_purpose(&self) -> bool {
        !self.purpose.trim().is_empty()
    }

    pub fn missing_requirements(&self) -> Vec<Requirement> {
        let mut missing = Vec::new();
        if self.date.is_none() {
            missing.push(Requirement::Date);
        }
        if self.slot.is_none() {
            missing.push(Requirement::Slot);
        }
        if !self.has_purpose() {
            missing.push(Requirement::Purpose);
        }
        missing
    }

    pub fn is_complete(&self) -> bool {
        self.missing_requirements().is_empty()
    }
}

/// Finalized booking handed back to the caller on confirm.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BookingRecord {
    pub id: Uuid,
    pub date: NaiveDate,
    pub slot_id: String,
    pub slot_time: String,
    pub purpose: String,
    pub notes: String,
    pub appointment_type: AppointmentType,
    pub booked_by: UserRole,
}

// ==============================================================================
// QUOTA MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QuotaLimit {
    Limited(u32),
    Unbounded,
}

impl From<Option<u32>> for QuotaLimit {
    fn from(max: Option<u32>) -> Self {
        match max {
            Some(max) => QuotaLimit::Limited(max),
            None => QuotaLimit::Unbounded,
        }
    }
}

impl fmt::Display for QuotaLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuotaLimit::Limited(max) => write!(f, "{}", max),
            QuotaLimit::Unbounded => write!(f, "unbounded"),
        }
    }
}

/// Caller-owned booking counter. `count` never exceeds a limited `max`.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct BookingQuota {
    count: u32,
    max: QuotaLimit,
}

impl BookingQuota {
    pub fn new(count: u32, max: QuotaLimit) -> Result<Self, BookingError> {
        if let QuotaLimit::Limited(limit) = max {
            if count > limit {
                return Err(BookingError::InvalidQuota { count, max: limit });
            }
        }
        Ok(Self { count, max })
    }

    pub fn limited(max: u32) -> Self {
        Self { count: 0, max: QuotaLimit::Limited(max) }
    }

    pub fn unbounded() -> Self {
        Self { count: 0, max: QuotaLimit::Unbounded }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn max(&self) -> QuotaLimit {
        self.max
    }

    /// `None` when unbounded.
    pub fn remaining(&self) -> Option<u32> {
        match self.max {
            QuotaLimit::Limited(max) => Some(max.saturating_sub(self.count)),
            QuotaLimit::Unbounded => None,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == Some(0)
    }

    /// Whether `role` may submit another booking under this quota.
    pub fn allows(&self, role: UserRole) -> bool {
        !role.is_quota_bound() || !self.is_exhausted()
    }

    /// Dashboard label, e.g. `1/2 bookings used`. Unbounded quotas have none.
    pub fn usage_label(&self) -> Option<String> {
        match self.max {
            QuotaLimit::Limited(max) => Some(format!("{}/{} bookings used", self.count, max)),
            QuotaLimit::Unbounded => None,
        }
    }

    /// Apply the increment emitted by a successful confirm. Saturates at `max`.
    pub fn apply(&mut self, _increment: QuotaIncrement) {
        if self.is_exhausted() {
            tracing::warn!("Quota already at {}/{}, increment dropped", self.count, self.max);
            return;
        }
        self.count = self.count.saturating_add(1);
    }
}

/// Signal that one booking was confirmed. Only a confirm can produce it.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "the caller owns the quota and must apply the increment"]
pub struct QuotaIncrement {
    _private: (),
}

impl QuotaIncrement {
    pub(crate) fn new() -> Self {
        Self { _private: () }
    }
}

// ==============================================================================
// SESSION MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Empty,
    DateChosen,
    SlotChosen,
    DetailsEntered,
    Submittable,
    Confirmed,
    Cancelled,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Empty => write!(f, "empty"),
            SessionState::DateChosen => write!(f, "date_chosen"),
            SessionState::SlotChosen => write!(f, "slot_chosen"),
            SessionState::DetailsEntered => write!(f, "details_entered"),
            SessionState::Submittable => write!(f, "submittable"),
            SessionState::Confirmed => write!(f, "confirmed"),
            SessionState::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Requirement {
    Date,
    Slot,
    Purpose,
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Requirement::Date => write!(f, "date"),
            Requirement::Slot => write!(f, "time slot"),
            Requirement::Purpose => write!(f, "purpose"),
        }
    }
}

/// Outcome of picking a slot that exists in the current result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotSelection {
    Selected,
    /// Slot is booked or pending; nothing changed.
    Ignored(SlotStatus),
}

#[derive(Debug)]
pub struct Confirmation {
    pub record: BookingRecord,
    pub increment: QuotaIncrement,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BookingError {
    #[error("Date {0} is not bookable (past date or weekend)")]
    IneligibleDate(NaiveDate),

    #[error("Time slot {0} is not offered for the selected date")]
    InvalidSlotReference(String),

    #[error("Booking is incomplete, missing: {}", join_requirements(.missing))]
    PreconditionNotMet { missing: Vec<Requirement> },

    #[error("Booking limit reached ({count}/{max} bookings used)")]
    QuotaExhausted { count: u32, max: u32 },

    #[error("Booking count {count} exceeds the maximum of {max}")]
    InvalidQuota { count: u32, max: u32 },

    #[error("Invalid session transition: {from} -> {to}")]
    InvalidTransition { from: SessionState, to: SessionState },
}

impl BookingError {
    /// True for the failures that block a confirm until the user fixes something.
    pub fn is_precondition_failure(&self) -> bool {
        matches!(
            self,
            BookingError::PreconditionNotMet { .. } | BookingError::QuotaExhausted { .. }
        )
    }
}

fn join_requirements(missing: &[Requirement]) -> String {
    missing
        .iter()
        .map(|requirement| requirement.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_rejects_count_above_max() {
        assert_eq!(
            BookingQuota::new(3, QuotaLimit::Limited(2)),
            Err(BookingError::InvalidQuota { count: 3, max: 2 })
        );
        assert!(BookingQuota::new(2, QuotaLimit::Limited(2)).unwrap().is_exhausted());
        assert!(!BookingQuota::new(500, QuotaLimit::Unbounded).unwrap().is_exhausted());
    }

    #[test]
    fn exhausted_quota_only_blocks_students() {
        let quota = BookingQuota::new(2, QuotaLimit::Limited(2)).unwrap();
        assert!(!quota.allows(UserRole::Student));
        assert!(quota.allows(UserRole::Staff));
    }

    #[test]
    fn apply_increments_and_saturates() {
        let mut quota = BookingQuota::limited(1);
        quota.apply(QuotaIncrement::new());
        assert_eq!(quota.count(), 1);
        quota.apply(QuotaIncrement::new());
        assert_eq!(quota.count(), 1);

        let mut unbounded = BookingQuota::unbounded();
        unbounded.apply(QuotaIncrement::new());
        assert_eq!(unbounded.count(), 1);
        assert_eq!(unbounded.remaining(), None);
    }

    #[test]
    fn unbounded_count_stops_at_u32_max() {
        let mut quota = BookingQuota::new(u32::MAX, QuotaLimit::Unbounded).unwrap();
        quota.apply(QuotaIncrement::new());
        assert_eq!(quota.count(), u32::MAX);
    }

    #[test]
    fn usage_label_matches_dashboard_text() {
        let quota = BookingQuota::new(1, QuotaLimit::Limited(2)).unwrap();
        assert_eq!(quota.usage_label().as_deref(), Some("1/2 bookings used"));
        assert_eq!(BookingQuota::unbounded().usage_label(), None);
    }

    #[test]
    fn draft_reports_missing_fields_in_order() {
        let draft = BookingDraft { purpose: "   ".into(), ..Default::default() };
        assert_eq!(
            draft.missing_requirements(),
            vec![Requirement::Date, Requirement::Slot, Requirement::Purpose]
        );
    }

    #[test]
    fn precondition_message_lists_missing_fields() {
        let err = BookingError::PreconditionNotMet {
            missing: vec![Requirement::Slot, Requirement::Purpose],
        };
        assert_eq!(err.to_string(), "Booking is incomplete, missing: time slot, purpose");
        assert!(err.is_precondition_failure());
        assert!(BookingError::QuotaExhausted { count: 2, max: 2 }.is_precondition_failure());
        assert!(!BookingError::InvalidSlotReference("x".into()).is_precondition_failure());
    }

    #[test]
    fn record_serializes_snake_case_enums() {
        let record = BookingRecord {
            id: Uuid::nil(),
            date: NaiveDate::from_ymd_opt(2025, 6, 23).unwrap(),
            slot_id: "2025-06-23T0900".into(),
            slot_time: "09:00 AM".into(),
            purpose: "Advising".into(),
            notes: String::new(),
            appointment_type: AppointmentType::Emergency,
            booked_by: UserRole::Student,
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["appointment_type"], "emergency");
        assert_eq!(value["booked_by"], "student");
        assert_eq!(value["date"], "2025-06-23");
    }
}
