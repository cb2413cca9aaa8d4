// libs/booking-cell/src/services/lifecycle.rs
use tracing::{debug, warn};

use crate::models::{BookingDraft, BookingError, SessionState};

/// Transition rules for a booking session.
#[derive(Debug, Clone, Copy, Default)]
pub struct BookingLifecycle;

impl BookingLifecycle {
    pub fn new() -> Self {
        Self
    }

    /// Resting state implied by the draft and the quota check.
    pub fn derive_state(&self, draft: &BookingDraft, quota_allows: bool) -> SessionState {
        match (draft.date, &draft.slot, draft.has_purpose()) {
            (None, _, _) => SessionState::Empty,
            (Some(_), None, _) => SessionState::DateChosen,
            (Some(_), Some(_), false) => SessionState::SlotChosen,
            (Some(_), Some(_), true) if !quota_allows => SessionState::DetailsEntered,
            (Some(_), Some(_), true) => SessionState::Submittable,
        }
    }

    /// Validate that a state change is allowed
    pub fn validate_transition(
        &self,
        current: SessionState,
        next: SessionState,
    ) -> Result<(), BookingError> {
        debug!("Validating session transition from {} to {}", current, next);

        if current != next && !self.get_valid_transitions(current).contains(&next) {
            warn!("Invalid session transition attempted: {} -> {}", current, next);
            return Err(BookingError::InvalidTransition { from: current, to: next });
        }

        Ok(())
    }

    /// Get all valid next states for a given current state
    pub fn get_valid_transitions(&self, current: SessionState) -> Vec<SessionState> {
        match current {
            SessionState::Empty => vec![
                SessionState::DateChosen,
                SessionState::Cancelled,
            ],
            // Details may be typed before the slot is picked, so a slot pick can
            // land directly in DetailsEntered or Submittable.
            SessionState::DateChosen => vec![
                SessionState::SlotChosen,
                SessionState::DetailsEntered,
                SessionState::Submittable,
                SessionState::Cancelled,
            ],
            SessionState::SlotChosen => vec![
                SessionState::DateChosen,
                SessionState::DetailsEntered,
                SessionState::Submittable,
                SessionState::Cancelled,
            ],
            SessionState::DetailsEntered => vec![
                SessionState::DateChosen,
                SessionState::SlotChosen,
                SessionState::Submittable,
                SessionState::Cancelled,
            ],
            SessionState::Submittable => vec![
                SessionState::DateChosen,
                SessionState::SlotChosen,
                SessionState::DetailsEntered,
                SessionState::Confirmed,
                SessionState::Cancelled,
            ],
            // Pass-through states; the session rests in Empty afterwards
            SessionState::Confirmed => vec![SessionState::Empty],
            SessionState::Cancelled => vec![SessionState::Empty],
        }
    }

    pub fn is_terminal(&self, state: SessionState) -> bool {
        matches!(state, SessionState::Confirmed | SessionState::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use availability_cell::{SlotStatus, TimeSlot};
    use chrono::{NaiveDate, NaiveTime};

    fn draft(date: bool, slot: bool, purpose: &str) -> BookingDraft {
        let day = NaiveDate::from_ymd_opt(2025, 6, 23).unwrap();
        BookingDraft {
            date: date.then_some(day),
            slot: slot.then(|| {
                TimeSlot::new(day, NaiveTime::from_hms_opt(9, 0, 0).unwrap(), 60, SlotStatus::Available)
            }),
            purpose: purpose.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn derives_each_resting_state() {
        let lifecycle = BookingLifecycle::new();
        assert_eq!(lifecycle.derive_state(&draft(false, false, "x"), true), SessionState::Empty);
        assert_eq!(lifecycle.derive_state(&draft(true, false, "x"), true), SessionState::DateChosen);
        assert_eq!(lifecycle.derive_state(&draft(true, true, " "), true), SessionState::SlotChosen);
        assert_eq!(lifecycle.derive_state(&draft(true, true, "x"), false), SessionState::DetailsEntered);
        assert_eq!(lifecycle.derive_state(&draft(true, true, "x"), true), SessionState::Submittable);
    }

    #[test]
    fn only_submittable_can_confirm() {
        let lifecycle = BookingLifecycle::new();
        assert_eq!(lifecycle.validate_transition(SessionState::Submittable, SessionState::Confirmed), Ok(()));
        assert_matches!(
            lifecycle.validate_transition(SessionState::DetailsEntered, SessionState::Confirmed),
            Err(BookingError::InvalidTransition { from: SessionState::DetailsEntered, to: SessionState::Confirmed })
        );
        assert!(lifecycle.validate_transition(SessionState::Empty, SessionState::Confirmed).is_err());
    }

    #[test]
    fn every_non_terminal_state_can_cancel() {
        let lifecycle = BookingLifecycle::new();
        for state in [
            SessionState::Empty,
            SessionState::DateChosen,
            SessionState::SlotChosen,
            SessionState::DetailsEntered,
            SessionState::Submittable,
        ] {
            assert!(!lifecycle.is_terminal(state));
            assert!(lifecycle.validate_transition(state, SessionState::Cancelled).is_ok(), "{}", state);
        }
        assert!(lifecycle.is_terminal(SessionState::Cancelled));
        assert_eq!(lifecycle.get_valid_transitions(SessionState::Confirmed), vec![SessionState::Empty]);
    }
}
