// libs/booking-cell/src/services/session.rs
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use availability_cell::{AvailabilityProvider, TimeSlot};
use shared_models::UserRole;

use crate::models::{
    AppointmentType, BookingDraft, BookingError, BookingQuota, BookingRecord, Confirmation,
    QuotaIncrement, QuotaLimit, SessionState, SlotSelection,
};
use crate::services::lifecycle::BookingLifecycle;

/// One user's booking flow: date, slot, details, then confirm or cancel.
pub struct BookingSession {
    provider: Arc<AvailabilityProvider>,
    lifecycle: BookingLifecycle,
    role: UserRole,
    quota: BookingQuota,
    draft: BookingDraft,
    offered: Vec<TimeSlot>,
    state: SessionState,
}

impl BookingSession {
    pub fn new(provider: Arc<AvailabilityProvider>, role: UserRole, quota: BookingQuota) -> Self {
        Self {
            provider,
            lifecycle: BookingLifecycle::new(),
            role,
            quota,
            draft: BookingDraft::default(),
            offered: Vec::new(),
            state: SessionState::Empty,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn role(&self) -> UserRole {
        self.role
    }

    pub fn quota(&self) -> BookingQuota {
        self.quota
    }

    pub fn draft(&self) -> &BookingDraft {
        &self.draft
    }

    /// Slots from the most recent query for the chosen date.
    pub fn offered_slots(&self) -> &[TimeSlot] {
        &self.offered
    }

    /// Choose the appointment date and load its slots.
    ///
    /// Ineligible dates are rejected without touching the draft. Picking a
    /// different date drops any chosen slot; picking the same date again is a
    /// no-op.
    pub fn select_date(&mut self, date: NaiveDate) -> Result<&[TimeSlot], BookingError> {
        if !self.provider.is_eligible(date) {
            warn!("Rejected ineligible date {} for {} session", date, self.role);
            return Err(BookingError::IneligibleDate(date));
        }

        if self.draft.date == Some(date) {
            debug!("Date {} already selected", date);
            return Ok(&self.offered);
        }

        if let Some(previous) = self.draft.slot.take() {
            debug!("Date changed from {:?} to {}, clearing slot {}", self.draft.date, date, previous.id);
        }

        self.draft.date = Some(date);
        self.offered = self.provider.get_slots(date);
        self.refresh_state();

        Ok(&self.offered)
    }

    /// Pick a slot from the current result set.
    ///
    /// Booked or pending slots are ignored without error. Ids outside the
    /// current result set are rejected with `InvalidSlotReference`.
    pub fn select_slot(&mut self, slot_id: &str) -> Result<SlotSelection, BookingError> {
        let Some(slot) = self.offered.iter().find(|slot| slot.id == slot_id) else {
            warn!(
                "Ignoring slot {} not offered for {:?}",
                slot_id, self.draft.date
            );
            return Err(BookingError::InvalidSlotReference(slot_id.to_string()));
        };

        if !slot.is_available() {
            debug!("Ignoring {} slot {}", slot.status, slot.id);
            return Ok(SlotSelection::Ignored(slot.status));
        }

        self.draft.slot = Some(slot.clone());
        self.refresh_state();
        Ok(SlotSelection::Selected)
    }

    pub fn set_purpose(&mut self, purpose: impl Into<String>) {
        self.draft.purpose = purpose.into();
        self.refresh_state();
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.draft.notes = notes.into();
    }

    pub fn set_appointment_type(&mut self, appointment_type: AppointmentType) {
        self.draft.appointment_type = appointment_type;
    }

    /// Fill the details form in one go. Unset type falls back to `individual`.
    pub fn enter_details(
        &mut self,
        purpose: impl Into<String>,
        notes: Option<String>,
        appointment_type: Option<AppointmentType>,
    ) {
        self.draft.notes = notes.unwrap_or_default();
        self.draft.appointment_type = appointment_type.unwrap_or_default();
        self.set_purpose(purpose);
    }

    /// Replace the quota snapshot, e.g. after another session confirmed.
    pub fn update_quota(&mut self, quota: BookingQuota) {
        self.quota = quota;
        self.refresh_state();
    }

    /// Why the session cannot be confirmed right now, if anything.
    pub fn blocked_reason(&self) -> Option<BookingError> {
        if let QuotaLimit::Limited(max) = self.quota.max() {
            if !self.quota.allows(self.role) {
                return Some(BookingError::QuotaExhausted {
                    count: self.quota.count(),
                    max,
                });
            }
        }

        let missing = self.draft.missing_requirements();
        if !missing.is_empty() {
            return Some(BookingError::PreconditionNotMet { missing });
        }

        None
    }

    pub fn is_submittable(&self) -> bool {
        self.state == SessionState::Submittable
    }

    /// Emit the booking and reset to `Empty`.
    ///
    /// The caller's current quota is taken as the new snapshot before the
    /// check. On failure the draft is left as it was. On success the session's
    /// own snapshot already counts this booking.
    pub fn confirm(&mut self, quota: &BookingQuota) -> Result<Confirmation, BookingError> {
        self.update_quota(*quota);

        if let Some(reason) = self.blocked_reason() {
            warn!("Confirm refused in state {}: {}", self.state, reason);
            return Err(reason);
        }

        let record = self.build_record()?;
        self.transition(SessionState::Confirmed)?;
        self.quota.apply(QuotaIncrement::new());

        info!(
            "Booking {} confirmed for {} on {} at {} ({})",
            record.id, self.role, record.date, record.slot_time, record.appointment_type
        );

        self.reset();
        Ok(Confirmation {
            record,
            increment: QuotaIncrement::new(),
        })
    }

    /// Drop the draft. No record is emitted and the quota is untouched.
    pub fn cancel(&mut self) {
        if self.transition(SessionState::Cancelled).is_err() {
            return;
        }
        info!("Booking session cancelled by {}", self.role);
        self.reset();
    }

    // Private helper methods

    fn build_record(&self) -> Result<BookingRecord, BookingError> {
        match (self.draft.date, &self.draft.slot) {
            (Some(date), Some(slot)) => Ok(BookingRecord {
                id: Uuid::new_v4(),
                date,
                slot_id: slot.id.clone(),
                slot_time: slot.time.clone(),
                purpose: self.draft.purpose.trim().to_string(),
                notes: self.draft.notes.trim().to_string(),
                appointment_type: self.draft.appointment_type,
                booked_by: self.role,
            }),
            _ => Err(BookingError::PreconditionNotMet {
                missing: self.draft.missing_requirements(),
            }),
        }
    }

    fn reset(&mut self) {
        self.draft = BookingDraft::default();
        self.offered.clear();
        self.refresh_state();
    }

    fn refresh_state(&mut self) {
        let next = self
            .lifecycle
            .derive_state(&self.draft, self.quota.allows(self.role));
        if self.transition(next).is_err() {
            debug!("Session kept in {}", self.state);
        }
    }

    /// Move to `next` only when the lifecycle allows it.
    fn transition(&mut self, next: SessionState) -> Result<(), BookingError> {
        if self.state == next {
            return Ok(());
        }
        self.lifecycle.validate_transition(self.state, next)?;
        debug!("Session {} -> {}", self.state, next);
        self.state = next;
        Ok(())
    }
}

impl std::fmt::Debug for BookingSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookingSession")
            .field("role", &self.role)
            .field("quota", &self.quota)
            .field("state", &self.state)
            .field("draft", &self.draft)
            .finish_non_exhaustive()
    }
}
