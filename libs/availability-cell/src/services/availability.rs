// libs/availability-cell/src/services/availability.rs
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::models::{SlotFilter, TimeSlot};
use crate::services::eligibility::{is_eligible, Clock};
use crate::services::schedule::StaffSchedule;

/// Computes the bookable slots for a date from the injected staff schedule.
#[derive(Clone)]
pub struct AvailabilityProvider {
    schedule: Arc<dyn StaffSchedule>,
    clock: Arc<dyn Clock>,
}

impl AvailabilityProvider {
    pub fn new(schedule: Arc<dyn StaffSchedule>, clock: Arc<dyn Clock>) -> Self {
        Self { schedule, clock }
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Date picker predicate; does not touch the schedule.
    pub fn is_eligible(&self, date: NaiveDate) -> bool {
        is_eligible(date, self.today())
    }

    /// Slots for `date` ordered by start time. Empty for ineligible dates or closed days.
    pub fn get_slots(&self, date: NaiveDate) -> Vec<TimeSlot> {
        debug!("Calculating slots for {}", date);

        if !self.is_eligible(date) {
            warn!("Slots requested for ineligible date {} (today is {})", date, self.today());
            return vec![];
        }

        let Some(hours) = self.schedule.working_hours(date) else {
            debug!("No working hours on {}", date);
            return vec![];
        };

        let slots: Vec<TimeSlot> = hours
            .slot_starts()
            .into_iter()
            .map(|start| {
                let status = self.schedule.slot_status(date, start);
                TimeSlot::new(date, start, hours.slot_minutes, status)
            })
            .collect();

        let slots = self.remove_duplicate_slots(slots);

        debug!(
            "Found {} slots on {} ({} available)",
            slots.len(),
            date,
            slots.iter().filter(|slot| slot.is_available()).count()
        );
        slots
    }

    pub fn get_filtered_slots(&self, date: NaiveDate, filter: SlotFilter) -> Vec<TimeSlot> {
        filter.apply(&self.get_slots(date))
    }

    fn remove_duplicate_slots(&self, mut slots: Vec<TimeSlot>) -> Vec<TimeSlot> {
        slots.sort_by(|a, b| a.start.cmp(&b.start));
        slots.dedup_by(|a, b| a.id == b.id);
        slots
    }
}

impl std::fmt::Debug for AvailabilityProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AvailabilityProvider")
            .field("today", &self.today())
            .finish_non_exhaustive()
    }
}
