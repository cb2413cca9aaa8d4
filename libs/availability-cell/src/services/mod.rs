pub mod availability;
pub mod eligibility;
pub mod schedule;

pub use availability::AvailabilityProvider;
pub use eligibility::{is_eligible, next_eligible_date, Clock, FixedClock, SystemClock};
pub use schedule::StaffSchedule;
