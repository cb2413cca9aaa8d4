// libs/availability-cell/src/services/eligibility.rs
use chrono::{Datelike, Local, NaiveDate, Weekday};

/// Source of "today" for the past-date boundary.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Reads the local calendar date, so the boundary moves at local midnight.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// A date can be booked iff it is today or later and falls on a weekday.
pub fn is_eligible(date: NaiveDate, today: NaiveDate) -> bool {
    date >= today && !is_weekend(date)
}

/// First eligible date on or after `from`.
pub fn next_eligible_date(from: NaiveDate) -> NaiveDate {
    from.iter_days()
        .find(|date| !is_weekend(*date))
        .unwrap_or(from)
}
