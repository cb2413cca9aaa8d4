use std::sync::Arc;

use anyhow::Context;
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info};

use availability_cell::{
    next_eligible_date, AvailabilityProvider, Clock, FixedClock, ScheduleConfig, SlotFilter,
    SystemClock,
};
use booking_cell::{
    AppointmentType, BookingQuota, BookingRecord, BookingSession, QuotaLimit, SlotSelection,
};
use shared_config::AppConfig;
use shared_models::{AppError, UserRole};

pub const USAGE: &str = "usage:
  scheduler [--today YYYY-MM-DD] slots [DATE] [--filter all|available|booked|pending]
  scheduler [--today YYYY-MM-DD] eligible DATE
  scheduler [--today YYYY-MM-DD] book DATE SLOT_ID PURPOSE [--notes TEXT]
            [--type individual|group|emergency] [--role student|staff] [--count N]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Slots {
        date: Option<NaiveDate>,
        filter: SlotFilter,
    },
    Eligible {
        date: NaiveDate,
    },
    Book(BookArgs),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookArgs {
    pub date: NaiveDate,
    pub slot_id: String,
    pub purpose: String,
    pub notes: Option<String>,
    pub appointment_type: AppointmentType,
    pub role: UserRole,
    pub bookings_made: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub today: Option<NaiveDate>,
    pub command: Command,
}

#[derive(Debug, Serialize)]
struct BookingOutput {
    record: BookingRecord,
    bookings_made: u32,
    usage: Option<String>,
}

/// Parse, execute, and render one invocation as JSON.
pub fn run(config: &AppConfig, args: &[String]) -> Result<String, AppError> {
    let invocation = parse_args(args)?;
    check_config(config)?;
    let schedule = load_schedule(config).map_err(|e| AppError::Schedule(format!("{:#}", e)))?;

    let clock: Arc<dyn Clock> = match invocation.today {
        Some(today) => Arc::new(FixedClock(today)),
        None => Arc::new(SystemClock),
    };
    let provider = Arc::new(AvailabilityProvider::new(Arc::new(schedule), clock));

    let output = execute(config, provider, invocation.command)?;
    serde_json::to_string_pretty(&output).map_err(|e| AppError::Internal(e.to_string()))
}

/// Settings problems that no schedule contents could fix.
pub fn check_config(config: &AppConfig) -> Result<(), AppError> {
    if let Some(path) = &config.schedule_path {
        if !path.is_file() {
            return Err(AppError::Config(format!(
                "SCHEDULE_PATH {} is not a file",
                path.display()
            )));
        }
    }
    Ok(())
}

pub fn load_schedule(config: &AppConfig) -> anyhow::Result<ScheduleConfig> {
    match &config.schedule_path {
        Some(path) => ScheduleConfig::from_file(path)
            .with_context(|| format!("loading schedule from {}", path.display())),
        None => {
            debug!("No schedule file configured, using default working hours");
            Ok(ScheduleConfig::default())
        }
    }
}

pub fn execute(
    config: &AppConfig,
    provider: Arc<AvailabilityProvider>,
    command: Command,
) -> Result<serde_json::Value, AppError> {
    match command {
        Command::Slots { date, filter } => {
            let date = date.unwrap_or_else(|| next_eligible_date(provider.today()));
            let slots = provider.get_filtered_slots(date, filter);
            info!("Listing {} slots for {}", slots.len(), date);

            Ok(json!({
                "date": date,
                "eligible": provider.is_eligible(date),
                "slots": slots,
            }))
        }
        Command::Eligible { date } => Ok(json!({
            "date": date,
            "eligible": provider.is_eligible(date),
        })),
        Command::Book(args) => book(config, provider, args),
    }
}

fn book(
    config: &AppConfig,
    provider: Arc<AvailabilityProvider>,
    args: BookArgs,
) -> Result<serde_json::Value, AppError> {
    let max = QuotaLimit::from(config.max_bookings_for(args.role));
    let mut quota = BookingQuota::new(args.bookings_made, max)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let mut session = BookingSession::new(provider, args.role, quota);

    session
        .select_date(args.date)
        .map_err(|e| AppError::Booking(e.to_string()))?;

    match session
        .select_slot(&args.slot_id)
        .map_err(|e| AppError::Booking(e.to_string()))?
    {
        SlotSelection::Selected => {}
        SlotSelection::Ignored(status) => {
            return Err(AppError::Booking(format!(
                "Time slot {} is {} and cannot be booked",
                args.slot_id, status
            )));
        }
    }

    session.enter_details(args.purpose, args.notes, Some(args.appointment_type));

    let confirmation = session
        .confirm(&quota)
        .map_err(|e| AppError::Booking(e.to_string()))?;
    quota.apply(confirmation.increment);

    let output = BookingOutput {
        record: confirmation.record,
        bookings_made: quota.count(),
        usage: quota.usage_label(),
    };
    serde_json::to_value(output).map_err(|e| AppError::Internal(e.to_string()))
}

pub fn parse_args(args: &[String]) -> Result<Invocation, AppError> {
    let mut today = None;
    let mut filter = SlotFilter::All;
    let mut notes = None;
    let mut appointment_type = AppointmentType::default();
    let mut role = UserRole::default();
    let mut bookings_made = 0;
    let mut positional: Vec<&str> = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let mut value_for = |flag: &str| {
            iter.next()
                .map(String::as_str)
                .ok_or_else(|| AppError::BadRequest(format!("{} needs a value\n{}", flag, USAGE)))
        };

        match arg.as_str() {
            "--today" => today = Some(parse_date(value_for("--today")?)?),
            "--filter" => {
                filter = value_for("--filter")?
                    .parse()
                    .map_err(|e: availability_cell::ScheduleError| AppError::BadRequest(e.to_string()))?
            }
            "--notes" => notes = Some(value_for("--notes")?.to_string()),
            "--type" => {
                appointment_type = value_for("--type")?.parse().map_err(AppError::BadRequest)?
            }
            "--role" => role = value_for("--role")?.parse().map_err(AppError::BadRequest)?,
            "--count" => {
                let raw = value_for("--count")?;
                bookings_made = raw
                    .parse()
                    .map_err(|_| AppError::BadRequest(format!("Invalid booking count: {}", raw)))?
            }
            other => positional.push(other),
        }
    }

    let command = match positional.as_slice() {
        ["slots"] => Command::Slots { date: None, filter },
        ["slots", date] => Command::Slots { date: Some(parse_date(date)?), filter },
        ["eligible", date] => Command::Eligible { date: parse_date(date)? },
        ["book", date, slot_id, purpose] => Command::Book(BookArgs {
            date: parse_date(date)?,
            slot_id: slot_id.to_string(),
            purpose: purpose.to_string(),
            notes,
            appointment_type,
            role,
            bookings_made,
        }),
        _ => return Err(AppError::BadRequest(USAGE.to_string())),
    };

    Ok(Invocation { today, command })
}

fn parse_date(raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| AppError::BadRequest(format!("Invalid date {:?}, expected YYYY-MM-DD", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use availability_cell::SlotStatus;
    use shared_utils::test_utils::{ScheduleFixtures, TestConfig, TestDates};

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|arg| arg.to_string()).collect()
    }

    fn today_arg() -> String {
        TestDates::today().to_string()
    }

    #[test]
    fn parses_slots_with_filter() {
        let invocation = parse_args(&args(&["--today", "2025-06-18", "slots", "2025-06-23", "--filter", "booked"]))
            .unwrap();

        assert_eq!(invocation.today, Some(TestDates::today()));
        assert_eq!(
            invocation.command,
            Command::Slots {
                date: Some(TestDates::next_monday()),
                filter: SlotFilter::Status(SlotStatus::Booked),
            }
        );
    }

    #[test]
    fn parses_book_with_options() {
        let invocation = parse_args(&args(&[
            "book", "2025-06-23", "2025-06-23T0900", "Advising",
            "--type", "group", "--role", "staff", "--count", "3", "--notes", "room 4",
        ]))
        .unwrap();

        assert_matches!(invocation.command, Command::Book(book) => {
            assert_eq!(book.appointment_type, AppointmentType::Group);
            assert_eq!(book.role, UserRole::Staff);
            assert_eq!(book.bookings_made, 3);
            assert_eq!(book.notes.as_deref(), Some("room 4"));
        });
    }

    #[test]
    fn rejects_bad_input() {
        assert_matches!(parse_args(&args(&[])), Err(AppError::BadRequest(_)));
        assert_matches!(parse_args(&args(&["eligible", "23/06/2025"])), Err(AppError::BadRequest(_)));
        assert_matches!(parse_args(&args(&["slots", "--filter"])), Err(AppError::BadRequest(_)));
        assert_matches!(parse_args(&args(&["slots", "--filter", "open"])), Err(AppError::BadRequest(_)));
    }

    #[test]
    fn lists_next_eligible_day_from_schedule_file() {
        let file = ScheduleFixtures::write_to_temp_file(&ScheduleFixtures::hourly_weekdays());
        let config = TestConfig {
            schedule_path: Some(file.path().to_path_buf()),
            ..Default::default()
        }
        .to_app_config();

        // a Saturday "today" rolls forward to Monday
        let output = run(&config, &args(&["--today", "2025-06-21", "slots", "--filter", "available"])).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["date"], "2025-06-23");
        assert_eq!(value["eligible"], true);
        assert_eq!(value["slots"].as_array().map(Vec::len), Some(5));
    }

    #[test]
    fn books_a_slot_and_reports_usage() {
        let file = ScheduleFixtures::write_to_temp_file(&ScheduleFixtures::hourly_weekdays());
        let config = TestConfig {
            schedule_path: Some(file.path().to_path_buf()),
            ..Default::default()
        }
        .to_app_config();

        let output = run(
            &config,
            &args(&["--today", &today_arg(), "book", "2025-06-23", "2025-06-23T0900", "Advising"]),
        )
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["record"]["slot_time"], "09:00 AM");
        assert_eq!(value["bookings_made"], 1);
        assert_eq!(value["usage"], "1/2 bookings used");
    }

    #[test]
    fn booked_slot_and_exhausted_quota_are_booking_errors() {
        let file = ScheduleFixtures::write_to_temp_file(&ScheduleFixtures::hourly_weekdays());
        let config = TestConfig {
            schedule_path: Some(file.path().to_path_buf()),
            ..Default::default()
        }
        .to_app_config();

        let booked = run(
            &config,
            &args(&["--today", &today_arg(), "book", "2025-06-23", "2025-06-23T1100", "Advising"]),
        );
        assert_matches!(booked, Err(AppError::Booking(msg)) if msg.contains("booked"));

        let exhausted = run(
            &config,
            &args(&["--today", &today_arg(), "book", "2025-06-23", "2025-06-23T0900", "Advising", "--count", "2"]),
        );
        assert_matches!(exhausted, Err(AppError::Booking(msg)) if msg.contains("Booking limit reached"));

        let over = run(
            &config,
            &args(&["--today", &today_arg(), "book", "2025-06-23", "2025-06-23T0900", "Advising", "--count", "3"]),
        );
        assert_matches!(over, Err(AppError::BadRequest(_)));
    }

    #[test]
    fn missing_schedule_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = TestConfig {
            schedule_path: Some(dir.path().join("missing.json")),
            ..Default::default()
        }
        .to_app_config();
        assert_matches!(run(&missing, &args(&["slots"])), Err(AppError::Config(msg)) if msg.contains("missing.json"));

        let directory = TestConfig {
            schedule_path: Some(dir.path().to_path_buf()),
            ..Default::default()
        }
        .to_app_config();
        assert_matches!(run(&directory, &args(&["slots"])), Err(AppError::Config(_)));
    }

    #[test]
    fn malformed_schedule_file_is_schedule_error() {
        let file = ScheduleFixtures::write_to_temp_file(&json!({
            "working_hours": { "start": "17:00", "end": "09:00", "slot_minutes": 30 }
        }));
        let config = TestConfig {
            schedule_path: Some(file.path().to_path_buf()),
            ..Default::default()
        }
        .to_app_config();

        assert_matches!(run(&config, &args(&["slots"])), Err(AppError::Schedule(_)));
    }
}
