//! Booking interval rules
//!
//! Pure functions of the draft fields, the resolved availability window and
//! the current local wall-clock time. Field checks back the incremental
//! draft setters; [`validate_draft`] re-runs everything before submission.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use thiserror::Error;

use crate::{
    config::BookingRules,
    models::{AvailabilityWindow, BookingDraft},
};

/// Wire format of booking instants: local wall-clock, no offset
pub const ISO_INSTANT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// A rejected draft. The `Display` text is what the user sees.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Select a vehicle")]
    MissingVehicle,

    #[error("Fill in all fields")]
    Incomplete,

    #[error("The start date cannot be before today")]
    StartDateInPast,

    #[error("The start time cannot be in the past")]
    StartTimeInPast,

    #[error("The end date cannot be before today")]
    EndDateInPast,

    #[error("The end date cannot be before the start date")]
    EndDateBeforeStart,

    #[error("The end time cannot be in the past")]
    EndTimeInPast,

    #[error("The end time must be after the start time")]
    EndTimeNotAfterStart,

    #[error("The minimum booking duration is {min_minutes} minutes")]
    TooShort { minutes: i64, min_minutes: i64 },

    #[error("The end of the booking must be after its start")]
    EndNotAfterStart,

    #[error("The vehicle is not available on: {}", format_dates(.dates))]
    Unavailable { dates: Vec<NaiveDate> },

    #[error("Availability for this vehicle has not been confirmed")]
    AvailabilityUnknown,
}

fn format_dates(dates: &[NaiveDate]) -> String {
    dates
        .iter()
        .map(|d| d.format("%Y-%m-%d").to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// An admissible booking interval, ready for submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidInterval {
    pub vehicle_id: i64,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl ValidInterval {
    pub fn iso_start(&self) -> String {
        self.start.format(ISO_INSTANT_FORMAT).to_string()
    }

    pub fn iso_end(&self) -> String {
        self.end.format(ISO_INSTANT_FORMAT).to_string()
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

/// Current time truncated to the minute; time fields have minute resolution.
fn current_minute(now: NaiveDateTime) -> NaiveTime {
    now.time()
        .with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or_else(|| now.time())
}

/// Rule 1: start date not before today
pub fn check_start_date(date: NaiveDate, now: NaiveDateTime) -> Result<(), ValidationError> {
    if date < now.date() {
        return Err(ValidationError::StartDateInPast);
    }
    Ok(())
}

/// Rule 2: a start today cannot be earlier than the current minute
pub fn check_start_time(
    start_date: Option<NaiveDate>,
    time: NaiveTime,
    now: NaiveDateTime,
) -> Result<(), ValidationError> {
    if start_date == Some(now.date()) && time < current_minute(now) {
        return Err(ValidationError::StartTimeInPast);
    }
    Ok(())
}

/// Rule 3: end date not before today nor before the start date.
/// Same-day bookings are allowed.
pub fn check_end_date(
    date: NaiveDate,
    start_date: Option<NaiveDate>,
    now: NaiveDateTime,
) -> Result<(), ValidationError> {
    if date < now.date() {
        return Err(ValidationError::EndDateInPast);
    }
    if matches!(start_date, Some(start) if date < start) {
        return Err(ValidationError::EndDateBeforeStart);
    }
    Ok(())
}

/// Rule 4: end time not in the past, and after the start time on a same-day booking
pub fn check_end_time(
    end_date: Option<NaiveDate>,
    start_date: Option<NaiveDate>,
    start_time: Option<NaiveTime>,
    time: NaiveTime,
    now: NaiveDateTime,
) -> Result<(), ValidationError> {
    if end_date == Some(now.date()) && time < current_minute(now) {
        return Err(ValidationError::EndTimeInPast);
    }
    if let (Some(end), Some(start), Some(start_time)) = (end_date, start_date, start_time) {
        if end == start && time <= start_time {
            return Err(ValidationError::EndTimeNotAfterStart);
        }
    }
    Ok(())
}

/// Rules 5 and 6 on the combined instants
pub fn check_interval(
    start: NaiveDateTime,
    end: NaiveDateTime,
    rules: &BookingRules,
) -> Result<(), ValidationError> {
    let minutes = (end - start).num_minutes();
    if minutes < rules.min_duration_minutes {
        return Err(ValidationError::TooShort {
            minutes,
            min_minutes: rules.min_duration_minutes,
        });
    }
    if end <= start {
        return Err(ValidationError::EndNotAfterStart);
    }
    Ok(())
}

/// Rule 7: every spanned date must be available. Missing availability, or a
/// window belonging to another vehicle, blocks the booking.
pub fn check_availability(
    vehicle_id: i64,
    start_date: NaiveDate,
    end_date: NaiveDate,
    availability: Option<&AvailabilityWindow>,
) -> Result<(), ValidationError> {
    let window = match availability {
        Some(w) if w.vehicle_id() == vehicle_id => w,
        _ => return Err(ValidationError::AvailabilityUnknown),
    };

    let dates = window.unavailable_between(start_date, end_date);
    if !dates.is_empty() {
        return Err(ValidationError::Unavailable { dates });
    }
    Ok(())
}

/// Holistic validation run before submission
pub fn validate_draft(
    draft: &BookingDraft,
    availability: Option<&AvailabilityWindow>,
    rules: &BookingRules,
    now: NaiveDateTime,
) -> Result<ValidInterval, ValidationError> {
    let vehicle_id = draft.vehicle_id.ok_or(ValidationError::MissingVehicle)?;

    let (start_date, start_time, end_date, end_time) = match (
        draft.start_date,
        draft.start_time,
        draft.end_date,
        draft.end_time,
    ) {
        (Some(sd), Some(st), Some(ed), Some(et)) => (sd, st, ed, et),
        _ => return Err(ValidationError::Incomplete),
    };

    check_start_date(start_date, now)?;
    check_start_time(Some(start_date), start_time, now)?;
    check_end_date(end_date, Some(start_date), now)?;
    check_end_time(Some(end_date), Some(start_date), Some(start_time), end_time, now)?;

    let start = start_date.and_time(start_time);
    let end = end_date.and_time(end_time);
    check_interval(start, end, rules)?;

    check_availability(vehicle_id, start_date, end_date, availability)?;

    Ok(ValidInterval {
        vehicle_id,
        start,
        end,
    })
}
