//! Price calculation

use chrono::NaiveDateTime;
use rust_decimal::prelude::*;

use crate::models::{BookingDraft, Vehicle};

const SECONDS_PER_HOUR: i64 = 3600;

/// Hours billed for an interval: started hours count in full, minimum one.
pub fn billed_hours(start: NaiveDateTime, end: NaiveDateTime) -> i64 {
    let seconds = (end - start).num_seconds();
    let hours = if seconds > 0 {
        (seconds + SECONDS_PER_HOUR - 1) / SECONDS_PER_HOUR
    } else {
        0
    };
    hours.max(1)
}

/// `max(1, ceil(hours)) * hourly_rate`
pub fn quote(hourly_rate: Decimal, start: NaiveDateTime, end: NaiveDateTime) -> Decimal {
    Decimal::from(billed_hours(start, end)) * hourly_rate
}

/// Total shown while the draft is edited; zero until every input is set.
pub fn draft_total(vehicle: Option<&Vehicle>, draft: &BookingDraft) -> Decimal {
    match (vehicle, draft.start_instant(), draft.end_instant()) {
        (Some(vehicle), Some(start), Some(end)) => quote(vehicle.hourly_rate, start, end),
        _ => Decimal::ZERO,
    }
}

/// Late-cancellation fee, rounded to cents
pub fn cancellation_penalty(total_cost: Decimal, rate: Decimal) -> Decimal {
    (total_cost * rate).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
