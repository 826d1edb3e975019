//! Booking cancellation
//!
//! Only active bookings can be cancelled. Inside the notice window before the
//! start a penalty on the total cost is disclosed first and applied on
//! confirmation. The penalty is computed here and not reconciled with the
//! server.

use chrono::{Duration, NaiveDateTime};
use rust_decimal::Decimal;
use std::sync::Arc;

use super::{
    events::{EventBus, SessionEvent},
    pricing,
};
use crate::{
    api::RentalApi,
    config::BookingRules,
    error::{AppError, AppResult},
    models::{Booking, BookingStatus, Notice},
};

/// What the user is told before confirming
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancellationQuote {
    pub booking_id: i64,
    /// `Some` when the booking starts within the notice window
    pub penalty: Option<Decimal>,
}

impl CancellationQuote {
    pub fn is_free(&self) -> bool {
        self.penalty.is_none()
    }

    pub fn confirmation_prompt(&self) -> String {
        match self.penalty {
            Some(amount) => format!(
                "Cancel this booking? A late-cancellation penalty of €{:.2} will be applied.",
                amount
            ),
            None => "Cancel this booking? Cancellation is free.".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancellationOutcome {
    pub booking_id: i64,
    pub penalty_applied: Option<Decimal>,
    pub notice: Notice,
}

/// Check that a booking can be cancelled and disclose the penalty, if any
pub fn assess(
    booking: &Booking,
    rules: &BookingRules,
    now: NaiveDateTime,
) -> AppResult<CancellationQuote> {
    if !booking.status.can_transition_to(BookingStatus::Annullata) {
        return Err(AppError::BusinessRule(format!(
            "Only active bookings can be cancelled (booking {} is {})",
            booking.id, booking.status
        )));
    }

    let notice = Duration::hours(rules.cancellation_notice_hours);
    let penalty = (booking.start < now + notice).then(|| {
        pricing::cancellation_penalty(booking.total_cost, rules.cancellation_penalty_rate)
    });

    Ok(CancellationQuote {
        booking_id: booking.id,
        penalty,
    })
}

#[derive(Clone)]
pub struct CancellationService {
    api: Arc<dyn RentalApi>,
    events: EventBus,
    rules: BookingRules,
}

impl CancellationService {
    pub fn new(api: Arc<dyn RentalApi>, events: EventBus, rules: BookingRules) -> Self {
        Self { api, events, rules }
    }

    pub fn prepare(&self, booking: &Booking, now: NaiveDateTime) -> AppResult<CancellationQuote> {
        assess(booking, &self.rules, now)
    }

    /// Cancel after the user confirmed `quote`
    pub async fn confirm(
        &self,
        booking: &mut Booking,
        quote: &CancellationQuote,
    ) -> AppResult<CancellationOutcome> {
        if quote.booking_id != booking.id {
            return Err(AppError::InvalidInput(format!(
                "Quote for booking {} used to cancel booking {}",
                quote.booking_id, booking.id
            )));
        }
        if !booking.status.can_transition_to(BookingStatus::Annullata) {
            return Err(AppError::BusinessRule(format!(
                "Booking {} is already {}",
                booking.id, booking.status
            )));
        }

        self.api.cancel_booking(booking.id).await?;
        booking.status = BookingStatus::Annullata;

        self.events.publish(SessionEvent::BookingsChanged);
        self.events.publish(SessionEvent::AvailabilityChanged {
            vehicle_id: booking.vehicle_id(),
        });

        let notice = match quote.penalty {
            Some(amount) => {
                tracing::info!("Booking {} cancelled with penalty {}", booking.id, amount);
                Notice::warning(format!(
                    "Booking cancelled. A penalty of €{:.2} has been applied.",
                    amount
                ))
            }
            None => {
                tracing::info!("Booking {} cancelled", booking.id);
                Notice::success("Booking cancelled")
            }
        };

        Ok(CancellationOutcome {
            booking_id: booking.id,
            penalty_applied: quote.penalty,
            notice,
        })
    }
}
