//! Booking engine services

pub mod availability;
pub mod bookings;
pub mod cancellation;
pub mod events;
pub mod pricing;
pub mod validation;

use std::sync::Arc;

use crate::{api::RentalApi, config::AppConfig};

/// Container for all services of one session
#[derive(Clone)]
pub struct Services {
    pub availability: Arc<availability::AvailabilityResolver>,
    pub bookings: bookings::BookingService,
    pub cancellations: cancellation::CancellationService,
    pub events: events::EventBus,
}

impl Services {
    /// Create all services on top of the given API
    pub fn new(api: Arc<dyn RentalApi>, config: &AppConfig) -> Self {
        let events = events::EventBus::new(config.events.capacity);
        Self {
            availability: Arc::new(availability::AvailabilityResolver::new(api.clone())),
            bookings: bookings::BookingService::new(
                api.clone(),
                events.clone(),
                config.booking.clone(),
            ),
            cancellations: cancellation::CancellationService::new(
                api,
                events.clone(),
                config.booking.clone(),
            ),
            events,
        }
    }
}
