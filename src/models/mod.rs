//! Data models for the rental client

pub mod availability;
pub mod booking;
pub mod draft;
pub mod notice;
pub mod payment;
pub mod vehicle;

// Re-export commonly used types
pub use availability::AvailabilityWindow;
pub use booking::{Booking, BookingFilter, BookingStatus};
pub use draft::BookingDraft;
pub use notice::{Notice, NoticeLevel};
pub use payment::{CreditCard, NewCreditCard, PaymentMethodPresence};
pub use vehicle::{FuelType, Vehicle, VehicleKind};
