//! Booking (prenotazione) model and related types

use chrono::{Duration, NaiveDateTime};
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};

use super::vehicle::Vehicle;

/// Booking lifecycle state. `Completata` and `Annullata` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Attiva,
    Completata,
    Annullata,
}

impl BookingStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, BookingStatus::Attiva)
    }

    /// Completion is time-driven on the server; cancellation is user-initiated.
    pub fn can_transition_to(self, next: BookingStatus) -> bool {
        matches!(
            (self, next),
            (BookingStatus::Attiva, BookingStatus::Completata)
                | (BookingStatus::Attiva, BookingStatus::Annullata)
        )
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            BookingStatus::Attiva => "Active",
            BookingStatus::Completata => "Completed",
            BookingStatus::Annullata => "Cancelled",
        };
        write!(f, "{}", label)
    }
}

/// Requester as embedded in booking payloads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub nome: Option<String>,
    #[serde(default)]
    pub cognome: Option<String>,
}

/// Persisted booking, owned by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: i64,
    #[serde(rename = "dataInizio")]
    pub start: NaiveDateTime,
    #[serde(rename = "dataFine")]
    pub end: NaiveDateTime,
    #[serde(rename = "stato")]
    pub status: BookingStatus,
    #[serde(rename = "costoTotale", with = "rust_decimal::serde::float")]
    pub total_cost: Decimal,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(rename = "dataCreazione", default)]
    pub created_at: Option<NaiveDateTime>,
    #[serde(rename = "veicolo", default)]
    pub vehicle: Option<Vehicle>,
    #[serde(rename = "utente", default)]
    pub user: Option<BookingUser>,
}

impl Booking {
    pub fn vehicle_id(&self) -> Option<i64> {
        self.vehicle.as_ref().map(|v| v.id)
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// "2h 30m", "3h" or "45m"
    pub fn duration_label(&self) -> String {
        let minutes = self.duration().num_minutes().max(0);
        let (hours, rest) = (minutes / 60, minutes % 60);
        match (hours, rest) {
            (0, m) => format!("{}m", m),
            (h, 0) => format!("{}h", h),
            (h, m) => format!("{}h {}m", h, m),
        }
    }

    /// Total cost divided by the actual booked hours
    pub fn effective_hourly_rate(&self) -> Option<Decimal> {
        let minutes = self.duration().num_minutes();
        if minutes <= 0 {
            return None;
        }
        let hours = Decimal::from(minutes) / Decimal::from(60);
        Some((self.total_cost / hours).round_dp(2))
    }
}

/// Filter tabs of the bookings list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BookingFilter {
    #[default]
    All,
    Active,
    Completed,
    Cancelled,
}

impl BookingFilter {
    pub fn matches(self, booking: &Booking) -> bool {
        match self {
            BookingFilter::All => true,
            BookingFilter::Active => booking.status == BookingStatus::Attiva,
            BookingFilter::Completed => booking.status == BookingStatus::Completata,
            BookingFilter::Cancelled => booking.status == BookingStatus::Annullata,
        }
    }

    pub fn apply(self, bookings: &[Booking]) -> Vec<Booking> {
        bookings.iter().filter(|b| self.matches(b)).cloned().collect()
    }

    pub fn count(self, bookings: &[Booking]) -> usize {
        bookings.iter().filter(|b| self.matches(b)).count()
    }
}

impl std::str::FromStr for BookingFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(BookingFilter::All),
            "active" => Ok(BookingFilter::Active),
            "completed" => Ok(BookingFilter::Completed),
            "cancelled" => Ok(BookingFilter::Cancelled),
            other => Err(format!("unknown booking filter: {}", other)),
        }
    }
}
