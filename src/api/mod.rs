//! Typed client for the rental REST API

pub mod bookings;
pub mod cards;
pub mod client;
pub mod vehicles;

use async_trait::async_trait;

use crate::{
    error::AppResult,
    models::{availability::AvailabilityResponse, Booking, CreditCard, NewCreditCard, Vehicle},
};

pub use client::ApiClient;

/// Remote operations used by the booking engine.
///
/// Every call is a single request/response; nothing is retried.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RentalApi: Send + Sync {
    /// `GET /veicoli`
    async fn list_vehicles(&self) -> AppResult<Vec<Vehicle>>;

    /// `GET /veicoli/{id}`
    async fn get_vehicle(&self, id: i64) -> AppResult<Vehicle>;

    /// `GET /veicoli/{id}/disponibilita`
    async fn get_availability(&self, vehicle_id: i64) -> AppResult<AvailabilityResponse>;

    /// `POST /prenotazioni?veicoloId=&inizio=&fine=`
    ///
    /// Any 2xx means the booking exists. The body is returned only when it
    /// decodes as a `Booking`.
    async fn create_booking(&self, vehicle_id: i64, start: String, end: String)
        -> AppResult<Option<Booking>>;

    /// `PUT /prenotazioni/{id}/cancella`
    async fn cancel_booking(&self, id: i64) -> AppResult<()>;

    /// `GET /prenotazioni/mybookings`
    async fn my_bookings(&self) -> AppResult<Vec<Booking>>;

    /// `GET /prenotazioni` (admin only)
    async fn all_bookings(&self) -> AppResult<Vec<Booking>>;

    /// `GET /carte-credito/valida`
    async fn has_valid_card(&self) -> AppResult<bool>;

    /// `GET /carte-credito`
    async fn list_cards(&self) -> AppResult<Vec<CreditCard>>;

    /// `POST /carte-credito`
    async fn add_card(&self, card: NewCreditCard) -> AppResult<CreditCard>;

    /// `DELETE /carte-credito/{id}`
    async fn remove_card(&self, id: i64) -> AppResult<()>;

    /// `PUT /carte-credito/{id}/principale`
    async fn set_primary_card(&self, id: i64) -> AppResult<CreditCard>;
}
