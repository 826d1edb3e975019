//! Vehicle catalog model

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Vehicle category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleKind {
    Auto,
    Scooter,
}

/// Fuel / power source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FuelType {
    Benzina,
    Diesel,
    Elettrico,
    Ibrido,
}

impl std::fmt::Display for VehicleKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            VehicleKind::Auto => "Car",
            VehicleKind::Scooter => "Scooter",
        };
        write!(f, "{}", label)
    }
}

impl std::fmt::Display for FuelType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            FuelType::Benzina => "Petrol",
            FuelType::Diesel => "Diesel",
            FuelType::Elettrico => "Electric",
            FuelType::Ibrido => "Hybrid",
        };
        write!(f, "{}", label)
    }
}

/// Vehicle as returned by `/veicoli`. Read-only on the client side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: i64,
    #[serde(rename = "targa")]
    pub plate: String,
    #[serde(rename = "marca")]
    pub make: String,
    #[serde(rename = "modello")]
    pub model: String,
    #[serde(rename = "anno", default)]
    pub year: Option<i32>,
    #[serde(rename = "tipo")]
    pub kind: VehicleKind,
    #[serde(rename = "alimentazione", alias = "carburante", default)]
    pub fuel: Option<FuelType>,
    #[serde(rename = "posti", default)]
    pub seats: Option<i32>,
    #[serde(rename = "descrizione", default)]
    pub description: Option<String>,
    #[serde(rename = "costoOrario", with = "rust_decimal::serde::float")]
    pub hourly_rate: Decimal,
    #[serde(rename = "attivo", default = "default_active")]
    pub active: bool,
    #[serde(rename = "immagine", default)]
    pub image: Option<String>,
    /// Date the vehicle entered the fleet, sent as a plain string
    #[serde(rename = "dataAggiunta", default)]
    pub added_on: Option<String>,
}

fn default_active() -> bool {
    true
}

impl Vehicle {
    /// Label used in vehicle pickers: "Fiat Panda (AB123CD)"
    pub fn label(&self) -> String {
        format!("{} {} ({})", self.make, self.model, self.plate)
    }

    /// Parsed fleet entry date, when the server sent an ISO date or datetime
    pub fn added_date(&self) -> Option<NaiveDate> {
        let raw = self.added_on.as_deref()?;
        raw.get(..10)
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
    }
}
