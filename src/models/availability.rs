//! Per-vehicle availability window

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::AppError;

/// Wire shape of `GET /veicoli/{id}/disponibilita`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResponse {
    pub veicolo_id: i64,
    #[serde(default)]
    pub date_disponibili: Vec<NaiveDate>,
    #[serde(default)]
    pub date_occupate: Vec<NaiveDate>,
}

/// Available and occupied calendar dates of one vehicle within the server's
/// lookahead horizon. A date is never in both sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailabilityWindow {
    vehicle_id: i64,
    available: BTreeSet<NaiveDate>,
    occupied: BTreeSet<NaiveDate>,
}

impl AvailabilityWindow {
    pub fn new(
        vehicle_id: i64,
        available: impl IntoIterator<Item = NaiveDate>,
        occupied: impl IntoIterator<Item = NaiveDate>,
    ) -> Result<Self, AppError> {
        let available: BTreeSet<NaiveDate> = available.into_iter().collect();
        let occupied: BTreeSet<NaiveDate> = occupied.into_iter().collect();

        if let Some(date) = available.intersection(&occupied).next() {
            return Err(AppError::InvalidPayload(format!(
                "Date {} reported both available and occupied for vehicle {}",
                date, vehicle_id
            )));
        }

        Ok(Self {
            vehicle_id,
            available,
            occupied,
        })
    }

    pub fn vehicle_id(&self) -> i64 {
        self.vehicle_id
    }

    pub fn available(&self) -> &BTreeSet<NaiveDate> {
        &self.available
    }

    pub fn occupied(&self) -> &BTreeSet<NaiveDate> {
        &self.occupied
    }

    pub fn is_available(&self, date: NaiveDate) -> bool {
        self.available.contains(&date)
    }

    /// Dates of the inclusive range `[start, end]` missing from the available set
    pub fn unavailable_between(&self, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
        start
            .iter_days()
            .take_while(|d| *d <= end)
            .filter(|d| !self.available.contains(d))
            .collect()
    }

    /// First and last date the window knows about
    pub fn horizon(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self
            .available
            .first()
            .into_iter()
            .chain(self.occupied.first())
            .min()?;
        let last = self
            .available
            .last()
            .into_iter()
            .chain(self.occupied.last())
            .max()?;
        Some((*first, *last))
    }
}

impl TryFrom<AvailabilityResponse> for AvailabilityWindow {
    type Error = AppError;

    fn try_from(response: AvailabilityResponse) -> Result<Self, Self::Error> {
        AvailabilityWindow::new(
            response.veicolo_id,
            response.date_disponibili,
            response.date_occupate,
        )
    }
}
