//! In-progress booking form state

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::services::validation::{self, ValidationError, ISO_INSTANT_FORMAT};

/// Booking draft, edited field by field.
///
/// Each setter validates the new value against the fields already chosen.
/// A rejected value is not applied and its message fills the single error
/// slot; an accepted value clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingDraft {
    pub vehicle_id: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_date: Option<NaiveDate>,
    pub end_time: Option<NaiveTime>,
    pub error: Option<String>,
}

impl BookingDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draft pre-seeded from navigation context (e.g. "book this vehicle")
    pub fn for_vehicle(vehicle_id: i64) -> Self {
        Self {
            vehicle_id: Some(vehicle_id),
            ..Self::default()
        }
    }

    pub fn select_vehicle(&mut self, vehicle_id: Option<i64>) {
        self.vehicle_id = vehicle_id;
        self.error = None;
    }

    pub fn set_start_date(
        &mut self,
        date: NaiveDate,
        now: NaiveDateTime,
    ) -> Result<(), ValidationError> {
        self.record(validation::check_start_date(date, now))?;
        self.start_date = Some(date);
        // Keep the pair consistent rather than leaving an end before the start
        if matches!(self.end_date, Some(end) if date > end) {
            self.end_date = None;
        }
        Ok(())
    }

    pub fn set_start_time(
        &mut self,
        time: NaiveTime,
        now: NaiveDateTime,
    ) -> Result<(), ValidationError> {
        self.record(validation::check_start_time(self.start_date, time, now))?;
        self.start_time = Some(time);
        Ok(())
    }

    pub fn set_end_date(
        &mut self,
        date: NaiveDate,
        now: NaiveDateTime,
    ) -> Result<(), ValidationError> {
        self.record(validation::check_end_date(date, self.start_date, now))?;
        self.end_date = Some(date);
        Ok(())
    }

    pub fn set_end_time(
        &mut self,
        time: NaiveTime,
        now: NaiveDateTime,
    ) -> Result<(), ValidationError> {
        self.record(validation::check_end_time(
            self.end_date,
            self.start_date,
            self.start_time,
            time,
            now,
        ))?;
        self.end_time = Some(time);
        Ok(())
    }

    fn record(&mut self, result: Result<(), ValidationError>) -> Result<(), ValidationError> {
        match &result {
            Ok(()) => self.error = None,
            Err(e) => self.error = Some(e.to_string()),
        }
        result
    }

    pub fn set_error(&mut self, error: &ValidationError) {
        self.error = Some(error.to_string());
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Submission stays disabled while an error is shown
    pub fn can_submit(&self) -> bool {
        self.error.is_none() && self.is_complete()
    }

    pub fn is_complete(&self) -> bool {
        self.vehicle_id.is_some()
            && self.start_date.is_some()
            && self.start_time.is_some()
            && self.end_date.is_some()
            && self.end_time.is_some()
    }

    pub fn start_instant(&self) -> Option<NaiveDateTime> {
        Some(self.start_date?.and_time(self.start_time?))
    }

    pub fn end_instant(&self) -> Option<NaiveDateTime> {
        Some(self.end_date?.and_time(self.end_time?))
    }

    pub fn iso_start(&self) -> Option<String> {
        self.start_instant()
            .map(|i| i.format(ISO_INSTANT_FORMAT).to_string())
    }

    pub fn iso_end(&self) -> Option<String> {
        self.end_instant()
            .map(|i| i.format(ISO_INSTANT_FORMAT).to_string())
    }

    /// Discard everything except the selected vehicle
    pub fn clear(&mut self) {
        *self = Self {
            vehicle_id: self.vehicle_id,
            ..Self::default()
        };
    }
}
