//! Booking endpoints

use serde_json::Value;

use super::ApiClient;
use crate::{
    error::{AppError, AppResult},
    models::Booking,
};

impl ApiClient {
    /// Create a booking. Instants are local wall-clock ISO strings.
    ///
    /// Once the server answered 2xx the booking is committed, so an
    /// unreadable body only loses the echo, never the outcome.
    pub async fn post_booking(
        &self,
        vehicle_id: i64,
        start: &str,
        end: &str,
    ) -> AppResult<Option<Booking>> {
        let request = self.post("prenotazioni")?.query(&[
            ("veicoloId", vehicle_id.to_string().as_str()),
            ("inizio", start),
            ("fine", end),
        ]);
        let response = self.send(request).await?;
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!("Could not read booking creation response: {}", e);
                String::new()
            }
        };

        let booking = parse_created_booking(&body);
        match &booking {
            Some(b) => tracing::info!("Booking {} created for vehicle {}", b.id, vehicle_id),
            None => tracing::info!("Booking created for vehicle {}", vehicle_id),
        }
        Ok(booking)
    }

    /// Soft-cancel a booking
    pub async fn put_cancellation(&self, id: i64) -> AppResult<()> {
        self.send(self.put(&format!("prenotazioni/{}/cancella", id))?)
            .await?;
        tracing::info!("Booking {} cancelled", id);
        Ok(())
    }

    /// Bookings of the authenticated user
    pub async fn fetch_my_bookings(&self) -> AppResult<Vec<Booking>> {
        let body: Value = self.send_json(self.get("prenotazioni/mybookings")?).await?;
        parse_booking_list(body)
    }

    pub async fn fetch_all_bookings(&self) -> AppResult<Vec<Booking>> {
        self.send_json(self.get("prenotazioni")?).await
    }
}

/// Body of a successful creation call, when it is a well-formed booking
pub fn parse_created_booking(body: &str) -> Option<Booking> {
    if body.trim().is_empty() {
        return None;
    }
    match serde_json::from_str::<Booking>(body) {
        Ok(booking) => Some(booking),
        Err(e) => {
            tracing::warn!("Booking created but the response body was not understood: {}", e);
            None
        }
    }
}

/// The list endpoint has answered with a bare array, a `{prenotazioni: [...]}`
/// envelope, or either of those encoded once more as a JSON string.
pub fn parse_booking_list(body: Value) -> AppResult<Vec<Booking>> {
    let body = match body {
        Value::String(raw) => serde_json::from_str(&raw)
            .map_err(|e| AppError::InvalidPayload(format!("Booking list is not JSON: {}", e)))?,
        other => other,
    };

    let list = match body {
        Value::Array(_) => body,
        Value::Object(mut map) => match map.remove("prenotazioni") {
            Some(inner @ Value::Array(_)) => inner,
            _ => {
                tracing::warn!("Booking list response has no bookings array");
                return Ok(Vec::new());
            }
        },
        _ => {
            tracing::warn!("Unexpected booking list response shape");
            return Ok(Vec::new());
        }
    };

    serde_json::from_value(list)
        .map_err(|e| AppError::InvalidPayload(format!("Malformed booking list: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "id": 1,
            "dataInizio": "2024-06-04T09:00:00",
            "dataFine": "2024-06-04T11:00:00",
            "stato": "ATTIVA",
            "costoTotale": 20.0
        })
    }

    #[test]
    fn test_bare_array() {
        let list = parse_booking_list(json!([sample()])).unwrap();
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_envelope_and_string_encoded() {
        let envelope = json!({ "prenotazioni": [sample(), sample()] });
        assert_eq!(parse_booking_list(envelope.clone()).unwrap().len(), 2);

        let encoded = Value::String(envelope.to_string());
        assert_eq!(parse_booking_list(encoded).unwrap().len(), 2);
    }

    #[test]
    fn test_created_booking_body() {
        assert_eq!(parse_created_booking(&sample().to_string()).map(|b| b.id), Some(1));

        // Raw entity without the computed cost
        let entity = json!({
            "id": 5,
            "dataInizio": "2024-06-04T09:00:00",
            "dataFine": "2024-06-04T11:00:00",
            "stato": "ATTIVA"
        });
        assert!(parse_created_booking(&entity.to_string()).is_none());
        assert!(parse_created_booking("").is_none());
        assert!(parse_created_booking("OK").is_none());
    }

    #[test]
    fn test_unknown_shapes() {
        assert!(parse_booking_list(json!({ "other": 1 })).unwrap().is_empty());
        assert!(parse_booking_list(json!(42)).unwrap().is_empty());
        assert!(matches!(
            parse_booking_list(Value::String("{oops".into())),
            Err(AppError::InvalidPayload(_))
        ));
    }
}
