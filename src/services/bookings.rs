//! Booking submission gate
//!
//! Submission is allowed only with a payment method on file and a draft
//! that passes every interval rule. Failures are terminal for the attempt:
//! nothing is retried, the draft is kept so the user can try again.

use chrono::NaiveDateTime;
use parking_lot::Mutex;
use reqwest::StatusCode;
use std::sync::Arc;
use validator::Validate;

use super::{
    events::{EventBus, SessionEvent},
    validation::{self, ValidationError},
};
use crate::{
    api::RentalApi,
    config::BookingRules,
    error::{AppError, AppResult},
    models::{
        AvailabilityWindow, Booking, BookingDraft, BookingFilter, CreditCard, NewCreditCard,
        Notice, PaymentMethodPresence,
    },
};

const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
const BOOKING_CONFLICT: &str = "BOOKING_CONFLICT";
const MISSING_CARD_MARKER: &str = "carta di credito";

const MSG_CARD_REQUIRED: &str = "A credit card is required before booking";
const MSG_INVALID_DATA: &str = "Invalid data. Check the fields you entered.";
const MSG_VALIDATION_FALLBACK: &str = "Validation error";
const MSG_CONFLICT_FALLBACK: &str = "Booking conflict";
const MSG_CONFLICT_HINT: &str = "Check the available dates shown for this vehicle.";
const MSG_UNAVAILABLE: &str = "The vehicle is not available on the selected dates. Try different dates.";
const MSG_SESSION_EXPIRED: &str = "Your session has expired. Sign in again.";
const MSG_RETRY: &str = "Booking failed. Please try again later.";

/// How a failed creation call is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    MissingPaymentMethod,
    ServerValidation,
    Conflict,
    Unauthorized,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitFailure {
    pub kind: FailureKind,
    pub message: String,
}

/// Map a creation error to the message the user sees
pub fn classify_failure(error: &AppError) -> SubmitFailure {
    let failure = |kind, message: &str| SubmitFailure {
        kind,
        message: message.to_string(),
    };

    let payload = error.payload();
    // The creation endpoint wraps the card error in a 500 and puts it in `dettaglio`
    let mentions_card = payload
        .map(|p| {
            [p.messaggio.as_deref(), p.dettaglio.as_deref()]
                .into_iter()
                .flatten()
                .any(|m| m.to_lowercase().contains(MISSING_CARD_MARKER))
        })
        .unwrap_or(false);
    if mentions_card {
        return failure(FailureKind::MissingPaymentMethod, MSG_CARD_REQUIRED);
    }

    match error.status() {
        Some(StatusCode::BAD_REQUEST) => match payload {
            Some(p) if p.is_kind(VALIDATION_ERROR) => failure(
                FailureKind::ServerValidation,
                p.messaggio.as_deref().unwrap_or(MSG_VALIDATION_FALLBACK),
            ),
            _ => failure(FailureKind::ServerValidation, MSG_INVALID_DATA),
        },
        Some(StatusCode::CONFLICT) => match payload {
            Some(p) if p.is_kind(BOOKING_CONFLICT) => SubmitFailure {
                kind: FailureKind::Conflict,
                message: format!(
                    "{} {}",
                    p.messaggio.as_deref().unwrap_or(MSG_CONFLICT_FALLBACK),
                    p.dettaglio.as_deref().unwrap_or(MSG_CONFLICT_HINT)
                ),
            },
            _ => failure(FailureKind::Conflict, MSG_UNAVAILABLE),
        },
        Some(StatusCode::UNAUTHORIZED) => failure(FailureKind::Unauthorized, MSG_SESSION_EXPIRED),
        _ => failure(FailureKind::Other, MSG_RETRY),
    }
}

/// Result of one submit attempt
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Booking created; the caller navigates to the bookings list. The
    /// booking is `None` when the server's echo could not be read.
    Created {
        booking: Option<Booking>,
        notice: Notice,
    },
    /// No valid payment method: open the collection step. Nothing was sent
    /// unless the server itself reported the missing card.
    PaymentMethodRequired { notice: Option<Notice> },
    /// Draft rejected locally; the error is also stored in the draft.
    Invalid(ValidationError),
    /// The server refused the booking.
    Rejected(SubmitFailure),
}

impl SubmitOutcome {
    pub fn notice(&self) -> Option<Notice> {
        match self {
            SubmitOutcome::Created { notice, .. } => Some(notice.clone()),
            SubmitOutcome::PaymentMethodRequired { notice } => notice.clone(),
            SubmitOutcome::Invalid(_) => None,
            SubmitOutcome::Rejected(failure) => Some(Notice::error(failure.message.clone())),
        }
    }
}

#[derive(Clone)]
pub struct BookingService {
    api: Arc<dyn RentalApi>,
    events: EventBus,
    rules: BookingRules,
    presence: Arc<Mutex<PaymentMethodPresence>>,
}

impl BookingService {
    pub fn new(api: Arc<dyn RentalApi>, events: EventBus, rules: BookingRules) -> Self {
        Self {
            api,
            events,
            rules,
            presence: Arc::new(Mutex::new(PaymentMethodPresence::Unknown)),
        }
    }

    pub fn rules(&self) -> &BookingRules {
        &self.rules
    }

    pub fn payment_presence(&self) -> PaymentMethodPresence {
        *self.presence.lock()
    }

    fn set_presence(&self, presence: PaymentMethodPresence) {
        *self.presence.lock() = presence;
    }

    /// Entering the booking flow: ask the server whether a card is on file.
    pub async fn begin_flow(&self) -> PaymentMethodPresence {
        let presence = match self.api.has_valid_card().await {
            Ok(valid) => PaymentMethodPresence::from(valid),
            Err(e) => {
                tracing::warn!("Payment method check failed: {}", e);
                PaymentMethodPresence::Absent
            }
        };
        self.set_presence(presence);
        presence
    }

    /// The collection step succeeded elsewhere; the user resubmits manually.
    pub fn payment_method_collected(&self) -> Notice {
        self.set_presence(PaymentMethodPresence::Present);
        Notice::success("Credit card added. You can now complete your booking.")
    }

    /// Validate and store a card, then unlock submission
    pub async fn collect_payment_method(&self, card: NewCreditCard) -> AppResult<CreditCard> {
        let card = card.normalized();
        card.validate()
            .map_err(|e| AppError::InvalidInput(e.to_string()))?;

        let stored = self.api.add_card(card).await?;
        self.payment_method_collected();
        Ok(stored)
    }

    pub async fn submit(
        &self,
        draft: &mut BookingDraft,
        availability: Option<&AvailabilityWindow>,
        now: NaiveDateTime,
    ) -> SubmitOutcome {
        if !self.payment_presence().is_present() {
            tracing::info!("Submission blocked: no payment method on file");
            return SubmitOutcome::PaymentMethodRequired { notice: None };
        }

        let interval = match validation::validate_draft(draft, availability, &self.rules, now) {
            Ok(interval) => interval,
            Err(e) => {
                draft.set_error(&e);
                return SubmitOutcome::Invalid(e);
            }
        };

        let result = self
            .api
            .create_booking(interval.vehicle_id, interval.iso_start(), interval.iso_end())
            .await;

        match result {
            Ok(booking) => {
                self.events.publish(SessionEvent::BookingsChanged);
                self.events.publish(SessionEvent::AvailabilityChanged {
                    vehicle_id: Some(interval.vehicle_id),
                });
                draft.clear();
                SubmitOutcome::Created {
                    booking,
                    notice: Notice::success("Booking confirmed"),
                }
            }
            Err(e) => {
                tracing::warn!("Booking creation failed: {}", e);
                let failure = classify_failure(&e);
                if failure.kind == FailureKind::MissingPaymentMethod {
                    self.set_presence(PaymentMethodPresence::Absent);
                    return SubmitOutcome::PaymentMethodRequired {
                        notice: Some(Notice::error(failure.message)),
                    };
                }
                SubmitOutcome::Rejected(failure)
            }
        }
    }

    /// Bookings of the acting user, optionally filtered
    pub async fn list_bookings(&self, filter: BookingFilter) -> AppResult<Vec<Booking>> {
        let bookings = self.api.my_bookings().await?;
        Ok(filter.apply(&bookings))
    }

    pub async fn all_bookings(&self) -> AppResult<Vec<Booking>> {
        self.api.all_bookings().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{api::MockRentalApi, error::ApiErrorPayload, models::BookingStatus};
    use chrono::{NaiveDate, NaiveTime};
    use rust_decimal::Decimal;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn now() -> NaiveDateTime {
        date(1).and_hms_opt(8, 0, 0).unwrap()
    }

    fn draft() -> BookingDraft {
        BookingDraft {
            vehicle_id: Some(5),
            start_date: Some(date(4)),
            start_time: NaiveTime::from_hms_opt(9, 0, 0),
            end_date: Some(date(4)),
            end_time: NaiveTime::from_hms_opt(11, 0, 0),
            error: None,
        }
    }

    fn window() -> AvailabilityWindow {
        AvailabilityWindow::new(5, (1..=30).map(date), std::iter::empty()).unwrap()
    }

    fn created() -> Booking {
        Booking {
            id: 99,
            start: date(4).and_hms_opt(9, 0, 0).unwrap(),
            end: date(4).and_hms_opt(11, 0, 0).unwrap(),
            status: BookingStatus::Attiva,
            total_cost: Decimal::from(20),
            note: None,
            created_at: None,
            vehicle: None,
            user: None,
        }
    }

    fn api_error(status: StatusCode, tipo: Option<&str>, msg: &str, detail: Option<&str>) -> AppError {
        AppError::Api {
            status,
            payload: Some(ApiErrorPayload {
                tipo: tipo.map(str::to_string),
                messaggio: Some(msg.to_string()),
                dettaglio: detail.map(str::to_string),
            }),
        }
    }

    fn service(api: MockRentalApi, bus: &EventBus) -> BookingService {
        BookingService::new(Arc::new(api), bus.clone(), BookingRules::default())
    }

    #[tokio::test]
    async fn test_no_card_opens_collection_without_network_call() {
        let mut api = MockRentalApi::new();
        api.expect_has_valid_card().times(1).returning(|| Ok(false));
        api.expect_create_booking().never();

        let bus = EventBus::default();
        let svc = service(api, &bus);
        assert_eq!(svc.begin_flow().await, PaymentMethodPresence::Absent);

        let mut d = draft();
        let outcome = svc.submit(&mut d, Some(&window()), now()).await;
        assert_eq!(outcome, SubmitOutcome::PaymentMethodRequired { notice: None });
    }

    #[tokio::test]
    async fn test_card_check_failure_counts_as_absent() {
        let mut api = MockRentalApi::new();
        api.expect_has_valid_card()
            .returning(|| Err(AppError::Internal("offline".into())));

        let svc = service(api, &EventBus::default());
        assert_eq!(svc.begin_flow().await, PaymentMethodPresence::Absent);
    }

    #[tokio::test]
    async fn test_collection_does_not_resubmit() {
        let mut api = MockRentalApi::new();
        api.expect_has_valid_card().returning(|| Ok(false));
        api.expect_create_booking().never();

        let svc = service(api, &EventBus::default());
        svc.begin_flow().await;
        svc.payment_method_collected();
        assert!(svc.payment_presence().is_present());
    }

    #[tokio::test]
    async fn test_successful_submission_broadcasts_and_clears_draft() {
        let mut api = MockRentalApi::new();
        api.expect_has_valid_card().returning(|| Ok(true));
        api.expect_create_booking()
            .withf(|id, start, end| {
                *id == 5 && start == "2024-06-04T09:00:00" && end == "2024-06-04T11:00:00"
            })
            .times(1)
            .returning(|_, _, _| Ok(Some(created())));

        let bus = EventBus::default();
        let mut rx = bus.subscribe();
        let svc = service(api, &bus);
        svc.begin_flow().await;

        let mut d = draft();
        let outcome = svc.submit(&mut d, Some(&window()), now()).await;

        match outcome {
            SubmitOutcome::Created { booking, .. } => assert_eq!(booking.map(|b| b.id), Some(99)),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(d, BookingDraft::for_vehicle(5));
        assert_eq!(rx.recv().await.unwrap(), SessionEvent::BookingsChanged);
        assert_eq!(
            rx.recv().await.unwrap(),
            SessionEvent::AvailabilityChanged { vehicle_id: Some(5) }
        );
    }

    #[tokio::test]
    async fn test_unreadable_echo_still_counts_as_created() {
        let mut api = MockRentalApi::new();
        api.expect_has_valid_card().returning(|| Ok(true));
        api.expect_create_booking()
            .times(1)
            .returning(|_, _, _| Ok(None));

        let bus = EventBus::default();
        let mut rx = bus.subscribe();
        let svc = service(api, &bus);
        svc.begin_flow().await;

        let mut d = draft();
        let outcome = svc.submit(&mut d, Some(&window()), now()).await;

        assert!(matches!(outcome, SubmitOutcome::Created { booking: None, .. }));
        assert_eq!(d, BookingDraft::for_vehicle(5));
        assert_eq!(rx.recv().await.unwrap(), SessionEvent::BookingsChanged);
    }

    #[tokio::test]
    async fn test_invalid_draft_sets_error_and_skips_call() {
        let mut api = MockRentalApi::new();
        api.expect_has_valid_card().returning(|| Ok(true));
        api.expect_create_booking().never();

        let svc = service(api, &EventBus::default());
        svc.begin_flow().await;

        let mut d = draft();
        d.end_time = NaiveTime::from_hms_opt(9, 30, 0);
        let outcome = svc.submit(&mut d, Some(&window()), now()).await;

        assert!(matches!(outcome, SubmitOutcome::Invalid(ValidationError::TooShort { .. })));
        assert!(d.error().is_some());
        assert!(!d.can_submit());
    }

    #[tokio::test]
    async fn test_conflict_keeps_draft_and_joins_detail() {
        let mut api = MockRentalApi::new();
        api.expect_has_valid_card().returning(|| Ok(true));
        api.expect_create_booking().returning(|_, _, _| {
            Err(api_error(
                StatusCode::CONFLICT,
                Some("BOOKING_CONFLICT"),
                "Vehicle already booked.",
                Some("Pick another slot."),
            ))
        });

        let svc = service(api, &EventBus::default());
        svc.begin_flow().await;

        let mut d = draft();
        let outcome = svc.submit(&mut d, Some(&window()), now()).await;

        assert_eq!(
            outcome,
            SubmitOutcome::Rejected(SubmitFailure {
                kind: FailureKind::Conflict,
                message: "Vehicle already booked. Pick another slot.".to_string(),
            })
        );
        assert_eq!(d, draft());
    }

    #[tokio::test]
    async fn test_server_missing_card_resets_presence() {
        let mut api = MockRentalApi::new();
        api.expect_has_valid_card().returning(|| Ok(true));
        api.expect_create_booking().returning(|_, _, _| {
            Err(api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                Some("INTERNAL_ERROR"),
                "Errore durante la creazione della prenotazione.",
                Some("È necessario inserire una carta di credito valida per effettuare una prenotazione"),
            ))
        });

        let svc = service(api, &EventBus::default());
        svc.begin_flow().await;

        let mut d = draft();
        let outcome = svc.submit(&mut d, Some(&window()), now()).await;
        assert!(matches!(
            outcome,
            SubmitOutcome::PaymentMethodRequired { notice: Some(_) }
        ));
        assert_eq!(svc.payment_presence(), PaymentMethodPresence::Absent);
    }

    #[test]
    fn test_classification() {
        let validation = api_error(StatusCode::BAD_REQUEST, Some("VALIDATION_ERROR"), "Date non valide", None);
        assert_eq!(
            classify_failure(&validation),
            SubmitFailure {
                kind: FailureKind::ServerValidation,
                message: "Date non valide".to_string()
            }
        );

        let bare_400 = AppError::Api {
            status: StatusCode::BAD_REQUEST,
            payload: None,
        };
        assert_eq!(classify_failure(&bare_400).message, MSG_INVALID_DATA);

        let conflict_no_detail =
            api_error(StatusCode::CONFLICT, Some("BOOKING_CONFLICT"), "Occupato.", None);
        assert_eq!(
            classify_failure(&conflict_no_detail).message,
            format!("Occupato. {}", MSG_CONFLICT_HINT)
        );

        let card_in_detail = api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            Some("INTERNAL_ERROR"),
            "Errore durante la creazione della prenotazione.",
            Some("È necessario inserire una carta di credito valida"),
        );
        assert_eq!(
            classify_failure(&card_in_detail).kind,
            FailureKind::MissingPaymentMethod
        );

        let plain_conflict = AppError::Api {
            status: StatusCode::CONFLICT,
            payload: None,
        };
        assert_eq!(classify_failure(&plain_conflict).message, MSG_UNAVAILABLE);

        assert_eq!(
            classify_failure(&AppError::Unauthorized),
            SubmitFailure {
                kind: FailureKind::Unauthorized,
                message: MSG_SESSION_EXPIRED.to_string(),
            }
        );
        assert_eq!(
            classify_failure(&AppError::Internal("x".into())).kind,
            FailureKind::Other
        );
    }

    #[tokio::test]
    async fn test_collect_payment_method_validates_first() {
        let mut api = MockRentalApi::new();
        api.expect_add_card().never();

        let svc = service(api, &EventBus::default());
        let bad = NewCreditCard {
            numero_carta: "123".into(),
            scadenza_carta: "12/29".into(),
            cvv_carta: "123".into(),
            intestatario_carta: "Mario Rossi".into(),
        };
        let result = svc.collect_payment_method(bad).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
        assert!(!svc.payment_presence().is_present());
    }
}
