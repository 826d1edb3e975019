//! Payment method (credit card) models

use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::Validate;

static CARD_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{16}$").unwrap());
static CARD_EXPIRY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(0[1-9]|1[0-2])/[0-9]{2}$").unwrap());
static CARD_CVV: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{3}$").unwrap());

/// Whether the acting user has a valid card on file.
///
/// Re-derived from the server every time the booking flow starts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PaymentMethodPresence {
    #[default]
    Unknown,
    Present,
    Absent,
}

impl PaymentMethodPresence {
    pub fn is_present(self) -> bool {
        self == PaymentMethodPresence::Present
    }
}

impl From<bool> for PaymentMethodPresence {
    fn from(present: bool) -> Self {
        if present {
            PaymentMethodPresence::Present
        } else {
            PaymentMethodPresence::Absent
        }
    }
}

/// Stored card as returned by `/carte-credito` (number masked by the server)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditCard {
    #[serde(default)]
    pub id: Option<i64>,
    pub numero_carta: String,
    pub scadenza_carta: String,
    pub intestatario_carta: String,
    #[serde(default)]
    pub tipo_carta: Option<String>,
    #[serde(default)]
    pub principale: bool,
    #[serde(default)]
    pub mascherata: bool,
    #[serde(default)]
    pub scaduta: bool,
    #[serde(default)]
    pub data_creazione: Option<NaiveDateTime>,
}

/// Card collected by the payment-method step
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewCreditCard {
    #[validate(regex(path = *CARD_NUMBER, message = "The card number must have exactly 16 digits"))]
    pub numero_carta: String,
    #[validate(regex(path = *CARD_EXPIRY, message = "Enter a valid expiry date (MM/YY)"))]
    pub scadenza_carta: String,
    #[validate(regex(path = *CARD_CVV, message = "The CVV must have exactly 3 digits"))]
    pub cvv_carta: String,
    #[validate(length(min = 1, message = "The card holder is required"))]
    pub intestatario_carta: String,
}

impl NewCreditCard {
    /// Strip the grouping spaces users type in the card number
    pub fn normalized(mut self) -> Self {
        self.numero_carta.retain(|c| !c.is_whitespace());
        self.intestatario_carta = self.intestatario_carta.trim().to_string();
        self
    }
}
