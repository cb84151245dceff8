//! Online payment of orders through the backend's payment gateway.
//!
//! The backend talks to the gateway; this client only asks for a checkout URL,
//! forwards the query string the gateway redirects back with, and reads the
//! resulting status.

use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::RequestError;
use crate::resource::read_data;
use crate::FanStore;

/// Largest amount, in VND, a single payment may carry.
pub const MAX_PAYMENT_AMOUNT: i64 = 100_000_000;

/// Whether `amount` may be sent to the gateway: strictly positive and at most
/// [`MAX_PAYMENT_AMOUNT`].
#[must_use]
pub const fn validate_amount(amount: i64) -> bool {
    amount > 0 && amount <= MAX_PAYMENT_AMOUNT
}

/// Formats an amount the Vietnamese way: `1.500.000 ₫`.
#[must_use]
pub fn format_amount(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);

    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0 { "-" } else { "" };
    format!("{sign}{grouped} ₫")
}

/// Represents errors that can occur while paying an order.
#[derive(Error, Debug)]
pub enum PaymentError {
    /// The amount is not within `1..=100_000_000`.
    #[error("Invalid payment amount: {0}. It must be between 1 and 100.000.000 ₫.")]
    InvalidAmount(i64),
    /// The backend could not be reached.
    #[error("Cannot reach the payment service. Please check your connection and try again.")]
    Network,
    /// The session ended or does not allow paying this order.
    #[error("Your session has expired. Please sign in again to pay.")]
    SessionExpired,
    /// The backend refused the payment, with its reason.
    #[error("{0}")]
    Rejected(String),
}

impl From<RequestError> for PaymentError {
    fn from(error: RequestError) -> Self {
        match error {
            RequestError::Unreachable(_) => Self::Network,
            RequestError::Unauthorized | RequestError::Forbidden(_) => Self::SessionExpired,
            other => Self::Rejected(other.user_message("Payment failed. Please try again.")),
        }
    }
}

/// Asks the backend for a checkout URL.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    /// Order to pay.
    pub order_id: String,
    /// Amount in VND.
    pub amount: i64,
    /// Description shown on the gateway page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_info: Option<String>,
    /// Preselected bank, skipping the gateway's bank choice.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_code: Option<String>,
}

/// Where to send the customer to pay.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentCheckout {
    /// Gateway page for this payment.
    #[serde(alias = "url")]
    pub payment_url: String,
    /// Reference the gateway will report back.
    #[serde(default, alias = "txnRef")]
    pub transaction_ref: Option<String>,
}

/// The backend's reading of a gateway return.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResult {
    /// Whether the money was taken.
    pub success: bool,
    /// The paid order.
    #[serde(default, deserialize_with = "crate::resource::deserialize_optional_id")]
    pub order_id: Option<String>,
    /// Gateway reference.
    #[serde(default, alias = "txnRef")]
    pub transaction_ref: Option<String>,
    /// Amount in VND.
    #[serde(default)]
    pub amount: Option<i64>,
    /// Human readable outcome.
    #[serde(default)]
    pub message: Option<String>,
}

/// Lifecycle of an order payment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentState {
    /// Not paid yet.
    #[default]
    Pending,
    /// Paid.
    Paid,
    /// The gateway refused or the customer cancelled.
    Failed,
    /// Money sent back.
    Refunded,
    /// Anything this crate does not know about yet.
    #[serde(other)]
    Unknown,
}

/// Payment status of an order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatus {
    /// The order.
    #[serde(deserialize_with = "crate::resource::deserialize_id")]
    pub order_id: String,
    /// Where the payment stands.
    #[serde(default)]
    pub status: PaymentState,
    /// Amount in VND.
    #[serde(default)]
    pub amount: i64,
}

/// Order payments.
pub struct Payments<'a> {
    client: &'a FanStore,
}

impl FanStore {
    /// Order payments.
    #[must_use]
    pub const fn payments(&self) -> Payments<'_> {
        Payments { client: self }
    }
}

impl Payments<'_> {
    /// Asks for a gateway checkout URL. The amount is checked before anything is sent.
    pub async fn create_payment(&self, request: &PaymentRequest) -> Result<PaymentCheckout, PaymentError> {
        if !validate_amount(request.amount) {
            return Err(PaymentError::InvalidAmount(request.amount));
        }

        if request.order_id.trim().is_empty() {
            return Err(PaymentError::Rejected("Order id is required.".to_string()));
        }

        let checkout: PaymentCheckout = self
            .client
            .post_data(&self.client.endpoint("payments/create"), request)
            .await
            .map_err(payment_failed)?;
        tracing::info!(order_id = %request.order_id, amount = request.amount, "payment created");

        Ok(checkout)
    }

    /// Has the backend verify the query string the gateway redirected back with.
    pub async fn verify_return(&self, query: &str) -> Result<PaymentResult, PaymentError> {
        let mut url = Url::parse(&self.client.endpoint("payments/return"))
            .map_err(|error| PaymentError::Rejected(error.to_string()))?;
        url.set_query(Some(query.trim_start_matches('?')).filter(|query| !query.is_empty()));

        let request = self.client.request_get(url.as_str(), None);
        let response = self.client.send_query(request).await.map_err(payment_failed)?;
        let result: PaymentResult = read_data(response).await.map_err(payment_failed)?;
        tracing::info!(success = result.success, order_id = ?result.order_id, "payment return verified");

        Ok(result)
    }

    /// Payment status of an order.
    pub async fn status(&self, order_id: &str) -> Result<PaymentStatus, PaymentError> {
        let order_id = order_id.trim();

        if order_id.is_empty() {
            return Err(PaymentError::Rejected("Order id is required.".to_string()));
        }

        self.client
            .get_data(&self.client.endpoint_with("payments", &[order_id, "status"]), None)
            .await
            .map_err(payment_failed)
    }
}

fn payment_failed(error: RequestError) -> PaymentError {
    tracing::warn!(%error, "payment call failed");
    PaymentError::from(error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_bounds() {
        assert!(!validate_amount(0));
        assert!(!validate_amount(-1));
        assert!(validate_amount(1));
        assert!(validate_amount(100_000_000));
        assert!(!validate_amount(100_000_001));
    }

    #[test]
    fn amounts_are_grouped_by_thousands() {
        assert_eq!(format_amount(1_500_000), "1.500.000 ₫");
        assert_eq!(format_amount(999), "999 ₫");
        assert_eq!(format_amount(0), "0 ₫");
        assert_eq!(format_amount(-25_000), "-25.000 ₫");
    }

    #[test]
    fn request_errors_are_classified() {
        assert!(matches!(
            PaymentError::from(RequestError::Unreachable("timeout".to_string())),
            PaymentError::Network
        ));
        assert!(matches!(
            PaymentError::from(RequestError::Unauthorized),
            PaymentError::SessionExpired
        ));

        let rejected = PaymentError::from(RequestError::BadRequest {
            message: "Order already paid".to_string(),
            fields: Vec::new(),
        });
        assert_eq!(rejected.to_string(), "Order already paid");

        let generic = PaymentError::from(RequestError::NotFound);
        assert_eq!(generic.to_string(), "Payment failed. Please try again.");
    }

    #[test]
    fn unknown_states_are_tolerated() {
        let status: PaymentStatus =
            serde_json::from_str(r#"{"orderId":42,"status":"CHARGEBACK","amount":150000}"#).unwrap();

        assert_eq!(status.order_id, "42");
        assert_eq!(status.status, PaymentState::Unknown);
    }
}
