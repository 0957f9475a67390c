//! Payment processor client.
//!
//! The checkout orchestrator only depends on the [`PaymentProcessor`]
//! trait: hand over a client secret and card details, get back a terminal
//! confirmation result. [`StripeGateway`] is the production
//! implementation, confirming payment intents with the publishable key
//! the way a browser client does. Processor messages (declines in
//! particular) are surfaced verbatim.

use async_trait::async_trait;
use copperleaf_core::PaymentIntentStatus;
use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

use crate::config::PaymentConfig;

/// Errors from the payment processor.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// HTTP request to the processor failed.
    #[error("processor request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Processor response could not be parsed.
    #[error("unexpected processor response: {0}")]
    Parse(#[from] serde_json::Error),

    /// The client secret does not look like one the processor issued.
    #[error("malformed client secret")]
    MalformedClientSecret,

    /// The processor rejected the payment. The message is the
    /// processor's own and is shown to the user as-is.
    #[error("{message}")]
    Declined {
        message: String,
        code: Option<String>,
    },
}

/// Card details collected at checkout.
///
/// `Debug` redacts the number and CVC.
#[derive(Clone)]
pub struct CardDetails {
    pub number: String,
    pub exp_month: u32,
    pub exp_year: u32,
    pub cvc: String,
}

impl std::fmt::Debug for CardDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardDetails")
            .field("number", &"[REDACTED]")
            .field("exp_month", &self.exp_month)
            .field("exp_year", &self.exp_year)
            .field("cvc", &"[REDACTED]")
            .finish()
    }
}

/// Terminal result of one confirmation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentConfirmation {
    pub status: PaymentIntentStatus,
}

/// The processor contract the orchestrator depends on.
///
/// One call per checkout attempt; the call may internally require
/// out-of-band user interaction (3-D Secure) and resolves only once the
/// processor reports a terminal status.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    /// Confirm a card payment for the intent identified by
    /// `client_secret`.
    ///
    /// # Errors
    ///
    /// Returns `Declined` with the processor's message when the payment
    /// is rejected, or a transport/parse error otherwise.
    async fn confirm_card_payment(
        &self,
        client_secret: &str,
        card: &CardDetails,
    ) -> Result<PaymentConfirmation, PaymentError>;
}

/// Extract the payment intent id from a client secret
/// (`pi_xxx_secret_yyy` -> `pi_xxx`).
fn intent_id_from_secret(client_secret: &str) -> Option<&str> {
    let (intent_id, _) = client_secret.split_once("_secret")?;
    if intent_id.is_empty() {
        return None;
    }
    Some(intent_id)
}

/// Wire shape of the processor's confirmation response. Either `error`
/// is present, or `status` carries the intent's new status.
#[derive(Debug, Deserialize)]
struct ConfirmResponseBody {
    #[serde(default)]
    error: Option<ProcessorErrorBody>,
    #[serde(default)]
    status: Option<PaymentIntentStatus>,
}

#[derive(Debug, Deserialize)]
struct ProcessorErrorBody {
    message: String,
    #[serde(default)]
    code: Option<String>,
}

/// Stripe payment intent confirmation over REST.
#[derive(Debug, Clone)]
pub struct StripeGateway {
    client: reqwest::Client,
    api_base: String,
    publishable_key: String,
}

impl StripeGateway {
    /// Create a gateway from payment configuration.
    ///
    /// The client carries the configured request timeout: a hung
    /// confirmation call resolves as a failed attempt instead of
    /// pending indefinitely.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &PaymentConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            api_base: config.api_base.as_str().trim_end_matches('/').to_string(),
            publishable_key: config.publishable_key.clone(),
        })
    }
}

#[async_trait]
impl PaymentProcessor for StripeGateway {
    #[instrument(skip(self, client_secret, card))]
    async fn confirm_card_payment(
        &self,
        client_secret: &str,
        card: &CardDetails,
    ) -> Result<PaymentConfirmation, PaymentError> {
        let intent_id =
            intent_id_from_secret(client_secret).ok_or(PaymentError::MalformedClientSecret)?;

        let url = format!("{}/v1/payment_intents/{intent_id}/confirm", self.api_base);
        let params = [
            ("key", self.publishable_key.clone()),
            ("client_secret", client_secret.to_string()),
            ("payment_method_data[type]", "card".to_string()),
            ("payment_method_data[card][number]", card.number.clone()),
            (
                "payment_method_data[card][exp_month]",
                card.exp_month.to_string(),
            ),
            (
                "payment_method_data[card][exp_year]",
                card.exp_year.to_string(),
            ),
            ("payment_method_data[card][cvc]", card.cvc.clone()),
        ];

        let response = self.client.post(&url).form(&params).send().await?;
        let response_text = response.text().await?;

        let body: ConfirmResponseBody = serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %response_text.chars().take(500).collect::<String>(),
                "Failed to parse processor response"
            );
            PaymentError::Parse(e)
        })?;

        if let Some(error) = body.error {
            tracing::debug!(code = ?error.code, "Processor declined payment");
            return Err(PaymentError::Declined {
                message: error.message,
                code: error.code,
            });
        }

        let status = body.status.unwrap_or(PaymentIntentStatus::Unknown);
        Ok(PaymentConfirmation { status })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_id_extraction() {
        assert_eq!(
            intent_id_from_secret("pi_3Abc_secret_xYz"),
            Some("pi_3Abc")
        );
        assert_eq!(intent_id_from_secret("_secret_xyz"), None);
        assert_eq!(intent_id_from_secret("garbage"), None);
    }

    #[test]
    fn test_error_body_takes_precedence() {
        let body: ConfirmResponseBody = serde_json::from_str(
            r#"{"error": {"message": "Your card was declined.", "code": "card_declined"}}"#,
        )
        .expect("parse");
        let error = body.error.expect("error present");
        assert_eq!(error.message, "Your card was declined.");
        assert_eq!(error.code.as_deref(), Some("card_declined"));
    }

    #[test]
    fn test_success_body_carries_status() {
        let body: ConfirmResponseBody =
            serde_json::from_str(r#"{"id": "pi_1", "status": "succeeded"}"#).expect("parse");
        assert!(body.error.is_none());
        assert_eq!(body.status, Some(PaymentIntentStatus::Succeeded));
    }

    #[test]
    fn test_card_debug_redacts_pan() {
        let card = CardDetails {
            number: "4242424242424242".to_string(),
            exp_month: 12,
            exp_year: 2030,
            cvc: "123".to_string(),
        };
        let debug = format!("{card:?}");
        assert!(!debug.contains("4242424242424242"));
        assert!(!debug.contains("123\""));
        assert!(debug.contains("[REDACTED]"));
    }
}
