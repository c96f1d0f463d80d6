//! # Payment Processor
//!
//! The one outbound dependency of the payment flow: create a payment intent
//! and hand back its client secret.
//!
//! ```text
//! PaymentService ──► dyn PaymentProcessor ──► StripeClient ──► POST /v1/payment_intents
//!                          ▲
//!                          └── FakeProcessor (tests)
//! ```
//!
//! Calls are never retried and are bounded by [`StripeConfig::timeout`]. A
//! failure is returned to the service, which discards the pending payment row.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

/// What the processor needs to open an intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentRequest {
    /// Amount in the currency's minor unit (cents).
    pub amount_minor_units: i64,
    pub currency: String,
    pub order_id: String,
    pub user_id: String,
}

/// A processor-side intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntent {
    pub intent_id: String,
    pub client_secret: String,
}

#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    async fn create_payment_intent(&self, req: &IntentRequest) -> Result<PaymentIntent, ProcessorError>;
}

/// Errors that can occur when talking to the processor.
#[derive(Debug, Error)]
pub enum ProcessorError {
    /// The processor answered and refused, e.g. an invalid amount.
    #[error("{0}")]
    Rejected(String),

    /// An HTTP transport or serialization error occurred.
    #[error("payment processor request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected response from payment processor: {0}")]
    MalformedResponse(String),
}

// =============================================================================
// Stripe
// =============================================================================

/// Connection settings for the Stripe API.
#[derive(Debug, Clone)]
pub struct StripeConfig {
    /// API base, e.g. `"https://api.stripe.com"`.
    pub api_base: String,
    pub secret_key: String,
    /// Whole-request timeout. A request that runs past it fails with
    /// [`ProcessorError::Http`].
    pub timeout: Duration,
}

/// HTTP client for Stripe's PaymentIntents API.
#[derive(Debug, Clone)]
pub struct StripeClient {
    config: StripeConfig,
    http: Client,
}

impl StripeClient {
    pub fn new(config: StripeConfig) -> Result<Self, ProcessorError> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, http })
    }
}

#[async_trait]
impl PaymentProcessor for StripeClient {
    async fn create_payment_intent(&self, req: &IntentRequest) -> Result<PaymentIntent, ProcessorError> {
        let url = format!("{}/v1/payment_intents", self.config.api_base.trim_end_matches('/'));

        let mut form = HashMap::new();
        form.insert("amount", req.amount_minor_units.to_string());
        form.insert("currency", req.currency.clone());
        form.insert("metadata[order_id]", req.order_id.clone());
        form.insert("metadata[user_id]", req.user_id.clone());

        debug!(order_id = %req.order_id, amount = req.amount_minor_units, "Creating Stripe payment intent");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.secret_key)
            .form(&form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            warn!(status = %status, order_id = %req.order_id, "Stripe rejected payment intent");
            return Err(ProcessorError::Rejected(rejection_message(&text, status)));
        }

        let parsed: StripeIntent = response.json().await?;
        match parsed.client_secret {
            Some(client_secret) => Ok(PaymentIntent {
                intent_id: parsed.id,
                client_secret,
            }),
            None => Err(ProcessorError::MalformedResponse(format!(
                "payment intent {} has no client_secret",
                parsed.id
            ))),
        }
    }
}

/// Stripe's `{"error": {"message": ...}}`, or the raw status when the body
/// is not in that shape.
fn rejection_message(body: &str, status: reqwest::StatusCode) -> String {
    serde_json::from_str::<StripeErrorBody>(body)
        .ok()
        .and_then(|b| b.error.message)
        .unwrap_or_else(|| format!("payment processor returned {status}"))
}

#[derive(Debug, Deserialize)]
struct StripeIntent {
    id: String,
    client_secret: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    message: Option<String>,
}

// =============================================================================
// Test double
// =============================================================================

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Counts calls and can be switched to reject.
    #[derive(Debug, Default)]
    pub struct FakeProcessor {
        calls: AtomicUsize,
        fail: AtomicBool,
        last: Mutex<Option<IntentRequest>>,
    }

    impl FakeProcessor {
        pub fn failing() -> Self {
            let fake = FakeProcessor::default();
            fake.fail.store(true, Ordering::SeqCst);
            fake
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn last_request(&self) -> Option<IntentRequest> {
            self.last.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PaymentProcessor for FakeProcessor {
        async fn create_payment_intent(&self, req: &IntentRequest) -> Result<PaymentIntent, ProcessorError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            *self.last.lock().unwrap() = Some(req.clone());

            if self.fail.load(Ordering::SeqCst) {
                return Err(ProcessorError::Rejected("Your card was declined.".to_string()));
            }

            Ok(PaymentIntent {
                intent_id: format!("pi_fake_{n}"),
                client_secret: format!("pi_fake_{n}_secret"),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_message_uses_stripe_error() {
        let body = r#"{"error": {"message": "Amount must be at least $0.50 usd", "type": "invalid_request_error"}}"#;
        assert_eq!(
            rejection_message(body, reqwest::StatusCode::BAD_REQUEST),
            "Amount must be at least $0.50 usd"
        );
    }

    #[tokio::test]
    async fn test_stripe_client_times_out() {
        use tokio::net::TcpListener;

        // Accepts the connection and never answers
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            std::future::pending::<()>().await;
        });

        let client = StripeClient::new(StripeConfig {
            api_base: format!("http://{addr}"),
            secret_key: "sk_test".to_string(),
            timeout: Duration::from_millis(200),
        })
        .unwrap();

        let req = IntentRequest {
            amount_minor_units: 1000,
            currency: "usd".to_string(),
            order_id: "o-1".to_string(),
            user_id: "alice".to_string(),
        };
        match client.create_payment_intent(&req).await {
            Err(ProcessorError::Http(e)) => assert!(e.is_timeout()),
            other => panic!("expected a timeout, got {other:?}"),
        }
    }

    #[test]
    fn test_rejection_message_falls_back_to_status() {
        let msg = rejection_message("<html>bad gateway</html>", reqwest::StatusCode::BAD_GATEWAY);
        assert!(msg.contains("502"));
    }
}
