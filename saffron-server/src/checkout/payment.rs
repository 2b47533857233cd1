//! Payment Provider Client
//!
//! Thin client for the external payment-session API. The checkout flow
//! calls this AFTER the order transaction commits, so a provider outage
//! can never hold a database transaction open.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::utils::AppError;

/// Request to open a payment session for an order.
#[derive(Debug, Clone, Serialize)]
pub struct SessionRequest {
    pub order_id: i64,
    /// Total in integer minor units
    pub amount: i64,
    pub currency: String,
}

/// An open payment session at the provider.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentSession {
    pub session_id: String,
    pub redirect_url: String,
}

#[async_trait]
pub trait PaymentSessions: Send + Sync {
    async fn create_session(&self, request: &SessionRequest) -> Result<PaymentSession, AppError>;
}

/// HTTP implementation against the configured provider base URL.
pub struct HttpPaymentSessions {
    client: reqwest::Client,
    base_url: String,
}

impl HttpPaymentSessions {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl PaymentSessions for HttpPaymentSessions {
    async fn create_session(&self, request: &SessionRequest) -> Result<PaymentSession, AppError> {
        let url = format!("{}/v1/sessions", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| AppError::internal(format!("Payment provider unreachable: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::internal(format!(
                "Payment provider returned {}",
                response.status()
            )));
        }

        response
            .json::<PaymentSession>()
            .await
            .map_err(|e| AppError::internal(format!("Malformed payment session response: {e}")))
    }
}

/// Deterministic sessions for tests; optionally fails every call.
pub struct StaticPaymentSessions {
    pub fail: bool,
}

#[async_trait]
impl PaymentSessions for StaticPaymentSessions {
    async fn create_session(&self, request: &SessionRequest) -> Result<PaymentSession, AppError> {
        if self.fail {
            return Err(AppError::internal("Payment provider unavailable"));
        }
        Ok(PaymentSession {
            session_id: format!("sess_{}", request.order_id),
            redirect_url: format!("https://pay.example/s/sess_{}", request.order_id),
        })
    }
}
