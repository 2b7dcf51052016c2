//! Payment order bridge: registers an amount with the provider and returns the
//! provider order id the browser checkout is opened against.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

pub const DEFAULT_API_BASE: &str = "https://api.razorpay.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The provider answered and refused the request.
    #[error("provider rejected the request (status {status}): {details}")]
    Rejected { status: u16, details: String },

    /// The provider could not be reached or answered with something unusable.
    #[error("provider unavailable: {0}")]
    Unavailable(String),
}

/// Provider order creation request. `amount` is in minor units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateRemoteOrder {
    pub amount: i64,
    pub currency: String,
    pub receipt: String,
    pub notes: BTreeMap<String, String>,
}

/// The provider's acknowledgement of a created order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub receipt: Option<String>,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_order(&self, request: &CreateRemoteOrder) -> Result<RemoteOrder, GatewayError>;
}

#[derive(Clone)]
pub struct RazorpayConfig {
    pub key_id: String,
    pub key_secret: String,
    pub api_base: String,
    pub timeout: Duration,
}

impl RazorpayConfig {
    pub fn new(key_id: impl Into<String>, key_secret: impl Into<String>) -> Self {
        Self {
            key_id: key_id.into(),
            key_secret: key_secret.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl core::fmt::Debug for RazorpayConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RazorpayConfig")
            .field("key_id", &self.key_id)
            .field("key_secret", &"<REDACTED>")
            .field("api_base", &self.api_base)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// REST client for `POST /v1/orders`, authenticated with HTTP Basic auth.
#[derive(Clone)]
pub struct RazorpayGateway {
    client: reqwest::Client,
    orders_url: String,
    key_id: String,
    key_secret: String,
}

impl core::fmt::Debug for RazorpayGateway {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RazorpayGateway")
            .field("orders_url", &self.orders_url)
            .field("key_id", &self.key_id)
            .field("key_secret", &"<REDACTED>")
            .finish_non_exhaustive()
    }
}

impl RazorpayGateway {
    pub fn new(config: RazorpayConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::Unavailable(format!("http client: {e}")))?;

        Ok(Self {
            client,
            orders_url: format!("{}/v1/orders", config.api_base.trim_end_matches('/')),
            key_id: config.key_id,
            key_secret: config.key_secret,
        })
    }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    #[instrument(skip(self, request), fields(receipt = %request.receipt, amount = request.amount))]
    async fn create_order(&self, request: &CreateRemoteOrder) -> Result<RemoteOrder, GatewayError> {
        let resp = self
            .client
            .post(&self.orders_url)
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(request)
            .send()
            .await
            .map_err(|e| GatewayError::Unavailable(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), details = %body, "provider order creation failed");
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                details: rejection_details(&body),
            });
        }

        resp.json::<RemoteOrder>()
            .await
            .map_err(|e| GatewayError::Unavailable(format!("undecodable provider response: {e}")))
    }
}

/// Prefer the provider's `error.description`; fall back to the raw body.
fn rejection_details(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["description"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}
