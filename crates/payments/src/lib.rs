//! Payment provider integration.
//!
//! - `gateway`: creates provider orders over the provider REST API.
//! - `signature`: HMAC-SHA256 checks for client callbacks and webhooks.
//! - `webhook`: parsing of signed webhook bodies into payment outcomes.

pub mod gateway;
pub mod signature;
pub mod webhook;

pub use gateway::{
    CreateRemoteOrder, GatewayError, PaymentGateway, RazorpayConfig, RazorpayGateway, RemoteOrder,
};
pub use signature::{
    payment_signature, verify_payment_signature, verify_webhook_signature, webhook_signature,
    SignatureError,
};
pub use webhook::{parse_webhook, WebhookError, WebhookEvent, WebhookPayment};
