use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::Extension,
    http::HeaderMap,
    response::IntoResponse,
    Json,
};
use serde_json::json;

use storefront_infra::services::WebhookOutcome;

use crate::app::errors;
use crate::app::services::AppServices;

pub const SIGNATURE_HEADER: &str = "x-razorpay-signature";

/// `POST /payment-webhook`. The signature covers the raw body, so it is read
/// as bytes and never re-serialized.
pub async fn payment_webhook(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
    body: Bytes,
) -> axum::response::Response {
    let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());

    match services.reconciliation.handle_webhook(&body, signature).await {
        Ok(WebhookOutcome::Applied(order)) => Json(json!({
            "received": true,
            "orderNumber": order.order_number(),
            "status": order.status(),
        }))
        .into_response(),
        Ok(WebhookOutcome::Ignored(event)) => {
            Json(json!({ "received": true, "ignored": event })).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}
