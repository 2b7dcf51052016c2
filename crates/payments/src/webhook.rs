//! Provider webhook bodies. Parsing happens only after the raw body's
//! signature has been verified.

use serde::Deserialize;
use thiserror::Error;

pub const EVENT_PAYMENT_CAPTURED: &str = "payment.captured";
pub const EVENT_PAYMENT_FAILED: &str = "payment.failed";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WebhookError {
    #[error("webhook body is not valid JSON: {0}")]
    Malformed(String),

    #[error("webhook payment entity has no order_id")]
    MissingOrderId,

    #[error("captured payment has no payment id")]
    MissingPaymentId,
}

/// Payment entity fields used for reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookPayment {
    pub provider_order_id: String,
    pub provider_payment_id: Option<String>,
    pub amount: Option<i64>,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEvent {
    Captured(WebhookPayment),
    Failed(WebhookPayment),
    /// Any other event name; acknowledged without touching orders.
    Ignored(String),
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    event: String,
    #[serde(default)]
    payload: Option<Payload>,
}

#[derive(Deserialize)]
struct Payload {
    payment: Option<PaymentWrapper>,
}

#[derive(Deserialize)]
struct PaymentWrapper {
    entity: Option<PaymentEntity>,
}

#[derive(Deserialize)]
struct PaymentEntity {
    id: Option<String>,
    order_id: Option<String>,
    amount: Option<i64>,
    currency: Option<String>,
}

pub fn parse_webhook(raw_body: &[u8]) -> Result<WebhookEvent, WebhookError> {
    let envelope: Envelope =
        serde_json::from_slice(raw_body).map_err(|e| WebhookError::Malformed(e.to_string()))?;

    let captured = match envelope.event.as_str() {
        EVENT_PAYMENT_CAPTURED => true,
        EVENT_PAYMENT_FAILED => false,
        _ => return Ok(WebhookEvent::Ignored(envelope.event)),
    };

    let entity = envelope
        .payload
        .and_then(|p| p.payment)
        .and_then(|p| p.entity)
        .ok_or(WebhookError::MissingOrderId)?;

    let provider_order_id = entity
        .order_id
        .filter(|id| !id.trim().is_empty())
        .ok_or(WebhookError::MissingOrderId)?;
    let provider_payment_id = entity.id.filter(|id| !id.trim().is_empty());

    let payment = WebhookPayment {
        provider_order_id,
        provider_payment_id,
        amount: entity.amount,
        currency: entity.currency,
    };

    if captured {
        if payment.provider_payment_id.is_none() {
            return Err(WebhookError::MissingPaymentId);
        }
        Ok(WebhookEvent::Captured(payment))
    } else {
        Ok(WebhookEvent::Failed(payment))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(event: &str, entity: serde_json::Value) -> Vec<u8> {
        serde_json::to_vec(&serde_json::json!({
            "entity": "event",
            "event": event,
            "payload": { "payment": { "entity": entity } }
        }))
        .unwrap()
    }

    #[test]
    fn captured_event_yields_payment_fields() {
        let raw = body(
            "payment.captured",
            serde_json::json!({"id": "pay_1", "order_id": "order_1", "amount": 21000, "currency": "INR", "status": "captured"}),
        );
        assert_eq!(
            parse_webhook(&raw).unwrap(),
            WebhookEvent::Captured(WebhookPayment {
                provider_order_id: "order_1".to_string(),
                provider_payment_id: Some("pay_1".to_string()),
                amount: Some(21_000),
                currency: Some("INR".to_string()),
            })
        );
    }

    #[test]
    fn failed_event_tolerates_missing_payment_id() {
        let raw = body("payment.failed", serde_json::json!({"order_id": "order_1"}));
        match parse_webhook(&raw).unwrap() {
            WebhookEvent::Failed(p) => {
                assert_eq!(p.provider_order_id, "order_1");
                assert_eq!(p.provider_payment_id, None);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn missing_order_id_is_rejected() {
        let raw = body("payment.captured", serde_json::json!({"id": "pay_1"}));
        assert_eq!(parse_webhook(&raw), Err(WebhookError::MissingOrderId));

        let raw = br#"{"event":"payment.failed","payload":{}}"#;
        assert_eq!(parse_webhook(raw), Err(WebhookError::MissingOrderId));
    }

    #[test]
    fn other_events_are_ignored() {
        let raw = br#"{"event":"refund.processed","payload":{}}"#;
        assert_eq!(
            parse_webhook(raw).unwrap(),
            WebhookEvent::Ignored("refund.processed".to_string())
        );
    }

    #[test]
    fn malformed_json_is_rejected() {
        assert!(matches!(parse_webhook(b"{not json"), Err(WebhookError::Malformed(_))));
    }
}
