//! Payment reconciliation: turns signed provider evidence into order
//! transitions.
//!
//! Two entry points reach the same transitions: the browser callback
//! (signed with the API key secret) and the provider webhook (signed with the
//! webhook secret over the raw body). Both look the order up by provider
//! order id, re-check the stored amount, and then apply one conditional
//! transition through the store.

use std::sync::Arc;

use chrono::Utc;
use tracing::instrument;

use storefront_core::{DomainError, OrderNumber};
use storefront_observability::SECURITY_TARGET;
use storefront_orders::{EventSource, Order, OrderMatch, Transition};
use storefront_payments::{
    parse_webhook, verify_payment_signature, verify_webhook_signature, WebhookEvent, WebhookPayment,
};

use super::ServiceError;
use crate::order_store::OrderStore;

/// Browser callback after a successful checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientPaymentProof {
    pub provider_order_id: String,
    pub provider_payment_id: String,
    pub signature: String,
}

/// Browser report of a failed or abandoned payment. Unsigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientPaymentFailure {
    pub provider_order_id: String,
    pub provider_payment_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WebhookOutcome {
    Applied(Order),
    /// Event type this service does not act on.
    Ignored(String),
}

pub struct ReconciliationService {
    orders: Arc<dyn OrderStore>,
    key_secret: String,
    webhook_secret: Option<String>,
}

impl ReconciliationService {
    pub fn new(orders: Arc<dyn OrderStore>, key_secret: impl Into<String>, webhook_secret: Option<String>) -> Self {
        Self {
            orders,
            key_secret: key_secret.into(),
            webhook_secret,
        }
    }

    /// Mark an order paid from a signed browser callback.
    ///
    /// Repeating the call re-applies the success: another `PAYMENT_VERIFIED`
    /// event is appended and the first `paidAt` is kept.
    #[instrument(skip(self, order_number, proof), fields(order_number = %order_number, provider_order_id = %proof.provider_order_id), err)]
    pub async fn verify_client_payment(
        &self,
        order_number: &OrderNumber,
        proof: &ClientPaymentProof,
    ) -> Result<Order, ServiceError> {
        if let Err(e) = verify_payment_signature(
            &self.key_secret,
            &proof.provider_order_id,
            &proof.provider_payment_id,
            &proof.signature,
        ) {
            tracing::warn!(
                target: SECURITY_TARGET,
                order_number = %order_number,
                provider_order_id = %proof.provider_order_id,
                provider_payment_id = %proof.provider_payment_id,
                reason = %e,
                "client payment signature rejected"
            );
            return Err(ServiceError::InvalidSignature);
        }

        let order = self.client_order(order_number, &proof.provider_order_id).await?;
        check_amount(&order)?;

        let t = Transition::payment_verified(
            &proof.provider_order_id,
            &proof.provider_payment_id,
            EventSource::Client,
            Utc::now(),
        );
        let matcher = OrderMatch::by_provider_order_id(&proof.provider_order_id).and_order_number(order_number.clone());

        let updated = self
            .orders
            .transition(&matcher, &t.patch, t.event)
            .await?
            .ok_or(ServiceError::OrderNotFound)?;

        tracing::info!(order_number = %order_number, "payment verified");
        Ok(updated)
    }

    /// Record a browser-reported payment failure.
    ///
    /// The report is unsigned, so it never regresses an order whose payment
    /// is already PAID; in that case the stored order is returned unchanged.
    #[instrument(skip(self, order_number, failure), fields(order_number = %order_number, provider_order_id = %failure.provider_order_id), err)]
    pub async fn report_client_failure(
        &self,
        order_number: &OrderNumber,
        failure: &ClientPaymentFailure,
    ) -> Result<Order, ServiceError> {
        let order = self.client_order(order_number, &failure.provider_order_id).await?;
        check_amount(&order)?;

        let t = Transition::payment_failed(
            &failure.provider_order_id,
            failure.provider_payment_id.as_deref(),
            EventSource::Client,
            Utc::now(),
        );
        let matcher = OrderMatch::by_provider_order_id(&failure.provider_order_id)
            .and_order_number(order_number.clone())
            .unless_paid();

        if let Some(updated) = self.orders.transition(&matcher, &t.patch, t.event).await? {
            tracing::info!(order_number = %order_number, "payment failure recorded");
            return Ok(updated);
        }

        let current = self
            .orders
            .find_by_order_number(order_number)
            .await?
            .ok_or(ServiceError::OrderNotFound)?;
        tracing::info!(order_number = %order_number, "failure report ignored for paid order");
        Ok(current)
    }

    /// Apply a provider webhook delivery.
    ///
    /// A signed `payment.failed` is authoritative and regresses a PAID order.
    #[instrument(skip(self, raw_body, signature), fields(body_len = raw_body.len()), err)]
    pub async fn handle_webhook(
        &self,
        raw_body: &[u8],
        signature: Option<&str>,
    ) -> Result<WebhookOutcome, ServiceError> {
        let Some(secret) = self.webhook_secret.as_deref() else {
            tracing::warn!(target: SECURITY_TARGET, "webhook received but no webhook secret is configured");
            return Err(ServiceError::InvalidSignature);
        };

        if let Err(e) = verify_webhook_signature(secret, raw_body, signature.unwrap_or_default()) {
            tracing::warn!(target: SECURITY_TARGET, reason = %e, "webhook signature rejected");
            return Err(ServiceError::InvalidSignature);
        }

        let (payment, captured) = match parse_webhook(raw_body)? {
            WebhookEvent::Captured(p) => (p, true),
            WebhookEvent::Failed(p) => (p, false),
            WebhookEvent::Ignored(name) => {
                tracing::info!(event = %name, "webhook event ignored");
                return Ok(WebhookOutcome::Ignored(name));
            }
        };

        let order = self
            .orders
            .find_by_provider_order_id(&payment.provider_order_id)
            .await?
            .ok_or_else(|| {
                tracing::warn!(provider_order_id = %payment.provider_order_id, "webhook for unknown order");
                ServiceError::OrderNotFound
            })?;
        check_amount(&order)?;
        if captured {
            check_captured_amount(&order, &payment)?;
        }

        let t = if captured {
            // Captured events always carry a payment id.
            let payment_id = payment.provider_payment_id.as_deref().unwrap_or_default();
            Transition::payment_verified(&payment.provider_order_id, payment_id, EventSource::Webhook, Utc::now())
        } else {
            Transition::payment_failed(
                &payment.provider_order_id,
                payment.provider_payment_id.as_deref(),
                EventSource::Webhook,
                Utc::now(),
            )
        };

        let updated = self
            .orders
            .transition(&OrderMatch::by_provider_order_id(&payment.provider_order_id), &t.patch, t.event)
            .await?
            .ok_or(ServiceError::OrderNotFound)?;

        tracing::info!(
            order_number = %updated.order_number(),
            status = %updated.status(),
            "webhook applied"
        );
        Ok(WebhookOutcome::Applied(updated))
    }

    /// Lookup by provider order id, which must belong to the named order.
    async fn client_order(&self, order_number: &OrderNumber, provider_order_id: &str) -> Result<Order, ServiceError> {
        self.orders
            .find_by_provider_order_id(provider_order_id)
            .await?
            .filter(|o| o.order_number() == order_number)
            .ok_or(ServiceError::OrderNotFound)
    }
}

fn check_amount(order: &Order) -> Result<(), ServiceError> {
    order.verify_amount().map_err(|e| {
        tracing::warn!(
            target: SECURITY_TARGET,
            order_number = %order.order_number(),
            expected = order.expected_amount(),
            recorded = order.payment().amount,
            "stored payment amount disagrees with order total"
        );
        ServiceError::Domain(e)
    })
}

/// A captured amount, when the provider reports one, must be the bound amount.
fn check_captured_amount(order: &Order, payment: &WebhookPayment) -> Result<(), ServiceError> {
    match payment.amount {
        Some(captured) if captured != order.expected_amount() => {
            tracing::warn!(
                target: SECURITY_TARGET,
                order_number = %order.order_number(),
                expected = order.expected_amount(),
                captured,
                "captured amount disagrees with order total"
            );
            Err(DomainError::AmountMismatch {
                expected: order.expected_amount(),
                recorded: captured,
            }
            .into())
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order_store::InMemoryOrderStore;
    use serde_json::json;
    use storefront_core::Money;
    use storefront_orders::{
        price_order, CatalogEntry, Customer, OrderEventType, OrderStatus, Payment, PaymentStatus,
        RequestedItem, StoreSettings,
    };
    use storefront_payments::{payment_signature, webhook_signature};

    const KEY_SECRET: &str = "test_secret";
    const WEBHOOK_SECRET: &str = "whsec";

    fn bagel_order(number: &str, provider_order_id: &str) -> Order {
        let priced = price_order(
            &[RequestedItem {
                menu_item_id: "bagel1".parse().unwrap(),
                qty: 2,
            }],
            &[CatalogEntry {
                id: "bagel1".parse().unwrap(),
                name: "Bagel".to_string(),
                price: Money::from_minor(10_000),
                is_available: true,
            }],
            &StoreSettings::default(),
        )
        .unwrap();
        let amount = priced.pricing.total.minor_units();
        Order::place(
            number.parse().unwrap(),
            priced,
            Customer::default(),
            Payment::created(provider_order_id, amount, "INR"),
            Utc::now(),
        )
        .unwrap()
    }

    async fn setup() -> (ReconciliationService, Arc<InMemoryOrderStore>, Order) {
        let store = Arc::new(InMemoryOrderStore::new());
        let order = bagel_order("ORD-1", "order_1");
        store.create(&order).await.unwrap();
        let service = ReconciliationService::new(store.clone(), KEY_SECRET, Some(WEBHOOK_SECRET.to_string()));
        (service, store, order)
    }

    fn proof(provider_order_id: &str, provider_payment_id: &str) -> ClientPaymentProof {
        ClientPaymentProof {
            provider_order_id: provider_order_id.to_string(),
            provider_payment_id: provider_payment_id.to_string(),
            signature: payment_signature(KEY_SECRET, provider_order_id, provider_payment_id).unwrap(),
        }
    }

    fn webhook(event: &str, payment_id: Option<&str>, amount: i64) -> (Vec<u8>, String) {
        let body = serde_json::to_vec(&json!({
            "event": event,
            "payload": { "payment": { "entity": {
                "id": payment_id,
                "order_id": "order_1",
                "amount": amount,
                "currency": "INR"
            }}}
        }))
        .unwrap();
        let sig = webhook_signature(WEBHOOK_SECRET, &body).unwrap();
        (body, sig)
    }

    fn count(order: &Order, kind: OrderEventType) -> usize {
        order.events().iter().filter(|e| e.kind == kind).count()
    }

    #[tokio::test]
    async fn verified_callback_marks_order_paid() {
        let (service, _, order) = setup().await;

        let paid = service
            .verify_client_payment(order.order_number(), &proof("order_1", "pay_1"))
            .await
            .unwrap();
        assert_eq!(paid.status(), OrderStatus::Paid);
        assert_eq!(paid.payment().status, PaymentStatus::Paid);
        assert_eq!(paid.payment().provider_payment_id.as_deref(), Some("pay_1"));
        assert!(paid.payment().paid_at.is_some());
        let last = paid.events().last().unwrap();
        assert_eq!(last.kind, OrderEventType::PaymentVerified);
        assert_eq!(last.details["source"], "client");
    }

    #[tokio::test]
    async fn repeated_verification_is_idempotent_in_state() {
        let (service, _, order) = setup().await;

        let first = service
            .verify_client_payment(order.order_number(), &proof("order_1", "pay_1"))
            .await
            .unwrap();
        let second = service
            .verify_client_payment(order.order_number(), &proof("order_1", "pay_1"))
            .await
            .unwrap();

        assert_eq!(second.status(), OrderStatus::Paid);
        assert_eq!(second.payment().paid_at, first.payment().paid_at);
        assert_eq!(count(&second, OrderEventType::PaymentVerified), 2);
    }

    #[tokio::test]
    async fn tampered_payment_id_is_rejected_without_mutation() {
        let (service, store, order) = setup().await;
        let mut tampered = proof("order_1", "pay_1");
        tampered.provider_payment_id = "pay_2".to_string();

        let err = service
            .verify_client_payment(order.order_number(), &tampered)
            .await
            .unwrap_err();
        assert_eq!(err, ServiceError::InvalidSignature);

        let stored = store.find_by_order_number(order.order_number()).await.unwrap().unwrap();
        assert_eq!(stored, order);
    }

    #[tokio::test]
    async fn unknown_or_foreign_order_is_not_found() {
        let (service, store, order) = setup().await;
        store.create(&bagel_order("ORD-2", "order_2")).await.unwrap();

        let err = service
            .verify_client_payment(order.order_number(), &proof("order_9", "pay_1"))
            .await
            .unwrap_err();
        assert_eq!(err, ServiceError::OrderNotFound);

        // Valid signature for a provider order that belongs to another order number.
        let err = service
            .verify_client_payment(order.order_number(), &proof("order_2", "pay_1"))
            .await
            .unwrap_err();
        assert_eq!(err, ServiceError::OrderNotFound);

        let other = store.find_by_provider_order_id("order_2").await.unwrap().unwrap();
        assert_eq!(other.status(), OrderStatus::PaymentPending);
    }

    #[tokio::test]
    async fn tampered_stored_amount_blocks_reconciliation() {
        let store = Arc::new(InMemoryOrderStore::new());
        let mut doc = serde_json::to_value(bagel_order("ORD-1", "order_1")).unwrap();
        doc["payment"]["amount"] = json!(100);
        let tampered: Order = serde_json::from_value(doc).unwrap();
        store.create(&tampered).await.unwrap();
        let service = ReconciliationService::new(store.clone(), KEY_SECRET, Some(WEBHOOK_SECRET.to_string()));

        let err = service
            .verify_client_payment(tampered.order_number(), &proof("order_1", "pay_1"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "amount_mismatch");

        let (body, sig) = webhook("payment.captured", Some("pay_1"), 21_000);
        let err = service.handle_webhook(&body, Some(&sig)).await.unwrap_err();
        assert_eq!(err.kind(), "amount_mismatch");

        let stored = store.find_by_provider_order_id("order_1").await.unwrap().unwrap();
        assert_eq!(stored, tampered);
    }

    #[tokio::test]
    async fn client_failure_cannot_regress_paid_order() {
        let (service, _, order) = setup().await;
        let failure = ClientPaymentFailure {
            provider_order_id: "order_1".to_string(),
            provider_payment_id: Some("pay_1".to_string()),
        };

        let failed = service.report_client_failure(order.order_number(), &failure).await.unwrap();
        assert_eq!(failed.status(), OrderStatus::PaymentPending);
        assert_eq!(failed.payment().status, PaymentStatus::Failed);
        assert_eq!(count(&failed, OrderEventType::PaymentFailed), 1);

        let paid = service
            .verify_client_payment(order.order_number(), &proof("order_1", "pay_1"))
            .await
            .unwrap();

        let after = service.report_client_failure(order.order_number(), &failure).await.unwrap();
        assert_eq!(after, paid);
        assert_eq!(after.status(), OrderStatus::Paid);
    }

    #[tokio::test]
    async fn captured_webhook_marks_paid_and_late_failure_regresses() {
        let (service, _, _) = setup().await;

        let (body, sig) = webhook("payment.captured", Some("pay_1"), 21_000);
        let WebhookOutcome::Applied(paid) = service.handle_webhook(&body, Some(&sig)).await.unwrap() else {
            panic!("expected applied outcome");
        };
        assert_eq!(paid.status(), OrderStatus::Paid);
        assert_eq!(paid.events().last().unwrap().details["source"], "webhook");

        let (body, sig) = webhook("payment.failed", Some("pay_1"), 21_000);
        let WebhookOutcome::Applied(failed) = service.handle_webhook(&body, Some(&sig)).await.unwrap() else {
            panic!("expected applied outcome");
        };
        assert_eq!(failed.status(), OrderStatus::PaymentPending);
        assert_eq!(failed.payment().status, PaymentStatus::Failed);
        assert_eq!(failed.payment().paid_at, None);
        assert_eq!(count(&failed, OrderEventType::PaymentVerified), 1);
        assert_eq!(count(&failed, OrderEventType::PaymentFailed), 1);
    }

    #[tokio::test]
    async fn webhook_signature_and_configuration_are_enforced() {
        let (service, store, order) = setup().await;
        let (body, sig) = webhook("payment.captured", Some("pay_1"), 21_000);

        assert_eq!(
            service.handle_webhook(&body, None).await.unwrap_err(),
            ServiceError::InvalidSignature
        );
        let mut altered = body.clone();
        altered.push(b' ');
        assert_eq!(
            service.handle_webhook(&altered, Some(&sig)).await.unwrap_err(),
            ServiceError::InvalidSignature
        );

        let unconfigured = ReconciliationService::new(store.clone(), KEY_SECRET, None);
        assert_eq!(
            unconfigured.handle_webhook(&body, Some(&sig)).await.unwrap_err(),
            ServiceError::InvalidSignature
        );

        let stored = store.find_by_order_number(order.order_number()).await.unwrap().unwrap();
        assert_eq!(stored, order);
    }

    #[tokio::test]
    async fn webhook_edge_cases() {
        let (service, store, order) = setup().await;

        let body = br#"{"event":"order.paid","payload":{}}"#;
        let sig = webhook_signature(WEBHOOK_SECRET, body).unwrap();
        assert_eq!(
            service.handle_webhook(body, Some(&sig)).await.unwrap(),
            WebhookOutcome::Ignored("order.paid".to_string())
        );

        let body = br#"{"event":"payment.captured","payload":{"payment":{"entity":{"id":"pay_1"}}}}"#;
        let sig = webhook_signature(WEBHOOK_SECRET, body).unwrap();
        let err = service.handle_webhook(body, Some(&sig)).await.unwrap_err();
        assert_eq!(err.kind(), "validation_error");

        let (body, sig) = webhook("payment.captured", Some("pay_1"), 20_000);
        let err = service.handle_webhook(&body, Some(&sig)).await.unwrap_err();
        assert_eq!(err.kind(), "amount_mismatch");

        let stored = store.find_by_order_number(order.order_number()).await.unwrap().unwrap();
        assert_eq!(stored, order);
    }
}
