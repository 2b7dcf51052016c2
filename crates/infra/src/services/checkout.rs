//! Checkout: price a cart from the catalog, register the amount with the
//! payment provider and persist the order bound to the provider order.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::instrument;

use storefront_core::{DomainError, MenuItemId, OrderNumber};
use storefront_observability::SECURITY_TARGET;
use storefront_orders::{price_order, Customer, Order, Payment, RequestedItem};
use storefront_payments::{CreateRemoteOrder, PaymentGateway};

use super::ServiceError;
use crate::order_store::OrderStore;
use crate::storefront::{CatalogSource, DeliveryZones, SettingsSource};

/// Value of the `source` note attached to provider orders.
pub const ORDER_SOURCE: &str = "storefront";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRequest {
    pub items: Vec<RequestedItem>,
    pub customer: Customer,
}

/// What the browser needs to open the provider checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutReceipt {
    #[serde(rename = "orderNumber")]
    pub order_number: OrderNumber,
    #[serde(rename = "razorpay_order_id")]
    pub provider_order_id: String,
    pub amount: i64,
    pub currency: String,
    pub key_id: String,
}

pub struct CheckoutService {
    orders: Arc<dyn OrderStore>,
    catalog: Arc<dyn CatalogSource>,
    settings: Arc<dyn SettingsSource>,
    zones: Arc<dyn DeliveryZones>,
    gateway: Arc<dyn PaymentGateway>,
    key_id: String,
}

impl CheckoutService {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        catalog: Arc<dyn CatalogSource>,
        settings: Arc<dyn SettingsSource>,
        zones: Arc<dyn DeliveryZones>,
        gateway: Arc<dyn PaymentGateway>,
        key_id: impl Into<String>,
    ) -> Self {
        Self {
            orders,
            catalog,
            settings,
            zones,
            gateway,
            key_id: key_id.into(),
        }
    }

    /// Create an order awaiting payment.
    ///
    /// Nothing is persisted unless the provider acknowledged exactly the
    /// computed amount; a provider failure leaves no order behind.
    #[instrument(skip(self, request), fields(lines = request.items.len()), err)]
    pub async fn checkout(&self, request: CheckoutRequest) -> Result<CheckoutReceipt, ServiceError> {
        let settings = self.settings.store_settings().await?;
        if !settings.store_open {
            return Err(DomainError::StoreClosed.into());
        }

        if let Some(pincode) = request.customer.pincode.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
            if !self.zones.is_serviceable(pincode).await? {
                return Err(DomainError::Unserviceable(pincode.to_string()).into());
            }
        }

        let ids: Vec<MenuItemId> = request.items.iter().map(|i| i.menu_item_id.clone()).collect();
        let catalog = self.catalog.entries(&ids).await?;
        let priced = price_order(&request.items, &catalog, &settings)?;

        if priced.pricing.subtotal < settings.min_order {
            return Err(DomainError::BelowMinimumOrder {
                subtotal: priced.pricing.subtotal.to_string(),
                minimum: settings.min_order.to_string(),
            }
            .into());
        }

        let now = Utc::now();
        let order_number = OrderNumber::generate(&settings.invoice_prefix, now);
        let amount = priced.pricing.total.minor_units();
        let currency = priced.pricing.currency.clone();

        let remote = self
            .gateway
            .create_order(&CreateRemoteOrder {
                amount,
                currency: currency.clone(),
                receipt: order_number.to_string(),
                notes: BTreeMap::from([
                    ("source".to_string(), ORDER_SOURCE.to_string()),
                    ("orderNumber".to_string(), order_number.to_string()),
                ]),
            })
            .await?;

        if remote.amount != amount || remote.currency != currency {
            tracing::warn!(
                target: SECURITY_TARGET,
                order_number = %order_number,
                provider_order_id = %remote.id,
                expected_amount = amount,
                provider_amount = remote.amount,
                provider_currency = %remote.currency,
                "provider acknowledged a different amount"
            );
            return Err(ServiceError::ProviderRejected(format!(
                "provider acknowledged {} {} instead of {amount} {currency}",
                remote.amount, remote.currency
            )));
        }

        let order = Order::place(
            order_number,
            priced,
            request.customer,
            Payment::created(remote.id, remote.amount, remote.currency),
            now,
        )?;
        self.orders.create(&order).await?;

        tracing::info!(
            order_number = %order.order_number(),
            provider_order_id = %order.payment().provider_order_id,
            amount,
            "order created"
        );

        Ok(CheckoutReceipt {
            order_number: order.order_number().clone(),
            provider_order_id: order.payment().provider_order_id.clone(),
            amount,
            currency,
            key_id: self.key_id.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{bagel_storefront, FakeGateway};
    use crate::order_store::InMemoryOrderStore;
    use crate::storefront::InMemoryStorefront;
    use storefront_core::Money;
    use storefront_orders::{OrderEventType, OrderStatus, PaymentStatus, StoreSettings};
    use storefront_payments::GatewayError;

    struct Harness {
        service: CheckoutService,
        orders: Arc<InMemoryOrderStore>,
        storefront: Arc<InMemoryStorefront>,
        gateway: Arc<FakeGateway>,
    }

    fn harness(gateway: FakeGateway) -> Harness {
        let orders = Arc::new(InMemoryOrderStore::new());
        let storefront = Arc::new(bagel_storefront());
        let gateway = Arc::new(gateway);
        let service = CheckoutService::new(
            orders.clone(),
            storefront.clone(),
            storefront.clone(),
            storefront.clone(),
            gateway.clone(),
            "rzp_test_key",
        );
        Harness {
            service,
            orders,
            storefront,
            gateway,
        }
    }

    fn request(id: &str, qty: i64) -> CheckoutRequest {
        CheckoutRequest {
            items: vec![RequestedItem {
                menu_item_id: id.parse().unwrap(),
                qty,
            }],
            customer: Customer {
                name: "Asha".to_string(),
                phone: "9999999999".to_string(),
                ..Customer::default()
            },
        }
    }

    #[tokio::test]
    async fn bagel_checkout_persists_order_bound_to_provider() {
        let h = harness(FakeGateway::echo());

        let receipt = h.service.checkout(request("bagel1", 2)).await.unwrap();
        assert_eq!(receipt.amount, 21_000);
        assert_eq!(receipt.currency, "INR");
        assert_eq!(receipt.key_id, "rzp_test_key");
        assert!(receipt.order_number.as_str().starts_with("ORD-"));

        let order = h.orders.find_by_order_number(&receipt.order_number).await.unwrap().unwrap();
        assert_eq!(order.status(), OrderStatus::PaymentPending);
        assert_eq!(order.pricing().subtotal, Money::from_minor(20_000));
        assert_eq!(order.pricing().tax, Money::from_minor(1_000));
        assert_eq!(order.pricing().total, Money::from_minor(21_000));
        assert_eq!(order.payment().amount, 21_000);
        assert_eq!(order.payment().status, PaymentStatus::Created);
        assert_eq!(order.payment().provider_order_id, receipt.provider_order_id);
        assert_eq!(order.customer().name, "Asha");
        assert_eq!(order.events().len(), 1);
        assert_eq!(order.events()[0].kind, OrderEventType::OrderCreated);

        let sent = h.gateway.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].amount, 21_000);
        assert_eq!(sent[0].receipt, receipt.order_number.as_str());
        assert_eq!(sent[0].notes["source"], ORDER_SOURCE);
        assert_eq!(sent[0].notes["orderNumber"], receipt.order_number.as_str());
    }

    #[tokio::test]
    async fn invalid_items_never_reach_the_provider() {
        let h = harness(FakeGateway::echo());

        let err = h.service.checkout(request("ghost", 1)).await.unwrap_err();
        assert_eq!(err, ServiceError::Domain(DomainError::InvalidItem("ghost".into())));

        let err = h.service.checkout(request("muffin", 1)).await.unwrap_err();
        assert_eq!(err.kind(), "item_unavailable");

        let err = h.service.checkout(request("bagel1", 0)).await.unwrap_err();
        assert_eq!(err.kind(), "invalid_item");

        assert!(h.gateway.requests().is_empty());
        assert!(h.orders.list_newest_first().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn provider_failures_persist_nothing() {
        let h = harness(FakeGateway::failing(GatewayError::Rejected {
            status: 401,
            details: "Authentication failed".into(),
        }));
        let err = h.service.checkout(request("bagel1", 1)).await.unwrap_err();
        assert_eq!(err.kind(), "provider_rejected");
        assert!(h.orders.list_newest_first().await.unwrap().is_empty());

        let h = harness(FakeGateway::failing(GatewayError::Unavailable("timed out".into())));
        let err = h.service.checkout(request("bagel1", 1)).await.unwrap_err();
        assert_eq!(err.kind(), "provider_unavailable");
        assert!(h.orders.list_newest_first().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn provider_amount_disagreement_is_rejected() {
        let h = harness(FakeGateway::with_amount_offset(1));
        let err = h.service.checkout(request("bagel1", 1)).await.unwrap_err();
        assert_eq!(err.kind(), "provider_rejected");
        assert!(h.orders.list_newest_first().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn closed_store_and_minimum_order_are_enforced() {
        let h = harness(FakeGateway::echo());

        h.storefront.set_settings(StoreSettings {
            min_order: Money::from_minor(25_000),
            ..StoreSettings::default()
        })
        .unwrap();
        let err = h.service.checkout(request("bagel1", 2)).await.unwrap_err();
        assert_eq!(err.kind(), "below_minimum_order");

        h.storefront.set_settings(StoreSettings {
            store_open: false,
            ..StoreSettings::default()
        })
        .unwrap();
        let err = h.service.checkout(request("bagel1", 2)).await.unwrap_err();
        assert_eq!(err, ServiceError::Domain(DomainError::StoreClosed));

        assert!(h.gateway.requests().is_empty());
    }

    #[tokio::test]
    async fn unlisted_pincode_is_rejected_once_zones_exist() {
        let h = harness(FakeGateway::echo());
        let mut req = request("bagel1", 1);
        req.customer.pincode = Some("110001".to_string());

        // No zones configured yet.
        assert!(h.service.checkout(req.clone()).await.is_ok());

        h.storefront.add_pincode("560001").unwrap();
        let err = h.service.checkout(req.clone()).await.unwrap_err();
        assert_eq!(err, ServiceError::Domain(DomainError::Unserviceable("110001".into())));

        req.customer.pincode = Some("560001".to_string());
        assert!(h.service.checkout(req).await.is_ok());
    }
}
