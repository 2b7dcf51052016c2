//! Operator-side order management: status changes, lookups and deletion.

use std::sync::Arc;

use chrono::Utc;
use tracing::instrument;

use storefront_core::OrderNumber;
use storefront_orders::{Order, OrderMatch, OrderStatus, Transition};

use super::ServiceError;
use crate::order_store::OrderStore;

pub struct LifecycleService {
    orders: Arc<dyn OrderStore>,
}

impl LifecycleService {
    pub fn new(orders: Arc<dyn OrderStore>) -> Self {
        Self { orders }
    }

    /// Move an order to any enumerated status.
    ///
    /// An unknown status string is rejected before the store is touched.
    #[instrument(skip(self, order_number), fields(order_number = %order_number), err)]
    pub async fn set_status(&self, order_number: &OrderNumber, raw_status: &str) -> Result<Order, ServiceError> {
        let to: OrderStatus = raw_status.parse()?;

        let t = Transition::status_changed(to, Utc::now());
        let updated = self
            .orders
            .transition(&OrderMatch::by_order_number(order_number.clone()), &t.patch, t.event)
            .await?
            .ok_or(ServiceError::OrderNotFound)?;

        let from = updated.events().last().and_then(|e| e.details["from"].as_str()).unwrap_or_default();
        tracing::info!(from, to = %to, "order status changed");
        Ok(updated)
    }

    pub async fn get(&self, order_number: &OrderNumber) -> Result<Order, ServiceError> {
        self.orders
            .find_by_order_number(order_number)
            .await?
            .ok_or(ServiceError::OrderNotFound)
    }

    pub async fn list(&self) -> Result<Vec<Order>, ServiceError> {
        Ok(self.orders.list_newest_first().await?)
    }

    #[instrument(skip(self, order_number), fields(order_number = %order_number), err)]
    pub async fn delete(&self, order_number: &OrderNumber) -> Result<(), ServiceError> {
        if self.orders.delete(order_number).await? {
            tracing::warn!("order deleted");
            Ok(())
        } else {
            Err(ServiceError::OrderNotFound)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order_store::InMemoryOrderStore;
    use storefront_core::{DomainError, Money};
    use storefront_orders::{
        price_order, CatalogEntry, Customer, OrderEventType, Payment, RequestedItem, StoreSettings,
    };

    async fn setup() -> (LifecycleService, Order) {
        let priced = price_order(
            &[RequestedItem {
                menu_item_id: "tea".parse().unwrap(),
                qty: 1,
            }],
            &[CatalogEntry {
                id: "tea".parse().unwrap(),
                name: "Tea".to_string(),
                price: Money::from_minor(4_000),
                is_available: true,
            }],
            &StoreSettings::default(),
        )
        .unwrap();
        let amount = priced.pricing.total.minor_units();
        let order = Order::place(
            "ORD-1".parse().unwrap(),
            priced,
            Customer::default(),
            Payment::created("order_1", amount, "INR"),
            Utc::now(),
        )
        .unwrap();

        let store = Arc::new(InMemoryOrderStore::new());
        store.create(&order).await.unwrap();
        (LifecycleService::new(store), order)
    }

    #[tokio::test]
    async fn status_change_appends_event() {
        let (service, order) = setup().await;

        let updated = service.set_status(order.order_number(), "PREPARING").await.unwrap();
        assert_eq!(updated.status(), OrderStatus::Preparing);
        let last = updated.events().last().unwrap();
        assert_eq!(last.kind, OrderEventType::StatusChanged);
        assert_eq!(last.details["from"], "PAYMENT_PENDING");
        assert_eq!(last.details["to"], "PREPARING");

        // Any status may follow any other.
        let back = service.set_status(order.order_number(), "CREATED").await.unwrap();
        assert_eq!(back.status(), OrderStatus::Created);
    }

    #[tokio::test]
    async fn concurrent_status_changes_chain_their_from() {
        let (service, order) = setup().await;
        let service = Arc::new(service);

        let targets = ["PREPARING", "COMPLETED", "CANCELLED", "PAID"];
        let handles: Vec<_> = targets
            .iter()
            .map(|to| {
                let to = *to;
                let service = service.clone();
                let number = order.order_number().clone();
                tokio::spawn(async move { service.set_status(&number, to).await })
            })
            .collect();
        for h in handles {
            h.await.unwrap().unwrap();
        }

        let stored = service.get(order.order_number()).await.unwrap();
        let events = stored.events();
        assert_eq!(events.len(), 1 + targets.len());
        let mut previous = "PAYMENT_PENDING".to_string();
        for event in &events[1..] {
            assert_eq!(event.details["from"], previous.as_str());
            previous = match event.kind {
                OrderEventType::OrderCancelled => "CANCELLED".to_string(),
                _ => event.details["to"].as_str().unwrap().to_string(),
            };
        }
        assert_eq!(stored.status().as_str(), previous);
    }

    #[tokio::test]
    async fn cancelling_records_order_cancelled() {
        let (service, order) = setup().await;
        let cancelled = service.set_status(order.order_number(), "CANCELLED").await.unwrap();
        assert_eq!(cancelled.events().last().unwrap().kind, OrderEventType::OrderCancelled);
    }

    #[tokio::test]
    async fn unknown_status_changes_nothing() {
        let (service, order) = setup().await;

        let err = service.set_status(order.order_number(), "SHIPPED").await.unwrap_err();
        assert_eq!(err, ServiceError::Domain(DomainError::InvalidStatus("SHIPPED".into())));
        assert_eq!(err.kind(), "invalid_status");

        assert_eq!(service.get(order.order_number()).await.unwrap(), order);
    }

    #[tokio::test]
    async fn missing_orders_are_not_found() {
        let (service, order) = setup().await;
        let ghost: OrderNumber = "ORD-ghost".parse().unwrap();

        assert_eq!(service.set_status(&ghost, "PAID").await.unwrap_err(), ServiceError::OrderNotFound);
        assert_eq!(service.get(&ghost).await.unwrap_err(), ServiceError::OrderNotFound);

        service.delete(order.order_number()).await.unwrap();
        assert_eq!(service.delete(order.order_number()).await.unwrap_err(), ServiceError::OrderNotFound);
        assert!(service.list().await.unwrap().is_empty());
    }
}
