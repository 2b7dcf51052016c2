//! Order persistence: a document store with atomic conditional transitions.

mod in_memory;
mod postgres;

use std::sync::Arc;

use async_trait::async_trait;

use storefront_core::OrderNumber;
use storefront_orders::{Order, OrderEvent, OrderMatch, OrderPatch};

use crate::error::StoreError;

pub use in_memory::InMemoryOrderStore;
pub use postgres::PostgresOrderStore;

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Insert a new order; a duplicate order number or provider order id is a `Conflict`.
    async fn create(&self, order: &Order) -> Result<(), StoreError>;

    async fn find_by_order_number(&self, order_number: &OrderNumber) -> Result<Option<Order>, StoreError>;

    async fn find_by_provider_order_id(&self, provider_order_id: &str) -> Result<Option<Order>, StoreError>;

    /// Apply `patch` and append `event` to the order selected by `matcher`,
    /// only if it still satisfies the predicate at write time.
    ///
    /// Returns the updated order, or `None` when nothing matched. A matcher
    /// naming neither key selects nothing.
    async fn transition(
        &self,
        matcher: &OrderMatch,
        patch: &OrderPatch,
        event: OrderEvent,
    ) -> Result<Option<Order>, StoreError>;

    async fn list_newest_first(&self) -> Result<Vec<Order>, StoreError>;

    /// Returns whether an order was removed.
    async fn delete(&self, order_number: &OrderNumber) -> Result<bool, StoreError>;
}

#[async_trait]
impl<S> OrderStore for Arc<S>
where
    S: OrderStore + ?Sized,
{
    async fn create(&self, order: &Order) -> Result<(), StoreError> {
        (**self).create(order).await
    }

    async fn find_by_order_number(&self, order_number: &OrderNumber) -> Result<Option<Order>, StoreError> {
        (**self).find_by_order_number(order_number).await
    }

    async fn find_by_provider_order_id(&self, provider_order_id: &str) -> Result<Option<Order>, StoreError> {
        (**self).find_by_provider_order_id(provider_order_id).await
    }

    async fn transition(
        &self,
        matcher: &OrderMatch,
        patch: &OrderPatch,
        event: OrderEvent,
    ) -> Result<Option<Order>, StoreError> {
        (**self).transition(matcher, patch, event).await
    }

    async fn list_newest_first(&self) -> Result<Vec<Order>, StoreError> {
        (**self).list_newest_first().await
    }

    async fn delete(&self, order_number: &OrderNumber) -> Result<bool, StoreError> {
        (**self).delete(order_number).await
    }
}
