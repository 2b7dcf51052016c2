use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use storefront_core::OrderNumber;
use storefront_orders::{Order, OrderEvent, OrderMatch, OrderPatch};

use super::OrderStore;
use crate::error::{poisoned, StoreError};

/// In-memory order store for tests/dev.
///
/// A single write lock covers lookup, predicate check and mutation, which is
/// what makes `transition` atomic here.
#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
    inner: RwLock<HashMap<OrderNumber, Order>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn locate<'a>(map: &'a mut HashMap<OrderNumber, Order>, matcher: &OrderMatch) -> Option<&'a mut Order> {
    match (&matcher.order_number, &matcher.provider_order_id) {
        (Some(n), _) => map.get_mut(n),
        (None, Some(id)) => map.values_mut().find(|o| &o.payment().provider_order_id == id),
        (None, None) => None,
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn create(&self, order: &Order) -> Result<(), StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;

        if map.contains_key(order.order_number()) {
            return Err(StoreError::Conflict(format!(
                "order {} already exists",
                order.order_number()
            )));
        }
        let provider_order_id = &order.payment().provider_order_id;
        if map.values().any(|o| &o.payment().provider_order_id == provider_order_id) {
            return Err(StoreError::Conflict(format!(
                "provider order {provider_order_id} already bound"
            )));
        }

        map.insert(order.order_number().clone(), order.clone());
        Ok(())
    }

    async fn find_by_order_number(&self, order_number: &OrderNumber) -> Result<Option<Order>, StoreError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.get(order_number).cloned())
    }

    async fn find_by_provider_order_id(&self, provider_order_id: &str) -> Result<Option<Order>, StoreError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map
            .values()
            .find(|o| o.payment().provider_order_id == provider_order_id)
            .cloned())
    }

    async fn transition(
        &self,
        matcher: &OrderMatch,
        patch: &OrderPatch,
        event: OrderEvent,
    ) -> Result<Option<Order>, StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;

        match locate(&mut map, matcher) {
            Some(order) if matcher.matches(order) => {
                order.apply(patch, event);
                Ok(Some(order.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn list_newest_first(&self) -> Result<Vec<Order>, StoreError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        let mut orders: Vec<Order> = map.values().cloned().collect();
        orders.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| b.order_number().cmp(a.order_number()))
        });
        Ok(orders)
    }

    async fn delete(&self, order_number: &OrderNumber) -> Result<bool, StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        Ok(map.remove(order_number).is_some())
    }
}
