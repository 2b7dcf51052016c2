//! Postgres-backed order store.
//!
//! Orders are stored as JSONB documents keyed by order number, with the
//! provider order id and creation time lifted into columns for lookup and
//! ordering. `transition` locks the selected row (`SELECT ... FOR UPDATE`),
//! evaluates the predicate in Rust and writes the document back in the same
//! transaction.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::{instrument, Span};

use storefront_core::OrderNumber;
use storefront_orders::{Order, OrderEvent, OrderMatch, OrderPatch};

use super::OrderStore;
use crate::db::LazyPool;
use crate::error::{map_sqlx_error, StoreError};

#[derive(Debug, Clone)]
pub struct PostgresOrderStore {
    pool: Arc<LazyPool>,
}

impl PostgresOrderStore {
    pub fn new(pool: Arc<LazyPool>) -> Self {
        Self { pool }
    }

    async fn pool(&self) -> Result<&PgPool, StoreError> {
        self.pool.get().await
    }
}

fn decode(row: &sqlx::postgres::PgRow) -> Result<Order, StoreError> {
    row.try_get::<Json<Order>, _>("document")
        .map(|Json(order)| order)
        .map_err(|e| StoreError::Unavailable(format!("failed to decode order document: {e}")))
}

async fn lock_for_update(
    tx: &mut Transaction<'_, Postgres>,
    matcher: &OrderMatch,
) -> Result<Option<Order>, StoreError> {
    let row = match (&matcher.order_number, &matcher.provider_order_id) {
        (Some(n), _) => {
            sqlx::query("SELECT document FROM orders WHERE order_number = $1 FOR UPDATE")
                .bind(n.as_str())
                .fetch_optional(&mut **tx)
                .await
        }
        (None, Some(id)) => {
            sqlx::query("SELECT document FROM orders WHERE provider_order_id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut **tx)
                .await
        }
        (None, None) => return Ok(None),
    }
    .map_err(|e| map_sqlx_error("lock_order", e))?;

    row.as_ref().map(decode).transpose()
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    #[instrument(skip(self, order), fields(order_number = %order.order_number()), err)]
    async fn create(&self, order: &Order) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO orders (order_number, provider_order_id, created_at, document)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(order.order_number().as_str())
        .bind(&order.payment().provider_order_id)
        .bind(order.created_at())
        .bind(Json(order))
        .execute(self.pool().await?)
        .await
        .map_err(|e| map_sqlx_error("insert_order", e))?;
        Ok(())
    }

    #[instrument(skip(self, order_number), fields(order_number = %order_number), err)]
    async fn find_by_order_number(&self, order_number: &OrderNumber) -> Result<Option<Order>, StoreError> {
        let row = sqlx::query("SELECT document FROM orders WHERE order_number = $1")
            .bind(order_number.as_str())
            .fetch_optional(self.pool().await?)
            .await
            .map_err(|e| map_sqlx_error("find_by_order_number", e))?;
        row.as_ref().map(decode).transpose()
    }

    #[instrument(skip(self), err)]
    async fn find_by_provider_order_id(&self, provider_order_id: &str) -> Result<Option<Order>, StoreError> {
        let row = sqlx::query("SELECT document FROM orders WHERE provider_order_id = $1")
            .bind(provider_order_id)
            .fetch_optional(self.pool().await?)
            .await
            .map_err(|e| map_sqlx_error("find_by_provider_order_id", e))?;
        row.as_ref().map(decode).transpose()
    }

    #[instrument(
        skip(self, matcher, patch, event),
        fields(event_type = event.kind.as_str(), matched = tracing::field::Empty),
        err
    )]
    async fn transition(
        &self,
        matcher: &OrderMatch,
        patch: &OrderPatch,
        event: OrderEvent,
    ) -> Result<Option<Order>, StoreError> {
        let span = Span::current();

        let mut tx = self
            .pool()
            .await?
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let mut order = match lock_for_update(&mut tx, matcher).await? {
            Some(order) if matcher.matches(&order) => order,
            _ => {
                tx.rollback()
                    .await
                    .map_err(|e| map_sqlx_error("rollback", e))?;
                span.record("matched", false);
                return Ok(None);
            }
        };

        order.apply(patch, event);

        sqlx::query("UPDATE orders SET document = $2 WHERE order_number = $1")
            .bind(order.order_number().as_str())
            .bind(Json(&order))
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("update_order", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        span.record("matched", true);
        Ok(Some(order))
    }

    #[instrument(skip(self), err)]
    async fn list_newest_first(&self) -> Result<Vec<Order>, StoreError> {
        let rows = sqlx::query("SELECT document FROM orders ORDER BY created_at DESC, order_number DESC")
            .fetch_all(self.pool().await?)
            .await
            .map_err(|e| map_sqlx_error("list_orders", e))?;
        rows.iter().map(decode).collect()
    }

    #[instrument(skip(self, order_number), fields(order_number = %order_number), err)]
    async fn delete(&self, order_number: &OrderNumber) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM orders WHERE order_number = $1")
            .bind(order_number.as_str())
            .execute(self.pool().await?)
            .await
            .map_err(|e| map_sqlx_error("delete_order", e))?;
        Ok(result.rows_affected() > 0)
    }
}
