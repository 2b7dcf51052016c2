use std::sync::Arc;

use async_trait::async_trait;
use sqlx::Row;
use sqlx::types::Json;
use tracing::instrument;

use storefront_core::MenuItemId;
use storefront_orders::{CatalogEntry, StoreSettings};

use super::{CatalogSource, DeliveryZones, SettingsSource};
use crate::db::LazyPool;
use crate::error::{map_sqlx_error, StoreError};

/// Catalog, settings and delivery zones read from the shared database.
///
/// Menu items and settings are JSONB documents in the same camelCase shape
/// the in-memory seed uses.
#[derive(Debug, Clone)]
pub struct PostgresStorefront {
    pool: Arc<LazyPool>,
}

impl PostgresStorefront {
    pub fn new(pool: Arc<LazyPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogSource for PostgresStorefront {
    #[instrument(skip(self, ids), fields(requested = ids.len()), err)]
    async fn entries(&self, ids: &[MenuItemId]) -> Result<Vec<CatalogEntry>, StoreError> {
        let ids: Vec<String> = ids.iter().map(|id| id.as_str().to_string()).collect();
        let rows = sqlx::query("SELECT document FROM menu_items WHERE id = ANY($1)")
            .bind(&ids)
            .fetch_all(self.pool.get().await?)
            .await
            .map_err(|e| map_sqlx_error("menu_entries", e))?;

        rows.iter()
            .map(|row| {
                row.try_get::<Json<CatalogEntry>, _>("document")
                    .map(|Json(entry)| entry)
                    .map_err(|e| StoreError::Unavailable(format!("failed to decode menu item: {e}")))
            })
            .collect()
    }
}

#[async_trait]
impl SettingsSource for PostgresStorefront {
    #[instrument(skip(self), err)]
    async fn store_settings(&self) -> Result<StoreSettings, StoreError> {
        let row = sqlx::query("SELECT document FROM store_settings WHERE id = 1")
            .fetch_optional(self.pool.get().await?)
            .await
            .map_err(|e| map_sqlx_error("store_settings", e))?;

        match row {
            Some(row) => row
                .try_get::<Json<StoreSettings>, _>("document")
                .map(|Json(settings)| settings)
                .map_err(|e| StoreError::Unavailable(format!("failed to decode store settings: {e}"))),
            None => Ok(StoreSettings::default()),
        }
    }
}

#[async_trait]
impl DeliveryZones for PostgresStorefront {
    #[instrument(skip(self), err)]
    async fn is_serviceable(&self, pincode: &str) -> Result<bool, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) AS configured,
                COUNT(*) FILTER (WHERE code = $1) AS matching
            FROM delivery_pincodes
            "#,
        )
        .bind(pincode.trim())
        .fetch_one(self.pool.get().await?)
        .await
        .map_err(|e| map_sqlx_error("delivery_zones", e))?;

        let configured: i64 = row.try_get("configured").map_err(|e| map_sqlx_error("delivery_zones", e))?;
        let matching: i64 = row.try_get("matching").map_err(|e| map_sqlx_error("delivery_zones", e))?;
        Ok(configured == 0 || matching > 0)
    }
}
