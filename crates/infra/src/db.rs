//! Postgres connection pool, created on first use and reused for the life of
//! the process.

use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tokio::sync::OnceCell;
use tracing::instrument;

use crate::error::{map_sqlx_error, StoreError};

/// Connection attempts give up after this long so requests fail fast.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS orders (
    order_number      TEXT PRIMARY KEY,
    provider_order_id TEXT NOT NULL UNIQUE,
    created_at        TIMESTAMPTZ NOT NULL,
    document          JSONB NOT NULL
);
CREATE INDEX IF NOT EXISTS orders_created_at_idx ON orders (created_at DESC);

CREATE TABLE IF NOT EXISTS menu_items (
    id       TEXT PRIMARY KEY,
    document JSONB NOT NULL
);

CREATE TABLE IF NOT EXISTS store_settings (
    id       SMALLINT PRIMARY KEY DEFAULT 1 CHECK (id = 1),
    document JSONB NOT NULL
);

CREATE TABLE IF NOT EXISTS delivery_pincodes (
    code TEXT PRIMARY KEY
);
"#;

/// Lazily connected pool.
///
/// The first caller connects and ensures the schema; concurrent callers wait
/// on the same initialization. A failed attempt leaves the cell empty so the
/// next request retries.
#[derive(Debug)]
pub struct LazyPool {
    url: String,
    cell: OnceCell<PgPool>,
}

impl LazyPool {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            cell: OnceCell::new(),
        }
    }

    #[instrument(skip(self), err)]
    pub async fn get(&self) -> Result<&PgPool, StoreError> {
        self.cell
            .get_or_try_init(|| async {
                let pool = PgPoolOptions::new()
                    .acquire_timeout(CONNECT_TIMEOUT)
                    .connect(&self.url)
                    .await
                    .map_err(|e| map_sqlx_error("connect", e))?;
                ensure_schema(&pool).await?;
                tracing::info!("postgres pool ready");
                Ok(pool)
            })
            .await
    }
}

pub async fn ensure_schema(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::raw_sql(SCHEMA)
        .execute(pool)
        .await
        .map_err(|e| map_sqlx_error("ensure_schema", e))?;
    Ok(())
}
