//! Read-only collaborators consumed by checkout: the menu catalog, store
//! settings and delivery zones.

mod in_memory;
mod postgres;

use async_trait::async_trait;

use storefront_core::MenuItemId;
use storefront_orders::{CatalogEntry, StoreSettings};

use crate::error::StoreError;

pub use in_memory::{InMemoryStorefront, Seed, SeedError};
pub use postgres::PostgresStorefront;

#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Entries for the given ids; unknown ids are simply absent from the result.
    async fn entries(&self, ids: &[MenuItemId]) -> Result<Vec<CatalogEntry>, StoreError>;
}

#[async_trait]
pub trait SettingsSource: Send + Sync {
    /// Current settings; missing fields take the store defaults.
    async fn store_settings(&self) -> Result<StoreSettings, StoreError>;
}

#[async_trait]
pub trait DeliveryZones: Send + Sync {
    /// Whether a pincode is served. With no zones configured every pincode is.
    async fn is_serviceable(&self, pincode: &str) -> Result<bool, StoreError>;
}
