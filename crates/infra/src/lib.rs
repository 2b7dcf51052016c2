//! Infrastructure layer: configuration, Postgres and in-memory stores, and the
//! application services built on them.

pub mod config;
pub mod db;
pub mod error;
pub mod order_store;
pub mod services;
pub mod storefront;

pub use config::{AppConfig, ConfigError};
pub use db::LazyPool;
pub use error::StoreError;
pub use order_store::{InMemoryOrderStore, OrderStore, PostgresOrderStore};
pub use storefront::{
    CatalogSource, DeliveryZones, InMemoryStorefront, PostgresStorefront, Seed, SeedError, SettingsSource,
};
