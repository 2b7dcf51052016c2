use std::collections::HashSet;
use std::path::Path;
use std::sync::RwLock;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use storefront_core::MenuItemId;
use storefront_orders::{CatalogEntry, StoreSettings};

use super::{CatalogSource, DeliveryZones, SettingsSource};
use crate::error::{poisoned, StoreError};

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid seed file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Seed document for the in-memory storefront.
///
/// ```json
/// { "settings": { "taxRate": 5 }, "catalog": [ { "id": "bagel1", "name": "Bagel", "price": 100 } ], "pincodes": ["560001"] }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Seed {
    pub settings: StoreSettings,
    pub catalog: Vec<CatalogEntry>,
    pub pincodes: Vec<String>,
}

impl Seed {
    pub fn load(path: &Path) -> Result<Self, SeedError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

/// In-memory catalog, settings and delivery zones for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryStorefront {
    catalog: RwLock<Vec<CatalogEntry>>,
    settings: RwLock<StoreSettings>,
    pincodes: RwLock<HashSet<String>>,
}

impl InMemoryStorefront {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed(seed: Seed) -> Self {
        Self {
            catalog: RwLock::new(seed.catalog),
            settings: RwLock::new(seed.settings),
            pincodes: RwLock::new(seed.pincodes.into_iter().map(|p| p.trim().to_string()).collect()),
        }
    }

    /// Insert or replace a catalog entry by id.
    pub fn upsert_item(&self, entry: CatalogEntry) -> Result<(), StoreError> {
        let mut catalog = self.catalog.write().map_err(|_| poisoned())?;
        catalog.retain(|e| e.id != entry.id);
        catalog.push(entry);
        Ok(())
    }

    pub fn set_settings(&self, settings: StoreSettings) -> Result<(), StoreError> {
        *self.settings.write().map_err(|_| poisoned())? = settings;
        Ok(())
    }

    pub fn add_pincode(&self, pincode: &str) -> Result<(), StoreError> {
        self.pincodes
            .write()
            .map_err(|_| poisoned())?
            .insert(pincode.trim().to_string());
        Ok(())
    }
}

#[async_trait]
impl CatalogSource for InMemoryStorefront {
    async fn entries(&self, ids: &[MenuItemId]) -> Result<Vec<CatalogEntry>, StoreError> {
        let catalog = self.catalog.read().map_err(|_| poisoned())?;
        Ok(catalog.iter().filter(|e| ids.contains(&e.id)).cloned().collect())
    }
}

#[async_trait]
impl SettingsSource for InMemoryStorefront {
    async fn store_settings(&self) -> Result<StoreSettings, StoreError> {
        Ok(self.settings.read().map_err(|_| poisoned())?.clone())
    }
}

#[async_trait]
impl DeliveryZones for InMemoryStorefront {
    async fn is_serviceable(&self, pincode: &str) -> Result<bool, StoreError> {
        let pincodes = self.pincodes.read().map_err(|_| poisoned())?;
        Ok(pincodes.is_empty() || pincodes.contains(pincode.trim()))
    }
}
