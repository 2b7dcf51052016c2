//! Service wiring: picks the store backends from configuration and builds the
//! application services the handlers share.

use std::sync::Arc;

use anyhow::Context;

use storefront_infra::services::{CheckoutService, LifecycleService, ReconciliationService};
use storefront_infra::{
    AppConfig, CatalogSource, DeliveryZones, InMemoryOrderStore, InMemoryStorefront, LazyPool, OrderStore,
    PostgresOrderStore, PostgresStorefront, Seed, SettingsSource,
};
use storefront_payments::{PaymentGateway, RazorpayGateway};

pub struct AppServices {
    pub checkout: CheckoutService,
    pub reconciliation: ReconciliationService,
    pub lifecycle: LifecycleService,
}

/// Storefront collaborators checkout reads from.
pub struct StorefrontSources {
    pub catalog: Arc<dyn CatalogSource>,
    pub settings: Arc<dyn SettingsSource>,
    pub zones: Arc<dyn DeliveryZones>,
}

impl StorefrontSources {
    pub fn in_memory(storefront: Arc<InMemoryStorefront>) -> Self {
        Self {
            catalog: storefront.clone(),
            settings: storefront.clone(),
            zones: storefront,
        }
    }
}

impl AppServices {
    pub fn new(
        config: &AppConfig,
        orders: Arc<dyn OrderStore>,
        sources: StorefrontSources,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            checkout: CheckoutService::new(
                orders.clone(),
                sources.catalog,
                sources.settings,
                sources.zones,
                gateway,
                config.razorpay.key_id.clone(),
            ),
            reconciliation: ReconciliationService::new(
                orders.clone(),
                config.razorpay.key_secret.clone(),
                config.webhook_secret.clone(),
            ),
            lifecycle: LifecycleService::new(orders),
        }
    }

    /// In-memory orders over the given storefront, with the real provider client.
    pub fn in_memory(config: &AppConfig, storefront: InMemoryStorefront) -> anyhow::Result<Self> {
        let gateway = RazorpayGateway::new(config.razorpay.clone()).context("building payment gateway")?;
        Ok(Self::new(
            config,
            Arc::new(InMemoryOrderStore::new()),
            StorefrontSources::in_memory(Arc::new(storefront)),
            Arc::new(gateway),
        ))
    }
}

pub fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    if config.use_persistent_stores {
        let url = config
            .database_url
            .clone()
            .context("DATABASE_URL must be set when USE_PERSISTENT_STORES is enabled")?;
        let pool = Arc::new(LazyPool::new(url));
        let storefront = Arc::new(PostgresStorefront::new(pool.clone()));
        let gateway = RazorpayGateway::new(config.razorpay.clone()).context("building payment gateway")?;

        tracing::info!("using postgres stores");
        return Ok(AppServices::new(
            config,
            Arc::new(PostgresOrderStore::new(pool)),
            StorefrontSources {
                catalog: storefront.clone(),
                settings: storefront.clone(),
                zones: storefront,
            },
            Arc::new(gateway),
        ));
    }

    let storefront = match &config.seed_path {
        Some(path) => {
            let seed = Seed::load(path).with_context(|| format!("loading seed {}", path.display()))?;
            tracing::info!(items = seed.catalog.len(), pincodes = seed.pincodes.len(), "seeded in-memory storefront");
            InMemoryStorefront::from_seed(seed)
        }
        None => {
            tracing::warn!("no STOREFRONT_SEED configured; catalog is empty");
            InMemoryStorefront::new()
        }
    };

    tracing::info!("using in-memory stores");
    AppServices::in_memory(config, storefront)
}
