//! Read-only snapshots of the collaborators the order core consumes.

use serde::{Deserialize, Serialize};

use storefront_core::id::DEFAULT_ORDER_PREFIX;
use storefront_core::{MenuItemId, Money, TaxRate};

/// A menu entry as seen by the pricing engine at order time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub id: MenuItemId,
    pub name: String,
    pub price: Money,
    #[serde(default = "default_true")]
    pub is_available: bool,
}

/// Store-wide settings relevant to checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreSettings {
    pub tax_rate: TaxRate,
    pub currency: String,
    pub invoice_prefix: String,
    pub store_open: bool,
    pub min_order: Money,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            tax_rate: TaxRate::from_percent(5.0),
            currency: "INR".to_string(),
            invoice_prefix: DEFAULT_ORDER_PREFIX.to_string(),
            store_open: true,
            min_order: Money::ZERO,
        }
    }
}

fn default_true() -> bool {
    true
}
