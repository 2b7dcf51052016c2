//! Pricing engine: authoritative order totals from catalog prices.
//!
//! Rounding order (every step on exact minor units):
//! 1. `lineTotal = round2(price * qty)`
//! 2. `subtotal = sum(lineTotal)`
//! 3. `tax = round2(subtotal * taxRate / 100)`
//! 4. `total = round2(subtotal + tax)`
//!
//! Client-supplied prices are never an input here. Every step is checked
//! against `Money::MAX`; an order past it is rejected rather than wrapped.

use std::collections::HashMap;

use storefront_core::{DomainError, DomainResult, MenuItemId, Money, TaxRate};

use crate::catalog::{CatalogEntry, StoreSettings};
use crate::order::{Order, OrderItem, Pricing};

/// One requested line: which menu item, how many.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestedItem {
    pub menu_item_id: MenuItemId,
    pub qty: i64,
}

/// Result of pricing a request: item snapshots plus derived totals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedOrder {
    pub items: Vec<OrderItem>,
    pub pricing: Pricing,
}

/// Price a requested item list against a catalog snapshot.
///
/// Fails the whole order on the first offending line; there are no partial orders.
pub fn price_order(
    requested: &[RequestedItem],
    catalog: &[CatalogEntry],
    settings: &StoreSettings,
) -> DomainResult<PricedOrder> {
    if requested.is_empty() {
        return Err(DomainError::validation("items are required"));
    }

    let by_id: HashMap<&MenuItemId, &CatalogEntry> =
        catalog.iter().map(|entry| (&entry.id, entry)).collect();

    let mut items = Vec::with_capacity(requested.len());
    for line in requested {
        let qty = u32::try_from(line.qty)
            .ok()
            .filter(|q| *q > 0)
            .ok_or_else(|| DomainError::invalid_item(line.menu_item_id.as_str()))?;

        let entry = by_id
            .get(&line.menu_item_id)
            .ok_or_else(|| DomainError::invalid_item(line.menu_item_id.as_str()))?;

        if !entry.is_available {
            return Err(DomainError::unavailable(entry.id.as_str()));
        }

        let line_total = entry
            .price
            .checked_times(qty)
            .ok_or_else(|| DomainError::invalid_item(entry.id.as_str()))?;

        items.push(OrderItem {
            menu_item_id: entry.id.clone(),
            name: entry.name.clone(),
            price: entry.price,
            qty,
            line_total,
        });
    }

    let pricing = compute_pricing(&items, settings.tax_rate, &settings.currency)?;
    Ok(PricedOrder { items, pricing })
}

/// Derive pricing from item snapshots at a fixed tax rate.
pub fn compute_pricing(items: &[OrderItem], tax_rate: TaxRate, currency: &str) -> DomainResult<Pricing> {
    let too_large = || DomainError::validation(format!("order total exceeds {}", Money::MAX));

    let subtotal = items
        .iter()
        .try_fold(Money::ZERO, |acc, item| {
            item.price.checked_times(item.qty).and_then(|line| acc.checked_add(line))
        })
        .ok_or_else(too_large)?;
    let tax = subtotal.checked_percent(tax_rate).ok_or_else(too_large)?;
    let total = subtotal.checked_add(tax).ok_or_else(too_large)?;

    Ok(Pricing {
        subtotal,
        tax,
        total,
        currency: currency.to_string(),
        tax_rate,
    })
}

/// Recompute an order's pricing from its stored items and frozen tax rate.
pub fn reprice(order: &Order) -> DomainResult<Pricing> {
    let pricing = order.pricing();
    compute_pricing(order.items(), pricing.tax_rate, &pricing.currency)
}
