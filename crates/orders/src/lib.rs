//! Orders domain module.
//!
//! This crate contains the business rules for storefront orders, implemented
//! purely as deterministic domain logic (no IO, no HTTP, no storage): catalog
//! snapshots, the pricing engine, the order aggregate with its append-only event
//! log, and the conditional transitions applied by stores.

pub mod catalog;
pub mod order;
pub mod pricing;
pub mod transition;

pub use catalog::{CatalogEntry, StoreSettings};
pub use order::{
    Accounting, Customer, EventSource, Order, OrderEvent, OrderEventType, OrderItem, OrderStatus,
    Payment, PaymentStatus, Pricing, PAYMENT_METHOD_ONLINE, PAYMENT_PROVIDER,
};
pub use pricing::{compute_pricing, price_order, reprice, PricedOrder, RequestedItem};
pub use transition::{OrderMatch, OrderPatch, PaymentPatch, Transition};
