//! Application services: the storefront operations the HTTP layer exposes.

pub mod checkout;
pub mod error;
pub mod lifecycle;
pub mod reconciliation;

#[cfg(test)]
mod testing;

pub use checkout::{CheckoutReceipt, CheckoutRequest, CheckoutService};
pub use error::ServiceError;
pub use lifecycle::LifecycleService;
pub use reconciliation::{ClientPaymentFailure, ClientPaymentProof, ReconciliationService, WebhookOutcome};
