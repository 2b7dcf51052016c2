//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// catalog resolution, integrity checks). Infrastructure concerns belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed or missing input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A requested menu item id does not resolve, or its quantity is not a positive integer.
    #[error("invalid item: {0}")]
    InvalidItem(String),

    /// A requested menu item exists but is currently not available.
    #[error("item unavailable: {0}")]
    Unavailable(String),

    /// An order status string outside the enumerated set.
    #[error("invalid status: {0}")]
    InvalidStatus(String),

    /// The store is not accepting orders.
    #[error("store is closed")]
    StoreClosed,

    /// The delivery pincode is not served.
    #[error("pincode not serviceable: {0}")]
    Unserviceable(String),

    /// The order subtotal is below the configured minimum.
    #[error("order subtotal {subtotal} is below the minimum of {minimum}")]
    BelowMinimumOrder { subtotal: String, minimum: String },

    /// Stored payment amount disagrees with the amount derived from stored pricing.
    #[error("amount mismatch: expected {expected}, recorded {recorded}")]
    AmountMismatch { expected: i64, recorded: i64 },

    /// A requested resource was not found (domain-level).
    #[error("not found")]
    NotFound,

    /// A uniqueness or state conflict.
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_item(id: impl Into<String>) -> Self {
        Self::InvalidItem(id.into())
    }

    pub fn unavailable(id: impl Into<String>) -> Self {
        Self::Unavailable(id.into())
    }

    pub fn invalid_status(raw: impl Into<String>) -> Self {
        Self::InvalidStatus(raw.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }
}
