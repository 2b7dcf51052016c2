use thiserror::Error;

use storefront_core::DomainError;
use storefront_payments::{GatewayError, WebhookError};

use crate::error::StoreError;

/// Application-service error: every failure a storefront operation can report.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("payment signature is invalid")]
    InvalidSignature,

    #[error("order not found")]
    OrderNotFound,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("payment provider rejected the request: {0}")]
    ProviderRejected(String),

    #[error("payment provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("order store unavailable: {0}")]
    StoreUnavailable(String),
}

impl ServiceError {
    /// Stable machine-readable kind, used as the `error` field of API responses.
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::Domain(e) => match e {
                DomainError::Validation(_) => "validation_error",
                DomainError::InvalidItem(_) => "invalid_item",
                DomainError::Unavailable(_) => "item_unavailable",
                DomainError::InvalidStatus(_) => "invalid_status",
                DomainError::StoreClosed => "store_closed",
                DomainError::Unserviceable(_) => "unserviceable_pincode",
                DomainError::BelowMinimumOrder { .. } => "below_minimum_order",
                DomainError::AmountMismatch { .. } => "amount_mismatch",
                DomainError::NotFound => "order_not_found",
                DomainError::Conflict(_) => "conflict",
            },
            ServiceError::InvalidSignature => "invalid_signature",
            ServiceError::OrderNotFound => "order_not_found",
            ServiceError::Conflict(_) => "conflict",
            ServiceError::ProviderRejected(_) => "provider_rejected",
            ServiceError::ProviderUnavailable(_) => "provider_unavailable",
            ServiceError::StoreUnavailable(_) => "store_unavailable",
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => ServiceError::Conflict(msg),
            StoreError::Unavailable(msg) => ServiceError::StoreUnavailable(msg),
        }
    }
}

impl From<GatewayError> for ServiceError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Rejected { status, details } => {
                ServiceError::ProviderRejected(format!("status {status}: {details}"))
            }
            GatewayError::Unavailable(msg) => ServiceError::ProviderUnavailable(msg),
        }
    }
}

impl From<WebhookError> for ServiceError {
    fn from(err: WebhookError) -> Self {
        ServiceError::Domain(DomainError::validation(err.to_string()))
    }
}
