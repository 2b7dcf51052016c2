//! Route classification for operator access.
//!
//! Every request is classified once here and enforced by a single middleware;
//! handlers never check credentials themselves.

use axum::http::Method;

use crate::app::dto::PatchOrderRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Health,
    Orders,
    PaymentWebhook,
    Other,
}

impl Route {
    pub fn from_path(path: &str) -> Self {
        match path.trim_end_matches('/') {
            "/health" => Route::Health,
            "/orders" => Route::Orders,
            "/payment-webhook" => Route::PaymentWebhook,
            _ => Route::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Admin,
    /// `PATCH /orders`: payment actions are public, status changes are admin.
    AdminForStatusChange,
}

pub fn requires_admin(route: Route, method: &Method) -> Access {
    match (route, method) {
        (Route::Orders, &Method::GET) | (Route::Orders, &Method::DELETE) => Access::Admin,
        (Route::Orders, &Method::PATCH) => Access::AdminForStatusChange,
        _ => Access::Public,
    }
}

/// Whether a `PATCH /orders` body asks for an operator status change.
pub fn is_status_change(body: &[u8]) -> bool {
    matches!(
        serde_json::from_slice::<PatchOrderRequest>(body),
        Ok(PatchOrderRequest::Status(_))
    )
}
