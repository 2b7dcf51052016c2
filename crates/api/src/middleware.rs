use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    extract::State,
    http::{HeaderMap, Request, StatusCode},
    middleware::Next,
    response::Response,
};

use storefront_auth::{authorize_admin, AdminToken};
use storefront_observability::SECURITY_TARGET;

use crate::app::errors::json_error;
use crate::authz::{is_status_change, requires_admin, Access, Route};

pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Upper bound on buffered request bodies.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

#[derive(Clone)]
pub struct AdminState {
    pub token: Option<Arc<AdminToken>>,
}

pub async fn admin_middleware(
    State(state): State<AdminState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let route = Route::from_path(req.uri().path());

    let req = match requires_admin(route, req.method()) {
        Access::Public => return next.run(req).await,
        Access::Admin => req,
        Access::AdminForStatusChange => {
            let (parts, body) = req.into_parts();
            let Ok(bytes) = to_bytes(body, MAX_BODY_BYTES).await else {
                return json_error(
                    StatusCode::BAD_REQUEST,
                    "validation_error",
                    "request body too large or unreadable",
                );
            };
            let status_change = is_status_change(&bytes);
            let req = Request::from_parts(parts, Body::from(bytes));
            if !status_change {
                return next.run(req).await;
            }
            req
        }
    };

    if let Err(e) = authorize_admin(state.token.as_deref(), presented_token(req.headers())) {
        tracing::warn!(
            target: SECURITY_TARGET,
            method = %req.method(),
            path = %req.uri().path(),
            reason = %e,
            "admin request rejected"
        );
        return json_error(StatusCode::UNAUTHORIZED, "unauthorized", e.to_string());
    }

    next.run(req).await
}

fn presented_token(headers: &HeaderMap) -> Option<&str> {
    headers.get(ADMIN_TOKEN_HEADER).and_then(|v| v.to_str().ok())
}
