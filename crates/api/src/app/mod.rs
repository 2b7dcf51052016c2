//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store/provider wiring and the shared application services
//! - `routes/`: HTTP handlers (orders, webhook, health)
//! - `dto.rs`: request DTOs and JSON parsing helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, Extension, Router};
use tower::ServiceBuilder;

use storefront_infra::AppConfig;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

use services::AppServices;

/// Build the full HTTP router (public entrypoint used by `main.rs` and tests).
pub fn build_app(config: &AppConfig, services: Arc<AppServices>) -> Router {
    if config.admin_token.is_none() {
        tracing::warn!("ADMIN_TOKEN not set; admin routes will reject every request");
    }
    let admin_state = middleware::AdminState {
        token: config.admin_token.clone().map(Arc::new),
    };

    routes::router().layer(
        ServiceBuilder::new()
            .layer(DefaultBodyLimit::max(middleware::MAX_BODY_BYTES))
            .layer(Extension(services))
            .layer(axum::middleware::from_fn_with_state(
                admin_state,
                middleware::admin_middleware,
            )),
    )
}
