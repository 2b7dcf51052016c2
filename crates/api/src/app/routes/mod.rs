use axum::{
    routing::{get, post},
    Router,
};

pub mod orders;
pub mod system;
pub mod webhook;

pub fn router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .route(
            "/orders",
            post(orders::create_order)
                .get(orders::get_orders)
                .patch(orders::patch_order)
                .delete(orders::delete_order),
        )
        .route("/payment-webhook", post(webhook::payment_webhook))
}
