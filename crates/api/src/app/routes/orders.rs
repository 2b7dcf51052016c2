use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;

use crate::app::dto::{self, CreateOrderRequest, OrderQuery, PatchOrderRequest, PaymentCommand};
use crate::app::errors;
use crate::app::services::AppServices;

/// `POST /orders`: checkout.
pub async fn create_order(
    Extension(services): Extension<Arc<AppServices>>,
    body: Bytes,
) -> axum::response::Response {
    let req: CreateOrderRequest = match dto::parse_json(&body) {
        Ok(r) => r,
        Err(resp) => return resp,
    };
    let checkout = match req.into_checkout() {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    match services.checkout.checkout(checkout).await {
        Ok(receipt) => (StatusCode::CREATED, Json(receipt)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// `GET /orders` lists newest first; `GET /orders?orderNumber=X` returns one order.
pub async fn get_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<OrderQuery>,
) -> axum::response::Response {
    if query.order_number.is_none() {
        return match services.lifecycle.list().await {
            Ok(orders) => Json(json!({ "orders": orders })).into_response(),
            Err(e) => errors::service_error_to_response(e),
        };
    }

    let order_number = match query.required_order_number() {
        Ok(n) => n,
        Err(resp) => return resp,
    };
    match services.lifecycle.get(&order_number).await {
        Ok(order) => Json(json!({ "order": order })).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// `PATCH /orders?orderNumber=X`: payment actions or an operator status change.
pub async fn patch_order(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<OrderQuery>,
    body: Bytes,
) -> axum::response::Response {
    let order_number = match query.required_order_number() {
        Ok(n) => n,
        Err(resp) => return resp,
    };
    let req: PatchOrderRequest = match dto::parse_json(&body) {
        Ok(r) => r,
        Err(resp) => return resp,
    };

    let result = match req {
        PatchOrderRequest::Payment(action) => match PaymentCommand::from(action) {
            PaymentCommand::Verify(proof) => {
                services.reconciliation.verify_client_payment(&order_number, &proof).await
            }
            PaymentCommand::Failed(failure) => {
                services.reconciliation.report_client_failure(&order_number, &failure).await
            }
        },
        PatchOrderRequest::Status(change) => services.lifecycle.set_status(&order_number, &change.status).await,
    };

    match result {
        Ok(order) => Json(json!({ "success": true, "order": order })).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// `DELETE /orders?orderNumber=X`.
pub async fn delete_order(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<OrderQuery>,
) -> axum::response::Response {
    let order_number = match query.required_order_number() {
        Ok(n) => n,
        Err(resp) => return resp,
    };

    match services.lifecycle.delete(&order_number).await {
        Ok(()) => {
            tracing::info!(order_number = %order_number, "order deleted");
            Json(json!({ "success": true })).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}
