use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use storefront_core::DomainError;
use storefront_infra::services::ServiceError;

pub fn service_error_to_response(err: ServiceError) -> axum::response::Response {
    let code = err.kind();
    match err {
        ServiceError::Domain(DomainError::NotFound) | ServiceError::OrderNotFound => {
            json_error(StatusCode::NOT_FOUND, code, "order not found")
        }
        ServiceError::Domain(DomainError::Conflict(msg)) | ServiceError::Conflict(msg) => {
            json_error(StatusCode::CONFLICT, code, msg)
        }
        ServiceError::Domain(e) => json_error(StatusCode::BAD_REQUEST, code, e.to_string()),
        ServiceError::InvalidSignature => {
            json_error(StatusCode::BAD_REQUEST, code, "payment signature is invalid")
        }
        ServiceError::ProviderRejected(msg) => json_error(StatusCode::BAD_REQUEST, code, msg),
        ServiceError::ProviderUnavailable(msg) => {
            tracing::warn!(error = %msg, "payment provider unavailable");
            json_error(StatusCode::BAD_GATEWAY, code, msg)
        }
        ServiceError::StoreUnavailable(msg) => {
            tracing::error!(error = %msg, "order store unavailable");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, code, "order store unavailable")
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
