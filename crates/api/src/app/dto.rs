use axum::http::StatusCode;
use axum::response::Response;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use storefront_core::{MenuItemId, OrderNumber};
use storefront_infra::services::{CheckoutRequest, ClientPaymentFailure, ClientPaymentProof};
use storefront_orders::{Customer, RequestedItem};

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

/// `POST /orders`. Only ids and quantities are read; prices come from the catalog.
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub items: Vec<CartLine>,
    #[serde(default)]
    pub customer: Customer,
}

#[derive(Debug, Deserialize)]
pub struct CartLine {
    #[serde(alias = "menuItemId")]
    pub id: String,
    pub qty: f64,
}

/// `PATCH /orders?orderNumber=X`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum PatchOrderRequest {
    Payment(PaymentAction),
    Status(StatusChange),
}

#[derive(Debug, Deserialize)]
#[serde(
    tag = "action",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase",
    deny_unknown_fields
)]
pub enum PaymentAction {
    VerifyPayment {
        #[serde(alias = "razorpay_order_id")]
        provider_order_id: String,
        #[serde(alias = "razorpay_payment_id")]
        provider_payment_id: String,
        #[serde(alias = "razorpay_signature")]
        signature: String,
    },
    MarkPaymentFailed {
        #[serde(alias = "razorpay_order_id")]
        provider_order_id: String,
        #[serde(default, alias = "razorpay_payment_id")]
        provider_payment_id: Option<String>,
    },
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StatusChange {
    pub status: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct OrderQuery {
    #[serde(rename = "orderNumber")]
    pub order_number: Option<String>,
}

// -------------------------
// Mapping helpers
// -------------------------

/// Parse a JSON body; malformed input is a `validation_error`.
pub fn parse_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, Response> {
    serde_json::from_slice(body).map_err(|e| {
        errors::json_error(StatusCode::BAD_REQUEST, "validation_error", format!("invalid request body: {e}"))
    })
}

impl OrderQuery {
    pub fn required_order_number(&self) -> Result<OrderNumber, Response> {
        self.order_number
            .as_deref()
            .unwrap_or_default()
            .parse()
            .map_err(|_| errors::json_error(StatusCode::BAD_REQUEST, "validation_error", "orderNumber is required"))
    }
}

/// Quantities must be whole and positive; anything else becomes 0 so pricing
/// rejects the line with its id.
fn whole_quantity(qty: f64) -> i64 {
    if qty.is_finite() && qty.fract() == 0.0 {
        qty as i64
    } else {
        0
    }
}

impl CreateOrderRequest {
    pub fn into_checkout(self) -> Result<CheckoutRequest, Response> {
        let mut items = Vec::with_capacity(self.items.len());
        for line in self.items {
            let menu_item_id: MenuItemId = line.id.parse().map_err(|_| {
                errors::json_error(StatusCode::BAD_REQUEST, "validation_error", "item id is required")
            })?;
            items.push(RequestedItem {
                menu_item_id,
                qty: whole_quantity(line.qty),
            });
        }
        Ok(CheckoutRequest {
            items,
            customer: self.customer,
        })
    }
}

impl From<PaymentAction> for PaymentCommand {
    fn from(action: PaymentAction) -> Self {
        match action {
            PaymentAction::VerifyPayment {
                provider_order_id,
                provider_payment_id,
                signature,
            } => PaymentCommand::Verify(ClientPaymentProof {
                provider_order_id,
                provider_payment_id,
                signature,
            }),
            PaymentAction::MarkPaymentFailed {
                provider_order_id,
                provider_payment_id,
            } => PaymentCommand::Failed(ClientPaymentFailure {
                provider_order_id,
                provider_payment_id,
            }),
        }
    }
}

/// Payment action in service terms.
pub enum PaymentCommand {
    Verify(ClientPaymentProof),
    Failed(ClientPaymentFailure),
}
