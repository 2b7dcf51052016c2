use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

use storefront_core::{DomainError, DomainResult, MenuItemId, Money, OrderNumber, TaxRate};

use crate::pricing::PricedOrder;
use crate::transition::{OrderPatch, PaymentPatch};

pub const PAYMENT_PROVIDER: &str = "razorpay";
pub const PAYMENT_METHOD_ONLINE: &str = "Online";

/// Order status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Created,
    PaymentPending,
    Paid,
    Preparing,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Created,
        OrderStatus::PaymentPending,
        OrderStatus::Paid,
        OrderStatus::Preparing,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Created => "CREATED",
            OrderStatus::PaymentPending => "PAYMENT_PENDING",
            OrderStatus::Paid => "PAID",
            OrderStatus::Preparing => "PREPARING",
            OrderStatus::Completed => "COMPLETED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }
}

impl core::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    /// Exact match against the enumerated names; anything else is `InvalidStatus`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| DomainError::invalid_status(s))
    }
}

/// Order line: a snapshot of the catalog entry at order time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub menu_item_id: MenuItemId,
    pub name: String,
    pub price: Money,
    pub qty: u32,
    pub line_total: Money,
}

/// Derived pricing, frozen at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pricing {
    pub subtotal: Money,
    pub tax: Money,
    pub total: Money,
    pub currency: String,
    /// Tax rate in effect when the order was priced.
    pub tax_rate: TaxRate,
}

/// Free-form customer capture.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Customer {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub pincode: Option<String>,
    pub note: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Created,
    Paid,
    Failed,
}

/// Payment sub-record; `provider_order_id` is the join key to the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub provider: String,
    pub provider_order_id: String,
    pub provider_payment_id: Option<String>,
    pub method: String,
    pub status: PaymentStatus,
    /// Amount in minor units, as acknowledged by the provider.
    pub amount: i64,
    pub currency: String,
    pub paid_at: Option<DateTime<Utc>>,
}

impl Payment {
    /// Payment record for a freshly created provider order.
    pub fn created(provider_order_id: impl Into<String>, amount: i64, currency: impl Into<String>) -> Self {
        Self {
            provider: PAYMENT_PROVIDER.to_string(),
            provider_order_id: provider_order_id.into(),
            provider_payment_id: None,
            method: PAYMENT_METHOD_ONLINE.to_string(),
            status: PaymentStatus::Created,
            amount,
            currency: currency.into(),
            paid_at: None,
        }
    }
}

/// Invoicing sub-record, reserved for an accounting integration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Accounting {
    pub provider: Option<String>,
    pub invoice_id: Option<String>,
    pub invoice_number: Option<String>,
    pub invoice_url: Option<String>,
    pub synced_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderEventType {
    OrderCreated,
    PaymentVerified,
    PaymentFailed,
    StatusChanged,
    OrderCancelled,
}

impl OrderEventType {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderEventType::OrderCreated => "ORDER_CREATED",
            OrderEventType::PaymentVerified => "PAYMENT_VERIFIED",
            OrderEventType::PaymentFailed => "PAYMENT_FAILED",
            OrderEventType::StatusChanged => "STATUS_CHANGED",
            OrderEventType::OrderCancelled => "ORDER_CANCELLED",
        }
    }
}

/// Which reconciliation entry point produced a payment event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventSource {
    Client,
    Webhook,
}

impl EventSource {
    pub fn as_str(self) -> &'static str {
        match self {
            EventSource::Client => "client",
            EventSource::Webhook => "webhook",
        }
    }
}

/// One entry of the append-only order event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderEvent {
    #[serde(rename = "type")]
    pub kind: OrderEventType,
    pub at: DateTime<Utc>,
    pub details: JsonValue,
}

impl OrderEvent {
    pub fn new(kind: OrderEventType, at: DateTime<Utc>, details: JsonValue) -> Self {
        Self { kind, at, details }
    }
}

/// Aggregate root: Order.
///
/// Fields are private so the only ways to change an order are `place` and
/// `apply`, which keep the event log append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    order_number: OrderNumber,
    status: OrderStatus,
    items: Vec<OrderItem>,
    pricing: Pricing,
    customer: Customer,
    payment: Payment,
    accounting: Accounting,
    events: Vec<OrderEvent>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Order {
    /// Build a new order awaiting payment, bound to its provider order.
    pub fn place(
        order_number: OrderNumber,
        priced: PricedOrder,
        customer: Customer,
        payment: Payment,
        at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if priced.items.is_empty() {
            return Err(DomainError::validation("order must contain at least one item"));
        }
        if payment.provider_order_id.trim().is_empty() {
            return Err(DomainError::validation("provider order id is required"));
        }

        let expected = priced.pricing.total.minor_units();
        if payment.amount != expected {
            return Err(DomainError::AmountMismatch {
                expected,
                recorded: payment.amount,
            });
        }

        let created = OrderEvent::new(
            OrderEventType::OrderCreated,
            at,
            json!({
                "orderNumber": order_number.as_str(),
                "providerOrderId": payment.provider_order_id,
                "total": priced.pricing.total,
                "currency": priced.pricing.currency,
            }),
        );

        Ok(Self {
            order_number,
            status: OrderStatus::PaymentPending,
            items: priced.items,
            pricing: priced.pricing,
            customer,
            payment,
            accounting: Accounting::default(),
            events: vec![created],
            created_at: at,
            updated_at: at,
        })
    }

    pub fn order_number(&self) -> &OrderNumber {
        &self.order_number
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn pricing(&self) -> &Pricing {
        &self.pricing
    }

    pub fn customer(&self) -> &Customer {
        &self.customer
    }

    pub fn payment(&self) -> &Payment {
        &self.payment
    }

    pub fn accounting(&self) -> &Accounting {
        &self.accounting
    }

    pub fn events(&self) -> &[OrderEvent] {
        &self.events
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// `round(pricing.total * 100)`: the amount every reconciliation must see recorded.
    pub fn expected_amount(&self) -> i64 {
        self.pricing.total.minor_units()
    }

    /// Cross-check the recorded payment amount against the stored pricing.
    pub fn verify_amount(&self) -> DomainResult<()> {
        let expected = self.expected_amount();
        if self.payment.amount != expected {
            return Err(DomainError::AmountMismatch {
                expected,
                recorded: self.payment.amount,
            });
        }
        Ok(())
    }

    /// Apply a transition patch and append its event.
    ///
    /// Callers are responsible for having checked the match predicate; this
    /// only mutates state.
    pub fn apply(&mut self, patch: &OrderPatch, mut event: OrderEvent) {
        if matches!(event.kind, OrderEventType::StatusChanged | OrderEventType::OrderCancelled) {
            if let Some(details) = event.details.as_object_mut() {
                details.insert("from".to_string(), json!(self.status.as_str()));
            }
        }

        if let Some(status) = patch.status {
            self.status = status;
        }

        match &patch.payment {
            Some(PaymentPatch::Paid { provider_payment_id }) => {
                let already_paid =
                    self.payment.status == PaymentStatus::Paid && self.payment.paid_at.is_some();
                if !already_paid {
                    self.payment.paid_at = Some(event.at);
                }
                self.payment.provider_payment_id = Some(provider_payment_id.clone());
                self.payment.status = PaymentStatus::Paid;
            }
            Some(PaymentPatch::Failed { provider_payment_id }) => {
                self.payment.provider_payment_id = provider_payment_id.clone();
                self.payment.status = PaymentStatus::Failed;
                self.payment.paid_at = None;
            }
            None => {}
        }

        if patch.reset_accounting {
            self.accounting = Accounting::default();
        }

        self.updated_at = event.at;
        self.events.push(event);
    }
}
