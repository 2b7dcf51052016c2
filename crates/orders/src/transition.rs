//! Conditional transitions: a match predicate, the fields to set, and the one
//! event to append.
//!
//! Stores evaluate `OrderMatch::matches` and `Order::apply` under a single
//! atomic document update; that is the only concurrency primitive reconciliation
//! relies on.

use chrono::{DateTime, Utc};
use serde_json::json;

use storefront_core::OrderNumber;

use crate::order::{EventSource, Order, OrderEvent, OrderEventType, OrderStatus, PaymentStatus};

/// Predicate a stored order must satisfy for a transition to apply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderMatch {
    pub order_number: Option<OrderNumber>,
    pub provider_order_id: Option<String>,
    /// Skip orders whose payment is already recorded as PAID.
    pub unless_paid: bool,
}

impl OrderMatch {
    pub fn by_order_number(order_number: OrderNumber) -> Self {
        Self {
            order_number: Some(order_number),
            ..Self::default()
        }
    }

    pub fn by_provider_order_id(provider_order_id: impl Into<String>) -> Self {
        Self {
            provider_order_id: Some(provider_order_id.into()),
            ..Self::default()
        }
    }

    pub fn and_order_number(mut self, order_number: OrderNumber) -> Self {
        self.order_number = Some(order_number);
        self
    }

    pub fn unless_paid(mut self) -> Self {
        self.unless_paid = true;
        self
    }

    pub fn matches(&self, order: &Order) -> bool {
        if let Some(n) = &self.order_number {
            if order.order_number() != n {
                return false;
            }
        }
        if let Some(id) = &self.provider_order_id {
            if &order.payment().provider_order_id != id {
                return false;
            }
        }
        if self.unless_paid && order.payment().status == PaymentStatus::Paid {
            return false;
        }
        true
    }
}

/// Payment sub-record changes carried by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentPatch {
    /// `status = PAID`; `paidAt` is set unless already recorded.
    Paid { provider_payment_id: String },
    /// `status = FAILED`, `paidAt = null`.
    Failed { provider_payment_id: Option<String> },
}

/// Fields a transition sets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderPatch {
    pub status: Option<OrderStatus>,
    pub payment: Option<PaymentPatch>,
    pub reset_accounting: bool,
}

/// A patch together with the event that records it.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub patch: OrderPatch,
    pub event: OrderEvent,
}

impl Transition {
    pub fn payment_verified(
        provider_order_id: &str,
        provider_payment_id: &str,
        source: EventSource,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            patch: OrderPatch {
                status: Some(OrderStatus::Paid),
                payment: Some(PaymentPatch::Paid {
                    provider_payment_id: provider_payment_id.to_string(),
                }),
                reset_accounting: true,
            },
            event: OrderEvent::new(
                OrderEventType::PaymentVerified,
                at,
                json!({
                    "providerOrderId": provider_order_id,
                    "providerPaymentId": provider_payment_id,
                    "source": source.as_str(),
                }),
            ),
        }
    }

    pub fn payment_failed(
        provider_order_id: &str,
        provider_payment_id: Option<&str>,
        source: EventSource,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            patch: OrderPatch {
                status: Some(OrderStatus::PaymentPending),
                payment: Some(PaymentPatch::Failed {
                    provider_payment_id: provider_payment_id.map(str::to_string),
                }),
                reset_accounting: false,
            },
            event: OrderEvent::new(
                OrderEventType::PaymentFailed,
                at,
                json!({
                    "providerOrderId": provider_order_id,
                    "providerPaymentId": provider_payment_id,
                    "source": source.as_str(),
                }),
            ),
        }
    }

    /// Operator status change; cancelling is logged as `ORDER_CANCELLED`.
    ///
    /// The event's `from` is filled in by `Order::apply` from the status it
    /// replaces.
    pub fn status_changed(to: OrderStatus, at: DateTime<Utc>) -> Self {
        let event = if to == OrderStatus::Cancelled {
            OrderEvent::new(OrderEventType::OrderCancelled, at, json!({}))
        } else {
            OrderEvent::new(OrderEventType::StatusChanged, at, json!({ "to": to.as_str() }))
        };

        Self {
            patch: OrderPatch {
                status: Some(to),
                ..OrderPatch::default()
            },
            event,
        }
    }
}
