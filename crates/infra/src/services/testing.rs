//! Shared fixtures for service tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;

use storefront_core::Money;
use storefront_orders::CatalogEntry;
use storefront_payments::{CreateRemoteOrder, GatewayError, PaymentGateway, RemoteOrder};

use crate::storefront::InMemoryStorefront;

/// Catalog with an available bagel at 100.00 and an unavailable muffin.
pub fn bagel_storefront() -> InMemoryStorefront {
    let storefront = InMemoryStorefront::new();
    storefront.upsert_item(CatalogEntry {
        id: "bagel1".parse().unwrap(),
        name: "Bagel".to_string(),
        price: Money::from_minor(10_000),
        is_available: true,
    })
    .unwrap();
    storefront.upsert_item(CatalogEntry {
        id: "muffin".parse().unwrap(),
        name: "Muffin".to_string(),
        price: Money::from_minor(5_000),
        is_available: false,
    })
    .unwrap();
    storefront
}

enum Mode {
    Echo { amount_offset: i64 },
    Fail(GatewayError),
}

/// Records requests and answers like the provider would.
pub struct FakeGateway {
    mode: Mode,
    counter: AtomicU64,
    requests: Mutex<Vec<CreateRemoteOrder>>,
}

impl FakeGateway {
    fn with_mode(mode: Mode) -> Self {
        Self {
            mode,
            counter: AtomicU64::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn echo() -> Self {
        Self::with_mode(Mode::Echo { amount_offset: 0 })
    }

    pub fn with_amount_offset(amount_offset: i64) -> Self {
        Self::with_mode(Mode::Echo { amount_offset })
    }

    pub fn failing(err: GatewayError) -> Self {
        Self::with_mode(Mode::Fail(err))
    }

    pub fn requests(&self) -> Vec<CreateRemoteOrder> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_order(&self, request: &CreateRemoteOrder) -> Result<RemoteOrder, GatewayError> {
        self.requests.lock().unwrap().push(request.clone());
        match &self.mode {
            Mode::Echo { amount_offset } => {
                let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
                Ok(RemoteOrder {
                    id: format!("order_fake{n}"),
                    amount: request.amount + amount_offset,
                    currency: request.currency.clone(),
                    receipt: Some(request.receipt.clone()),
                })
            }
            Mode::Fail(err) => Err(err.clone()),
        }
    }
}
