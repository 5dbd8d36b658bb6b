#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tokio::sync::Mutex;

use bookpay::error::{AppError, Result};
use bookpay::gateway::{GatewayOrder, OrderNotes, PaymentGateway};
use bookpay::handlers::{OrderService, ServiceConfig};
use bookpay::notifier::Notifier;
use bookpay::store::InMemoryOrderStore;

pub const TEST_SECRET: &str = "test_secret";
pub const TEST_BOOK_LINK: &str = "https://example.com/book/download";

type HmacSha256 = Hmac<Sha256>;

/// Valid gateway signature for the given order/payment pair.
pub fn sign(order_id: &str, payment_id: &str, secret: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(format!("{}|{}", order_id, payment_id).as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

#[derive(Debug, Clone)]
pub struct GatewayCall {
    pub amount_minor_units: i64,
    pub currency: String,
    pub receipt: String,
}

/// Gateway double that hands out a fixed order id and records every call.
pub struct StubGateway {
    order_id: String,
    fail: bool,
    pub calls: Mutex<Vec<GatewayCall>>,
}

impl StubGateway {
    pub fn returning(order_id: &str) -> Self {
        Self {
            order_id: order_id.to_string(),
            fail: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            order_id: String::new(),
            fail: true,
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl PaymentGateway for StubGateway {
    async fn create_order(
        &self,
        amount_minor_units: i64,
        currency: &str,
        receipt: &str,
        _notes: &OrderNotes,
    ) -> Result<GatewayOrder> {
        self.calls.lock().await.push(GatewayCall {
            amount_minor_units,
            currency: currency.to_string(),
            receipt: receipt.to_string(),
        });
        if self.fail {
            return Err(AppError::Gateway("stub gateway is down".to_string()));
        }
        Ok(GatewayOrder {
            id: self.order_id.clone(),
        })
    }

    fn checkout_key_id(&self) -> &str {
        "rzp_test_stub"
    }
}

#[derive(Debug, Clone)]
pub struct SentMail {
    pub recipient: String,
    pub subject: String,
    pub body: String,
    pub resource_link: Option<String>,
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<SentMail>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn messages(&self) -> Vec<SentMail> {
        self.sent.lock().await.clone()
    }

    /// Polls until at least `count` messages have landed. Background sends
    /// run on a spawned task, so arrival time is not deterministic.
    pub async fn wait_for_messages(&self, count: usize) -> Vec<SentMail> {
        for _ in 0..100 {
            let messages = self.messages().await;
            if messages.len() >= count {
                return messages;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        self.messages().await
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
        resource_link: Option<&str>,
    ) -> Result<()> {
        self.sent.lock().await.push(SentMail {
            recipient: recipient.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
            resource_link: resource_link.map(str::to_string),
        });
        Ok(())
    }
}

pub struct TestHarness {
    pub service: Arc<OrderService>,
    pub store: InMemoryOrderStore,
    pub gateway: Arc<StubGateway>,
    pub notifier: Arc<RecordingNotifier>,
}

pub fn harness_with_gateway(gateway: StubGateway) -> TestHarness {
    let store = InMemoryOrderStore::new();
    let gateway = Arc::new(gateway);
    let notifier = Arc::new(RecordingNotifier::new());
    let service = OrderService::new(
        Arc::new(store.clone()),
        Arc::clone(&gateway) as Arc<dyn PaymentGateway>,
        Arc::clone(&notifier) as Arc<dyn Notifier>,
        ServiceConfig {
            currency: "INR".to_string(),
            razorpay_key_secret: TEST_SECRET.to_string(),
            book_link: TEST_BOOK_LINK.to_string(),
        },
    );
    TestHarness {
        service: Arc::new(service),
        store,
        gateway,
        notifier,
    }
}

pub fn harness() -> TestHarness {
    harness_with_gateway(StubGateway::returning("order_abc"))
}
