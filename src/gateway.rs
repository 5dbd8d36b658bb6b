use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Buyer details forwarded to the gateway as order notes.
#[derive(Debug, Clone, Serialize)]
pub struct OrderNotes {
    pub user_name: String,
    pub user_email: String,
    pub user_whatsapp: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
}

/// External payment processor, consumed through its order-creation call
/// only. Failures propagate as [`AppError::Gateway`]; no retries here.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_order(
        &self,
        amount_minor_units: i64,
        currency: &str,
        receipt: &str,
        notes: &OrderNotes,
    ) -> Result<GatewayOrder>;

    /// Public key id the frontend needs to render the checkout widget.
    fn checkout_key_id(&self) -> &str;
}

pub struct RazorpayGateway {
    client: reqwest::Client,
    base_url: String,
    key_id: String,
    key_secret: String,
}

#[derive(Serialize)]
struct CreateOrderBody<'a> {
    amount: i64,
    currency: &'a str,
    receipt: &'a str,
    notes: &'a OrderNotes,
}

impl RazorpayGateway {
    const DEFAULT_BASE_URL: &'static str = "https://api.razorpay.com";

    pub fn new(key_id: String, key_secret: String) -> Self {
        Self::with_base_url(Self::DEFAULT_BASE_URL.to_string(), key_id, key_secret)
    }

    pub fn with_base_url(base_url: String, key_id: String, key_secret: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("reqwest client construction cannot fail with static options");
        Self {
            client,
            base_url,
            key_id,
            key_secret,
        }
    }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    async fn create_order(
        &self,
        amount_minor_units: i64,
        currency: &str,
        receipt: &str,
        notes: &OrderNotes,
    ) -> Result<GatewayOrder> {
        let url = format!("{}/v1/orders", self.base_url);
        let body = CreateOrderBody {
            amount: amount_minor_units,
            currency,
            receipt,
            notes,
        };

        let response = self
            .client
            .post(url)
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Gateway(format!("order creation request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::Gateway(format!(
                "order creation rejected ({}): {}",
                status,
                detail.trim()
            )));
        }

        response
            .json::<GatewayOrder>()
            .await
            .map_err(|e| AppError::Gateway(format!("unreadable gateway response: {}", e)))
    }

    fn checkout_key_id(&self) -> &str {
        &self.key_id
    }
}
