use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::error::{AppError, Result};
use crate::gateway::{OrderNotes, PaymentGateway};
use crate::models::{NewOrder, NewPaymentRecord, OrderStatus};
use crate::notifier::Notifier;
use crate::signature;
use crate::store::OrderStore;

#[derive(Clone)]
pub struct ServiceConfig {
    /// Currency the gateway is charged in. Amounts are whole units at this
    /// layer and converted to minor units only when talking to the gateway.
    pub currency: String,
    /// Shared secret used to authenticate payment callbacks.
    pub razorpay_key_secret: String,
    /// Download target included in every outgoing email.
    pub book_link: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub whatsapp: Option<String>,
    pub amount: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyPaymentInput {
    pub razorpay_order_id: Option<String>,
    pub razorpay_payment_id: Option<String>,
    pub razorpay_signature: Option<String>,
    pub order_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SendBookInput {
    pub order_id: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GatewayCheckout {
    pub razorpay_order_id: String,
    pub razorpay_key_id: String,
}

#[derive(Debug, Serialize)]
pub struct CreatedOrder {
    pub order_id: String,
    pub amount: i64,
    pub is_free: bool,
    #[serde(flatten)]
    pub checkout: Option<GatewayCheckout>,
}

#[derive(Debug, Serialize)]
pub struct VerifiedPayment {
    pub payment_id: String,
    pub order_id: String,
}

/// Client-facing order projection. `payment_id` and the whatsapp number are
/// deliberately withheld.
#[derive(Debug, Serialize)]
pub struct OrderSummary {
    pub id: String,
    pub user_name: String,
    pub user_email: String,
    pub amount: i64,
    pub status: OrderStatus,
    pub created_at: chrono::DateTime<Utc>,
}

/// The order lifecycle state machine: free-vs-paid creation, payment
/// verification, and the notifications hanging off both.
pub struct OrderService {
    store: Arc<dyn OrderStore>,
    gateway: Arc<dyn PaymentGateway>,
    notifier: Arc<dyn Notifier>,
    config: ServiceConfig,
}

fn required(value: Option<String>, field: &str) -> Result<String> {
    let value = value
        .ok_or_else(|| AppError::Validation(format!("missing required field: {}", field)))?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{} must not be empty", field)));
    }
    Ok(trimmed.to_string())
}

impl OrderService {
    pub fn new(
        store: Arc<dyn OrderStore>,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn Notifier>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            store,
            gateway,
            notifier,
            config,
        }
    }

    pub async fn create_order(&self, input: CreateOrderInput) -> Result<CreatedOrder> {
        let name = required(input.name, "name")?;
        let email = required(input.email, "email")?;
        let whatsapp = required(input.whatsapp, "whatsapp")?;
        let amount = input
            .amount
            .ok_or_else(|| AppError::Validation("missing required field: amount".to_string()))?;

        if !email.contains('@') || !email.contains('.') {
            return Err(AppError::Validation("invalid email address".to_string()));
        }
        if amount < 0 {
            return Err(AppError::Validation("amount cannot be negative".to_string()));
        }

        if amount == 0 {
            return self.create_free_order(name, email, whatsapp).await;
        }
        self.create_paid_order(name, email, whatsapp, amount).await
    }

    /// Zero-amount orders never touch the gateway; the download email goes
    /// out synchronously right after the insert.
    async fn create_free_order(
        &self,
        name: String,
        email: String,
        whatsapp: String,
    ) -> Result<CreatedOrder> {
        let order_id = format!("FREE-{}", Utc::now().timestamp());

        self.store
            .insert(NewOrder {
                id: order_id.clone(),
                user_name: name.clone(),
                user_email: email.clone(),
                user_whatsapp: whatsapp,
                amount: 0,
            })
            .await?;

        info!(%order_id, "free order created");

        let subject = "Your free book access is ready";
        let body = format!(
            "Hello {},\n\n\
             Thank you for getting your free copy of the book!\n\n\
             Order Details:\n\
             - Order ID: {}\n\
             - Status: Active\n\
             - Access Type: Free",
            name, order_id
        );
        if let Err(e) = self
            .notifier
            .send(&email, subject, &body, Some(&self.config.book_link))
            .await
        {
            warn!(%order_id, "free-access email failed: {}", e);
        }

        Ok(CreatedOrder {
            order_id,
            amount: 0,
            is_free: true,
            checkout: None,
        })
    }

    /// Paid orders are created gateway-first: nothing is persisted locally
    /// until the gateway order exists. A store failure after that leaves a
    /// dangling gateway order, which is accepted and logged.
    async fn create_paid_order(
        &self,
        name: String,
        email: String,
        whatsapp: String,
        amount: i64,
    ) -> Result<CreatedOrder> {
        let amount_minor_units = amount
            .checked_mul(100)
            .ok_or_else(|| AppError::Validation("Amount is too large".to_string()))?;
        let receipt = format!("order-{}", Utc::now().timestamp());
        let notes = OrderNotes {
            user_name: name.clone(),
            user_email: email.clone(),
            user_whatsapp: whatsapp.clone(),
        };

        let gateway_order = self
            .gateway
            .create_order(amount_minor_units, &self.config.currency, &receipt, &notes)
            .await?;
        let order_id = gateway_order.id;

        if let Err(e) = self
            .store
            .insert(NewOrder {
                id: order_id.clone(),
                user_name: name,
                user_email: email,
                user_whatsapp: whatsapp,
                amount,
            })
            .await
        {
            error!(%order_id, "gateway order exists but local persist failed: {}", e);
            return Err(e);
        }

        info!(%order_id, amount, "paid order created");

        Ok(CreatedOrder {
            order_id: order_id.clone(),
            amount,
            is_free: false,
            checkout: Some(GatewayCheckout {
                razorpay_order_id: order_id,
                razorpay_key_id: self.gateway.checkout_key_id().to_string(),
            }),
        })
    }

    pub async fn verify_payment(&self, input: VerifyPaymentInput) -> Result<VerifiedPayment> {
        let razorpay_order_id = required(input.razorpay_order_id, "razorpay_order_id")?;
        let razorpay_payment_id = required(input.razorpay_payment_id, "razorpay_payment_id")?;
        let razorpay_signature = required(input.razorpay_signature, "razorpay_signature")?;
        let order_id = required(input.order_id, "order_id")?;

        if !signature::verify(
            &razorpay_order_id,
            &razorpay_payment_id,
            &razorpay_signature,
            &self.config.razorpay_key_secret,
        ) {
            warn!(%order_id, "payment signature mismatch");
            return Err(AppError::SignatureMismatch);
        }

        self.store
            .update_payment(&order_id, &razorpay_payment_id, OrderStatus::Paid)
            .await?;

        let order = self.store.get(&order_id).await?;

        if let Some(order) = &order {
            self.store
                .record_payment(NewPaymentRecord {
                    order_id: order_id.clone(),
                    razorpay_order_id,
                    razorpay_payment_id: razorpay_payment_id.clone(),
                    razorpay_signature,
                    amount: order.amount,
                    status: OrderStatus::Paid,
                })
                .await?;

            // Confirmation email is fire-and-forget; the caller gets the
            // verification result before delivery completes.
            let notifier = Arc::clone(&self.notifier);
            let recipient = order.user_email.clone();
            let link = self.config.book_link.clone();
            let body = format!(
                "Thank you {} for your purchase!\n\n\
                 Payment Details:\n\
                 - Order ID: {}\n\
                 - Amount: {}\n\
                 - Payment ID: {}\n\
                 - Status: PAID",
                order.user_name, order_id, order.amount, razorpay_payment_id
            );
            let spawned_order_id = order_id.clone();
            tokio::spawn(async move {
                if let Err(e) = notifier
                    .send(&recipient, "Your book is ready", &body, Some(&link))
                    .await
                {
                    error!(order_id = %spawned_order_id, "confirmation email failed: {}", e);
                }
            });
        }

        info!(%order_id, payment_id = %razorpay_payment_id, "payment verified");

        Ok(VerifiedPayment {
            payment_id: razorpay_payment_id,
            order_id,
        })
    }

    pub async fn get_order(&self, order_id: &str) -> Result<OrderSummary> {
        let order = self
            .store
            .get(order_id)
            .await?
            .ok_or_else(|| AppError::NotFound(order_id.to_string()))?;

        Ok(OrderSummary {
            id: order.id,
            user_name: order.user_name,
            user_email: order.user_email,
            amount: order.amount,
            status: order.status,
            created_at: order.created_at,
        })
    }

    pub async fn send_book(&self, input: SendBookInput) -> Result<String> {
        let order_id = required(input.order_id, "order_id")?;
        let email = required(input.email, "email")?;

        let order = self
            .store
            .get(&order_id)
            .await?
            .ok_or_else(|| AppError::NotFound(order_id.clone()))?;

        let subject = "Your book is here";
        let body = format!(
            "Hello {},\n\n\
             Your book is ready to download from the link in this email.\n\n\
             Order Details:\n\
             - Order ID: {}\n\
             - Amount: {}\n\
             - Status: {}",
            order.user_name,
            order_id,
            order.amount,
            order.status.as_str()
        );
        // The caller-supplied address is used as-is, without matching it
        // against the order's registered email.
        if let Err(e) = self
            .notifier
            .send(&email, subject, &body, Some(&self.config.book_link))
            .await
        {
            warn!(%order_id, "send-book email failed: {}", e);
        }

        Ok(order_id)
    }
}
