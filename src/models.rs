use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// Order lifecycle state. `Paid` is terminal; there is no way back to
/// `Created` once a payment has been recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Created,
    Paid,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Created => "created",
            OrderStatus::Paid => "paid",
        }
    }
}

impl TryFrom<&str> for OrderStatus {
    type Error = AppError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "created" => Ok(OrderStatus::Created),
            "paid" => Ok(OrderStatus::Paid),
            other => Err(AppError::Persistence(format!(
                "unknown order status in storage: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub user_name: String,
    pub user_email: String,
    pub user_whatsapp: String,
    pub amount: i64,
    pub status: OrderStatus,
    pub payment_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub id: String,
    pub user_name: String,
    pub user_email: String,
    pub user_whatsapp: String,
    pub amount: i64,
}

/// Append-only audit record written once per successful verification.
#[derive(Debug, Clone)]
pub struct NewPaymentRecord {
    pub order_id: String,
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
    pub amount: i64,
    pub status: OrderStatus,
}

#[derive(Debug, Clone, Queryable)]
pub struct OrderRow {
    pub id: String,
    pub user_name: String,
    pub user_email: String,
    pub user_whatsapp: String,
    pub amount: i64,
    pub status: String,
    pub payment_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::orders)]
pub struct NewOrderRow {
    pub id: String,
    pub user_name: String,
    pub user_email: String,
    pub user_whatsapp: String,
    pub amount: i64,
    pub status: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::payments)]
pub struct NewPaymentRow {
    pub id: Uuid,
    pub order_id: String,
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
    pub amount: i64,
    pub status: String,
}

impl TryFrom<OrderRow> for Order {
    type Error = AppError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status = OrderStatus::try_from(row.status.as_str())?;
        Ok(Order {
            id: row.id,
            user_name: row.user_name,
            user_email: row.user_email,
            user_whatsapp: row.user_whatsapp,
            amount: row.amount,
            status,
            payment_id: row.payment_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl From<NewOrder> for NewOrderRow {
    fn from(order: NewOrder) -> Self {
        NewOrderRow {
            id: order.id,
            user_name: order.user_name,
            user_email: order.user_email,
            user_whatsapp: order.user_whatsapp,
            amount: order.amount,
            status: OrderStatus::Created.as_str().to_string(),
        }
    }
}

impl From<NewPaymentRecord> for NewPaymentRow {
    fn from(record: NewPaymentRecord) -> Self {
        NewPaymentRow {
            id: Uuid::new_v4(),
            order_id: record.order_id,
            razorpay_order_id: record.razorpay_order_id,
            razorpay_payment_id: record.razorpay_payment_id,
            razorpay_signature: record.razorpay_signature,
            amount: record.amount,
            status: record.status.as_str().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_storage_representation() {
        assert_eq!(
            OrderStatus::try_from(OrderStatus::Created.as_str()).unwrap(),
            OrderStatus::Created
        );
        assert_eq!(
            OrderStatus::try_from(OrderStatus::Paid.as_str()).unwrap(),
            OrderStatus::Paid
        );
    }

    #[test]
    fn unknown_status_is_a_storage_error() {
        assert!(matches!(
            OrderStatus::try_from("refunded"),
            Err(AppError::Persistence(_))
        ));
    }
}
