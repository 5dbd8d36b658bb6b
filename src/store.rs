use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::{pooled_connection::bb8::Pool, AsyncPgConnection, RunQueryDsl};
use tokio::sync::RwLock;

use crate::error::{AppError, Result};
use crate::models::{NewOrder, NewOrderRow, NewPaymentRecord, NewPaymentRow, Order, OrderRow, OrderStatus};
use crate::schema::{orders, payments};

pub type DbPool = Pool<AsyncPgConnection>;

/// Durable mapping of order id to order record.
///
/// Every call goes straight to storage; there is no cache in front of it.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persists a new order with `status = created` and no payment id.
    /// Fails with [`AppError::Conflict`] when the id already exists.
    async fn insert(&self, order: NewOrder) -> Result<()>;

    /// Sets `payment_id` and `status` in one atomic update and refreshes
    /// `updated_at`. Fails with [`AppError::NotFound`] when the order is
    /// absent.
    async fn update_payment(
        &self,
        order_id: &str,
        payment_id: &str,
        status: OrderStatus,
    ) -> Result<()>;

    /// Point lookup. A missing row is `Ok(None)`, not an error.
    async fn get(&self, order_id: &str) -> Result<Option<Order>>;

    /// Appends to the payments audit table. Replaying the same gateway
    /// payment id is a no-op, so duplicate verification callbacks do not
    /// fail here.
    async fn record_payment(&self, record: NewPaymentRecord) -> Result<()>;
}

#[derive(Clone)]
pub struct PgOrderStore {
    pool: DbPool,
}

impl PgOrderStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn conn(
        &self,
    ) -> Result<diesel_async::pooled_connection::bb8::PooledConnection<'_, AsyncPgConnection>> {
        self.pool
            .get()
            .await
            .map_err(|e| AppError::Persistence(format!("connection pool error: {}", e)))
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn insert(&self, order: NewOrder) -> Result<()> {
        let mut conn = self.conn().await?;
        let row = NewOrderRow::from(order);

        diesel::insert_into(orders::table)
            .values(&row)
            .execute(&mut conn)
            .await?;

        Ok(())
    }

    async fn update_payment(
        &self,
        order_id: &str,
        payment_id: &str,
        status: OrderStatus,
    ) -> Result<()> {
        let mut conn = self.conn().await?;

        let updated = diesel::update(orders::table.filter(orders::id.eq(order_id)))
            .set((
                orders::payment_id.eq(payment_id),
                orders::status.eq(status.as_str()),
                orders::updated_at.eq(diesel::dsl::now),
            ))
            .execute(&mut conn)
            .await?;

        if updated == 0 {
            return Err(AppError::NotFound(order_id.to_string()));
        }
        Ok(())
    }

    async fn get(&self, order_id: &str) -> Result<Option<Order>> {
        let mut conn = self.conn().await?;

        let row = orders::table
            .filter(orders::id.eq(order_id))
            .first::<OrderRow>(&mut conn)
            .await
            .optional()?;

        row.map(Order::try_from).transpose()
    }

    async fn record_payment(&self, record: NewPaymentRecord) -> Result<()> {
        let mut conn = self.conn().await?;
        let row = NewPaymentRow::from(record);

        diesel::insert_into(payments::table)
            .values(&row)
            .on_conflict_do_nothing()
            .execute(&mut conn)
            .await?;

        Ok(())
    }
}

/// Thread-safe in-memory store, for tests and database-less runs.
#[derive(Default, Clone)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<HashMap<String, Order>>>,
    payments: Arc<RwLock<Vec<NewPaymentRecord>>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Audit rows recorded so far, oldest first.
    pub async fn recorded_payments(&self) -> Vec<NewPaymentRecord> {
        self.payments.read().await.clone()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert(&self, order: NewOrder) -> Result<()> {
        let mut orders = self.orders.write().await;
        if orders.contains_key(&order.id) {
            return Err(AppError::Conflict(order.id));
        }
        let now = chrono::Utc::now();
        orders.insert(
            order.id.clone(),
            Order {
                id: order.id,
                user_name: order.user_name,
                user_email: order.user_email,
                user_whatsapp: order.user_whatsapp,
                amount: order.amount,
                status: OrderStatus::Created,
                payment_id: None,
                created_at: now,
                updated_at: now,
            },
        );
        Ok(())
    }

    async fn update_payment(
        &self,
        order_id: &str,
        payment_id: &str,
        status: OrderStatus,
    ) -> Result<()> {
        let mut orders = self.orders.write().await;
        let order = orders
            .get_mut(order_id)
            .ok_or_else(|| AppError::NotFound(order_id.to_string()))?;
        order.payment_id = Some(payment_id.to_string());
        order.status = status;
        order.updated_at = chrono::Utc::now();
        Ok(())
    }

    async fn get(&self, order_id: &str) -> Result<Option<Order>> {
        let orders = self.orders.read().await;
        Ok(orders.get(order_id).cloned())
    }

    async fn record_payment(&self, record: NewPaymentRecord) -> Result<()> {
        let mut payments = self.payments.write().await;
        let replay = payments
            .iter()
            .any(|p| p.razorpay_payment_id == record.razorpay_payment_id);
        if !replay {
            payments.push(record);
        }
        Ok(())
    }
}
