use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;

use crate::domain::order::{
    CustomerId, DeliveryRefs, Order, OrderDraft, OrderId, OrderLine, OrderState,
};
use super::StoreError;

// ============================================================================
// Order Store - Repository for Orders and their Lines
// ============================================================================
//
// Responsibilities:
// 1. Insert an order together with all of its lines (all-or-nothing)
// 2. Load orders with lines
// 3. Persist state/payment progress with an optimistic check
// 4. Pass-through administrative delete
//
// ============================================================================

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn create(&self, draft: &OrderDraft) -> Result<Order, StoreError>;

    async fn find(&self, order_id: OrderId) -> Result<Option<Order>, StoreError>;

    async fn list_for_customer(
        &self,
        customer_id: CustomerId,
        state: Option<OrderState>,
    ) -> Result<Vec<Order>, StoreError>;

    /// Persist `next`'s progress fields if the stored row still matches `previous`.
    ///
    /// Returns `false` when another writer got there first.
    async fn update_progress(&self, previous: &Order, next: &Order) -> Result<bool, StoreError>;

    async fn delete(&self, order_id: OrderId) -> Result<bool, StoreError>;
}

#[derive(Debug, FromRow)]
struct OrderRow {
    id: i64,
    customer_id: i64,
    payment_method_id: i64,
    delivery_zone_id: i64,
    delivery_method_id: i64,
    schedule_id: i64,
    total: Decimal,
    state: String,
    payment_confirmed: bool,
    payment_confirmed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct LineRow {
    order_id: i64,
    product_id: i64,
    quantity: i32,
    unit_price: Decimal,
    subtotal: Decimal,
}

impl OrderRow {
    fn into_order(self, lines: Vec<OrderLine>) -> Result<Order, StoreError> {
        let state = self
            .state
            .parse::<OrderState>()
            .map_err(|e| StoreError::Corrupt(format!("order {}: {}", self.id, e)))?;

        Ok(Order {
            id: self.id,
            customer_id: self.customer_id,
            payment_method_id: self.payment_method_id,
            delivery: DeliveryRefs {
                zone_id: self.delivery_zone_id,
                method_id: self.delivery_method_id,
                schedule_id: self.schedule_id,
            },
            total: self.total,
            state,
            payment_confirmed: self.payment_confirmed,
            payment_confirmed_at: self.payment_confirmed_at,
            created_at: self.created_at,
            lines,
        })
    }
}

impl From<LineRow> for OrderLine {
    fn from(row: LineRow) -> Self {
        Self {
            product_id: row.product_id,
            quantity: row.quantity,
            unit_price: row.unit_price,
            subtotal: row.subtotal,
        }
    }
}

const ORDER_COLUMNS: &str = "id, customer_id, payment_method_id, delivery_zone_id, \
     delivery_method_id, schedule_id, total, state, payment_confirmed, \
     payment_confirmed_at, created_at";

pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_lines(&self, order_ids: &[i64]) -> Result<HashMap<i64, Vec<OrderLine>>, StoreError> {
        let rows: Vec<LineRow> = sqlx::query_as(
            "SELECT order_id, product_id, quantity, unit_price, subtotal
             FROM order_lines
             WHERE order_id = ANY($1)
             ORDER BY id ASC",
        )
        .bind(order_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: HashMap<i64, Vec<OrderLine>> = HashMap::new();
        for row in rows {
            grouped.entry(row.order_id).or_default().push(row.into());
        }
        Ok(grouped)
    }

    async fn hydrate(&self, rows: Vec<OrderRow>) -> Result<Vec<Order>, StoreError> {
        let ids: Vec<i64> = rows.iter().map(|row| row.id).collect();
        let mut lines = self.load_lines(&ids).await?;

        rows.into_iter()
            .map(|row| {
                let order_lines = lines.remove(&row.id).unwrap_or_default();
                if order_lines.is_empty() {
                    return Err(StoreError::Corrupt(format!("order {} has no lines", row.id)));
                }
                row.into_order(order_lines)
            })
            .collect()
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn create(&self, draft: &OrderDraft) -> Result<Order, StoreError> {
        // Order row and line rows commit together or not at all
        let mut tx = self.pool.begin().await?;

        let row: OrderRow = sqlx::query_as(&format!(
            "INSERT INTO orders (customer_id, payment_method_id, delivery_zone_id,
                                 delivery_method_id, schedule_id, total, state)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {ORDER_COLUMNS}"
        ))
        .bind(draft.customer_id)
        .bind(draft.payment_method_id)
        .bind(draft.delivery.zone_id)
        .bind(draft.delivery.method_id)
        .bind(draft.delivery.schedule_id)
        .bind(draft.total)
        .bind(OrderState::Pending.as_str())
        .fetch_one(&mut *tx)
        .await?;

        for line in &draft.lines {
            sqlx::query(
                "INSERT INTO order_lines (order_id, product_id, quantity, unit_price, subtotal)
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(row.id)
            .bind(line.product_id)
            .bind(line.quantity)
            .bind(line.unit_price)
            .bind(line.subtotal)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::info!(
            order_id = row.id,
            customer_id = draft.customer_id,
            line_count = draft.lines.len(),
            total = %draft.total,
            "✅ Persisted order with lines"
        );

        row.into_order(draft.lines.clone())
    }

    async fn find(&self, order_id: OrderId) -> Result<Option<Order>, StoreError> {
        let row: Option<OrderRow> =
            sqlx::query_as(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"))
                .bind(order_id)
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list_for_customer(
        &self,
        customer_id: CustomerId,
        state: Option<OrderState>,
    ) -> Result<Vec<Order>, StoreError> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders
             WHERE customer_id = $1 AND ($2::TEXT IS NULL OR state = $2)
             ORDER BY created_at DESC"
        ))
        .bind(customer_id)
        .bind(state.map(OrderState::as_str))
        .fetch_all(&self.pool)
        .await?;

        self.hydrate(rows).await
    }

    async fn update_progress(&self, previous: &Order, next: &Order) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE orders
             SET state = $1, payment_confirmed = $2, payment_confirmed_at = $3
             WHERE id = $4 AND state = $5 AND payment_confirmed = $6",
        )
        .bind(next.state.as_str())
        .bind(next.payment_confirmed)
        .bind(next.payment_confirmed_at)
        .bind(previous.id)
        .bind(previous.state.as_str())
        .bind(previous.payment_confirmed)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete(&self, order_id: OrderId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(order_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }
}
