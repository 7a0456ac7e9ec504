use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};

use crate::domain::collaborators::{
    CustomerContact, CustomerDirectory, DeliveryReferenceData, ProductCatalog,
};
use crate::domain::order::{CustomerId, DeliveryDescription, DeliveryRefs, ProductId};
use super::StoreError;

// ============================================================================
// Reference Data - read-only views over tables owned by other services
// ============================================================================

pub struct PgReferenceData {
    pool: PgPool,
}

impl PgReferenceData {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct CustomerRow {
    name: String,
    email: String,
    phone: Option<String>,
}

#[derive(Debug, FromRow)]
struct DeliveryRow {
    zone: String,
    zone_price: Option<Decimal>,
    method: String,
    schedule: String,
}

#[async_trait]
impl CustomerDirectory for PgReferenceData {
    async fn lookup(&self, customer_id: CustomerId) -> Result<Option<CustomerContact>, StoreError> {
        let row: Option<CustomerRow> =
            sqlx::query_as("SELECT name, email, phone FROM customers WHERE id = $1")
                .bind(customer_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|row| CustomerContact {
            name: row.name,
            email: row.email,
            phone: row.phone,
        }))
    }
}

#[async_trait]
impl ProductCatalog for PgReferenceData {
    async fn lookup(&self, product_id: ProductId) -> Result<Option<String>, StoreError> {
        let name: Option<(String,)> = sqlx::query_as("SELECT name FROM products WHERE id = $1")
            .bind(product_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(name.map(|(name,)| name))
    }
}

#[async_trait]
impl DeliveryReferenceData for PgReferenceData {
    async fn describe(&self, refs: DeliveryRefs) -> Result<Option<DeliveryDescription>, StoreError> {
        let row: Option<DeliveryRow> = sqlx::query_as(
            "SELECT z.name AS zone, z.price AS zone_price, m.name AS method, s.description AS schedule
             FROM delivery_zones z, delivery_methods m, delivery_schedules s
             WHERE z.id = $1 AND m.id = $2 AND s.id = $3",
        )
        .bind(refs.zone_id)
        .bind(refs.method_id)
        .bind(refs.schedule_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| DeliveryDescription {
            zone: row.zone,
            method: row.method,
            schedule: row.schedule,
            zone_price: row.zone_price,
        }))
    }
}
