// ============================================================================
// Storage Layer
// ============================================================================
//
// - order_store    - OrderStore contract + PostgreSQL implementation
// - reference_data - Read-only lookups against directory/catalog tables
//
// ============================================================================

mod order_store;
mod reference_data;

pub use order_store::{OrderStore, PgOrderStore};
pub use reference_data::PgReferenceData;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Corrupt row: {0}")]
    Corrupt(String),
}

/// Apply embedded schema migrations
pub async fn migrate(pool: &sqlx::PgPool) -> Result<(), StoreError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Database migrations applied");
    Ok(())
}
