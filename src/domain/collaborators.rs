use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::order::{CustomerId, DeliveryDescription, DeliveryRefs, ProductId};
use crate::store::StoreError;

// ============================================================================
// External Collaborators
// ============================================================================
//
// Customer directory, product catalog and delivery reference data are owned
// by other services. The order core only consumes these contracts.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerContact {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

#[async_trait]
pub trait CustomerDirectory: Send + Sync {
    async fn lookup(&self, customer_id: CustomerId) -> Result<Option<CustomerContact>, StoreError>;
}

#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Display name of a product
    async fn lookup(&self, product_id: ProductId) -> Result<Option<String>, StoreError>;
}

#[async_trait]
pub trait DeliveryReferenceData: Send + Sync {
    async fn describe(&self, refs: DeliveryRefs) -> Result<Option<DeliveryDescription>, StoreError>;
}
