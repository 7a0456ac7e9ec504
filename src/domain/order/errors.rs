use crate::store::StoreError;
use super::value_objects::{CustomerId, OrderId, OrderState, ProductId};

// ============================================================================
// Order Business Rule Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Order must contain at least one line")]
    EmptyLines,

    #[error("Invalid quantity {quantity} for product {product_id}")]
    InvalidQuantity { product_id: ProductId, quantity: i32 },

    #[error("Invalid unit price for product {0}")]
    InvalidUnitPrice(ProductId),

    #[error("Order total exceeds the largest storable amount")]
    TotalOutOfRange,

    #[error("Unknown order state: {0}")]
    UnknownState(String),

    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    #[error("Customer not found: {0}")]
    CustomerNotFound(CustomerId),

    #[error("Cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderState, to: OrderState },

    #[error("Order {0} was modified concurrently")]
    ConcurrentModification(OrderId),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl OrderError {
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            OrderError::EmptyLines
                | OrderError::InvalidQuantity { .. }
                | OrderError::InvalidUnitPrice(_)
                | OrderError::TotalOutOfRange
                | OrderError::UnknownState(_)
        )
    }
}
