// ============================================================================
// Order Domain - Business Logic for the Order Entity
// ============================================================================
//
// This module contains ALL Order-specific code:
// - Value objects (OrderState, OrderLine, DeliveryRefs)
// - State machine (forward-only fulfillment progression)
// - Events (OrderEventTag, OrderView, OrderEvent)
// - Errors (OrderError enum)
// - Aggregate (Order, OrderDraft)
// - Service (OrderService orchestrating store, collaborators and notifications)
//
// ============================================================================

pub mod value_objects;
pub mod state_machine;
pub mod events;
pub mod errors;
pub mod aggregate;
pub mod service;

// Re-export for convenience
pub use value_objects::*;
pub use events::*;
pub use errors::*;
pub use aggregate::*;
pub use service::*;
