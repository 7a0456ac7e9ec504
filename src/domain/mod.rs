// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// - order/         - Order entity, state machine, lifecycle events, service
// - collaborators  - Contracts for customer, catalog and delivery lookups
//
// Persistence and notification delivery are reached only through traits.
//
// ============================================================================

pub mod collaborators;
pub mod order;
