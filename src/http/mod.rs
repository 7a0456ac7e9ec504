// ============================================================================
// HTTP Surface - actix-web routes for orders and alerts
// ============================================================================
//
// - routes  - Handlers and request/response bodies
// - errors  - Domain error → status code mapping
// - auth    - Caller identification for customer-scoped reads
//
// ============================================================================

mod auth;
mod errors;
mod routes;

pub use auth::{Authenticator, HeaderAuthenticator};
pub use routes::configure;

use std::sync::Arc;

use crate::alerts::LowStockAlerter;
use crate::domain::order::OrderService;

/// Shared handler state, registered as `web::Data<AppState>`
pub struct AppState {
    pub orders: Arc<OrderService>,
    pub alerts: Arc<LowStockAlerter>,
    pub auth: Arc<dyn Authenticator>,
}
