// ============================================================================
// Alerts - duplicate-suppressed operational signals
// ============================================================================
//
// - cooldown   - CooldownStore contract, in-memory and Redis stores, tracker
// - low_stock  - Low-stock email alerts sharing the email transport
//
// ============================================================================

pub mod cooldown;
pub mod low_stock;

pub use cooldown::{AlertCooldownTracker, CooldownStore, InMemoryCooldownStore, RedisCooldownStore};
pub use low_stock::{AlertError, LowStockAlerter, LowStockSignal};
