// ============================================================================
// Actors Module
// ============================================================================
//
// Actors are reserved for infrastructure concerns. Domain logic lives in
// OrderService; the notification actor only moves dispatch off the request
// path.
//
// ============================================================================

mod notification_actor;

pub use notification_actor::NotificationActor;
