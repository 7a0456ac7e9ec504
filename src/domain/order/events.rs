use serde::{Deserialize, Serialize};
use rust_decimal::Decimal;
use chrono::{DateTime, Utc};
use std::fmt;

use super::value_objects::{OrderId, OrderState};

// ============================================================================
// Order Events - Lifecycle signals fanned out to notification channels
// ============================================================================

/// Lifecycle event tag. One per fulfillment stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderEventTag {
    Created,
    PaymentConfirmed,
    ReadyForPickup,
    Shipped,
    Delivered,
}

impl OrderEventTag {
    /// The event announced when an order enters `state`
    pub fn for_state(state: OrderState) -> Self {
        match state {
            OrderState::Pending => OrderEventTag::Created,
            OrderState::PaymentConfirmed => OrderEventTag::PaymentConfirmed,
            OrderState::ReadyForPickup => OrderEventTag::ReadyForPickup,
            OrderState::Shipped => OrderEventTag::Shipped,
            OrderState::Delivered => OrderEventTag::Delivered,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderEventTag::Created => "created",
            OrderEventTag::PaymentConfirmed => "payment_confirmed",
            OrderEventTag::ReadyForPickup => "ready_for_pickup",
            OrderEventTag::Shipped => "shipped",
            OrderEventTag::Delivered => "delivered",
        }
    }
}

impl fmt::Display for OrderEventTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Write intent against an existing order. Both payment paths funnel through here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderTransition {
    Advance(OrderState),
    ConfirmPayment,
}

/// Line as rendered in a notification
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineView {
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

/// Human-readable delivery details resolved from reference data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryDescription {
    pub zone: String,
    pub method: String,
    pub schedule: String,
    pub zone_price: Option<Decimal>,
}

/// Enriched order view: everything both channels need to render a message
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderView {
    pub order_id: OrderId,
    pub order_number: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub state: OrderState,
    pub total: Decimal,
    pub lines: Vec<LineView>,
    pub delivery: Option<DeliveryDescription>,
    pub created_at: DateTime<Utc>,
}

impl OrderView {
    pub fn order_number_for(order_id: OrderId) -> String {
        format!("#{order_id}")
    }
}

/// Ephemeral event handed to the dispatcher. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderEvent {
    pub tag: OrderEventTag,
    pub view: OrderView,
}

impl OrderEvent {
    pub fn new(tag: OrderEventTag, view: OrderView) -> Self {
        Self { tag, view }
    }

    /// Idempotency key for one lifecycle signal of one order
    pub fn dedupe_key(&self) -> String {
        format!("order:{}:{}", self.view.order_id, self.tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_state_maps_to_its_own_tag() {
        let tags: std::collections::HashSet<_> =
            OrderState::ALL.into_iter().map(OrderEventTag::for_state).collect();
        assert_eq!(tags.len(), 5);
        assert_eq!(OrderEventTag::for_state(OrderState::Pending), OrderEventTag::Created);
    }

    #[test]
    fn test_tag_deserializes_from_config_key() {
        let tag: OrderEventTag = serde_json::from_str("\"ready_for_pickup\"").unwrap();
        assert_eq!(tag, OrderEventTag::ReadyForPickup);
    }

    #[test]
    fn test_order_number_format() {
        assert_eq!(OrderView::order_number_for(42), "#42");
    }
}
