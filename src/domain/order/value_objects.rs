use serde::{Deserialize, Serialize};
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;

use super::errors::OrderError;

// ============================================================================
// Order Value Objects
// ============================================================================

pub type OrderId = i64;
pub type CustomerId = i64;
pub type ProductId = i64;

/// Fulfillment stage of an order, in strict forward order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderState {
    Pending,
    PaymentConfirmed,
    ReadyForPickup,
    Shipped,
    Delivered,
}

impl OrderState {
    pub const ALL: [OrderState; 5] = [
        OrderState::Pending,
        OrderState::PaymentConfirmed,
        OrderState::ReadyForPickup,
        OrderState::Shipped,
        OrderState::Delivered,
    ];

    /// Position in the fulfillment sequence
    pub fn index(self) -> usize {
        match self {
            OrderState::Pending => 0,
            OrderState::PaymentConfirmed => 1,
            OrderState::ReadyForPickup => 2,
            OrderState::Shipped => 3,
            OrderState::Delivered => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderState::Pending => "pending",
            OrderState::PaymentConfirmed => "payment_confirmed",
            OrderState::ReadyForPickup => "ready_for_pickup",
            OrderState::Shipped => "shipped",
            OrderState::Delivered => "delivered",
        }
    }

    pub fn is_paid_stage(self) -> bool {
        self.index() >= OrderState::PaymentConfirmed.index()
    }
}

impl fmt::Display for OrderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderState {
    type Err = OrderError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        OrderState::ALL
            .into_iter()
            .find(|state| state.as_str() == value)
            .ok_or_else(|| OrderError::UnknownState(value.to_string()))
    }
}

/// A line as submitted by the client, before pricing is fixed
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderLine {
    pub product_id: ProductId,
    pub quantity: i32,
    pub unit_price: Decimal,
}

/// Persisted line item. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

impl OrderLine {
    /// Fix the line's price. Fails when the unit price or subtotal does not fit a stored amount.
    pub fn priced(line: &NewOrderLine) -> Result<Self, OrderError> {
        let unit_price = round_money(line.unit_price);
        let subtotal = unit_price
            .checked_mul(Decimal::from(line.quantity))
            .map(round_money)
            .filter(|subtotal| unit_price <= max_amount() && *subtotal <= max_amount())
            .ok_or(OrderError::InvalidUnitPrice(line.product_id))?;

        Ok(Self {
            product_id: line.product_id,
            quantity: line.quantity,
            unit_price,
            subtotal,
        })
    }
}

/// Opaque delivery references, resolved for display by the reference-data collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryRefs {
    pub zone_id: i64,
    pub method_id: i64,
    pub schedule_id: i64,
}

/// Currency minor-unit precision
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp(2)
}

/// Largest amount the NUMERIC(12, 2) money columns hold
pub fn max_amount() -> Decimal {
    Decimal::new(999_999_999_999, 2)
}

// ============================================================================
// Unit Tests
// ============================================================================
