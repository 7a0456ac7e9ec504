use serde::{Deserialize, Serialize};
use rust_decimal::Decimal;
use chrono::{DateTime, Utc};

use super::errors::OrderError;
use super::events::{OrderEventTag, OrderTransition};
use super::state_machine::{OrderStateMachine, Transition};
use super::value_objects::{
    max_amount, CustomerId, DeliveryRefs, NewOrderLine, OrderId, OrderLine, OrderState,
};

// ============================================================================
// Order Entity - Domain Logic
// ============================================================================

/// Creation request, as received from the client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub customer_id: CustomerId,
    pub payment_method_id: i64,
    pub delivery_zone_id: i64,
    pub delivery_method_id: i64,
    pub schedule_id: i64,
    pub lines: Vec<NewOrderLine>,
}

/// Validated and priced order, ready to be persisted as one unit
#[derive(Debug, Clone, PartialEq)]
pub struct OrderDraft {
    pub customer_id: CustomerId,
    pub payment_method_id: i64,
    pub delivery: DeliveryRefs,
    pub lines: Vec<OrderLine>,
    pub total: Decimal,
}

impl OrderDraft {
    pub fn from_request(request: &NewOrder) -> Result<Self, OrderError> {
        Self::validate_lines(&request.lines)?;

        let lines = request
            .lines
            .iter()
            .map(OrderLine::priced)
            .collect::<Result<Vec<_>, _>>()?;

        let total = lines
            .iter()
            .try_fold(Decimal::ZERO, |total, line| total.checked_add(line.subtotal))
            .filter(|total| *total <= max_amount())
            .ok_or(OrderError::TotalOutOfRange)?;

        Ok(Self {
            customer_id: request.customer_id,
            payment_method_id: request.payment_method_id,
            delivery: DeliveryRefs {
                zone_id: request.delivery_zone_id,
                method_id: request.delivery_method_id,
                schedule_id: request.schedule_id,
            },
            lines,
            total,
        })
    }

    fn validate_lines(lines: &[NewOrderLine]) -> Result<(), OrderError> {
        if lines.is_empty() {
            return Err(OrderError::EmptyLines);
        }

        for line in lines {
            if line.quantity <= 0 {
                return Err(OrderError::InvalidQuantity {
                    product_id: line.product_id,
                    quantity: line.quantity,
                });
            }
            if line.unit_price.is_sign_negative() {
                return Err(OrderError::InvalidUnitPrice(line.product_id));
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub customer_id: CustomerId,
    pub payment_method_id: i64,
    pub delivery: DeliveryRefs,
    pub total: Decimal,
    pub state: OrderState,
    pub payment_confirmed: bool,
    pub payment_confirmed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub lines: Vec<OrderLine>,
}

impl Order {
    /// Compute the order that results from `transition`.
    ///
    /// Returns `None` for an accepted no-op (nothing to persist, nothing to announce).
    pub fn apply(
        &self,
        transition: OrderTransition,
        now: DateTime<Utc>,
    ) -> Result<Option<(Order, OrderEventTag)>, OrderError> {
        match transition {
            OrderTransition::Advance(requested) => {
                match OrderStateMachine::check(self.state, requested)? {
                    Transition::NoOp(_) => Ok(None),
                    Transition::Advance { to, .. } => {
                        let mut next = self.clone();
                        next.state = to;
                        if to.is_paid_stage() && !next.payment_confirmed {
                            next.payment_confirmed = true;
                            next.payment_confirmed_at = Some(now);
                        }
                        Ok(Some((next, OrderEventTag::for_state(to))))
                    }
                }
            }

            OrderTransition::ConfirmPayment => {
                if self.payment_confirmed {
                    return Ok(None);
                }

                let mut next = self.clone();
                next.payment_confirmed = true;
                next.payment_confirmed_at = Some(now);
                if next.state == OrderState::Pending {
                    next.state = OrderState::PaymentConfirmed;
                }
                Ok(Some((next, OrderEventTag::PaymentConfirmed)))
            }
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn line(product_id: i64, quantity: i32, cents: i64) -> NewOrderLine {
        NewOrderLine {
            product_id,
            quantity,
            unit_price: Decimal::new(cents, 2),
        }
    }

    fn request(lines: Vec<NewOrderLine>) -> NewOrder {
        NewOrder {
            customer_id: 1,
            payment_method_id: 2,
            delivery_zone_id: 3,
            delivery_method_id: 4,
            schedule_id: 5,
            lines,
        }
    }

    fn order_in(state: OrderState, payment_confirmed: bool) -> Order {
        let draft = OrderDraft::from_request(&request(vec![line(1, 1, 500)])).unwrap();
        Order {
            id: 42,
            customer_id: draft.customer_id,
            payment_method_id: draft.payment_method_id,
            delivery: draft.delivery,
            total: draft.total,
            state,
            payment_confirmed,
            payment_confirmed_at: None,
            created_at: Utc::now(),
            lines: draft.lines,
        }
    }

    #[test]
    fn test_total_is_sum_of_subtotals() {
        let draft = OrderDraft::from_request(&request(vec![line(1, 2, 1000), line(2, 1, 500)])).unwrap();
        assert_eq!(draft.total, Decimal::new(2500, 2));
        assert_eq!(draft.lines.len(), 2);
        assert_eq!(draft.delivery.schedule_id, 5);
    }

    #[test]
    fn test_empty_lines_rejected() {
        let result = OrderDraft::from_request(&request(vec![]));
        assert!(matches!(result, Err(OrderError::EmptyLines)));
    }

    #[test]
    fn test_non_positive_quantity_rejected() {
        let result = OrderDraft::from_request(&request(vec![line(1, 2, 100), line(9, 0, 100)]));
        assert!(matches!(
            result,
            Err(OrderError::InvalidQuantity { product_id: 9, quantity: 0 })
        ));
    }

    #[test]
    fn test_total_beyond_storable_amount_rejected() {
        let near_limit = NewOrderLine {
            product_id: 4,
            quantity: 1,
            unit_price: max_amount(),
        };
        let result = OrderDraft::from_request(&request(vec![near_limit.clone(), near_limit]));
        assert!(matches!(result, Err(OrderError::TotalOutOfRange)));
    }

    #[test]
    fn test_overflowing_price_is_a_validation_error() {
        let huge = NewOrderLine {
            product_id: 6,
            quantity: 3,
            unit_price: "50000000000000000000000000000".parse().unwrap(),
        };
        let error = OrderDraft::from_request(&request(vec![huge])).unwrap_err();
        assert!(error.is_validation());
    }

    #[test]
    fn test_negative_price_rejected() {
        let result = OrderDraft::from_request(&request(vec![line(3, 1, -100)]));
        assert!(matches!(result, Err(OrderError::InvalidUnitPrice(3))));
    }

    #[test]
    fn test_advance_to_paid_stage_sets_payment_flag() {
        let now = Utc::now();
        let (next, tag) = order_in(OrderState::Pending, false)
            .apply(OrderTransition::Advance(OrderState::Shipped), now)
            .unwrap()
            .unwrap();

        assert_eq!(next.state, OrderState::Shipped);
        assert!(next.payment_confirmed);
        assert_eq!(next.payment_confirmed_at, Some(now));
        assert_eq!(tag, OrderEventTag::Shipped);
    }

    #[test]
    fn test_reapplying_current_state_is_noop() {
        let result = order_in(OrderState::Shipped, true)
            .apply(OrderTransition::Advance(OrderState::Shipped), Utc::now())
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_backward_advance_fails() {
        let result = order_in(OrderState::Delivered, true)
            .apply(OrderTransition::Advance(OrderState::Pending), Utc::now());
        assert!(matches!(result, Err(OrderError::InvalidTransition { .. })));
    }

    #[test]
    fn test_confirm_payment_advances_pending_order() {
        let (next, tag) = order_in(OrderState::Pending, false)
            .apply(OrderTransition::ConfirmPayment, Utc::now())
            .unwrap()
            .unwrap();

        assert!(next.payment_confirmed);
        assert_eq!(next.state, OrderState::PaymentConfirmed);
        assert_eq!(tag, OrderEventTag::PaymentConfirmed);
    }

    #[test]
    fn test_confirm_payment_keeps_later_state() {
        let (next, _) = order_in(OrderState::ReadyForPickup, false)
            .apply(OrderTransition::ConfirmPayment, Utc::now())
            .unwrap()
            .unwrap();
        assert_eq!(next.state, OrderState::ReadyForPickup);
    }

    #[test]
    fn test_confirm_payment_twice_is_noop() {
        let result = order_in(OrderState::PaymentConfirmed, true)
            .apply(OrderTransition::ConfirmPayment, Utc::now())
            .unwrap();
        assert!(result.is_none());
    }
}
