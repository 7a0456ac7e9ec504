use super::errors::OrderError;
use super::value_objects::OrderState;

// ============================================================================
// Order State Machine
// ============================================================================
//
// Pending → PaymentConfirmed → ReadyForPickup → Shipped → Delivered
//
// Any forward jump is legal, re-applying the current state is accepted as a
// no-op, and moving backwards is rejected.
//
// ============================================================================

/// Outcome of an accepted transition request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Advance { from: OrderState, to: OrderState },
    NoOp(OrderState),
}

pub struct OrderStateMachine;

impl OrderStateMachine {
    pub fn can_transition(current: OrderState, requested: OrderState) -> bool {
        requested.index() >= current.index()
    }

    pub fn check(current: OrderState, requested: OrderState) -> Result<Transition, OrderError> {
        if !Self::can_transition(current, requested) {
            return Err(OrderError::InvalidTransition {
                from: current,
                to: requested,
            });
        }

        if current == requested {
            Ok(Transition::NoOp(current))
        } else {
            Ok(Transition::Advance {
                from: current,
                to: requested,
            })
        }
    }
}
