//! Order lifecycle.
//!
//! ```text
//!   PENDING ──place──► PROCESSING ──cancel───► CANCELED  (terminal)
//!                           │
//!                           └──complete──► COMPLETED (terminal)
//! ```
//!
//! `PENDING` only exists for the instant between building an order and
//! persisting it; no stored order is ever `PENDING`.

use crate::domain::OrderStatus;

/// A move the table does not allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionError {
    pub from: OrderStatus,
    pub to: OrderStatus,
}

impl OrderStatus {
    /// Returns `true` if no further transitions are possible.
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Canceled)
    }

    pub fn can_transition_to(self, to: OrderStatus) -> bool {
        matches!(
            (self, to),
            (OrderStatus::Pending, OrderStatus::Processing)
                | (OrderStatus::Processing, OrderStatus::Canceled)
                | (OrderStatus::Processing, OrderStatus::Completed)
        )
    }

    pub fn transition_to(self, to: OrderStatus) -> Result<OrderStatus, TransitionError> {
        if self.can_transition_to(to) {
            Ok(to)
        } else {
            Err(TransitionError { from: self, to })
        }
    }
}
