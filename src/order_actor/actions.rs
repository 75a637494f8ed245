use crate::domain::{Order, OrderStatus};

#[derive(Debug, Clone)]
pub enum OrderAction {
    /// Moves the order to a new status if the state machine allows it.
    Transition(OrderStatus),
}

#[derive(Debug, Clone)]
pub enum OrderActionResult {
    /// The order after the transition
    Transitioned(Order),
}
