use thiserror::Error;

use crate::actor_framework::EntityError;
use crate::domain::OrderStatus;

/// Errors that can occur during order operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum OrderEntityError {
    #[error("Order not found: {0}")]
    NotFound(String),
    #[error("Cannot change order {order_id} from {from} to {to}")]
    IllegalTransition {
        order_id: String,
        from: OrderStatus,
        to: OrderStatus,
    },
    #[error("Order validation error: {0}")]
    ValidationError(String),
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl EntityError for OrderEntityError {
    fn not_found(id: String) -> Self {
        OrderEntityError::NotFound(id)
    }

    fn communication(reason: String) -> Self {
        OrderEntityError::ActorCommunicationError(reason)
    }
}
