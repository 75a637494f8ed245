use thiserror::Error;

use crate::actor_framework::EntityError;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProductError {
    #[error("Product not found: {0}")]
    NotFound(String),
    #[error("Not enough inventory for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: String,
        requested: u32,
        available: u32,
    },
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(u32),
    #[error("Product validation error: {0}")]
    ValidationError(String),
    #[error("Inventory invariant violated: {0}")]
    InvariantViolation(String),
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl EntityError for ProductError {
    fn not_found(id: String) -> Self {
        ProductError::NotFound(id)
    }

    fn communication(reason: String) -> Self {
        ProductError::ActorCommunicationError(reason)
    }
}
