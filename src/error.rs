//! Errors surfaced at the service boundary.
//!
//! Actor-level errors (`ProductError`, `OrderEntityError`, `UserError`) are
//! raised where they are detected and converted here unchanged in meaning.
//! `status_code` gives the HTTP status an outer layer would answer with.

use thiserror::Error;

use crate::cache::CacheError;
use crate::domain::OrderStatus;
use crate::order_actor::OrderEntityError;
use crate::product_actor::ProductError;
use crate::user_actor::UserError;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum OrderError {
    #[error("Not enough inventory for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: String,
        requested: u32,
        available: u32,
    },
    #[error("Product not found: {0}")]
    ProductNotFound(String),
    #[error("Order not found: {0}")]
    OrderNotFound(String),
    #[error("User not found: {0}")]
    UserNotFound(String),
    #[error("Cannot change order {order_id} from {from} to {to}")]
    IllegalTransition {
        order_id: String,
        from: OrderStatus,
        to: OrderStatus,
    },
    #[error("Access denied: {0}")]
    AccessDenied(String),
    #[error("Invariant violated: {0}")]
    InvariantViolation(String),
    #[error("Order validation error: {0}")]
    ValidationError(String),
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl OrderError {
    pub fn status_code(&self) -> u16 {
        match self {
            OrderError::InsufficientStock { .. }
            | OrderError::IllegalTransition { .. }
            | OrderError::ValidationError(_) => 400,
            OrderError::UserNotFound(_) => 401,
            OrderError::AccessDenied(_) => 403,
            OrderError::ProductNotFound(_) | OrderError::OrderNotFound(_) => 404,
            OrderError::InvariantViolation(_) | OrderError::ActorCommunicationError(_) => 500,
        }
    }
}

impl From<ProductError> for OrderError {
    fn from(e: ProductError) -> Self {
        match e {
            ProductError::NotFound(id) => OrderError::ProductNotFound(id),
            ProductError::InsufficientStock { product_id, requested, available } => {
                OrderError::InsufficientStock { product_id, requested, available }
            }
            ProductError::InvalidQuantity(q) => {
                OrderError::ValidationError(format!("Invalid quantity: {q}"))
            }
            ProductError::ValidationError(msg) => OrderError::ValidationError(msg),
            ProductError::InvariantViolation(msg) => OrderError::InvariantViolation(msg),
            ProductError::ActorCommunicationError(msg) => OrderError::ActorCommunicationError(msg),
        }
    }
}

impl From<OrderEntityError> for OrderError {
    fn from(e: OrderEntityError) -> Self {
        match e {
            OrderEntityError::NotFound(id) => OrderError::OrderNotFound(id),
            OrderEntityError::IllegalTransition { order_id, from, to } => {
                OrderError::IllegalTransition { order_id, from, to }
            }
            OrderEntityError::ValidationError(msg) => OrderError::ValidationError(msg),
            OrderEntityError::ActorCommunicationError(msg) => {
                OrderError::ActorCommunicationError(msg)
            }
        }
    }
}

impl From<UserError> for OrderError {
    fn from(e: UserError) -> Self {
        match e {
            UserError::NotFound(id) => OrderError::UserNotFound(id),
            UserError::ValidationError(msg) => OrderError::ValidationError(msg),
            UserError::ActorCommunicationError(msg) => OrderError::ActorCommunicationError(msg),
        }
    }
}

/// Errors from catalog reads, product administration and watchlists.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CatalogError {
    #[error("Product not found: {0}")]
    ProductNotFound(String),
    #[error("User not found: {0}")]
    UserNotFound(String),
    #[error("Access denied: {0}")]
    AccessDenied(String),
    #[error("Product validation error: {0}")]
    ValidationError(String),
    #[error("Invariant violated: {0}")]
    InvariantViolation(String),
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl CatalogError {
    pub fn status_code(&self) -> u16 {
        match self {
            CatalogError::ValidationError(_) | CatalogError::Cache(CacheError::UnknownRegion(_)) => 400,
            CatalogError::UserNotFound(_) => 401,
            CatalogError::AccessDenied(_) => 403,
            CatalogError::ProductNotFound(_) => 404,
            CatalogError::InvariantViolation(_)
            | CatalogError::Cache(CacheError::Unavailable(_))
            | CatalogError::ActorCommunicationError(_) => 500,
        }
    }
}

impl From<ProductError> for CatalogError {
    fn from(e: ProductError) -> Self {
        match e {
            ProductError::NotFound(id) => CatalogError::ProductNotFound(id),
            ProductError::ValidationError(msg) => CatalogError::ValidationError(msg),
            ProductError::InvalidQuantity(q) => {
                CatalogError::ValidationError(format!("Invalid quantity: {q}"))
            }
            ProductError::InsufficientStock { product_id, .. } => CatalogError::ValidationError(
                format!("Stock movement rejected for product {product_id}"),
            ),
            ProductError::InvariantViolation(msg) => CatalogError::InvariantViolation(msg),
            ProductError::ActorCommunicationError(msg) => {
                CatalogError::ActorCommunicationError(msg)
            }
        }
    }
}

impl From<UserError> for CatalogError {
    fn from(e: UserError) -> Self {
        match e {
            UserError::NotFound(id) => CatalogError::UserNotFound(id),
            UserError::ValidationError(msg) => CatalogError::ValidationError(msg),
            UserError::ActorCommunicationError(msg) => CatalogError::ActorCommunicationError(msg),
        }
    }
}

impl From<OrderEntityError> for CatalogError {
    fn from(e: OrderEntityError) -> Self {
        match e {
            OrderEntityError::ActorCommunicationError(msg) => {
                CatalogError::ActorCommunicationError(msg)
            }
            other => CatalogError::InvariantViolation(other.to_string()),
        }
    }
}
