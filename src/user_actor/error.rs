use thiserror::Error;

use crate::actor_framework::EntityError;

/// Errors that can occur during user operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum UserError {
    #[error("User not found: {0}")]
    NotFound(String),
    #[error("User validation error: {0}")]
    ValidationError(String),
    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl EntityError for UserError {
    fn not_found(id: String) -> Self {
        UserError::NotFound(id)
    }

    fn communication(reason: String) -> Self {
        UserError::ActorCommunicationError(reason)
    }
}
