use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SystemError {
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Actor task failed: {0}")]
    ActorTask(String),
}
