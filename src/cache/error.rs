use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum CacheError {
    #[error("Unknown cache region: {0}")]
    UnknownRegion(String),
    #[error("Cache unavailable: {0}")]
    Unavailable(String),
}
