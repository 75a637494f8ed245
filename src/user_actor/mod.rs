//! User rows: identity, role set and watchlist.

mod actions;
pub mod entity;
pub mod error;

pub use actions::*;
pub use error::*;
