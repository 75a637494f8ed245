//! Product-specific domain logic, including the inventory ledger actions.

mod actions;
mod dtos;
pub mod entity;
pub mod error;

pub use actions::*;
pub use dtos::*;
pub use error::*;
