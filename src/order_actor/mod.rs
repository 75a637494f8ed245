//! Order rows, their lifecycle, and the purchase-time snapshot of lines.

mod actions;
pub mod entity;
pub mod error;
pub mod snapshot;
pub mod state_machine;

pub use actions::*;
pub use error::*;
pub use state_machine::TransitionError;
