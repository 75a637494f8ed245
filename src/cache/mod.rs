//! Cached read views and the rules for invalidating them.
//!
//! The cache is an actor like every table. Reads go through
//! [`CacheClient::read_through`]; writes never touch the cache directly but
//! report a [`Mutation`] to the [`CacheCoordinator`] once they have committed.

pub mod coordinator;
pub mod error;
pub mod keys;
pub mod region;
pub mod store;
pub mod value;

pub use coordinator::*;
pub use error::*;
pub use region::*;
pub use store::*;
pub use value::*;
