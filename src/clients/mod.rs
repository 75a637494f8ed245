//! Typed handles over the actors, and the orchestrating clients built on them.

#[macro_use]
mod macros;

pub mod catalog_client;
pub mod order_client;
pub mod product_client;
pub mod user_client;

pub use catalog_client::CatalogClient;
pub use order_client::OrderClient;
pub use product_client::ProductClient;
pub use user_client::UserClient;
