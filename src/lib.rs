//! # Supermart
//!
//! Order management for a small online store, built from actors.
//!
//! - **Tables** - every table is a [`actor_framework::ResourceActor`] that owns its
//!   rows and applies one request at a time → users, products, orders
//! - **Inventory ledger** - stock only moves through debit and credit actions on
//!   the product actor → [`clients::ProductClient`]
//! - **Orders** - placement, cancellation and completion, with purchase-time
//!   line snapshots and a status state machine → [`clients::OrderClient`]
//! - **Catalog** - cached product views, rankings, purchase history and
//!   watchlists → [`clients::CatalogClient`]
//! - **Cache** - regions with TTLs, read-through loading and declarative
//!   invalidation after commit → [`cache`]
//! - **System** - startup, configuration, tracing and shutdown → [`app_system`]
//!
//! ```no_run
//! use supermart::app_system::OrderSystem;
//! use supermart::domain::{OrderItemRequest, Principal, Role, UserCreate};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let system = OrderSystem::new();
//! let user = system
//!     .user_client
//!     .create_user(UserCreate::new("alice", "alice@example.com", [Role::User]))
//!     .await?;
//! let order = system
//!     .order_client
//!     .place_order(&Principal::from(&user), vec![OrderItemRequest::new("product_1", 2)])
//!     .await?;
//! println!("{} {}", order.id, order.total_amount());
//! system.shutdown().await?;
//! # Ok(())
//! # }
//! ```

pub mod actor_framework;
pub mod app_system;
pub mod cache;
pub mod clients;
pub mod domain;
pub mod error;
pub mod order_actor;
pub mod product_actor;
pub mod user_actor;

#[cfg(test)]
mod mock_framework;
