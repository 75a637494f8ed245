use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::{SystemConfig, SystemError};
use crate::actor_framework::ResourceActor;
use crate::cache::{CacheActor, CacheClient, CacheCoordinator};
use crate::clients::{CatalogClient, OrderClient, ProductClient, UserClient};
use crate::domain::{Order, Product, User};

/// Id generator producing `<prefix>_1`, `<prefix>_2`, ...
fn sequential_ids(prefix: &'static str) -> impl Fn() -> String + Send + Sync + 'static {
    let counter = Arc::new(AtomicU64::new(1));
    move || {
        let id = counter.fetch_add(1, Ordering::SeqCst);
        format!("{}_{}", prefix, id)
    }
}

/// The main application system that orchestrates all actors.
///
/// Responsible for starting up actors, wiring them together, and handling shutdown.
pub struct OrderSystem {
    pub order_client: OrderClient,
    pub catalog_client: CatalogClient,
    pub user_client: UserClient,
    pub product_client: ProductClient,
    pub cache_client: CacheClient,
    handles: Vec<JoinHandle<()>>,
    warmup: Option<JoinHandle<()>>,
}

impl Default for OrderSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderSystem {
    pub fn new() -> Self {
        Self::with_config(SystemConfig::default())
    }

    /// Starts every actor. Must be called inside a tokio runtime.
    pub fn with_config(config: SystemConfig) -> Self {
        info!(buffer_size = config.buffer_size, "Starting order system");

        // 1. Tables
        let (user_actor, user_resource_client) =
            ResourceActor::<User>::new(config.buffer_size, sequential_ids("user"));
        let user_client = UserClient::new(user_resource_client);
        let user_handle = tokio::spawn(user_actor.run());

        let (product_actor, product_resource_client) =
            ResourceActor::<Product>::new(config.buffer_size, sequential_ids("product"));
        let product_client = ProductClient::new(product_resource_client);
        let product_handle = tokio::spawn(product_actor.run());

        let (order_actor, order_resource_client) =
            ResourceActor::<Order>::new(config.buffer_size, sequential_ids("order"));
        let order_handle = tokio::spawn(order_actor.run());

        // 2. Cache and its coordinator
        let (cache_actor, cache_client) = CacheActor::new(&config.cache, config.buffer_size);
        let cache_handle = tokio::spawn(cache_actor.run());
        let coordinator = CacheCoordinator::new(Arc::new(cache_client.clone()));

        // 3. Orchestrators
        let order_client = OrderClient::new(
            order_resource_client,
            user_client.clone(),
            product_client.clone(),
            cache_client.clone(),
            coordinator.clone(),
        );
        let catalog_client = CatalogClient::new(
            product_client.clone(),
            user_client.clone(),
            order_client.clone(),
            cache_client.clone(),
            coordinator,
        );

        let warmup = config.warmup_on_start.then(|| catalog_client.warmup());

        Self {
            order_client,
            catalog_client,
            user_client,
            product_client,
            cache_client,
            handles: vec![user_handle, product_handle, order_handle, cache_handle],
            warmup,
        }
    }

    /// Stops every actor and waits for them to finish.
    pub async fn shutdown(self) -> Result<(), SystemError> {
        info!("Shutting down system...");

        if let Some(warmup) = self.warmup {
            if let Err(e) = warmup.await {
                warn!("Warmup task failed: {:?}", e);
            }
        }

        if let Err(e) = self.order_client.shutdown().await {
            warn!(error = %e, "Order actor already stopped");
        }
        if let Err(e) = self.user_client.shutdown().await {
            warn!(error = %e, "User actor already stopped");
        }
        if let Err(e) = self.product_client.shutdown().await {
            warn!(error = %e, "Product actor already stopped");
        }
        if let Err(e) = self.cache_client.shutdown().await {
            warn!(error = %e, "Cache actor already stopped");
        }

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Actor task failed: {:?}", e);
                return Err(SystemError::ActorTask(format!("{:?}", e)));
            }
        }

        info!("System shutdown complete.");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_system_starts_and_stops() {
        let system = OrderSystem::default();
        assert!(system.user_client.list_users().await.unwrap().is_empty());
        system.shutdown().await.unwrap();
    }
}
