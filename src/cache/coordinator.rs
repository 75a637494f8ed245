use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, instrument};

use super::keys;
use super::{CacheClient, CacheError, CacheRegion};

/// One thing to drop from the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invalidation {
    /// Every entry in the region.
    Region(CacheRegion),
    Key(CacheRegion, String),
    /// Every entry whose key starts with the prefix.
    Prefix(CacheRegion, String),
}

/// A committed write, described in terms of the views it makes stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    PlaceOrder { user_id: String },
    CancelOrder,
    CompleteOrder,
    ProductChanged,
}

impl Mutation {
    pub fn name(&self) -> &'static str {
        match self {
            Mutation::PlaceOrder { .. } => "place_order",
            Mutation::CancelOrder => "cancel_order",
            Mutation::CompleteOrder => "complete_order",
            Mutation::ProductChanged => "product_changed",
        }
    }

    /// The invalidation table.
    pub fn invalidations(&self) -> Vec<Invalidation> {
        use CacheRegion::*;
        use Invalidation::{Key, Prefix, Region};

        match self {
            Mutation::PlaceOrder { user_id } => vec![
                Region(Orders),
                Key(UserOrders, keys::user_orders(user_id)),
                Region(Products),
                Region(AdminProducts),
                Region(TopPopularProducts),
                Prefix(UserRecentProducts, keys::recent_prefix(user_id)),
                Prefix(UserFrequentProducts, keys::frequent_prefix(user_id)),
            ],
            // the canceled order may belong to any user
            Mutation::CancelOrder => vec![
                Region(Orders),
                Region(UserOrders),
                Region(Products),
                Region(AdminProducts),
            ],
            Mutation::CompleteOrder => vec![Region(Orders), Region(UserOrders)],
            Mutation::ProductChanged => vec![
                Region(Products),
                Region(AdminProducts),
                Region(TopProfitableProducts),
                Region(TopPopularProducts),
            ],
        }
    }
}

/// Anything that can drop cache entries.
#[async_trait]
pub trait CacheInvalidator: Send + Sync {
    async fn invalidate(&self, targets: Vec<Invalidation>) -> Result<(), CacheError>;
}

#[async_trait]
impl CacheInvalidator for CacheClient {
    async fn invalidate(&self, targets: Vec<Invalidation>) -> Result<(), CacheError> {
        self.evict(targets).await
    }
}

/// Applies the invalidation table after a write has committed.
///
/// Invalidation failures are logged and swallowed: the write already
/// happened, and stale entries still age out by TTL.
#[derive(Clone)]
pub struct CacheCoordinator {
    invalidator: Arc<dyn CacheInvalidator>,
}

impl CacheCoordinator {
    pub fn new(invalidator: Arc<dyn CacheInvalidator>) -> Self {
        Self { invalidator }
    }

    #[instrument(skip(self), fields(mutation = mutation.name()))]
    pub async fn after_commit(&self, mutation: Mutation) {
        let targets = mutation.invalidations();
        let count = targets.len();
        match self.invalidator.invalidate(targets).await {
            Ok(()) => debug!(targets = count, "Cache invalidated"),
            Err(e) => error!(error = %e, "Cache invalidation failed"),
        }
    }
}
