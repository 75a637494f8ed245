use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use super::{CacheError, CacheRegion, CacheValue, Cacheable, Invalidation};
use crate::actor_framework::Response;
use crate::app_system::CacheConfig;
use crate::client_method;

/// Outcome of a lookup. A miss carries the region generation the caller must
/// hand back when it stores the value it loaded.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Hit(CacheValue),
    Miss { generation: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionStats {
    pub region: CacheRegion,
    pub ttl: Duration,
    pub entries: usize,
    pub keys: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub regions: Vec<RegionStats>,
}

impl CacheStats {
    pub fn total_entries(&self) -> usize {
        self.regions.iter().map(|r| r.entries).sum()
    }

    pub fn region(&self, region: CacheRegion) -> Option<&RegionStats> {
        self.regions.iter().find(|r| r.region == region)
    }
}

pub enum CacheRequest {
    Lookup {
        region: CacheRegion,
        key: String,
        respond_to: Response<Lookup, CacheError>,
    },
    Store {
        region: CacheRegion,
        key: String,
        value: CacheValue,
        generation: u64,
        respond_to: Response<bool, CacheError>,
    },
    Invalidate {
        targets: Vec<Invalidation>,
        respond_to: Response<(), CacheError>,
    },
    Stats {
        respond_to: Response<CacheStats, CacheError>,
    },
    ClearAll {
        respond_to: Response<(), CacheError>,
    },
    ClearRegion {
        name: String,
        respond_to: Response<(), CacheError>,
    },
    Shutdown,
}

struct CacheEntry {
    value: CacheValue,
    expires_at: Instant,
}

struct RegionState {
    ttl: Duration,
    generation: u64,
    entries: HashMap<String, CacheEntry>,
}

impl RegionState {
    fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            generation: 0,
            entries: HashMap::new(),
        }
    }

    /// Drops matching entries and moves the region to a new generation, so
    /// any load already in flight will not be stored.
    fn evict_where(&mut self, matches: impl Fn(&str) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| !matches(key.as_str()));
        self.generation += 1;
        before - self.entries.len()
    }
}

/// Actor owning every cache region.
pub struct CacheActor {
    receiver: mpsc::Receiver<CacheRequest>,
    regions: HashMap<CacheRegion, RegionState>,
}

impl CacheActor {
    pub fn new(config: &CacheConfig, buffer_size: usize) -> (Self, CacheClient) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let regions = CacheRegion::ALL
            .into_iter()
            .map(|region| (region, RegionState::new(config.ttl_for(region))))
            .collect();
        let actor = Self { receiver, regions };
        let client = CacheClient {
            sender,
            slow_load_threshold: config.slow_load_threshold,
        };
        (actor, client)
    }

    #[instrument(name = "cache_actor", skip(self))]
    pub async fn run(mut self) {
        info!("Cache starting");
        while let Some(msg) = self.receiver.recv().await {
            match msg {
                CacheRequest::Lookup { region, key, respond_to } => {
                    let _ = respond_to.send(Ok(self.handle_lookup(region, &key)));
                }
                CacheRequest::Store { region, key, value, generation, respond_to } => {
                    let _ = respond_to.send(Ok(self.handle_store(region, key, value, generation)));
                }
                CacheRequest::Invalidate { targets, respond_to } => {
                    self.handle_invalidate(targets);
                    let _ = respond_to.send(Ok(()));
                }
                CacheRequest::Stats { respond_to } => {
                    let _ = respond_to.send(Ok(self.handle_stats()));
                }
                CacheRequest::ClearAll { respond_to } => {
                    self.handle_clear_all();
                    let _ = respond_to.send(Ok(()));
                }
                CacheRequest::ClearRegion { name, respond_to } => {
                    let _ = respond_to.send(self.handle_clear_region(&name));
                }
                CacheRequest::Shutdown => {
                    info!("Cache shutting down");
                    break;
                }
            }
        }
        info!("Cache stopped");
    }

    fn region_mut(&mut self, region: CacheRegion) -> &mut RegionState {
        self.regions
            .entry(region)
            .or_insert_with(|| RegionState::new(region.default_ttl()))
    }

    #[instrument(skip(self), fields(region = %region))]
    fn handle_lookup(&mut self, region: CacheRegion, key: &str) -> Lookup {
        let state = self.region_mut(region);
        let now = Instant::now();
        match state.entries.get(key) {
            Some(entry) if entry.expires_at > now => {
                debug!("Hit");
                Lookup::Hit(entry.value.clone())
            }
            Some(_) => {
                debug!("Expired");
                state.entries.remove(key);
                Lookup::Miss { generation: state.generation }
            }
            None => {
                debug!("Miss");
                Lookup::Miss { generation: state.generation }
            }
        }
    }

    #[instrument(skip(self, value), fields(region = %region))]
    fn handle_store(
        &mut self,
        region: CacheRegion,
        key: String,
        value: CacheValue,
        generation: u64,
    ) -> bool {
        let state = self.region_mut(region);
        if generation != state.generation {
            debug!(current = state.generation, "Discarding stale fill");
            return false;
        }
        let expires_at = Instant::now() + state.ttl;
        state.entries.insert(key, CacheEntry { value, expires_at });
        true
    }

    #[instrument(skip(self))]
    fn handle_invalidate(&mut self, targets: Vec<Invalidation>) {
        for target in targets {
            let evicted = match &target {
                Invalidation::Region(region) => self.region_mut(*region).evict_where(|_| true),
                Invalidation::Key(region, key) => {
                    self.region_mut(*region).evict_where(|candidate| candidate == key)
                }
                Invalidation::Prefix(region, prefix) => self
                    .region_mut(*region)
                    .evict_where(|candidate| candidate.starts_with(prefix.as_str())),
            };
            debug!(target = ?target, evicted, "Invalidated");
        }
    }

    fn handle_stats(&self) -> CacheStats {
        let now = Instant::now();
        let regions = CacheRegion::ALL
            .into_iter()
            .map(|region| match self.regions.get(&region) {
                Some(state) => {
                    let mut keys: Vec<String> = state
                        .entries
                        .iter()
                        .filter(|(_, entry)| entry.expires_at > now)
                        .map(|(key, _)| key.clone())
                        .collect();
                    keys.sort();
                    RegionStats {
                        region,
                        ttl: state.ttl,
                        entries: keys.len(),
                        keys,
                    }
                }
                None => RegionStats {
                    region,
                    ttl: region.default_ttl(),
                    entries: 0,
                    keys: Vec::new(),
                },
            })
            .collect();
        CacheStats { regions }
    }

    fn handle_clear_all(&mut self) {
        for state in self.regions.values_mut() {
            state.evict_where(|_| true);
        }
        info!("All cache regions cleared");
    }

    fn handle_clear_region(&mut self, name: &str) -> Result<(), CacheError> {
        let region: CacheRegion = name.parse()?;
        let evicted = self.region_mut(region).evict_where(|_| true);
        info!(region = %region, evicted, "Cache region cleared");
        Ok(())
    }
}

#[derive(Clone)]
pub struct CacheClient {
    sender: mpsc::Sender<CacheRequest>,
    slow_load_threshold: Duration,
}

client_method!(CacheClient => fn lookup(region: CacheRegion, key: String) -> Lookup as CacheRequest::Lookup, Error = CacheError::Unavailable);
client_method!(CacheClient => fn evict(targets: Vec<Invalidation>) -> () as CacheRequest::Invalidate, Error = CacheError::Unavailable);
client_method!(CacheClient => fn stats() -> CacheStats as CacheRequest::Stats, Error = CacheError::Unavailable);
client_method!(CacheClient => fn clear_all() -> () as CacheRequest::ClearAll, Error = CacheError::Unavailable);
client_method!(CacheClient => fn clear_region(name: String) -> () as CacheRequest::ClearRegion, Error = CacheError::Unavailable);

impl CacheClient {
    /// Stores `value` if the region is still at `generation`. Returns whether
    /// it was kept.
    #[instrument(skip(self, value))]
    pub async fn store(
        &self,
        region: CacheRegion,
        key: String,
        value: CacheValue,
        generation: u64,
    ) -> Result<bool, CacheError> {
        debug!("Sending request");
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(CacheRequest::Store { region, key, value, generation, respond_to })
            .await
            .map_err(|_| CacheError::Unavailable("Actor closed".to_string()))?;
        response
            .await
            .map_err(|_| CacheError::Unavailable("Actor dropped".to_string()))?
    }

    pub async fn shutdown(&self) -> Result<(), CacheError> {
        self.sender
            .send(CacheRequest::Shutdown)
            .await
            .map_err(|_| CacheError::Unavailable("Actor closed".to_string()))
    }

    /// Returns the cached value for `key`, or runs `load` and caches its
    /// result. Loader errors are returned and never cached. If the cache
    /// actor is unreachable the loader result is returned uncached.
    #[instrument(skip_all, fields(region = %region, key = %key))]
    pub async fn read_through<V, E, F, Fut>(
        &self,
        region: CacheRegion,
        key: String,
        load: F,
    ) -> Result<V, E>
    where
        V: Cacheable,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let generation = match self.lookup(region, key.clone()).await {
            Ok(Lookup::Hit(value)) => match V::from_value(value) {
                Some(hit) => return Ok(hit),
                None => {
                    warn!("Cached value has an unexpected shape, reloading");
                    None
                }
            },
            Ok(Lookup::Miss { generation }) => Some(generation),
            Err(e) => {
                warn!(error = %e, "Cache unavailable, loading directly");
                None
            }
        };

        let started = Instant::now();
        let loaded = load().await?;
        let elapsed = started.elapsed();
        if elapsed > self.slow_load_threshold {
            warn!(elapsed_ms = elapsed.as_millis() as u64, "Slow cache load");
        } else {
            debug!(elapsed_ms = elapsed.as_millis() as u64, "Loaded");
        }

        if let Some(generation) = generation {
            match self.store(region, key, loaded.clone().into_value(), generation).await {
                Ok(_) => {}
                Err(e) => warn!(error = %e, "Could not store loaded value"),
            }
        }
        Ok(loaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ProductView;
    use rust_decimal::Decimal;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn start(config: CacheConfig) -> CacheClient {
        let (actor, client) = CacheActor::new(&config, 16);
        tokio::spawn(actor.run());
        client
    }

    fn view(id: &str) -> ProductView {
        let stamp = chrono::DateTime::from_timestamp(0, 0).unwrap();
        ProductView {
            id: id.to_string(),
            name: format!("Item {id}"),
            description: String::new(),
            price: Decimal::new(250, 2),
            quantity: 4,
            created_at: stamp,
            updated_at: stamp,
        }
    }

    #[tokio::test]
    async fn test_miss_store_hit() {
        let cache = start(CacheConfig::default());
        let key = "product-p1".to_string();

        let generation = match cache.lookup(CacheRegion::Products, key.clone()).await.unwrap() {
            Lookup::Miss { generation } => generation,
            other => panic!("expected miss, got {:?}", other),
        };
        let stored = cache
            .store(CacheRegion::Products, key.clone(), view("p1").into_value(), generation)
            .await
            .unwrap();
        assert!(stored);

        let hit = cache.lookup(CacheRegion::Products, key).await.unwrap();
        assert_eq!(hit, Lookup::Hit(CacheValue::Product(view("p1"))));
    }

    #[tokio::test]
    async fn test_fill_after_invalidation_is_discarded() {
        let cache = start(CacheConfig::default());
        let key = "all-in-stock".to_string();

        let Lookup::Miss { generation } = cache.lookup(CacheRegion::Products, key.clone()).await.unwrap() else {
            panic!("expected miss");
        };
        cache.evict(vec![Invalidation::Region(CacheRegion::Products)]).await.unwrap();

        let stored = cache
            .store(CacheRegion::Products, key.clone(), vec![view("p1")].into_value(), generation)
            .await
            .unwrap();
        assert!(!stored);
        assert!(matches!(
            cache.lookup(CacheRegion::Products, key).await.unwrap(),
            Lookup::Miss { .. }
        ));
    }

    #[tokio::test]
    async fn test_entries_expire_after_ttl() {
        let config = CacheConfig::default().with_ttl(CacheRegion::Orders, Duration::from_millis(20));
        let cache = start(config);

        let loads = Arc::new(AtomicUsize::new(0));
        for _ in 0..2 {
            let loads = loads.clone();
            let _: Result<Vec<crate::domain::Order>, CacheError> = cache
                .read_through(CacheRegion::Orders, "all".to_string(), || async move {
                    loads.fetch_add(1, Ordering::SeqCst);
                    Ok(Vec::new())
                })
                .await;
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_millis(40)).await;
        let loads_after = loads.clone();
        let _: Result<Vec<crate::domain::Order>, CacheError> = cache
            .read_through(CacheRegion::Orders, "all".to_string(), || async move {
                loads_after.fetch_add(1, Ordering::SeqCst);
                Ok(Vec::new())
            })
            .await;
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_prefix_and_key_invalidation_are_scoped() {
        let cache = start(CacheConfig::default());
        for key in ["recent-alice-5", "recent-alice-10", "recent-bob-5"] {
            let _: Result<Vec<ProductView>, CacheError> = cache
                .read_through(CacheRegion::UserRecentProducts, key.to_string(), || async {
                    Ok(vec![view("p1")])
                })
                .await;
        }
        let _: Result<Vec<crate::domain::Order>, CacheError> = cache
            .read_through(CacheRegion::UserOrders, "alice".to_string(), || async { Ok(Vec::new()) })
            .await;
        let _: Result<Vec<crate::domain::Order>, CacheError> = cache
            .read_through(CacheRegion::UserOrders, "bob".to_string(), || async { Ok(Vec::new()) })
            .await;

        cache
            .evict(vec![
                Invalidation::Prefix(CacheRegion::UserRecentProducts, "recent-alice-".to_string()),
                Invalidation::Key(CacheRegion::UserOrders, "alice".to_string()),
            ])
            .await
            .unwrap();

        let stats = cache.stats().await.unwrap();
        assert_eq!(
            stats.region(CacheRegion::UserRecentProducts).unwrap().keys,
            vec!["recent-bob-5".to_string()]
        );
        assert_eq!(
            stats.region(CacheRegion::UserOrders).unwrap().keys,
            vec!["bob".to_string()]
        );
        assert_eq!(stats.total_entries(), 2);
    }

    #[tokio::test]
    async fn test_loader_errors_are_not_cached() {
        let cache = start(CacheConfig::default());
        let failed: Result<ProductView, String> = cache
            .read_through(CacheRegion::Products, "product-p9".to_string(), || async {
                Err("no such product".to_string())
            })
            .await;
        assert_eq!(failed, Err("no such product".to_string()));
        assert_eq!(cache.stats().await.unwrap().total_entries(), 0);
    }

    #[tokio::test]
    async fn test_clear_region_and_clear_all() {
        let cache = start(CacheConfig::default());
        let _: Result<Vec<ProductView>, CacheError> = cache
            .read_through(CacheRegion::Products, "all-in-stock".to_string(), || async {
                Ok(vec![view("p1")])
            })
            .await;
        let _: Result<Vec<ProductView>, CacheError> = cache
            .read_through(CacheRegion::TopPopularProducts, "top-popular-10".to_string(), || async {
                Ok(vec![view("p1")])
            })
            .await;

        assert_eq!(
            cache.clear_region("nope".to_string()).await,
            Err(CacheError::UnknownRegion("nope".to_string()))
        );
        cache.clear_region("products".to_string()).await.unwrap();
        assert_eq!(cache.stats().await.unwrap().total_entries(), 1);

        cache.clear_all().await.unwrap();
        assert_eq!(cache.stats().await.unwrap().total_entries(), 0);
    }

    #[tokio::test]
    async fn test_read_through_survives_stopped_cache() {
        let cache = start(CacheConfig::default());
        cache.shutdown().await.unwrap();
        tokio::task::yield_now().await;

        let value: Result<ProductView, CacheError> = cache
            .read_through(CacheRegion::Products, "product-p1".to_string(), || async {
                Ok(view("p1"))
            })
            .await;
        assert_eq!(value, Ok(view("p1")));
    }
}
