use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::CacheRegion;

use super::SystemError;

const DEFAULT_TTL: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// Used for any region without an entry in `region_ttls`.
    pub default_ttl: Duration,
    pub region_ttls: HashMap<CacheRegion, Duration>,
    /// Read-through loads slower than this are logged at `warn`.
    pub slow_load_threshold: Duration,
}

impl CacheConfig {
    pub fn ttl_for(&self, region: CacheRegion) -> Duration {
        self.region_ttls
            .get(&region)
            .copied()
            .unwrap_or(self.default_ttl)
    }

    pub fn with_ttl(mut self, region: CacheRegion, ttl: Duration) -> Self {
        self.region_ttls.insert(region, ttl);
        self
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: DEFAULT_TTL,
            region_ttls: CacheRegion::ALL
                .into_iter()
                .map(|region| (region, region.default_ttl()))
                .collect(),
            slow_load_threshold: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SystemConfig {
    /// Mailbox capacity of every actor.
    pub buffer_size: usize,
    pub cache: CacheConfig,
    pub warmup_on_start: bool,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            buffer_size: 32,
            cache: CacheConfig::default(),
            warmup_on_start: true,
        }
    }
}

impl SystemConfig {
    /// Defaults overridden by `SUPERMART_*` environment variables.
    ///
    /// `SUPERMART_CACHE_TTL_SECS` sets one TTL for every region; a
    /// `SUPERMART_CACHE_TTL_<REGION>_SECS` variable (region name upper-cased,
    /// dashes as underscores) then overrides a single region.
    pub fn from_env() -> Result<Self, SystemError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SystemError> {
        let mut config = Self::default();

        if let Some(size) = parse_var::<usize>(&lookup, "SUPERMART_BUFFER_SIZE")? {
            if size == 0 {
                return Err(SystemError::Config(
                    "SUPERMART_BUFFER_SIZE must be greater than zero".to_string(),
                ));
            }
            config.buffer_size = size;
        }

        if let Some(secs) = parse_var::<u64>(&lookup, "SUPERMART_CACHE_TTL_SECS")? {
            config.cache.default_ttl = Duration::from_secs(secs);
            config.cache.region_ttls.clear();
        }

        for region in CacheRegion::ALL {
            let name = format!(
                "SUPERMART_CACHE_TTL_{}_SECS",
                region.name().to_uppercase().replace('-', "_")
            );
            if let Some(secs) = parse_var::<u64>(&lookup, &name)? {
                config.cache.region_ttls.insert(region, Duration::from_secs(secs));
            }
        }

        if let Some(ms) = parse_var::<u64>(&lookup, "SUPERMART_SLOW_LOAD_MS")? {
            config.cache.slow_load_threshold = Duration::from_millis(ms);
        }

        if let Some(warmup) = parse_var::<bool>(&lookup, "SUPERMART_CACHE_WARMUP")? {
            config.warmup_on_start = warmup;
        }

        Ok(config)
    }
}

fn parse_var<V: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<Option<V>, SystemError> {
    match lookup(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| SystemError::Config(format!("{name} has an invalid value: {raw:?}"))),
    }
}
