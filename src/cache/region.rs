use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use super::CacheError;

/// A named, independently expiring group of cached views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CacheRegion {
    Products,
    AdminProducts,
    TopProfitableProducts,
    TopPopularProducts,
    UserRecentProducts,
    UserFrequentProducts,
    Orders,
    UserOrders,
}

impl CacheRegion {
    pub const ALL: [CacheRegion; 8] = [
        CacheRegion::Products,
        CacheRegion::AdminProducts,
        CacheRegion::TopProfitableProducts,
        CacheRegion::TopPopularProducts,
        CacheRegion::UserRecentProducts,
        CacheRegion::UserFrequentProducts,
        CacheRegion::Orders,
        CacheRegion::UserOrders,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CacheRegion::Products => "products",
            CacheRegion::AdminProducts => "admin-products",
            CacheRegion::TopProfitableProducts => "top-profitable-products",
            CacheRegion::TopPopularProducts => "top-popular-products",
            CacheRegion::UserRecentProducts => "user-recent-products",
            CacheRegion::UserFrequentProducts => "user-frequent-products",
            CacheRegion::Orders => "orders",
            CacheRegion::UserOrders => "user-orders",
        }
    }

    /// Time-to-live used when configuration does not override it.
    pub fn default_ttl(self) -> Duration {
        let minutes = match self {
            CacheRegion::Products => 30,
            CacheRegion::AdminProducts => 15,
            CacheRegion::TopProfitableProducts => 60,
            CacheRegion::TopPopularProducts => 30,
            CacheRegion::UserRecentProducts => 5,
            CacheRegion::UserFrequentProducts => 15,
            CacheRegion::Orders => 5,
            CacheRegion::UserOrders => 3,
        };
        Duration::from_secs(minutes * 60)
    }
}

impl fmt::Display for CacheRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CacheRegion {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CacheRegion::ALL
            .into_iter()
            .find(|region| region.name() == s)
            .ok_or_else(|| CacheError::UnknownRegion(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for region in CacheRegion::ALL {
            assert_eq!(region.name().parse::<CacheRegion>(), Ok(region));
        }
        assert_eq!(
            "wishlist".parse::<CacheRegion>(),
            Err(CacheError::UnknownRegion("wishlist".into()))
        );
    }
}
