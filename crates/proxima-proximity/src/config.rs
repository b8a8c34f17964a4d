use std::time::Duration;

use proxima_cache::CACHE_TTL;

/// Settings for [`ProximityResolver`](crate::ProximityResolver).
#[derive(Debug, Clone)]
pub struct ProximityConfig {
    /// Search radius around the reported position, in metres.
    pub radius_meters: f64,
    /// Maximum number of records returned.
    pub limit: usize,
    /// Lifetime of a cached result.
    pub cache_ttl: Duration,
    /// Upper bound on one store query. The retry gets its own budget.
    pub store_timeout: Duration,
}

impl Default for ProximityConfig {
    fn default() -> Self {
        Self {
            radius_meters: 20_000.0,
            limit: 20,
            cache_ttl: CACHE_TTL,
            store_timeout: Duration::from_secs(5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ProximityConfig::default();
        assert_eq!(config.radius_meters, 20_000.0);
        assert_eq!(config.limit, 20);
        assert_eq!(config.cache_ttl, Duration::from_secs(300));
        assert_eq!(config.store_timeout, Duration::from_secs(5));
    }
}
