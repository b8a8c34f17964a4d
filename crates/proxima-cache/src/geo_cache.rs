//! Cache-aside storage of nearby results, keyed by bucket.

use std::time::Duration;

use proxima_protocol::NearbyResult;

use crate::{BucketKey, CacheError, CacheTier};

/// How long a cached nearby result stays valid.
pub const CACHE_TTL: Duration = Duration::from_secs(300);

/// Settings for [`GeoCache`].
#[derive(Debug, Clone)]
pub struct GeoCacheConfig {
    /// Upper bound on a single tier round-trip. A slower tier counts as
    /// unavailable for that call.
    pub op_timeout: Duration,
}

impl Default for GeoCacheConfig {
    fn default() -> Self {
        Self {
            op_timeout: Duration::from_secs(1),
        }
    }
}

/// Nearby results cached per [`BucketKey`] in a [`CacheTier`].
///
/// Neither operation can fail from the caller's point of view:
///
/// - `get` returns `None` on a miss, an expired entry, an unreachable or
///   slow tier, or an entry that no longer decodes.
/// - `set` logs and drops any failure; the next lookup simply misses.
///
/// Entries are whole JSON arrays written in one command, so a reader never
/// sees a partial list. There is no invalidation: entries only expire.
pub struct GeoCache<K> {
    tier: K,
    config: GeoCacheConfig,
}

impl<K: CacheTier> GeoCache<K> {
    pub fn new(tier: K, config: GeoCacheConfig) -> Self {
        Self { tier, config }
    }

    /// Returns the underlying tier.
    pub fn tier(&self) -> &K {
        &self.tier
    }

    /// Looks up the cached result for `key`.
    pub async fn get(&self, key: &BucketKey) -> Option<NearbyResult> {
        let cache_key = key.to_string();
        match self.try_get(&cache_key).await {
            Ok(Some(result)) => {
                tracing::debug!(key = %cache_key, records = result.len(), "geo cache hit");
                Some(result)
            }
            Ok(None) => {
                tracing::debug!(key = %cache_key, "geo cache miss");
                None
            }
            Err(e) => {
                tracing::warn!(key = %cache_key, error = %e, "geo cache read failed, treating as miss");
                None
            }
        }
    }

    /// Stores `result` under `key` for `ttl`.
    pub async fn set(&self, key: &BucketKey, result: &NearbyResult, ttl: Duration) {
        let cache_key = key.to_string();
        match self.try_set(&cache_key, result, ttl).await {
            Ok(()) => {
                tracing::debug!(key = %cache_key, records = result.len(), ?ttl, "geo cache populated");
            }
            Err(e) => {
                tracing::warn!(key = %cache_key, error = %e, "geo cache write failed");
            }
        }
    }

    async fn try_get(&self, cache_key: &str) -> Result<Option<NearbyResult>, CacheError> {
        let raw = tokio::time::timeout(self.config.op_timeout, self.tier.get(cache_key))
            .await
            .map_err(|_| CacheError::Timeout(self.config.op_timeout))??;

        match raw {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| CacheError::Corrupt(e.to_string())),
            None => Ok(None),
        }
    }

    async fn try_set(
        &self,
        cache_key: &str,
        result: &NearbyResult,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let raw = serde_json::to_string(result).map_err(|e| CacheError::Corrupt(e.to_string()))?;
        tokio::time::timeout(
            self.config.op_timeout,
            self.tier.set_with_ttl(cache_key, &raw, ttl),
        )
        .await
        .map_err(|_| CacheError::Timeout(self.config.op_timeout))?
    }
}
