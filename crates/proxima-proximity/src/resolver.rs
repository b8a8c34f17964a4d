use proxima_cache::{BucketKey, CacheTier, GeoCache};
use proxima_protocol::{GeoPoint, LocationRecord, LocationSample, NearbyResult, Principal};
use proxima_store::{GeoStore, StoreError};

use crate::ProximityConfig;

/// Answers "what is near this position?" through the geo cache, falling
/// back to the store.
///
/// `resolve` never fails. Cache trouble reads as a miss, a failing store
/// query is retried once, and a second failure yields an empty result.
pub struct ProximityResolver<K, S> {
    cache: GeoCache<K>,
    store: S,
    config: ProximityConfig,
}

impl<K: CacheTier, S: GeoStore> ProximityResolver<K, S> {
    pub fn new(cache: GeoCache<K>, store: S, config: ProximityConfig) -> Self {
        Self {
            cache,
            store,
            config,
        }
    }

    pub fn cache(&self) -> &GeoCache<K> {
        &self.cache
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &ProximityConfig {
        &self.config
    }

    /// Resolves the records near `sample` on behalf of `principal`.
    pub async fn resolve(&self, principal: &Principal, sample: LocationSample) -> NearbyResult {
        let key = BucketKey::from_sample(sample);

        if let Some(cached) = self.cache.get(&key).await {
            return cached;
        }

        let point = GeoPoint::from(sample);
        let records = match self.query(point).await {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(principal = %principal.id, %key, error = %e, "nearby query failed, retrying");
                match self.query(point).await {
                    Ok(records) => records,
                    Err(e) => {
                        tracing::error!(principal = %principal.id, %key, error = %e, "nearby query failed twice, returning empty result");
                        return NearbyResult::empty();
                    }
                }
            }
        };

        let result = NearbyResult::new(records);
        tracing::debug!(principal = %principal.id, %key, records = result.len(), "nearby query served by store");
        self.cache.set(&key, &result, self.config.cache_ttl).await;
        result
    }

    async fn query(&self, point: GeoPoint) -> Result<Vec<LocationRecord>, StoreError> {
        tokio::time::timeout(
            self.config.store_timeout,
            self.store
                .find_near(point, self.config.radius_meters, self.config.limit),
        )
        .await
        .map_err(|_| StoreError::Timeout(self.config.store_timeout))?
    }
}
