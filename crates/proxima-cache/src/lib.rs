//! Cache layer for Proxima.
//!
//! - [`CacheTier`]: the fast, shared, externally-backed key/value tier
//!   (`get`, `set_with_ttl`, `hash_field_set`). Implemented in-process by
//!   [`MemoryCacheTier`] and, with the `redis` feature, by
//!   [`RedisCacheTier`] against Redis/Valkey.
//! - [`BucketKey`]: a location sample quantized to a one-arc-minute cell.
//! - [`GeoCache`]: cache-aside storage of nearby results per bucket. It
//!   never fails: tier errors, timeouts, and corrupt entries are logged and
//!   read as misses.
//!
//! # Feature Flags
//!
//! - `redis`: [`RedisCacheTier`] via `redis::aio::ConnectionManager`

mod bucket;
mod error;
mod geo_cache;
mod memory;
#[cfg(feature = "redis")]
mod redis_tier;

pub use bucket::{BUCKET_RESOLUTION, BucketKey};
pub use error::CacheError;
pub use geo_cache::{CACHE_TTL, GeoCache, GeoCacheConfig};
pub use memory::{MemoryCacheTier, SWEEP_INTERVAL};
#[cfg(feature = "redis")]
pub use redis_tier::RedisCacheTier;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// The fast cache tier.
///
/// Concurrent `get`/`set_with_ttl` on one key are governed by the tier's
/// own atomicity: a write replaces the whole value, last writer wins.
pub trait CacheTier: Send + Sync + 'static {
    /// Returns the value stored under `key`, or `None` if absent or expired.
    fn get(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Option<String>, CacheError>> + Send;

    /// Stores `value` under `key`, expiring after `ttl`.
    fn set_with_ttl(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> impl Future<Output = Result<(), CacheError>> + Send;

    /// Sets one field of the hash stored under `key`.
    fn hash_field_set(
        &self,
        key: &str,
        field: &str,
        value: &str,
    ) -> impl Future<Output = Result<(), CacheError>> + Send;
}

impl<T: CacheTier> CacheTier for Arc<T> {
    fn get(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Option<String>, CacheError>> + Send {
        (**self).get(key)
    }

    fn set_with_ttl(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> impl Future<Output = Result<(), CacheError>> + Send {
        (**self).set_with_ttl(key, value, ttl)
    }

    fn hash_field_set(
        &self,
        key: &str,
        field: &str,
        value: &str,
    ) -> impl Future<Output = Result<(), CacheError>> + Send {
        (**self).hash_field_set(key, field, value)
    }
}
