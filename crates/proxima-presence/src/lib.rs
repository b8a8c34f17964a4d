//! Presence tracking for Proxima.
//!
//! A principal's online flag lives in two places: a field on the
//! `user:{id}` hash in the cache tier (read by anything that wants a fast
//! answer) and the durable flag in the principal store. [`PresenceTracker`]
//! writes both on every transition.
//!
//! The two writes are independent. Either can fail or time out without
//! affecting the other, and neither failure reaches the caller: presence is
//! best-effort and a stale flag is acceptable.

use std::time::Duration;

use proxima_cache::{CacheError, CacheTier};
use proxima_protocol::PrincipalId;
use proxima_store::{PrincipalStore, StoreError};

/// Hash field holding the online flag.
pub const ONLINE_FIELD: &str = "isOnline";

/// Cache key of a principal's presence hash.
pub fn presence_key(id: &PrincipalId) -> String {
    format!("user:{id}")
}

/// Settings for [`PresenceTracker`].
#[derive(Debug, Clone)]
pub struct PresenceConfig {
    /// Upper bound on each of the two writes.
    pub write_timeout: Duration,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            write_timeout: Duration::from_secs(2),
        }
    }
}

/// Records online/offline transitions in the cache tier and the store.
///
/// Both operations are idempotent; calling `set_online` twice leaves the
/// same state as calling it once.
pub struct PresenceTracker<K, S> {
    cache: K,
    store: S,
    config: PresenceConfig,
}

impl<K: CacheTier, S: PrincipalStore> PresenceTracker<K, S> {
    pub fn new(cache: K, store: S, config: PresenceConfig) -> Self {
        Self {
            cache,
            store,
            config,
        }
    }

    pub async fn set_online(&self, id: &PrincipalId) {
        self.record(id, true).await;
    }

    pub async fn set_offline(&self, id: &PrincipalId) {
        self.record(id, false).await;
    }

    async fn record(&self, id: &PrincipalId, online: bool) {
        let (cache, store) = tokio::join!(self.write_cache(id, online), self.write_store(id, online));

        if let Err(e) = cache {
            tracing::warn!(principal = %id, online, error = %e, "presence cache write failed");
        }
        if let Err(e) = store {
            tracing::warn!(principal = %id, online, error = %e, "presence store write failed");
        }
        tracing::debug!(principal = %id, online, "presence recorded");
    }

    async fn write_cache(&self, id: &PrincipalId, online: bool) -> Result<(), CacheError> {
        let flag = if online { "1" } else { "0" };
        let key = presence_key(id);
        tokio::time::timeout(
            self.config.write_timeout,
            self.cache.hash_field_set(&key, ONLINE_FIELD, flag),
        )
        .await
        .map_err(|_| CacheError::Timeout(self.config.write_timeout))?
    }

    async fn write_store(&self, id: &PrincipalId, online: bool) -> Result<(), StoreError> {
        tokio::time::timeout(self.config.write_timeout, self.store.set_online(id, online))
            .await
            .map_err(|_| StoreError::Timeout(self.config.write_timeout))?
    }
}
