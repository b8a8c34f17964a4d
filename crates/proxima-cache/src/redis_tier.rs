//! Redis/Valkey cache tier.

use std::time::Duration;

use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use crate::{CacheError, CacheTier};

/// A [`CacheTier`] backed by Redis (or any wire-compatible server such as
/// Valkey).
///
/// `ConnectionManager` reconnects on its own; each call clones the cheap
/// handle so concurrent callers never contend on a lock here.
#[derive(Clone)]
pub struct RedisCacheTier {
    connection: ConnectionManager,
}

impl RedisCacheTier {
    /// Opens a managed connection to `url` (`redis://…` or `rediss://…`).
    pub async fn connect(url: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(url)?;
        let connection = ConnectionManager::new(client).await?;
        tracing::info!("cache tier connected");
        Ok(Self { connection })
    }
}

impl CacheTier for RedisCacheTier {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.connection.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set_with_ttl(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        // SETEX rejects a zero expiry.
        let seconds = ttl.as_secs().max(1);
        let mut conn = self.connection.clone();
        let () = conn.set_ex(key, value, seconds as _).await?;
        Ok(())
    }

    async fn hash_field_set(
        &self,
        key: &str,
        field: &str,
        value: &str,
    ) -> Result<(), CacheError> {
        let mut conn = self.connection.clone();
        let _: i64 = conn.hset(key, field, value).await?;
        Ok(())
    }
}
