//! In-process cache tier with per-key expiry.

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::{CacheError, CacheTier};

/// How often a write also sweeps out expired values.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug)]
struct Values {
    entries: HashMap<String, (String, Instant)>,
    next_sweep: Instant,
}

impl Values {
    fn purge(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, (_, expires_at)| *expires_at > now);
        self.next_sweep = now + SWEEP_INTERVAL;
        before - self.entries.len()
    }
}

/// A [`CacheTier`] held in process memory.
///
/// Expiry uses Tokio's clock, so tests can pause and advance time instead
/// of sleeping. An expired value is dropped when it is read, and writes
/// sweep every expired value at most once per [`SWEEP_INTERVAL`]. Bucket
/// keys are rarely read twice, so without the sweep every cell ever
/// visited would stay resident. For a tier that may sit without writes,
/// [`spawn_sweeper`](Self::spawn_sweeper) purges on a timer as well.
#[derive(Debug)]
pub struct MemoryCacheTier {
    values: Mutex<Values>,
    hashes: Mutex<HashMap<String, HashMap<String, String>>>,
}

impl Default for MemoryCacheTier {
    fn default() -> Self {
        Self {
            values: Mutex::new(Values {
                entries: HashMap::new(),
                next_sweep: Instant::now() + SWEEP_INTERVAL,
            }),
            hashes: Mutex::default(),
        }
    }
}

impl MemoryCacheTier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads one field of a hash.
    pub async fn hash_field_get(&self, key: &str, field: &str) -> Option<String> {
        self.hashes
            .lock()
            .await
            .get(key)
            .and_then(|h| h.get(field))
            .cloned()
    }

    /// Number of values held, expired ones not yet swept included.
    pub async fn resident(&self) -> usize {
        self.values.lock().await.entries.len()
    }

    /// Drops every expired value and returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        self.values.lock().await.purge(Instant::now())
    }

    /// Purges expired values every `every` until the tier is dropped.
    pub fn spawn_sweeper(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let weak: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticks = tokio::time::interval(every);
            ticks.tick().await;
            loop {
                ticks.tick().await;
                let Some(tier) = weak.upgrade() else { break };
                let removed = tier.purge_expired().await;
                if removed > 0 {
                    tracing::debug!(removed, "swept expired cache values");
                }
            }
        })
    }
}

impl CacheTier for MemoryCacheTier {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut values = self.values.lock().await;
        match values.entries.get(key) {
            Some((value, expires_at)) if *expires_at > Instant::now() => {
                Ok(Some(value.clone()))
            }
            Some(_) => {
                values.entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set_with_ttl(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let now = Instant::now();
        let mut values = self.values.lock().await;
        if now >= values.next_sweep {
            values.purge(now);
        }
        values
            .entries
            .insert(key.to_string(), (value.to_string(), now + ttl));
        Ok(())
    }

    async fn hash_field_set(
        &self,
        key: &str,
        field: &str,
        value: &str,
    ) -> Result<(), CacheError> {
        self.hashes
            .lock()
            .await
            .entry(key.to_string())
            .or_default()
            .insert(field.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_value_expires_after_ttl() {
        let tier = MemoryCacheTier::new();
        tier.set_with_ttl("k", "v", Duration::from_secs(10))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(9)).await;
        assert_eq!(tier.get("k").await.unwrap().as_deref(), Some("v"));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(tier.get("k").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_replaces_value_and_ttl() {
        let tier = MemoryCacheTier::new();
        tier.set_with_ttl("k", "old", Duration::from_secs(5))
            .await
            .unwrap();
        tier.set_with_ttl("k", "new", Duration::from_secs(60))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(30)).await;
        assert_eq!(tier.get("k").await.unwrap().as_deref(), Some("new"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired() {
        let tier = MemoryCacheTier::new();
        tier.set_with_ttl("short", "v", Duration::from_secs(1))
            .await
            .unwrap();
        tier.set_with_ttl("long", "v", Duration::from_secs(100))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(2)).await;

        assert_eq!(tier.purge_expired().await, 1);
        assert!(tier.get("long").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_hash_fields_are_independent() {
        let tier = MemoryCacheTier::new();
        tier.hash_field_set("user:u1", "isOnline", "1").await.unwrap();
        tier.hash_field_set("user:u1", "lastSeen", "now").await.unwrap();
        tier.hash_field_set("user:u1", "isOnline", "0").await.unwrap();

        assert_eq!(
            tier.hash_field_get("user:u1", "isOnline").await.as_deref(),
            Some("0")
        );
        assert_eq!(
            tier.hash_field_get("user:u1", "lastSeen").await.as_deref(),
            Some("now")
        );
        assert_eq!(tier.hash_field_get("user:u2", "isOnline").await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_keys_that_are_never_read_again_are_reclaimed() {
        let tier = MemoryCacheTier::new();
        for cell in 0..1000 {
            tier.set_with_ttl(&format!("nearby:{cell}:3052"), "[]", Duration::from_secs(300))
                .await
                .unwrap();
        }
        assert_eq!(tier.resident().await, 1000);

        tokio::time::advance(Duration::from_secs(3600)).await;
        tier.set_with_ttl("nearby:282:3052", "[]", Duration::from_secs(300))
            .await
            .unwrap();

        assert_eq!(tier.resident().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_writes_sweep_at_most_once_per_interval() {
        let tier = MemoryCacheTier::new();
        tier.set_with_ttl("short", "v", Duration::from_secs(1))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(2)).await;
        tier.set_with_ttl("other", "v", Duration::from_secs(300))
            .await
            .unwrap();
        assert_eq!(tier.resident().await, 2, "sweep not due yet");

        tokio::time::advance(SWEEP_INTERVAL).await;
        tier.set_with_ttl("other", "v", Duration::from_secs(300))
            .await
            .unwrap();
        assert_eq!(tier.resident().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_reclaims_without_writes() {
        let tier = Arc::new(MemoryCacheTier::new());
        let sweeper = tier.spawn_sweeper(Duration::from_secs(60));
        for cell in 0..100 {
            tier.set_with_ttl(&format!("nearby:{cell}:3052"), "[]", Duration::from_secs(300))
                .await
                .unwrap();
        }

        tokio::time::sleep(Duration::from_secs(3600)).await;

        assert_eq!(tier.resident().await, 0);
        sweeper.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_stops_with_the_tier() {
        let tier = Arc::new(MemoryCacheTier::new());
        let sweeper = tier.spawn_sweeper(Duration::from_secs(60));
        drop(tier);

        tokio::time::timeout(Duration::from_secs(600), sweeper)
            .await
            .expect("sweeper should exit once the tier is gone")
            .unwrap();
    }
}
