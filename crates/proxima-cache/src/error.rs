//! Error types for the cache layer.

/// Errors returned by a [`CacheTier`](crate::CacheTier).
///
/// None of these ever leave [`GeoCache`](crate::GeoCache): a failing tier
/// is indistinguishable from a miss to its callers.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The cache tier could not be reached or rejected the command.
    #[error("cache unavailable: {0}")]
    Unavailable(String),

    /// The operation did not complete within its time budget.
    #[error("cache operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// A cached value could not be encoded or decoded.
    #[error("corrupt cache entry: {0}")]
    Corrupt(String),
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for CacheError {
    fn from(e: redis::RedisError) -> Self {
        Self::Unavailable(e.to_string())
    }
}
