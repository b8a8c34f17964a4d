//! Proximity resolution for Proxima.
//!
//! [`ProximityResolver::resolve`] turns a client's position into the list of
//! nearby records, cache first:
//!
//! ```text
//! sample ──BucketKey──→ GeoCache::get ──hit──────────────────────────→ result
//!                           │
//!                          miss ──→ GeoStore::find_near(raw point)
//!                                       │ ok ──→ GeoCache::set ──────→ result
//!                                       │ err ─→ retry once ─ok──────→ result
//!                                                         └─err──────→ empty
//! ```
//!
//! Only the cache key is bucketed. The store query always uses the precise
//! coordinate, so ranking does not depend on cache granularity.
//!
//! Concurrent misses on the same bucket each query the store. There is no
//! per-key de-duplication of in-flight queries.

mod config;
mod resolver;

pub use config::ProximityConfig;
pub use resolver::ProximityResolver;
