//! # Proxima
//!
//! Real-time proximity service. Clients hold a WebSocket open, report
//! their position with `updateLocation`, and get the nearby places back as
//! `nearbyLocations`.
//!
//! Every connection authenticates once from its handshake (the `token`
//! cookie, a bearer header, or a `token` query parameter). While it is
//! open the principal is marked online in the cache tier and the store.
//! Nearby lookups are served from a cache keyed by one-arc-minute cells
//! and fall back to the store's spherical query.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use proxima::prelude::*;
//!
//! # async fn start() -> Result<(), ProximaError> {
//! let store = Arc::new(MemoryStore::from_seed(SeedData::load("seed.json").await?));
//! let server = ProximaServer::builder()
//!     .bind("0.0.0.0:5000")
//!     .build(
//!         JwtVerifier::hs256(b"change-me"),
//!         Arc::new(MemoryCacheTier::new()),
//!         store,
//!     )
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod server;
mod service;

pub use config::{ConfigError, ServerConfig};
pub use error::ProximaError;
pub use handler::LOCATION_UPDATE_FAILED;
pub use server::{ProximaServer, ProximaServerBuilder};
pub use service::ProximaService;

pub mod prelude {
    pub use crate::{
        ConfigError, LOCATION_UPDATE_FAILED, ProximaError, ProximaServer, ProximaServerBuilder,
        ProximaService, ServerConfig,
    };
    pub use proxima_cache::{
        BucketKey, CacheError, CacheTier, GeoCache, GeoCacheConfig, MemoryCacheTier,
        RedisCacheTier, SWEEP_INTERVAL,
    };
    pub use proxima_presence::{PresenceConfig, PresenceTracker};
    pub use proxima_protocol::{
        AudioFile, ClientEvent, Codec, ErrorPayload, GeoPoint, JsonCodec, LocationRecord,
        LocationSample, NearbyResult, Principal, PrincipalId, ServerEvent,
    };
    pub use proxima_proximity::{ProximityConfig, ProximityResolver};
    pub use proxima_session::{
        ConnectionContext, ConnectionRegistry, ConnectionState, IdentityVerifier, JwtVerifier,
        SessionError, StaticTokenVerifier,
    };
    pub use proxima_store::{GeoStore, MemoryStore, PrincipalStore, SeedData, StoreError};
    pub use proxima_transport::{
        Connection, ConnectionId, Frame, HandshakeMetadata, PendingConnection, PendingWebSocket,
        Transport, TransportError, WebSocketConnection, WebSocketTransport,
    };
}
