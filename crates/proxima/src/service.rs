//! Shared per-server state handed to every connection task.

use std::sync::Arc;
use std::time::Duration;

use proxima_cache::{CacheTier, GeoCache};
use proxima_presence::PresenceTracker;
use proxima_protocol::{Codec, JsonCodec};
use proxima_proximity::ProximityResolver;
use proxima_session::{ConnectionAuthenticator, ConnectionRegistry, IdentityVerifier};
use proxima_store::{GeoStore, PrincipalStore};
use proxima_transport::Connection;

use crate::ServerConfig;
use crate::handler::handle_connection;

/// The collaborators every connection handler needs.
///
/// Built once at startup and shared behind an `Arc`. Nothing in here is
/// per-connection; per-connection state lives in the handler task.
pub struct ProximaService<V, K, S, C = JsonCodec> {
    pub(crate) authenticator: ConnectionAuthenticator<V, S>,
    pub(crate) presence: PresenceTracker<K, S>,
    pub(crate) resolver: ProximityResolver<K, S>,
    pub(crate) registry: Arc<ConnectionRegistry>,
    pub(crate) codec: C,
    pub(crate) idle_timeout: Duration,
    pub(crate) queue_depth: usize,
}

impl<V, K, S> ProximaService<V, K, S, JsonCodec>
where
    V: IdentityVerifier,
    K: CacheTier + Clone,
    S: GeoStore + PrincipalStore + Clone,
{
    /// Wires the collaborators together.
    ///
    /// `cache` and `store` are shared by the presence tracker and the
    /// resolver, so they are usually `Arc`s.
    pub fn new(verifier: V, cache: K, store: S, config: &ServerConfig) -> Self {
        Self {
            authenticator: ConnectionAuthenticator::new(verifier, store.clone()),
            presence: PresenceTracker::new(cache.clone(), store.clone(), config.presence.clone()),
            resolver: ProximityResolver::new(
                GeoCache::new(cache, config.cache.clone()),
                store,
                config.proximity.clone(),
            ),
            registry: Arc::new(ConnectionRegistry::new()),
            codec: JsonCodec,
            idle_timeout: config.idle_timeout,
            queue_depth: config.location_queue_depth.max(1),
        }
    }
}

impl<V, K, S, C> ProximaService<V, K, S, C>
where
    V: IdentityVerifier,
    K: CacheTier,
    S: GeoStore + PrincipalStore,
    C: Codec,
{
    /// The registry of live, authenticated connections.
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    pub fn resolver(&self) -> &ProximityResolver<K, S> {
        &self.resolver
    }

    /// Drives one connection from handshake to close.
    ///
    /// Returns once the connection is closed. Location updates that are
    /// still being resolved at that point finish in the background and
    /// their results are discarded.
    pub async fn serve<T: Connection>(self: Arc<Self>, conn: T) -> Result<(), crate::ProximaError> {
        handle_connection(conn, self).await
    }
}
