//! `ProximaServer` builder and accept loop.
//!
//! This is the entry point for running a Proxima server. It ties the
//! layers together: transport → session → presence / proximity.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use proxima_cache::CacheTier;
use proxima_protocol::{Codec, JsonCodec};
use proxima_session::{ConnectionRegistry, IdentityVerifier};
use proxima_store::{GeoStore, PrincipalStore};
use proxima_transport::{PendingConnection, Transport, WebSocketTransport};

use crate::handler::handle_connection;
use crate::{ProximaError, ProximaService, ServerConfig};

/// Builder for configuring and starting a Proxima server.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
///
/// use proxima::prelude::*;
///
/// # async fn start() -> Result<(), ProximaError> {
/// let store = Arc::new(MemoryStore::new());
/// let server = ProximaServer::builder()
///     .bind("0.0.0.0:5000")
///     .build(
///         JwtVerifier::hs256(b"secret"),
///         Arc::new(MemoryCacheTier::new()),
///         store,
///     )
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct ProximaServerBuilder {
    config: ServerConfig,
}

impl ProximaServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Sets how long a client may take to finish the WebSocket upgrade.
    pub fn handshake_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.config.handshake_timeout = timeout;
        self
    }

    /// Sets how long a silent connection is kept open.
    pub fn idle_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.config.idle_timeout = timeout;
        self
    }

    /// Binds the listener and wires the collaborators.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build<V, K, S>(
        self,
        verifier: V,
        cache: K,
        store: S,
    ) -> Result<ProximaServer<V, K, S, JsonCodec>, ProximaError>
    where
        V: IdentityVerifier,
        K: CacheTier + Clone,
        S: GeoStore + PrincipalStore + Clone,
    {
        let transport = WebSocketTransport::bind(&self.config.bind_addr).await?;
        let service = Arc::new(ProximaService::new(verifier, cache, store, &self.config));

        Ok(ProximaServer {
            transport,
            service,
            handshake_timeout: self.config.handshake_timeout,
        })
    }
}

impl Default for ProximaServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Proxima server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct ProximaServer<V, K, S, C = JsonCodec> {
    transport: WebSocketTransport,
    service: Arc<ProximaService<V, K, S, C>>,
    handshake_timeout: Duration,
}

impl ProximaServer<(), (), (), JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> ProximaServerBuilder {
        ProximaServerBuilder::new()
    }
}

impl<V, K, S, C> ProximaServer<V, K, S, C>
where
    V: IdentityVerifier,
    K: CacheTier,
    S: GeoStore + PrincipalStore,
    C: Codec,
{
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// The registry of live connections, for observation.
    pub fn registry(&self) -> Arc<ConnectionRegistry> {
        Arc::clone(self.service.registry())
    }

    pub fn service(&self) -> &Arc<ProximaService<V, K, S, C>> {
        &self.service
    }

    /// Runs the accept loop until the process is terminated.
    pub async fn run(self) -> Result<(), ProximaError> {
        self.run_until(std::future::pending()).await
    }

    /// Runs the accept loop until `shutdown` completes.
    ///
    /// The loop itself only takes sockets off the listener. Each client's
    /// upgrade runs on that client's task under `handshake_timeout`, so a
    /// peer that stalls mid-handshake delays nobody else.
    ///
    /// Connections that are already open keep running to completion; only
    /// new connections stop being accepted.
    pub async fn run_until(
        mut self,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), ProximaError> {
        tokio::pin!(shutdown);
        tracing::info!(addr = ?self.local_addr().ok(), "Proxima server running");

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    tracing::info!("shutdown requested, no longer accepting connections");
                    self.transport.shutdown().await?;
                    return Ok(());
                }
                accepted = self.transport.accept() => match accepted {
                    Ok(pending) => {
                        tokio::spawn(serve_pending(
                            pending,
                            Arc::clone(&self.service),
                            self.handshake_timeout,
                        ));
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "accept failed");
                    }
                },
            }
        }
    }
}

/// Upgrades one accepted socket and hands it to the connection handler.
async fn serve_pending<P, V, K, S, C>(
    pending: P,
    service: Arc<ProximaService<V, K, S, C>>,
    handshake_timeout: Duration,
) where
    P: PendingConnection,
    V: IdentityVerifier,
    K: CacheTier,
    S: GeoStore + PrincipalStore,
    C: Codec,
{
    let conn = match tokio::time::timeout(handshake_timeout, pending.upgrade()).await {
        Ok(Ok(conn)) => conn,
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "client handshake failed");
            return;
        }
        Err(_) => {
            tracing::warn!(timeout = ?handshake_timeout, "client handshake timed out, dropping socket");
            return;
        }
    };

    if let Err(e) = handle_connection(conn, service).await {
        tracing::debug!(error = %e, "connection ended with error");
    }
}
