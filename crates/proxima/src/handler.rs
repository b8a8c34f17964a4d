//! Per-connection handler: authentication, location updates, disconnect.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Authenticate from the handshake metadata, or send `connectError`
//!      and close
//!   2. Register the connection, mark the principal online, go `Active`
//!   3. Loop: receive frames, queue location updates for the worker.
//!      Any frame, keep-alives included, restarts the idle timer.
//!   4. On disconnect: close the context, unregister, mark offline
//!
//! Updates are resolved by a separate worker task, one at a time and in
//! arrival order, so the receive loop notices a disconnect even while a
//! resolve is in flight. Whatever the worker produces after the context
//! closes is dropped.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use proxima_cache::CacheTier;
use proxima_protocol::{
    ClientEvent, Codec, ErrorPayload, LocationSample, Principal, PrincipalId, ServerEvent,
};
use proxima_session::{ConnectionContext, IdentityVerifier, SessionError};
use proxima_store::{GeoStore, PrincipalStore};
use proxima_transport::{Connection, Frame};
use tokio::sync::mpsc;

use crate::{ProximaError, ProximaService};

/// Message carried by `locationUpdateError`.
pub const LOCATION_UPDATE_FAILED: &str = "Failed to update location";

/// Work queued for the location worker, in arrival order.
enum Inbound {
    Update(LocationSample),
    Rejected(String),
}

/// Marks the principal offline when the handler exits.
///
/// The normal path calls [`disconnect`](Self::disconnect). If the handler
/// unwinds instead, `Drop` spawns the same cleanup since it cannot await.
struct DisconnectGuard<V, K, S, C>
where
    V: IdentityVerifier,
    K: CacheTier,
    S: GeoStore + PrincipalStore,
    C: Codec,
{
    cleanup: Option<Disconnect<V, K, S, C>>,
}

struct Disconnect<V, K, S, C> {
    service: Arc<ProximaService<V, K, S, C>>,
    ctx: Arc<ConnectionContext>,
    principal: PrincipalId,
}

impl<V, K, S, C> Disconnect<V, K, S, C>
where
    V: IdentityVerifier,
    K: CacheTier,
    S: GeoStore + PrincipalStore,
    C: Codec,
{
    async fn run(self) {
        let conn_id = self.ctx.id();
        if let Err(e) = self.ctx.close() {
            tracing::debug!(%conn_id, error = %e, "context not closed cleanly");
        }

        match self.service.registry.unregister(conn_id).await {
            Some((record, active)) => tracing::info!(
                %conn_id,
                principal = %self.principal,
                active,
                connected_for = ?record.connected_at.elapsed(),
                "connection closed"
            ),
            None => tracing::debug!(%conn_id, "connection was not registered"),
        }

        self.service.presence.set_offline(&self.principal).await;
    }
}

impl<V, K, S, C> DisconnectGuard<V, K, S, C>
where
    V: IdentityVerifier,
    K: CacheTier,
    S: GeoStore + PrincipalStore,
    C: Codec,
{
    fn new(
        service: Arc<ProximaService<V, K, S, C>>,
        ctx: Arc<ConnectionContext>,
        principal: PrincipalId,
    ) -> Self {
        Self {
            cleanup: Some(Disconnect {
                service,
                ctx,
                principal,
            }),
        }
    }

    async fn disconnect(mut self) {
        if let Some(cleanup) = self.cleanup.take() {
            cleanup.run().await;
        }
    }
}

impl<V, K, S, C> Drop for DisconnectGuard<V, K, S, C>
where
    V: IdentityVerifier,
    K: CacheTier,
    S: GeoStore + PrincipalStore,
    C: Codec,
{
    fn drop(&mut self) {
        if let Some(cleanup) = self.cleanup.take() {
            tokio::spawn(cleanup.run());
        }
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<T, V, K, S, C>(
    conn: T,
    service: Arc<ProximaService<V, K, S, C>>,
) -> Result<(), ProximaError>
where
    T: Connection,
    V: IdentityVerifier,
    K: CacheTier,
    S: GeoStore + PrincipalStore,
    C: Codec,
{
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    let ctx = Arc::new(ConnectionContext::new(conn_id));
    tracing::debug!(%conn_id, "handling new connection");

    // --- Step 1: Authenticate ---
    let principal = match service.authenticator.authenticate(conn.metadata()).await {
        Ok(principal) => principal,
        Err(e) => {
            refuse(&*conn, &ctx, &service.codec, &e).await;
            return Err(e.into());
        }
    };
    ctx.attach(principal.clone())?;

    let active = service.registry.register(conn_id, principal.clone()).await;
    let guard = DisconnectGuard::new(Arc::clone(&service), Arc::clone(&ctx), principal.id.clone());
    tracing::info!(%conn_id, principal = %principal.id, active, "connection authenticated");

    // --- Step 2: Online ---
    service.presence.set_online(&principal.id).await;
    ctx.activate()?;

    // --- Step 3: Receive loop ---
    let (outbox, inbox) = mpsc::channel(service.queue_depth);
    tokio::spawn(location_worker(
        Arc::clone(&conn),
        Arc::clone(&ctx),
        Arc::clone(&service),
        principal.clone(),
        inbox,
    ));

    loop {
        let frame = match tokio::time::timeout(service.idle_timeout, conn.recv()).await {
            Ok(Ok(Some(Frame::Data(frame)))) => frame,
            Ok(Ok(Some(Frame::KeepAlive))) => {
                tracing::trace!(%conn_id, "keep-alive");
                continue;
            }
            Ok(Ok(None)) => {
                tracing::debug!(%conn_id, principal = %principal.id, "connection closed by client");
                break;
            }
            Ok(Err(e)) => {
                tracing::warn!(%conn_id, principal = %principal.id, error = %e, "connection error");
                break;
            }
            Err(_) => {
                tracing::info!(%conn_id, principal = %principal.id, "connection idle, closing");
                break;
            }
        };

        // The context only closes after this loop exits; the worker and
        // `emit` check for that.
        let item = match service.codec.decode::<ClientEvent>(&frame) {
            Ok(ClientEvent::UpdateLocation(sample)) => Inbound::Update(sample),
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "rejected malformed frame");
                Inbound::Rejected(format!("{LOCATION_UPDATE_FAILED}: {e}"))
            }
        };

        if outbox.send(item).await.is_err() {
            tracing::warn!(%conn_id, "location worker stopped, closing connection");
            break;
        }
    }

    // --- Step 4: Disconnect ---
    drop(outbox);
    guard.disconnect().await;
    if let Err(e) = conn.close().await {
        tracing::debug!(%conn_id, error = %e, "close after disconnect failed");
    }

    Ok(())
}

/// Resolves queued updates one at a time and emits the answers.
async fn location_worker<T, V, K, S, C>(
    conn: Arc<T>,
    ctx: Arc<ConnectionContext>,
    service: Arc<ProximaService<V, K, S, C>>,
    principal: Principal,
    mut inbox: mpsc::Receiver<Inbound>,
) where
    T: Connection,
    V: IdentityVerifier,
    K: CacheTier,
    S: GeoStore + PrincipalStore,
    C: Codec,
{
    while let Some(item) = inbox.recv().await {
        if !ctx.is_active() {
            tracing::debug!(conn_id = %ctx.id(), "connection closed, dropping queued updates");
            break;
        }

        let event = match item {
            Inbound::Update(sample) => {
                match AssertUnwindSafe(service.resolver.resolve(&principal, sample))
                    .catch_unwind()
                    .await
                {
                    Ok(result) => ServerEvent::NearbyLocations(result),
                    Err(_) => {
                        tracing::error!(principal = %principal.id, ?sample, "proximity resolution panicked");
                        ServerEvent::LocationUpdateError(ErrorPayload::new(LOCATION_UPDATE_FAILED))
                    }
                }
            }
            Inbound::Rejected(message) => {
                ServerEvent::LocationUpdateError(ErrorPayload::new(message))
            }
        };

        emit(&*conn, &ctx, &service.codec, &event).await;
    }
}

/// Sends `event` if the connection is still active; otherwise drops it.
async fn emit<T: Connection, C: Codec>(
    conn: &T,
    ctx: &ConnectionContext,
    codec: &C,
    event: &ServerEvent,
) {
    if !ctx.is_active() {
        tracing::debug!(conn_id = %ctx.id(), event = event.name(), "connection closed, discarding emit");
        return;
    }

    let bytes = match codec.encode(event) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(conn_id = %ctx.id(), event = event.name(), error = %e, "failed to encode event");
            return;
        }
    };

    if let Err(e) = conn.send(&bytes).await {
        tracing::debug!(conn_id = %ctx.id(), event = event.name(), error = %e, "emit failed");
    }
}

/// Tells the client why it was refused, then closes.
async fn refuse<T: Connection, C: Codec>(
    conn: &T,
    ctx: &ConnectionContext,
    codec: &C,
    err: &SessionError,
) {
    let conn_id = conn.id();
    tracing::warn!(%conn_id, error = %err, "connection refused");

    match codec.encode(&ServerEvent::ConnectError(ErrorPayload::new(err.to_string()))) {
        Ok(bytes) => {
            if let Err(e) = conn.send(&bytes).await {
                tracing::debug!(%conn_id, error = %e, "failed to send connectError");
            }
        }
        Err(e) => tracing::warn!(%conn_id, error = %e, "failed to encode connectError"),
    }

    if let Err(e) = conn.close().await {
        tracing::debug!(%conn_id, error = %e, "close after refusal failed");
    }
    if let Err(e) = ctx.close() {
        tracing::debug!(%conn_id, error = %e, "context not closed cleanly");
    }
}
