//! Process-wide registry of live connections.
//!
//! Owned by the server and handed to every connection task; there is no
//! global state. The active-connection count is observability only.

use std::collections::HashMap;
use std::time::Instant;

use proxima_protocol::{Principal, PrincipalId};
use proxima_transport::ConnectionId;
use tokio::sync::Mutex;

/// What the registry remembers about one authenticated connection.
#[derive(Debug, Clone)]
pub struct ConnectionRecord {
    pub principal: Principal,
    pub connected_at: Instant,
}

#[derive(Debug, Default)]
struct RegistryInner {
    connections: HashMap<ConnectionId, ConnectionRecord>,
    per_principal: HashMap<PrincipalId, usize>,
}

/// Tracks authenticated connections and their count.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    inner: Mutex<RegistryInner>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an authenticated connection. Returns the active count after
    /// the insert. Registering the same id twice replaces the record
    /// without double counting.
    pub async fn register(&self, id: ConnectionId, principal: Principal) -> usize {
        let mut inner = self.inner.lock().await;
        let principal_id = principal.id.clone();
        let record = ConnectionRecord {
            principal,
            connected_at: Instant::now(),
        };
        if let Some(previous) = inner.connections.insert(id, record) {
            decrement(&mut inner.per_principal, &previous.principal.id);
        }
        *inner.per_principal.entry(principal_id).or_insert(0) += 1;
        inner.connections.len()
    }

    /// Forgets a connection. Returns its record and the remaining active
    /// count, or `None` if it was never registered (or already removed).
    pub async fn unregister(&self, id: ConnectionId) -> Option<(ConnectionRecord, usize)> {
        let mut inner = self.inner.lock().await;
        let record = inner.connections.remove(&id)?;
        decrement(&mut inner.per_principal, &record.principal.id);
        Some((record, inner.connections.len()))
    }

    /// Number of authenticated connections right now.
    pub async fn active_count(&self) -> usize {
        self.inner.lock().await.connections.len()
    }

    /// Number of live connections held by one principal.
    pub async fn connections_for(&self, principal: &PrincipalId) -> usize {
        self.inner
            .lock()
            .await
            .per_principal
            .get(principal)
            .copied()
            .unwrap_or(0)
    }

    pub async fn get(&self, id: ConnectionId) -> Option<ConnectionRecord> {
        self.inner.lock().await.connections.get(&id).cloned()
    }
}

fn decrement(counts: &mut HashMap<PrincipalId, usize>, id: &PrincipalId) {
    if let Some(count) = counts.get_mut(id) {
        *count -= 1;
        if *count == 0 {
            counts.remove(id);
        }
    }
}
