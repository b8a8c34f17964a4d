//! Transport abstraction layer for Proxima.
//!
//! Provides the [`Transport`] and [`Connection`] traits that abstract over
//! the duplex, per-client channel the proximity service talks through.
//! The wire framing is the transport's business; everything above this
//! crate sees whole messages as bytes plus the [`HandshakeMetadata`] the
//! client presented when the channel opened.
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket transport via `tokio-tungstenite`

mod error;
mod metadata;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
pub use metadata::HandshakeMetadata;
#[cfg(feature = "websocket")]
pub use websocket::{PendingWebSocket, WebSocketConnection, WebSocketTransport};

use std::fmt;
use std::future::Future;

/// Process-unique id of one client channel. Two sockets opened by the
/// same principal get different ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Source of client channels.
///
/// `accept` only takes the raw socket off the listener. The opening
/// handshake runs later, in [`PendingConnection::upgrade`], so the caller
/// can move it onto the client's own task and bound it with a timeout. A
/// peer that never finishes its handshake must not hold up the next one.
pub trait Transport: Send + Sync + 'static {
    type Pending: PendingConnection<Connection = Self::Connection, Error = Self::Error>;
    type Connection: Connection;
    type Error: std::error::Error + Send + Sync;

    /// Waits for the next client socket.
    fn accept(
        &mut self,
    ) -> impl Future<Output = Result<Self::Pending, Self::Error>> + Send;

    /// Stops handing out connections. Channels already accepted are left
    /// to their own tasks.
    fn shutdown(
        &self,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// A client socket whose opening handshake has not run yet.
///
/// Dropping it (for example when a timeout fires around `upgrade`) closes
/// the socket.
pub trait PendingConnection: Send + 'static {
    type Connection: Connection;
    type Error: std::error::Error + Send + Sync;

    /// Runs the handshake. On success the connection carries the
    /// [`HandshakeMetadata`] the client presented.
    fn upgrade(self) -> impl Future<Output = Result<Self::Connection, Self::Error>> + Send;
}

/// One inbound unit from a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A whole application message.
    Data(Vec<u8>),
    /// A liveness signal with no payload for the application, such as a
    /// WebSocket ping. It still counts as activity.
    KeepAlive,
}

/// One client's duplex channel.
///
/// Shared behind an `Arc` by the receive loop and the location worker, so
/// `send` and `recv` must not block each other.
pub trait Connection: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Writes one whole frame.
    fn send(
        &self,
        data: &[u8],
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Reads the next frame. `Ok(None)` means the client went away
    /// cleanly.
    fn recv(
        &self,
    ) -> impl Future<Output = Result<Option<Frame>, Self::Error>> + Send;

    /// Tears the channel down from the server side.
    fn close(&self) -> impl Future<Output = Result<(), Self::Error>> + Send;

    fn id(&self) -> ConnectionId;

    /// Headers and query string of the opening request.
    fn metadata(&self) -> &HandshakeMetadata;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_formats_for_logs() {
        let id = ConnectionId::new(7);
        assert_eq!(id.into_inner(), 7);
        assert_eq!(format!("{id}"), "conn-7");
    }

    #[test]
    fn test_connection_id_hash_works_as_map_key() {
        use std::collections::HashMap;
        let mut map = HashMap::new();
        map.insert(ConnectionId::new(1), "u1");
        map.insert(ConnectionId::new(2), "u2");
        assert_eq!(map[&ConnectionId::new(1)], "u1");
    }
}
