//! Errors raised while accepting clients or moving frames.

use std::io;

/// Errors from the transport layer.
///
/// Once a connection is open, every failure means the channel is unusable;
/// the lifecycle layer treats all of them as a disconnect.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The listener could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// Accepting a TCP connection failed.
    #[error("accept failed: {0}")]
    Accept(#[source] io::Error),

    /// The client's upgrade request was malformed or the upgrade failed.
    #[error("handshake failed: {0}")]
    Handshake(String),

    /// The peer is gone.
    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    /// Writing a frame failed.
    #[error("send failed: {0}")]
    Send(String),

    /// Reading a frame failed.
    #[error("receive failed: {0}")]
    Receive(String),
}
