//! Unified error type for Proxima.

use proxima_cache::CacheError;
use proxima_protocol::ProtocolError;
use proxima_session::SessionError;
use proxima_store::StoreError;
use proxima_transport::TransportError;

use crate::ConfigError;

/// Top-level error that wraps every crate-specific error.
///
/// Only startup and authentication failures travel this far: once a
/// connection is active, cache, store, and presence failures are absorbed
/// by the layer that hit them.
#[derive(Debug, thiserror::Error)]
pub enum ProximaError {
    /// Binding or accepting connections failed.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A frame could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Authentication or a lifecycle transition failed.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The store could not be seeded.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The cache tier could not be reached at startup.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// The configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
