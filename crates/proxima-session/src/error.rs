//! Error types for the session layer.

use proxima_protocol::PrincipalId;

use crate::ConnectionState;

/// Errors that can occur while authenticating or driving a connection.
///
/// The first four variants are authentication failures: they are fatal to
/// the connection attempt and never retried here.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The handshake carried no credential.
    #[error("authentication required")]
    MissingCredential,

    /// The credential was present but did not verify.
    #[error("invalid credential: {0}")]
    InvalidCredential(String),

    /// The credential verified, but its principal no longer exists.
    #[error("principal {0} not found")]
    PrincipalNotFound(PrincipalId),

    /// The principal could not be looked up (store failure or timeout).
    #[error("authentication failed: {0}")]
    PrincipalUnavailable(String),

    /// A lifecycle transition that the state machine does not allow.
    #[error("invalid connection transition {from} -> {to}")]
    InvalidTransition {
        from: ConnectionState,
        to: ConnectionState,
    },

    /// A principal was already attached to this connection.
    #[error("connection already has principal {0}")]
    PrincipalAlreadyAttached(PrincipalId),
}

impl SessionError {
    /// Returns `true` for the authentication-failure variants.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            Self::MissingCredential
                | Self::InvalidCredential(_)
                | Self::PrincipalNotFound(_)
                | Self::PrincipalUnavailable(_)
        )
    }
}
