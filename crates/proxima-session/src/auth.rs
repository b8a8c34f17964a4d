//! Connection authentication: handshake metadata in, principal out.
//!
//! Runs once per connection attempt, before any other handler. There are
//! no retries here; a rejected client reconnects with fresh metadata.

use std::time::Duration;

use proxima_protocol::Principal;
use proxima_store::PrincipalStore;
use proxima_transport::HandshakeMetadata;

use crate::{IdentityVerifier, SessionError};

/// Default upper bound on verification plus principal lookup.
pub const AUTH_TIMEOUT: Duration = Duration::from_secs(5);

/// Pulls the credential out of the handshake.
///
/// Looked for, in order: the `token` cookie (what browser clients send
/// after logging in), an `Authorization: Bearer …` header, then a `token`
/// query parameter. Empty values count as absent.
pub fn extract_token(metadata: &HandshakeMetadata) -> Option<&str> {
    let bearer = || {
        metadata
            .header("authorization")
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
    };

    metadata
        .cookie("token")
        .filter(|t| !t.is_empty())
        .or_else(|| bearer().filter(|t| !t.is_empty()))
        .or_else(|| metadata.query_param("token").filter(|t| !t.is_empty()))
}

/// Validates a new connection's credential and resolves its principal.
///
/// ```text
/// metadata ──extract_token──→ token ──verify──→ PrincipalId ──find_principal──→ Principal
///    │                          │                    │
///    └─ MissingCredential       └─ InvalidCredential └─ PrincipalNotFound / PrincipalUnavailable
/// ```
pub struct ConnectionAuthenticator<V, P> {
    verifier: V,
    principals: P,
    timeout: Duration,
}

impl<V: IdentityVerifier, P: PrincipalStore> ConnectionAuthenticator<V, P> {
    pub fn new(verifier: V, principals: P) -> Self {
        Self {
            verifier,
            principals,
            timeout: AUTH_TIMEOUT,
        }
    }

    /// Overrides the verification + lookup time budget.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Authenticates a connection from its handshake metadata.
    ///
    /// # Errors
    /// - [`SessionError::MissingCredential`]: no token in the handshake
    /// - [`SessionError::InvalidCredential`]: the verifier rejected it
    /// - [`SessionError::PrincipalNotFound`]: verified, but unknown
    /// - [`SessionError::PrincipalUnavailable`]: lookup failed or timed out
    pub async fn authenticate(
        &self,
        metadata: &HandshakeMetadata,
    ) -> Result<Principal, SessionError> {
        let token = extract_token(metadata).ok_or(SessionError::MissingCredential)?;

        tokio::time::timeout(self.timeout, self.resolve(token))
            .await
            .map_err(|_| {
                SessionError::PrincipalUnavailable(format!(
                    "timed out after {:?}",
                    self.timeout
                ))
            })?
    }

    async fn resolve(&self, token: &str) -> Result<Principal, SessionError> {
        let id = self.verifier.verify(token).await?;

        match self.principals.find_principal(&id).await {
            Ok(Some(principal)) => Ok(principal),
            Ok(None) => Err(SessionError::PrincipalNotFound(id)),
            Err(e) => Err(SessionError::PrincipalUnavailable(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_prefers_cookie() {
        let meta = HandshakeMetadata::new()
            .with_header("Cookie", "token=from-cookie")
            .with_header("Authorization", "Bearer from-header")
            .with_query("token=from-query");
        assert_eq!(extract_token(&meta), Some("from-cookie"));
    }

    #[test]
    fn test_extract_falls_back_to_bearer_then_query() {
        let meta = HandshakeMetadata::new()
            .with_header("Authorization", "Bearer from-header")
            .with_query("token=from-query");
        assert_eq!(extract_token(&meta), Some("from-header"));

        let meta = HandshakeMetadata::new().with_query("token=from-query");
        assert_eq!(extract_token(&meta), Some("from-query"));
    }

    #[test]
    fn test_extract_ignores_other_schemes_and_empty_values() {
        let meta = HandshakeMetadata::new()
            .with_header("Cookie", "token=")
            .with_header("Authorization", "Basic dTE6cHc=");
        assert_eq!(extract_token(&meta), None);
    }

    #[test]
    fn test_extract_without_metadata() {
        assert_eq!(extract_token(&HandshakeMetadata::new()), None);
    }
}
