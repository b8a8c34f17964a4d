//! Credential validation: opaque token in, verified principal id out.
//!
//! Proxima doesn't issue credentials. Whatever signs clients in (a login
//! endpoint, an identity provider) hands them a token; the
//! [`IdentityVerifier`] decides whether that token is genuine and whose it
//! is. It is called exactly once per connection.

use std::collections::HashMap;
use std::future::Future;

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use proxima_protocol::PrincipalId;
use serde::Deserialize;

use crate::SessionError;

/// Validates a credential and returns the principal it was issued to.
///
/// # Example
///
/// ```rust
/// use proxima_protocol::PrincipalId;
/// use proxima_session::{IdentityVerifier, SessionError};
///
/// /// Accepts `user:<id>` tokens. Development only.
/// struct PrefixVerifier;
///
/// impl IdentityVerifier for PrefixVerifier {
///     async fn verify(&self, token: &str) -> Result<PrincipalId, SessionError> {
///         token
///             .strip_prefix("user:")
///             .map(PrincipalId::new)
///             .ok_or_else(|| SessionError::InvalidCredential("unknown scheme".into()))
///     }
/// }
/// ```
pub trait IdentityVerifier: Send + Sync + 'static {
    /// # Errors
    /// [`SessionError::InvalidCredential`] if the token does not verify.
    fn verify(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<PrincipalId, SessionError>> + Send;
}

// ---------------------------------------------------------------------------
// JwtVerifier
// ---------------------------------------------------------------------------

/// Claims carried by the login token.
#[derive(Debug, Deserialize)]
struct Claims {
    id: String,
}

/// Verifies HS256 JSON Web Tokens whose `id` claim names the principal.
///
/// Signature and `exp` are checked; an expired or tampered token is an
/// [`SessionError::InvalidCredential`].
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    /// Creates a verifier for tokens signed with the shared `secret`.
    pub fn hs256(secret: &[u8]) -> Self {
        Self {
            key: DecodingKey::from_secret(secret),
            validation: Validation::new(Algorithm::HS256),
        }
    }
}

impl IdentityVerifier for JwtVerifier {
    async fn verify(&self, token: &str) -> Result<PrincipalId, SessionError> {
        let data = decode::<Claims>(token, &self.key, &self.validation)
            .map_err(|e| SessionError::InvalidCredential(e.to_string()))?;
        Ok(PrincipalId(data.claims.id))
    }
}

// ---------------------------------------------------------------------------
// StaticTokenVerifier
// ---------------------------------------------------------------------------

/// A fixed token → principal table, for development and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenVerifier {
    tokens: HashMap<String, PrincipalId>,
}

impl StaticTokenVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts `token` as a credential for `principal`.
    pub fn with_token(mut self, token: impl Into<String>, principal: impl Into<String>) -> Self {
        self.tokens
            .insert(token.into(), PrincipalId::new(principal));
        self
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl IdentityVerifier for StaticTokenVerifier {
    async fn verify(&self, token: &str) -> Result<PrincipalId, SessionError> {
        self.tokens
            .get(token)
            .cloned()
            .ok_or_else(|| SessionError::InvalidCredential("unknown token".into()))
    }
}
