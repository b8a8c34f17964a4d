//! Connection authentication and lifecycle for Proxima.
//!
//! This crate handles everything about a connection except moving bytes
//! and answering location queries:
//!
//! 1. **Credential validation**: [`IdentityVerifier`] turns an opaque
//!    token into a [`PrincipalId`](proxima_protocol::PrincipalId)
//!    ([`JwtVerifier`], [`StaticTokenVerifier`]).
//! 2. **Authentication**: [`ConnectionAuthenticator`] pulls the token out
//!    of the handshake metadata, verifies it, and resolves the principal.
//! 3. **Lifecycle**: [`ConnectionContext`] walks one connection through
//!    [`ConnectionState`] and holds its principal.
//! 4. **Registry**: [`ConnectionRegistry`] knows who is connected and
//!    keeps the active-connection count.
//!
//! # How it fits in the stack
//!
//! ```text
//! Lifecycle manager (proxima)  ← drives authentication and state per connection
//!     ↕
//! Session layer (this crate)   ← identity, state machine, registry
//!     ↕
//! Transport + Store (below)    ← handshake metadata, principal lookup
//! ```

mod auth;
mod context;
mod error;
mod registry;
mod state;
mod verifier;

pub use auth::{AUTH_TIMEOUT, ConnectionAuthenticator, extract_token};
pub use context::ConnectionContext;
pub use error::SessionError;
pub use registry::{ConnectionRecord, ConnectionRegistry};
pub use state::ConnectionState;
pub use verifier::{IdentityVerifier, JwtVerifier, StaticTokenVerifier};
