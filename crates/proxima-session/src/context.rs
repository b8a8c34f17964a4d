//! Per-connection context: identity, state, and creation time.

use std::sync::OnceLock;
use std::time::Instant;

use proxima_protocol::Principal;
use proxima_transport::ConnectionId;
use tokio::sync::watch;

use crate::{ConnectionState, SessionError};

/// The server's view of one connection, independent of its transport.
///
/// The principal is attached exactly once, on the
/// `Connecting → Authenticated` transition, and never changes afterwards.
/// State changes are atomic check-and-set operations, so concurrent
/// tasks (the receive loop and the location worker) agree on whether the
/// connection is still `Active`.
#[derive(Debug)]
pub struct ConnectionContext {
    id: ConnectionId,
    created_at: Instant,
    principal: OnceLock<Principal>,
    state: watch::Sender<ConnectionState>,
}

impl ConnectionContext {
    /// Creates a context in the `Connecting` state.
    pub fn new(id: ConnectionId) -> Self {
        let (state, _) = watch::channel(ConnectionState::Connecting);
        Self {
            id,
            created_at: Instant::now(),
            principal: OnceLock::new(),
            state,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Shorthand for `state().accepts_location_updates()`.
    pub fn is_active(&self) -> bool {
        self.state().accepts_location_updates()
    }

    /// The attached principal, once authenticated.
    pub fn principal(&self) -> Option<&Principal> {
        self.principal.get()
    }

    /// Watches state changes (e.g. to stop work once `Closed`).
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// Attaches the authenticated principal: `Connecting → Authenticated`.
    ///
    /// # Errors
    /// - [`SessionError::PrincipalAlreadyAttached`] on a second attach
    /// - [`SessionError::InvalidTransition`] if not `Connecting`
    pub fn attach(&self, principal: Principal) -> Result<(), SessionError> {
        if let Some(existing) = self.principal.get() {
            return Err(SessionError::PrincipalAlreadyAttached(existing.id.clone()));
        }
        let from = self.state();
        if !from.can_transition_to(ConnectionState::Authenticated) {
            return Err(SessionError::InvalidTransition {
                from,
                to: ConnectionState::Authenticated,
            });
        }
        self.principal
            .set(principal)
            .map_err(|p| SessionError::PrincipalAlreadyAttached(p.id))?;
        self.transition(ConnectionState::Authenticated)
    }

    /// `Authenticated → Active`.
    pub fn activate(&self) -> Result<(), SessionError> {
        self.transition(ConnectionState::Active)
    }

    /// `Connecting → Closed` (refused) or `Active → Closed` (disconnected).
    pub fn close(&self) -> Result<(), SessionError> {
        self.transition(ConnectionState::Closed)
    }

    fn transition(&self, to: ConnectionState) -> Result<(), SessionError> {
        let mut result = Ok(());
        self.state.send_if_modified(|current| {
            if current.can_transition_to(to) {
                tracing::trace!(conn_id = %self.id, from = %current, %to, "connection state change");
                *current = to;
                true
            } else {
                result = Err(SessionError::InvalidTransition { from: *current, to });
                false
            }
        });
        result
    }
}
