//! Per-connection lifecycle state machine.

use std::fmt;

/// The lifecycle state of one connection.
///
/// ```text
/// Connecting ──(auth ok)──→ Authenticated ──(online recorded)──→ Active
///     │                                                            │
///     └──────────(auth failed)──────→ Closed ←──(disconnect)───────┘
/// ```
///
/// There is no way back out of `Closed`: a reconnecting client is a new
/// connection and starts again at `Connecting`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    Connecting,
    Authenticated,
    Active,
    Closed,
}

impl ConnectionState {
    /// Returns `true` if `target` is a legal next state.
    pub fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Connecting, Self::Authenticated)
                | (Self::Connecting, Self::Closed)
                | (Self::Authenticated, Self::Active)
                | (Self::Active, Self::Closed)
        )
    }

    /// Location updates are only accepted while `Active`.
    pub fn accepts_location_updates(self) -> bool {
        matches!(self, Self::Active)
    }

    pub fn is_closed(self) -> bool {
        matches!(self, Self::Closed)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connecting => write!(f, "Connecting"),
            Self::Authenticated => write!(f, "Authenticated"),
            Self::Active => write!(f, "Active"),
            Self::Closed => write!(f, "Closed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ConnectionState::*;

    const ALL: [ConnectionState; 4] = [Connecting, Authenticated, Active, Closed];

    #[test]
    fn test_only_documented_transitions_are_allowed() {
        let allowed = [
            (Connecting, Authenticated),
            (Connecting, Closed),
            (Authenticated, Active),
            (Active, Closed),
        ];
        for from in ALL {
            for to in ALL {
                assert_eq!(
                    from.can_transition_to(to),
                    allowed.contains(&(from, to)),
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn test_closed_is_terminal() {
        for to in ALL {
            assert!(!Closed.can_transition_to(to));
        }
    }

    #[test]
    fn test_only_active_accepts_location_updates() {
        assert!(Active.accepts_location_updates());
        assert!(!Connecting.accepts_location_updates());
        assert!(!Authenticated.accepts_location_updates());
        assert!(!Closed.accepts_location_updates());
    }

    #[test]
    fn test_display() {
        assert_eq!(Authenticated.to_string(), "Authenticated");
        assert_eq!(Closed.to_string(), "Closed");
    }
}
