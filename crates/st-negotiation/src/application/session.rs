//! Connected-identity session state.

use crate::domain::Identity;
use parking_lot::RwLock;

/// Identity and connection flag published by the wallet layer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionState {
    /// Connected identity, if any.
    pub identity: Option<Identity>,
    /// Whether the wallet reports a live connection.
    pub connected: bool,
}

impl SessionState {
    /// A connected session for `identity`.
    pub fn connected(identity: Identity) -> Self {
        Self {
            identity: Some(identity),
            connected: true,
        }
    }

    /// Identity, but only while connected.
    pub fn active_identity(&self) -> Option<&Identity> {
        if self.connected {
            self.identity.as_ref()
        } else {
            None
        }
    }
}

/// Session state shared by the engine.
#[derive(Debug, Default)]
pub struct SessionContext {
    state: RwLock<SessionState>,
}

impl SessionContext {
    /// Replace the state, returning the previous one.
    pub fn replace(&self, state: SessionState) -> SessionState {
        std::mem::replace(&mut *self.state.write(), state)
    }

    /// Whether a session is connected.
    pub fn is_connected(&self) -> bool {
        self.state.read().active_identity().is_some()
    }

    /// Connected identity.
    pub fn identity(&self) -> Option<Identity> {
        self.state.read().active_identity().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_disconnected() {
        let ctx = SessionContext::default();
        assert!(!ctx.is_connected());
        assert!(ctx.identity().is_none());
    }

    #[test]
    fn test_identity_requires_connected_flag() {
        let ctx = SessionContext::default();
        ctx.replace(SessionState {
            identity: Some(Identity::new("0xA")),
            connected: false,
        });
        assert!(ctx.identity().is_none());

        let previous = ctx.replace(SessionState::connected(Identity::new("0xA")));
        assert!(!previous.connected);
        assert_eq!(ctx.identity(), Some(Identity::new("0xa")));
    }
}
