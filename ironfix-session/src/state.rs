/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Session state machine.
//!
//! Sessions move through five states named directly after the protocol
//! events that drive them (not the transport's connect/disconnect
//! lifecycle): a session exists in `Active` the moment its transport
//! connects, before any FIX-level Logon has been exchanged.

use std::fmt;

/// The state of a FIX session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Transport is connected; no Logon exchange has completed yet.
    Active,
    /// Logon exchange completed; normal message flow and heartbeating.
    Opened,
    /// A local `HandleShutdown` sent Logout and started the logout timer;
    /// waiting for the counterparty's Logout or timer expiry.
    Closing,
    /// Logout exchange is complete; the transport has not yet disconnected.
    Closed,
    /// Transport has disconnected; the session object may be discarded or
    /// reused for a fresh `Active` cycle.
    Shutdown,
}

impl SessionState {
    /// Returns true if the session accepts application message traffic.
    #[must_use]
    pub const fn is_opened(self) -> bool {
        matches!(self, Self::Opened)
    }

    /// Returns true if the session has fully wound down.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Shutdown)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Active => "Active",
            Self::Opened => "Opened",
            Self::Closing => "Closing",
            Self::Closed => "Closed",
            Self::Shutdown => "Shutdown",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_state_predicates() {
        assert!(SessionState::Opened.is_opened());
        assert!(!SessionState::Active.is_opened());
        assert!(SessionState::Shutdown.is_terminal());
        assert!(!SessionState::Closed.is_terminal());
    }

    #[test]
    fn test_session_state_display() {
        assert_eq!(SessionState::Opened.to_string(), "Opened");
        assert_eq!(SessionState::Closing.to_string(), "Closing");
    }
}
