//! Link state definition

use super::events::LinkEvent;

/// Link states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkState {
    /// Associated with the access point
    Connected,
    /// Not associated; reconnects are attempted at each due-check
    Disconnected,
    /// Failure limit reached; device restart requested
    Restarting,
}

impl LinkState {
    /// Check if the link is up
    pub fn is_connected(&self) -> bool {
        matches!(self, LinkState::Connected)
    }

    /// Check if this is the terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, LinkState::Restarting)
    }

    /// Process an event and return the next state
    pub fn transition(self, event: LinkEvent) -> Self {
        use LinkEvent::*;
        use LinkState::*;

        match (self, event) {
            // Terminal, absorbs everything
            (Restarting, _) => Restarting,

            (_, FailureLimitReached) => Restarting,

            (_, LinkUp) | (_, ReconnectSucceeded) => Connected,
            (_, LinkDown) | (_, ReconnectFailed) => Disconnected,
        }
    }
}
