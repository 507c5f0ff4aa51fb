//! Events that trigger link state transitions

/// Events observed by the network guardian
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkEvent {
    // Due-check results
    /// Status query reported an associated link
    LinkUp,
    /// Status query reported no link
    LinkDown,

    // Reconnect results
    /// Bounded reconnect brought the link back
    ReconnectSucceeded,
    /// Bounded reconnect timed out
    ReconnectFailed,
    /// Consecutive reconnect failures reached the configured limit
    FailureLimitReached,
}
