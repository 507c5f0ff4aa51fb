//! Platform services: monotonic clock, heap statistics, watchdog, reset

use crate::Millis;

/// Monotonic millisecond clock with a blocking delay
pub trait Clock {
    /// Milliseconds since boot (wrapping)
    fn now_ms(&self) -> Millis;

    /// Block for `ms` milliseconds
    fn delay_ms(&mut self, ms: u32);
}

/// Platform services beyond the clock
pub trait Platform: Clock {
    /// Currently free heap in bytes
    fn free_heap(&self) -> u32;

    /// Lowest free heap seen since boot
    fn min_free_heap(&self) -> u32;

    /// Reset the device
    ///
    /// On hardware this does not return. Test and host implementations
    /// may record the call and return; the control loop treats the
    /// device as halted afterwards either way.
    fn restart(&mut self);
}

/// Hardware watchdog
///
/// Expiry resets the device; there is no software callback.
pub trait Watchdog {
    /// Start the watchdog with the given timeout
    fn arm(&mut self, timeout_ms: u32);

    /// Reset the countdown
    fn feed(&mut self);
}
