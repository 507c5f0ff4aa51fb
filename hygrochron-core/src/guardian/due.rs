//! Timestamp-gated due-check

use crate::Millis;

/// Decides whether a periodic action should run this tick
///
/// Elapsed time is computed with wrapping subtraction, so a counter wrap
/// never stalls the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DueGate {
    interval_ms: u32,
    last_ms: Millis,
}

impl DueGate {
    /// Create a gate whose first interval counts from `now`
    pub const fn new(interval_ms: u32, now: Millis) -> Self {
        Self {
            interval_ms,
            last_ms: now,
        }
    }

    /// Time since the gate last fired
    pub fn elapsed(&self, now: Millis) -> u32 {
        now.wrapping_sub(self.last_ms)
    }

    /// Check without firing
    pub fn is_due(&self, now: Millis) -> bool {
        self.elapsed(now) >= self.interval_ms
    }

    /// Restart the interval at `now`
    pub fn mark(&mut self, now: Millis) {
        self.last_ms = now;
    }

    /// Fire if due, restarting the interval
    pub fn poll(&mut self, now: Millis) -> bool {
        if self.is_due(now) {
            self.mark(now);
            true
        } else {
            false
        }
    }

    pub fn interval_ms(&self) -> u32 {
        self.interval_ms
    }

    pub fn last_ms(&self) -> Millis {
        self.last_ms
    }
}
