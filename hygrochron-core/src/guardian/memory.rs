//! Memory guardian
//!
//! Advisory only: a low heap is logged and surfaced on the display, never
//! remediated. The guardian exists to make a leak regression visible.

use log::warn;

use crate::config::MemoryPolicy;
use crate::guardian::DueGate;
use crate::traits::Platform;
use crate::Millis;

/// One heap sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MemoryState {
    pub free_bytes: u32,
    pub min_free_bytes: u32,
    pub last_check: Millis,
}

/// Result of a memory due-check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MemoryCheck {
    /// Throttled; no sample taken
    NotDue,
    /// Free heap at or above the low-water mark
    Ok(MemoryState),
    /// Free heap below the low-water mark
    Low(MemoryState),
}

/// Throttled heap monitor
#[derive(Debug, Clone)]
pub struct MemoryGuardian {
    policy: MemoryPolicy,
    gate: DueGate,
    last: Option<MemoryState>,
}

impl MemoryGuardian {
    pub fn new(policy: MemoryPolicy, now: Millis) -> Self {
        Self {
            policy,
            gate: DueGate::new(policy.check_interval_ms, now),
            last: None,
        }
    }

    /// Sample the heap if the throttle interval has elapsed
    pub fn poll<P: Platform + ?Sized>(&mut self, now: Millis, platform: &P) -> MemoryCheck {
        if !self.gate.poll(now) {
            return MemoryCheck::NotDue;
        }

        let sample = MemoryState {
            free_bytes: platform.free_heap(),
            min_free_bytes: platform.min_free_heap(),
            last_check: now,
        };
        self.last = Some(sample);

        if self.is_below_mark(&sample) {
            warn!(
                "Low memory! Free: {} bytes, Min: {} bytes",
                sample.free_bytes, sample.min_free_bytes
            );
            MemoryCheck::Low(sample)
        } else {
            MemoryCheck::Ok(sample)
        }
    }

    /// Latest sample, if any was taken
    pub fn last_sample(&self) -> Option<&MemoryState> {
        self.last.as_ref()
    }

    /// Whether the latest sample was below the low-water mark
    pub fn is_low(&self) -> bool {
        self.last.as_ref().map_or(false, |s| self.is_below_mark(s))
    }

    fn is_below_mark(&self, sample: &MemoryState) -> bool {
        sample.free_bytes < self.policy.low_water_bytes
    }
}
