//! Bounded retry with a fixed delay
//!
//! Replaces open-ended busy-wait loops: a probe runs at most `attempts`
//! times with `delay_ms` between consecutive probes, through an injected
//! [`Clock`] so the wait is testable without real time passing.

use serde::Deserialize;

use crate::traits::Clock;
use crate::Millis;

/// Attempt count and spacing for a bounded wait
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(default)]
pub struct RetryPolicy {
    /// Maximum number of probes
    pub attempts: u8,
    /// Delay between consecutive probes
    pub delay_ms: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(10, 1_000)
    }
}

impl RetryPolicy {
    pub const fn new(attempts: u8, delay_ms: u32) -> Self {
        Self { attempts, delay_ms }
    }

    /// Total time spent waiting when every probe fails
    pub fn window_ms(&self) -> u32 {
        let gaps = self.attempts.saturating_sub(1) as u32;
        gaps.saturating_mul(self.delay_ms)
    }
}

/// Context handed to each probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attempt {
    /// 1-based attempt number
    pub number: u8,
    /// Clock reading when the probe runs
    pub now_ms: Millis,
}

/// Result of a bounded retry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RetryOutcome {
    /// A probe succeeded on the given attempt
    Succeeded { attempts: u8 },
    /// Every probe failed
    Exhausted { attempts: u8 },
}

impl RetryOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RetryOutcome::Succeeded { .. })
    }
}

/// Run `probe` until it returns `true` or the policy is exhausted
///
/// No delay follows the final probe.
pub fn retry<C, F>(clock: &mut C, policy: &RetryPolicy, mut probe: F) -> RetryOutcome
where
    C: Clock + ?Sized,
    F: FnMut(Attempt) -> bool,
{
    for number in 1..=policy.attempts {
        let attempt = Attempt {
            number,
            now_ms: clock.now_ms(),
        };
        if probe(attempt) {
            return RetryOutcome::Succeeded { attempts: number };
        }
        if number < policy.attempts {
            clock.delay_ms(policy.delay_ms);
        }
    }

    RetryOutcome::Exhausted {
        attempts: policy.attempts,
    }
}
