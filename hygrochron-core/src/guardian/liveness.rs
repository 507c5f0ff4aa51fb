//! Liveness feeder
//!
//! Wraps the hardware watchdog. The control loop feeds it first thing in
//! every tick, before any call that could stall.

use log::info;

use crate::config::WatchdogPolicy;
use crate::traits::Watchdog;

/// Watchdog wrapper that tracks feeds
pub struct LivenessFeeder<W> {
    watchdog: W,
    timeout_ms: u32,
    armed: bool,
    feeds: u32,
}

impl<W: Watchdog> LivenessFeeder<W> {
    pub fn new(watchdog: W, policy: &WatchdogPolicy) -> Self {
        Self {
            watchdog,
            timeout_ms: policy.timeout_ms,
            armed: false,
            feeds: 0,
        }
    }

    /// Start the hardware countdown
    pub fn arm(&mut self) {
        self.watchdog.arm(self.timeout_ms);
        self.armed = true;
        info!("Watchdog armed: {} ms", self.timeout_ms);
    }

    /// Reset the countdown
    pub fn feed(&mut self) {
        self.watchdog.feed();
        self.feeds = self.feeds.wrapping_add(1);
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    /// Feeds since boot (wrapping)
    pub fn feeds(&self) -> u32 {
        self.feeds
    }

    pub fn watchdog(&self) -> &W {
        &self.watchdog
    }
}
