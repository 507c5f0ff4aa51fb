//! Watchdog thread
//!
//! Once armed, a background thread aborts the process if the control loop
//! stops feeding for longer than the timeout, the same way the hardware
//! watchdog resets the board.

use std::process;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use hygrochron_core::traits::Watchdog;
use log::error;

/// How often the watchdog thread checks the last feed
const POLL: Duration = Duration::from_millis(250);

#[derive(Debug, Default)]
pub struct ThreadWatchdog {
    last_feed: Option<Arc<Mutex<Instant>>>,
}

impl ThreadWatchdog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Watchdog for ThreadWatchdog {
    fn arm(&mut self, timeout_ms: u32) {
        if self.last_feed.is_some() {
            return;
        }
        let last_feed = Arc::new(Mutex::new(Instant::now()));
        let watched = Arc::clone(&last_feed);
        let timeout = Duration::from_millis(u64::from(timeout_ms));

        thread::spawn(move || loop {
            thread::sleep(POLL);
            let starved = match watched.lock() {
                Ok(fed) => fed.elapsed() > timeout,
                Err(_) => true,
            };
            if starved {
                error!("Watchdog expired after {} ms without a feed", timeout_ms);
                process::abort();
            }
        });
        self.last_feed = Some(last_feed);
    }

    fn feed(&mut self) {
        if let Some(last_feed) = &self.last_feed {
            if let Ok(mut fed) = last_feed.lock() {
                *fed = Instant::now();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feeding_keeps_process_alive() {
        let mut watchdog = ThreadWatchdog::new();
        watchdog.arm(2_000);
        for _ in 0..4 {
            thread::sleep(Duration::from_millis(100));
            watchdog.feed();
        }
        assert!(watchdog.last_feed.is_some());
    }

    #[test]
    fn test_feed_before_arm_is_ignored() {
        let mut watchdog = ThreadWatchdog::new();
        watchdog.feed();
        assert!(watchdog.last_feed.is_none());
    }
}
