//! Host platform: wall-clock time, sleeping delays, a simulated heap

use std::cell::Cell;
use std::process;
use std::thread;
use std::time::Duration;

use hygrochron_core::traits::{Clock, Platform};
use hygrochron_core::Millis;
use log::error;

use super::Uptime;

/// Exit status reported when the device asks for a restart
pub const RESTART_EXIT_CODE: i32 = 3;

pub struct SimPlatform {
    uptime: Uptime,
    free: Cell<u32>,
    min_free: Cell<u32>,
    /// Bytes lost per heap query
    leak: u32,
}

impl SimPlatform {
    pub fn new(uptime: Uptime, free_heap: u32, leak: u32) -> Self {
        Self {
            uptime,
            free: Cell::new(free_heap),
            min_free: Cell::new(free_heap),
            leak,
        }
    }
}

impl Clock for SimPlatform {
    fn now_ms(&self) -> Millis {
        self.uptime.now_ms()
    }

    fn delay_ms(&mut self, ms: u32) {
        thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}

impl Platform for SimPlatform {
    fn free_heap(&self) -> u32 {
        let free = self.free.get().saturating_sub(self.leak);
        self.free.set(free);
        self.min_free.set(self.min_free.get().min(free));
        free
    }

    fn min_free_heap(&self) -> u32 {
        self.min_free.get()
    }

    fn restart(&mut self) {
        error!(
            "Restart requested after {} ms uptime; exiting with status {}",
            self.uptime.now_ms(),
            RESTART_EXIT_CODE
        );
        process::exit(RESTART_EXIT_CODE);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heap_leaks_per_query() {
        let platform = SimPlatform::new(Uptime::start(), 1_000, 300);
        assert_eq!(platform.free_heap(), 700);
        assert_eq!(platform.free_heap(), 400);
        assert_eq!(platform.min_free_heap(), 400);
        assert_eq!(platform.free_heap(), 100);
        assert_eq!(platform.free_heap(), 0);
    }

    #[test]
    fn test_steady_heap_without_leak() {
        let platform = SimPlatform::new(Uptime::start(), 180_000, 0);
        assert_eq!(platform.free_heap(), 180_000);
        assert_eq!(platform.min_free_heap(), 180_000);
    }

    #[test]
    fn test_delay_advances_clock() {
        let mut platform = SimPlatform::new(Uptime::start(), 0, 0);
        let start = platform.now_ms();
        platform.delay_ms(20);
        assert!(platform.now_ms().wrapping_sub(start) >= 20);
    }
}
