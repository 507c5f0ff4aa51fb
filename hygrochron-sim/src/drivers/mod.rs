//! Simulated drivers
//!
//! Each one implements a core driver trait on top of the host: wall-clock
//! time, a TCP socket, a thread standing in for the hardware watchdog.

pub mod display;
pub mod http;
pub mod network;
pub mod platform;
pub mod sensor;
pub mod time;
pub mod watchdog;

pub use display::TerminalDisplay;
pub use http::TcpHttp;
pub use network::{Outage, SimNetwork};
pub use platform::SimPlatform;
pub use sensor::SimSensor;
pub use time::SimTime;
pub use watchdog::ThreadWatchdog;

use std::time::Instant;

use hygrochron_core::Millis;

/// Monotonic clock shared by the simulated drivers
#[derive(Debug, Clone, Copy)]
pub struct Uptime {
    boot: Instant,
}

impl Uptime {
    pub fn start() -> Self {
        Self {
            boot: Instant::now(),
        }
    }

    /// Milliseconds since start, wrapping like the device counter
    pub fn now_ms(&self) -> Millis {
        self.boot.elapsed().as_millis() as Millis
    }

    pub fn secs_f64(&self) -> f64 {
        self.boot.elapsed().as_secs_f64()
    }
}
