//! Board-agnostic core logic for the Hygrochron climate clock
//!
//! This crate contains everything that does not depend on a specific
//! board:
//!
//! - Driver traits (sensor, display, network, time sync, HTTP, watchdog)
//! - Configuration type definitions and validation
//! - Reading source (sensor sample validation)
//! - Guardians for network, time sync, memory and liveness
//! - Presentation (screen layout and centering)
//! - Shared status board and the status server views
//! - The cooperative control loop tying it all together

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod calendar;
pub mod config;
pub mod control;
pub mod guardian;
pub mod presentation;
pub mod reading;
pub mod retry;
pub mod state;
pub mod status;
pub mod traits;

#[cfg(test)]
pub(crate) mod testing;

pub use control::{BootReport, Device, Peripherals, TickReport};

/// Wrapping millisecond timestamp from the platform's monotonic clock
///
/// Wraps after roughly 49.7 days; every comparison uses wrapping
/// subtraction.
pub type Millis = u32;
