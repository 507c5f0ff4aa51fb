//! Guardians
//!
//! Each guardian owns one piece of auxiliary health state and is invoked
//! at most once per tick, subject to its own due-check interval. Guardians
//! borrow the drivers they need per call; they never own hardware.

pub mod due;
pub mod liveness;
pub mod memory;
pub mod network;
pub mod time;

pub use due::DueGate;
pub use liveness::LivenessFeeder;
pub use memory::{MemoryCheck, MemoryGuardian, MemoryState};
pub use network::{NetworkCheck, NetworkGuardian, NetworkHealth, ReconnectOutcome};
pub use time::{ClockReading, SyncOutcome, TimeGuardian, TimeSyncState};
