//! Network link state machine
//!
//! The link is explicit, finite, and deterministic. `Restarting` is
//! terminal: once entered, the only way out is a device reset.

pub mod events;
pub mod machine;

pub use events::LinkEvent;
pub use machine::LinkState;
