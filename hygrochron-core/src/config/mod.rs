//! Configuration types
//!
//! Board-agnostic configuration structures, deserialized from TOML by the
//! host binary and validated once at startup.

pub mod types;

pub use types::*;
