//! Shared status and the HTTP views over it
//!
//! The control loop is the single writer of the [`StatusBoard`]; the
//! [`StatusServer`] only reads it. Both run on the same thread, so a
//! response always sees one tick's complete snapshot.

pub mod board;
pub mod router;
pub mod server;

pub use board::{Freshness, SharedStatus, StatusBoard};
pub use router::{Route, Router, RouterFull, MAX_ROUTES};
pub use server::StatusServer;
