//! Presentation
//!
//! Screens are built as plain data (a list of positioned text runs) and
//! then pushed to a [`DisplayDriver`](crate::traits::DisplayDriver) in one
//! clear/draw/flush pass. Building a screen never touches the display.

pub mod layout;
pub mod screen;

pub use layout::center_x;
pub use screen::{Screen, TextRun};
