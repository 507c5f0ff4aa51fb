//! Driver traits
//!
//! These traits define the interface between the control loop and the
//! board-specific drivers. The core never talks to hardware directly.

pub mod display;
pub mod http;
pub mod network;
pub mod sensor;
pub mod system;
pub mod time_source;

pub use display::{DisplayDriver, DisplayError, Font, TextMetrics};
pub use http::{HttpError, HttpServer};
pub use network::{LinkStatus, NetworkDriver, NetworkError};
pub use sensor::{ClimateSensor, RawSample, SensorError};
pub use system::{Clock, Platform, Watchdog};
pub use time_source::{TimeError, TimeSource};
