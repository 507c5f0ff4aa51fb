//! Wall-clock time source trait

use crate::calendar::LocalTime;

/// Errors that can occur with the time source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimeError {
    /// No time has been obtained yet, or the server did not answer
    Unavailable,
}

/// Trait for an NTP-backed local clock
pub trait TimeSource {
    /// Request synchronization and return the resulting local time
    ///
    /// `gmt_offset_s` and `dst_offset_s` are re-applied on every call.
    fn sync(
        &mut self,
        server: &str,
        gmt_offset_s: i32,
        dst_offset_s: i32,
    ) -> Result<LocalTime, TimeError>;

    /// Current local time from the synchronized clock
    fn local_time(&mut self) -> Result<LocalTime, TimeError>;
}
