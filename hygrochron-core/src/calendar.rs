//! Local calendar time and its fixed text formats
//!
//! Fields follow the C `struct tm` convention the time services report:
//! years counted from 1900 and zero-based months. Formatting normalizes
//! them (`+1900`, `+1`).

use core::fmt::Write;

use heapless::String;

/// Formatted `HH:MM:SS`
pub type TimeText = String<12>;

/// Formatted `YYYY-MM-DD`
pub type DateText = String<16>;

/// Broken-down local time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LocalTime {
    /// Years since 1900
    pub year: i32,
    /// Month, 0-11
    pub month: u8,
    /// Day of month, 1-31
    pub day: u8,
    /// Hour, 0-23
    pub hour: u8,
    /// Minute, 0-59
    pub minute: u8,
    /// Second, 0-60 (leap second)
    pub second: u8,
}

impl LocalTime {
    /// Build from a calendar date with a four-digit year and 1-based month
    pub const fn from_ymd_hms(
        year: i32,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
    ) -> Self {
        Self {
            year: year - 1900,
            month: month.saturating_sub(1),
            day,
            hour,
            minute,
            second,
        }
    }

    /// Four-digit calendar year
    pub fn calendar_year(&self) -> i32 {
        self.year + 1900
    }

    /// 1-based calendar month
    pub fn calendar_month(&self) -> u8 {
        self.month + 1
    }

    /// `HH:MM:SS`, 24-hour, zero-padded
    pub fn format_time(&self) -> TimeText {
        let mut out = TimeText::new();
        let _ = write!(out, "{:02}:{:02}:{:02}", self.hour, self.minute, self.second);
        out
    }

    /// `YYYY-MM-DD`, zero-padded, year clamped to four digits
    pub fn format_date(&self) -> DateText {
        let mut out = DateText::new();
        let year = self.calendar_year().clamp(0, 9999);
        let _ = write!(
            out,
            "{:04}-{:02}-{:02}",
            year,
            self.calendar_month(),
            self.day
        );
        out
    }
}
