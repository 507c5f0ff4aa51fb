//! Host clock standing in for the NTP-backed RTC

use chrono::{DateTime, Datelike, FixedOffset, Timelike, Utc};
use hygrochron_core::calendar::LocalTime;
use hygrochron_core::traits::{TimeError, TimeSource};
use log::{debug, info};

/// Local time from the host clock once a sync has been answered
pub struct SimTime {
    offset: Option<FixedOffset>,
    /// Sync requests still to go unanswered
    failures_left: u32,
}

impl SimTime {
    pub fn new(unanswered_syncs: u32) -> Self {
        Self {
            offset: None,
            failures_left: unanswered_syncs,
        }
    }
}

/// Break a zoned timestamp into calendar fields
pub fn to_local_time(at: &DateTime<FixedOffset>) -> LocalTime {
    LocalTime::from_ymd_hms(
        at.year(),
        at.month() as u8,
        at.day() as u8,
        at.hour() as u8,
        at.minute() as u8,
        at.second() as u8,
    )
}

impl TimeSource for SimTime {
    fn sync(
        &mut self,
        server: &str,
        gmt_offset_s: i32,
        dst_offset_s: i32,
    ) -> Result<LocalTime, TimeError> {
        if self.failures_left > 0 {
            self.failures_left -= 1;
            debug!("{} did not answer", server);
            return Err(TimeError::Unavailable);
        }

        let offset = FixedOffset::east_opt(gmt_offset_s.saturating_add(dst_offset_s))
            .ok_or(TimeError::Unavailable)?;
        self.offset = Some(offset);
        let now = Utc::now().with_timezone(&offset);
        info!("Time from {}: {}", server, now.format("%Y-%m-%d %H:%M:%S %:z"));
        Ok(to_local_time(&now))
    }

    fn local_time(&mut self) -> Result<LocalTime, TimeError> {
        let offset = self.offset.ok_or(TimeError::Unavailable)?;
        Ok(to_local_time(&Utc::now().with_timezone(&offset)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_to_local_time_applies_offset() {
        let offset = FixedOffset::east_opt(8 * 3600).unwrap();
        let at = Utc
            .with_ymd_and_hms(2025, 7, 4, 6, 30, 15)
            .unwrap()
            .with_timezone(&offset);
        assert_eq!(
            to_local_time(&at),
            LocalTime::from_ymd_hms(2025, 7, 4, 14, 30, 15)
        );
    }

    #[test]
    fn test_unsynced_clock_is_unavailable() {
        let mut time = SimTime::new(0);
        assert_eq!(time.local_time(), Err(TimeError::Unavailable));
    }

    #[test]
    fn test_unanswered_syncs_then_success() {
        let mut time = SimTime::new(2);
        assert!(time.sync("pool.ntp.org", 0, 0).is_err());
        assert!(time.sync("pool.ntp.org", 0, 0).is_err());
        assert!(time.sync("pool.ntp.org", 0, 3600).is_ok());
        assert!(time.local_time().is_ok());
    }

    #[test]
    fn test_offset_out_of_range() {
        let mut time = SimTime::new(0);
        assert_eq!(
            time.sync("pool.ntp.org", 90_000, 0),
            Err(TimeError::Unavailable)
        );
    }
}
