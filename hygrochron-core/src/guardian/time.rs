//! Time guardian
//!
//! Re-issues the time-sync request every `resync_interval_ms`, whether or
//! not the previous attempt succeeded. Sync failures are never fatal: the
//! last successfully fetched local time stays available for rendering.

use log::{debug, info, warn};

use crate::calendar::LocalTime;
use crate::config::{TimeConfig, TimeSyncPolicy};
use crate::guardian::DueGate;
use crate::retry::{retry, RetryOutcome};
use crate::traits::{Clock, TimeSource};
use crate::Millis;

/// Sync bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimeSyncState {
    pub last_sync_attempt: Millis,
    /// A local time has been obtained at least once since boot
    pub synced_once: bool,
}

/// Result of a resync due-check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SyncOutcome {
    NotDue,
    Synced,
    Failed,
}

/// Local time for one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockReading {
    /// Read from the time source this tick
    Fetched(LocalTime),
    /// The source failed; last successfully fetched time, for display only
    Fallback(LocalTime),
}

impl ClockReading {
    pub fn time(&self) -> LocalTime {
        match *self {
            ClockReading::Fetched(time) | ClockReading::Fallback(time) => time,
        }
    }

    pub fn is_fetched(&self) -> bool {
        matches!(self, ClockReading::Fetched(_))
    }
}

/// Periodic NTP resync with last-known-good fallback
#[derive(Debug, Clone)]
pub struct TimeGuardian {
    config: TimeConfig,
    policy: TimeSyncPolicy,
    gate: DueGate,
    state: TimeSyncState,
    last_good: Option<LocalTime>,
}

impl TimeGuardian {
    pub fn new(config: TimeConfig, policy: TimeSyncPolicy, now: Millis) -> Self {
        Self {
            config,
            policy,
            gate: DueGate::new(policy.resync_interval_ms, now),
            state: TimeSyncState {
                last_sync_attempt: now,
                synced_once: false,
            },
            last_good: None,
        }
    }

    pub fn state(&self) -> &TimeSyncState {
        &self.state
    }

    /// Initial sync at boot
    ///
    /// Issues one sync request, then polls the local clock with the
    /// bounded initial-sync policy. `on_attempt` runs before every probe
    /// (watchdog feeding). The resync interval counts from completion.
    pub fn initial_sync<T, C, F>(
        &mut self,
        source: &mut T,
        clock: &mut C,
        mut on_attempt: F,
    ) -> RetryOutcome
    where
        T: TimeSource + ?Sized,
        C: Clock + ?Sized,
        F: FnMut(),
    {
        info!("Syncing NTP time from {}", self.config.ntp_server.as_str());
        let mut fetched = None;
        let config = &self.config;

        let outcome = retry(clock, &self.policy.initial_sync, |attempt| {
            on_attempt();
            let result = if attempt.number == 1 {
                source.sync(&config.ntp_server, config.gmt_offset_s, config.dst_offset_s)
            } else {
                source.local_time()
            };
            fetched = result.ok();
            fetched.is_some()
        });

        let now = clock.now_ms();
        self.gate.mark(now);
        self.state.last_sync_attempt = now;

        match fetched {
            Some(time) => {
                self.record(time);
                info!(
                    "NTP time sync successful: {} {}",
                    time.format_date().as_str(),
                    time.format_time().as_str()
                );
            }
            None => warn!("NTP time sync failed, will retry in loop"),
        }
        outcome
    }

    /// Resync if the interval has elapsed
    pub fn poll<T: TimeSource + ?Sized>(&mut self, now: Millis, source: &mut T) -> SyncOutcome {
        if !self.gate.poll(now) {
            return SyncOutcome::NotDue;
        }
        self.state.last_sync_attempt = now;

        match source.sync(
            &self.config.ntp_server,
            self.config.gmt_offset_s,
            self.config.dst_offset_s,
        ) {
            Ok(time) => {
                self.record(time);
                info!("NTP time sync successful");
                SyncOutcome::Synced
            }
            Err(e) => {
                warn!("NTP time sync failed: {:?}", e);
                SyncOutcome::Failed
            }
        }
    }

    /// Local time for this tick
    ///
    /// Falls back to the last successfully fetched time when the source
    /// cannot answer. `None` only if no time was ever obtained.
    pub fn current_time<T: TimeSource + ?Sized>(&mut self, source: &mut T) -> Option<ClockReading> {
        match source.local_time() {
            Ok(time) => {
                self.record(time);
                Some(ClockReading::Fetched(time))
            }
            Err(e) => {
                debug!("Failed to obtain time: {:?}", e);
                self.last_good.map(ClockReading::Fallback)
            }
        }
    }

    /// Last successfully fetched local time
    pub fn last_good(&self) -> Option<LocalTime> {
        self.last_good
    }

    fn record(&mut self, time: LocalTime) {
        self.last_good = Some(time);
        self.state.synced_once = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeClock, FakeTime};

    fn noon() -> LocalTime {
        LocalTime::from_ymd_hms(2025, 7, 4, 12, 0, 0)
    }

    fn guardian() -> TimeGuardian {
        TimeGuardian::new(TimeConfig::default(), TimeSyncPolicy::default(), 0)
    }

    #[test]
    fn test_initial_sync_success() {
        let mut time = guardian();
        let mut source = FakeTime::answering(noon());
        let mut clock = FakeClock::new(0);
        let mut feeds = 0;

        let outcome = time.initial_sync(&mut source, &mut clock, || feeds += 1);
        assert_eq!(outcome, RetryOutcome::Succeeded { attempts: 1 });
        assert_eq!(feeds, 1);
        assert!(time.state().synced_once);
        assert_eq!(source.last_offsets, Some((28_800, 0)));
    }

    #[test]
    fn test_initial_sync_bounded() {
        let mut time = guardian();
        let mut source = FakeTime::silent(noon());
        let mut clock = FakeClock::new(0);
        let mut feeds = 0;

        let outcome = time.initial_sync(&mut source, &mut clock, || feeds += 1);
        assert_eq!(outcome, RetryOutcome::Exhausted { attempts: 10 });
        assert_eq!(feeds, 10);
        assert_eq!(source.syncs, 1);
        assert_eq!(clock.now_ms(), 4_500);
        assert!(!time.state().synced_once);
        assert_eq!(time.state().last_sync_attempt, 4_500);
    }

    #[test]
    fn test_resync_regardless_of_previous_result() {
        let mut time = guardian();
        let mut source = FakeTime::answering(noon());
        let mut clock = FakeClock::new(0);
        time.initial_sync(&mut source, &mut clock, || {});

        assert_eq!(time.poll(599_999, &mut source), SyncOutcome::NotDue);
        assert_eq!(time.poll(600_000, &mut source), SyncOutcome::Synced);
        assert_eq!(time.state().last_sync_attempt, 600_000);

        source.server_answers = false;
        assert_eq!(time.poll(1_200_000, &mut source), SyncOutcome::Failed);
        source.server_answers = true;
        assert_eq!(time.poll(1_800_000, &mut source), SyncOutcome::Synced);
        assert_eq!(source.syncs, 4);
    }

    #[test]
    fn test_current_time_none_before_first_sync() {
        let mut time = guardian();
        let mut source = FakeTime::silent(noon());
        assert_eq!(time.current_time(&mut source), None);
    }

    #[test]
    fn test_current_time_falls_back_to_last_good() {
        let mut time = guardian();
        let mut source = FakeTime::answering(noon());
        let mut clock = FakeClock::new(0);
        time.initial_sync(&mut source, &mut clock, || {});
        assert_eq!(
            time.current_time(&mut source),
            Some(ClockReading::Fetched(noon()))
        );

        source.local_fails = true;
        let fallback = time.current_time(&mut source).unwrap();
        assert_eq!(fallback, ClockReading::Fallback(noon()));
        assert!(!fallback.is_fetched());
        assert_eq!(fallback.time(), noon());
        assert_eq!(time.last_good(), Some(noon()));
    }
}
