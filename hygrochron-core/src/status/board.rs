//! Last-known-good status snapshot

use log::debug;

use crate::calendar::{DateText, LocalTime, TimeText};
use crate::reading::Reading;
use crate::Millis;

/// Snapshot served to status readers
#[derive(Debug, Clone, PartialEq)]
pub struct SharedStatus {
    pub reading: Reading,
    /// `HH:MM:SS`
    pub time_of_day: TimeText,
    /// `YYYY-MM-DD`
    pub date: DateText,
    /// When this snapshot was committed; `None` before the first commit
    pub last_updated: Option<Millis>,
}

impl SharedStatus {
    /// Value served before the first successful tick: zeroed reading,
    /// empty time and date
    pub fn not_ready() -> Self {
        Self {
            reading: Reading {
                temperature: 0.0,
                humidity: None,
                valid: false,
            },
            time_of_day: TimeText::new(),
            date: DateText::new(),
            last_updated: None,
        }
    }
}

impl Default for SharedStatus {
    fn default() -> Self {
        Self::not_ready()
    }
}

/// How current the snapshot is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Freshness {
    /// Nothing committed yet
    NotReady,
    Fresh,
    /// Last commit is older than the staleness threshold
    Stale { age_ms: u32 },
}

impl Freshness {
    /// Status word reported to clients
    pub fn as_str(&self) -> &'static str {
        match self {
            Freshness::NotReady => "not_ready",
            Freshness::Fresh => "ok",
            Freshness::Stale { .. } => "stale",
        }
    }
}

/// Single-writer holder of the current [`SharedStatus`]
#[derive(Debug, Clone, Default)]
pub struct StatusBoard {
    current: SharedStatus,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the snapshot with a valid reading and its local time
    ///
    /// An invalid reading is refused and the previous snapshot is kept
    /// untouched. Returns whether the snapshot was replaced.
    pub fn commit(&mut self, reading: &Reading, time: &LocalTime, now: Millis) -> bool {
        if !reading.valid {
            debug!("Refusing to commit an invalid reading");
            return false;
        }
        self.current = SharedStatus {
            reading: *reading,
            time_of_day: time.format_time(),
            date: time.format_date(),
            last_updated: Some(now),
        };
        true
    }

    pub fn snapshot(&self) -> &SharedStatus {
        &self.current
    }

    /// Time since the last commit
    pub fn age_ms(&self, now: Millis) -> Option<u32> {
        self.current
            .last_updated
            .map(|updated| now.wrapping_sub(updated))
    }

    /// Classify the snapshot against `stale_after_ms`
    pub fn freshness(&self, now: Millis, stale_after_ms: u32) -> Freshness {
        match self.age_ms(now) {
            None => Freshness::NotReady,
            Some(age_ms) if age_ms > stale_after_ms => Freshness::Stale { age_ms },
            Some(_) => Freshness::Fresh,
        }
    }
}
