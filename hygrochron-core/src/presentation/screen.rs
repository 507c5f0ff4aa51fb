//! Screen construction and rendering
//!
//! The display is 128x64. Status notices are left-aligned small text at
//! fixed rows; the main screen centers each line.

use core::fmt::Write;

use heapless::{String, Vec};

use crate::calendar::LocalTime;
use crate::config::Ipv4;
use crate::presentation::center_x;
use crate::reading::Reading;
use crate::traits::{DisplayDriver, DisplayError, Font, TextMetrics};

/// Longest text a single run can hold
pub const MAX_RUN_LEN: usize = 24;

/// Most runs a screen can hold
pub const MAX_RUNS: usize = 6;

/// Baselines of the main screen lines
const DATE_Y: i16 = 12;
const TIME_Y: i16 = 38;
const CLIMATE_Y: i16 = 60;

/// Baselines of the two notice lines
const NOTICE_Y: [i16; 2] = [15, 30];

/// Baseline of the single-line waiting notice
const WAITING_Y: i16 = 32;

/// One positioned piece of text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRun {
    pub text: String<MAX_RUN_LEN>,
    pub x: i16,
    pub y: i16,
    pub font: Font,
}

/// A complete frame as a list of text runs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Screen {
    runs: Vec<TextRun, MAX_RUNS>,
}

impl Screen {
    pub const fn new() -> Self {
        Self { runs: Vec::new() }
    }

    /// Add a run; text past [`MAX_RUN_LEN`] and runs past [`MAX_RUNS`]
    /// are dropped
    pub fn push(&mut self, text: &str, x: i16, y: i16, font: Font) {
        let mut run = TextRun {
            text: String::new(),
            x,
            y,
            font,
        };
        for c in text.chars() {
            if run.text.push(c).is_err() {
                break;
            }
        }
        let _ = self.runs.push(run);
    }

    /// Add a run centered horizontally
    pub fn push_centered<M: TextMetrics + ?Sized>(
        &mut self,
        metrics: &M,
        text: &str,
        y: i16,
        font: Font,
    ) {
        let x = center_x(metrics.width(), metrics.text_width(text, font));
        self.push(text, x, y, font);
    }

    pub fn runs(&self) -> &[TextRun] {
        &self.runs
    }

    /// Clear, draw every run, flush
    pub fn render<D: DisplayDriver + ?Sized>(&self, display: &mut D) -> Result<(), DisplayError> {
        display.clear()?;
        for run in &self.runs {
            display.draw_text(&run.text, run.x, run.y, run.font)?;
        }
        display.flush()
    }

    /// Date, time and climate line, each centered
    ///
    /// The climate line is `"<t>°C  <h>%"`. It is measured as three runs
    /// (value, degree glyph, suffix) so fonts that compose the degree sign
    /// separately still line up; humidity is left out when absent.
    pub fn main<M: TextMetrics + ?Sized>(metrics: &M, reading: &Reading, time: &LocalTime) -> Self {
        let mut screen = Self::new();
        screen.push_centered(metrics, &time.format_date(), DATE_Y, Font::Small);
        screen.push_centered(metrics, &time.format_time(), TIME_Y, Font::Large);

        let mut value: String<MAX_RUN_LEN> = String::new();
        let _ = write!(value, "{:.1}", reading.temperature);
        let degree = "°";
        let mut suffix: String<MAX_RUN_LEN> = String::new();
        let _ = suffix.push('C');
        if let Some(humidity) = reading.humidity {
            let _ = write!(suffix, "  {:.1}%", humidity);
        }

        let font = Font::Medium;
        let widths = [
            metrics.text_width(&value, font),
            metrics.text_width(degree, font),
            metrics.text_width(&suffix, font),
        ];
        let total = widths.iter().fold(0u16, |acc, w| acc.saturating_add(*w));
        let mut x = center_x(metrics.width(), total);
        for (text, width) in [value.as_str(), degree, suffix.as_str()].into_iter().zip(widths) {
            screen.push(text, x, CLIMATE_Y, font);
            x = x.saturating_add(width as i16);
        }
        screen
    }

    /// Up to two left-aligned lines of small text
    pub fn notice(first: &str, second: Option<&str>) -> Self {
        let mut screen = Self::new();
        screen.push(first, 0, NOTICE_Y[0], Font::Small);
        if let Some(second) = second {
            screen.push(second, 0, NOTICE_Y[1], Font::Small);
        }
        screen
    }

    /// Shown while no local time is known
    pub fn syncing_time() -> Self {
        let mut screen = Self::new();
        screen.push("Syncing Time...", 0, WAITING_Y, Font::Small);
        screen
    }

    pub fn sensor_warming() -> Self {
        Self::notice("Sensor Warming...", None)
    }

    /// Sensor failed to initialize at boot
    pub fn sensor_missing() -> Self {
        Self::notice("Sensor Error!", Some("Check sensor"))
    }

    /// Sensor read failed this tick
    pub fn sensor_error() -> Self {
        Self::notice("Sensor Error!", None)
    }

    pub fn connecting_wifi() -> Self {
        Self::notice("Connecting WiFi...", None)
    }

    pub fn wifi_connected(ip: Option<Ipv4>) -> Self {
        let mut line: String<MAX_RUN_LEN> = String::new();
        match ip {
            Some(ip) => {
                let _ = write!(line, "IP: {}", ip);
            }
            None => {
                let _ = line.push_str("IP: -");
            }
        }
        Self::notice("WiFi Connected!", Some(&line))
    }

    pub fn syncing_ntp() -> Self {
        Self::notice("Syncing NTP...", None)
    }

    /// Reconnect about to start; `attempt` is 1-based
    pub fn wifi_lost(attempt: u8) -> Self {
        let mut line: String<MAX_RUN_LEN> = String::new();
        let _ = write!(line, "Retry: {}", attempt);
        Self::notice("WiFi Lost!", Some(&line))
    }

    /// Final message before a restart
    pub fn wifi_failed() -> Self {
        Self::notice("WiFi Failed!", Some("Restarting..."))
    }

    pub fn low_memory(free_bytes: u32) -> Self {
        let mut line: String<MAX_RUN_LEN> = String::new();
        let _ = write!(line, "Free: {}KB", free_bytes / 1024);
        Self::notice("Low Memory!", Some(&line))
    }
}
