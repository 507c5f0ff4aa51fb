//! In-memory drivers for unit tests

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::string::{String, ToString};
use std::vec::Vec;

use hygrochron_protocol::{Request, Response, StatusCode};

use crate::calendar::LocalTime;
use crate::config::{Ipv4, StaticIpConfig};
use crate::traits::{
    Clock, ClimateSensor, DisplayDriver, DisplayError, Font, HttpError, HttpServer, LinkStatus,
    NetworkDriver, NetworkError, Platform, RawSample, SensorError, TextMetrics, TimeError,
    TimeSource, Watchdog,
};
use crate::Millis;

/// Clock whose delays advance time instantly
///
/// Clones share the same time, so a display can stamp frames with the
/// platform clock.
#[derive(Debug, Clone)]
pub struct FakeClock {
    now: Rc<Cell<Millis>>,
}

impl FakeClock {
    pub fn new(start: Millis) -> Self {
        Self {
            now: Rc::new(Cell::new(start)),
        }
    }

    pub fn advance(&mut self, ms: u32) {
        self.now.set(self.now.get().wrapping_add(ms));
    }
}

impl Clock for FakeClock {
    fn now_ms(&self) -> Millis {
        self.now.get()
    }

    fn delay_ms(&mut self, ms: u32) {
        self.advance(ms);
    }
}

/// Sensor returning a fixed sample, with scripted errors
#[derive(Debug)]
pub struct FakeSensor {
    pub sample: RawSample,
    pub humidity_supported: bool,
    pub init_result: Result<(), SensorError>,
    /// Errors returned by upcoming reads, in order
    pub scripted: VecDeque<SensorError>,
    /// Fail every read while set
    pub always_fail: Option<SensorError>,
    pub reads: u32,
}

impl FakeSensor {
    pub fn steady(temperature_c: f32, humidity_pct: Option<f32>) -> Self {
        Self {
            sample: RawSample {
                temperature_c,
                humidity_pct,
            },
            humidity_supported: true,
            init_result: Ok(()),
            scripted: VecDeque::new(),
            always_fail: None,
            reads: 0,
        }
    }

    pub fn script_error(&mut self, error: SensorError) {
        self.scripted.push_back(error);
    }
}

impl ClimateSensor for FakeSensor {
    fn init(&mut self) -> Result<(), SensorError> {
        self.init_result
    }

    fn read(&mut self) -> Result<RawSample, SensorError> {
        self.reads += 1;
        if let Some(error) = self.always_fail {
            return Err(error);
        }
        match self.scripted.pop_front() {
            Some(error) => Err(error),
            None => Ok(self.sample),
        }
    }

    fn supports_humidity(&self) -> bool {
        self.humidity_supported
    }
}

/// One draw call
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub text: String,
    pub x: i16,
    pub y: i16,
    pub font: Font,
}

/// 128 px display with fixed-advance fonts that records flushed frames
#[derive(Debug, Default)]
pub struct FakeDisplay {
    pending: Vec<DrawCall>,
    pub frames: Vec<Vec<DrawCall>>,
    /// Clock time of each flushed frame, when built with [`FakeDisplay::stamped`]
    pub shown_at: Vec<Millis>,
    clock: Option<FakeClock>,
    pub fail_flush: bool,
}

impl FakeDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Display that records when each frame was flushed
    pub fn stamped(clock: FakeClock) -> Self {
        Self {
            clock: Some(clock),
            ..Self::default()
        }
    }

    /// Flush time of the first frame starting with `text`
    pub fn first_shown(&self, text: &str) -> Option<Millis> {
        self.frames
            .iter()
            .position(|frame| frame.first().map_or(false, |call| call.text == text))
            .and_then(|index| self.shown_at.get(index).copied())
    }

    pub fn advance(font: Font) -> u16 {
        match font {
            Font::Small => 6,
            Font::Medium => 8,
            Font::Large => 12,
        }
    }

    /// Texts of the most recently flushed frame
    pub fn last_texts(&self) -> Vec<String> {
        self.frames
            .last()
            .map(|frame| frame.iter().map(|call| call.text.clone()).collect())
            .unwrap_or_default()
    }

    /// Whether any flushed frame contained `text`
    pub fn ever_showed(&self, text: &str) -> bool {
        self.frames
            .iter()
            .any(|frame| frame.iter().any(|call| call.text == text))
    }
}

impl TextMetrics for FakeDisplay {
    fn width(&self) -> u16 {
        128
    }

    fn text_width(&self, text: &str, font: Font) -> u16 {
        text.chars().count() as u16 * Self::advance(font)
    }
}

impl DisplayDriver for FakeDisplay {
    fn clear(&mut self) -> Result<(), DisplayError> {
        self.pending.clear();
        Ok(())
    }

    fn draw_text(&mut self, text: &str, x: i16, y: i16, font: Font) -> Result<(), DisplayError> {
        self.pending.push(DrawCall {
            text: text.to_string(),
            x,
            y,
            font,
        });
        Ok(())
    }

    fn flush(&mut self) -> Result<(), DisplayError> {
        if self.fail_flush {
            return Err(DisplayError::Communication);
        }
        self.frames.push(core::mem::take(&mut self.pending));
        if let Some(clock) = &self.clock {
            self.shown_at.push(clock.now_ms());
        }
        Ok(())
    }
}

/// WiFi station whose link comes up only while `reachable` is set
#[derive(Debug)]
pub struct FakeNetwork {
    pub linked: bool,
    pub reachable: bool,
    pub reject_static: bool,
    pub connects: u32,
    pub disconnects: u32,
    pub status_queries: u32,
    pub static_applied: u32,
    pub last_ssid: String,
}

impl FakeNetwork {
    pub fn up() -> Self {
        Self {
            linked: true,
            reachable: true,
            reject_static: false,
            connects: 0,
            disconnects: 0,
            status_queries: 0,
            static_applied: 0,
            last_ssid: String::new(),
        }
    }

    /// Link drops and the access point stays unreachable
    pub fn outage(&mut self) {
        self.linked = false;
        self.reachable = false;
    }

    /// Access point comes back; the link is re-established on connect
    pub fn restore(&mut self) {
        self.reachable = true;
    }
}

impl NetworkDriver for FakeNetwork {
    fn connect(&mut self, ssid: &str, _password: &str) -> Result<(), NetworkError> {
        self.connects += 1;
        self.last_ssid = ssid.to_string();
        self.linked = self.reachable;
        Ok(())
    }

    fn disconnect(&mut self) {
        self.disconnects += 1;
        self.linked = false;
    }

    fn status(&mut self) -> LinkStatus {
        self.status_queries += 1;
        if self.linked {
            LinkStatus::Connected
        } else {
            LinkStatus::Disconnected
        }
    }

    fn apply_static_config(&mut self, _config: &StaticIpConfig) -> Result<(), NetworkError> {
        if self.reject_static {
            return Err(NetworkError::ConfigRejected);
        }
        self.static_applied += 1;
        Ok(())
    }

    fn local_ip(&self) -> Option<Ipv4> {
        self.linked.then(|| Ipv4::new(192, 168, 1, 200))
    }
}

/// Time source that reports a fixed local time once synced
#[derive(Debug)]
pub struct FakeTime {
    pub time: LocalTime,
    pub server_answers: bool,
    pub synced: bool,
    /// Reads of the local clock fail while set
    pub local_fails: bool,
    pub syncs: u32,
    pub last_offsets: Option<(i32, i32)>,
}

impl FakeTime {
    pub fn answering(time: LocalTime) -> Self {
        Self {
            time,
            server_answers: true,
            synced: false,
            local_fails: false,
            syncs: 0,
            last_offsets: None,
        }
    }

    pub fn silent(time: LocalTime) -> Self {
        Self {
            server_answers: false,
            ..Self::answering(time)
        }
    }
}

impl TimeSource for FakeTime {
    fn sync(
        &mut self,
        _server: &str,
        gmt_offset_s: i32,
        dst_offset_s: i32,
    ) -> Result<LocalTime, TimeError> {
        self.syncs += 1;
        self.last_offsets = Some((gmt_offset_s, dst_offset_s));
        if !self.server_answers {
            return Err(TimeError::Unavailable);
        }
        self.synced = true;
        Ok(self.time)
    }

    fn local_time(&mut self) -> Result<LocalTime, TimeError> {
        if self.synced && !self.local_fails {
            Ok(self.time)
        } else {
            Err(TimeError::Unavailable)
        }
    }
}

/// HTTP transport fed from a queue of raw requests
#[derive(Debug, Default)]
pub struct FakeHttp {
    pub pending: VecDeque<Vec<u8>>,
    pub responses: Vec<Response>,
}

impl FakeHttp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue(&mut self, raw: &str) {
        self.pending.push_back(raw.as_bytes().to_vec());
    }

    pub fn queue_get(&mut self, target: &str) {
        self.queue(&std::format!("GET {} HTTP/1.1\r\nHost: device\r\n\r\n", target));
    }
}

impl HttpServer for FakeHttp {
    fn serve_one_pending(
        &mut self,
        handler: &mut dyn FnMut(&Request<'_>) -> Response,
    ) -> Result<bool, HttpError> {
        let Some(raw) = self.pending.pop_front() else {
            return Ok(false);
        };
        let response = match Request::parse(&raw) {
            Ok(request) => handler(&request),
            Err(_) => Response::text(StatusCode::BadRequest, "Bad Request")
                .map_err(|_| HttpError::Io)?,
        };
        self.responses.push(response);
        Ok(true)
    }
}

/// Watchdog that counts feeds
#[derive(Debug, Default)]
pub struct FakeWatchdog {
    pub armed_with: Option<u32>,
    pub feeds: u32,
}

impl Watchdog for FakeWatchdog {
    fn arm(&mut self, timeout_ms: u32) {
        self.armed_with = Some(timeout_ms);
    }

    fn feed(&mut self) {
        self.feeds += 1;
    }
}

/// Platform with a fake clock, a settable heap and a restart counter
#[derive(Debug)]
pub struct FakePlatform {
    pub clock: FakeClock,
    pub free: u32,
    pub min_free: u32,
    pub heap_queries: Cell<u32>,
    pub restarts: u32,
    /// Time at which `restart` was called
    pub restarted_at: Option<Millis>,
}

impl FakePlatform {
    pub fn new(free: u32) -> Self {
        Self {
            clock: FakeClock::new(0),
            free,
            min_free: free,
            heap_queries: Cell::new(0),
            restarts: 0,
            restarted_at: None,
        }
    }

    pub fn set_free(&mut self, free: u32) {
        self.free = free;
        self.min_free = self.min_free.min(free);
    }
}

impl Clock for FakePlatform {
    fn now_ms(&self) -> Millis {
        self.clock.now_ms()
    }

    fn delay_ms(&mut self, ms: u32) {
        self.clock.delay_ms(ms);
    }
}

impl Platform for FakePlatform {
    fn free_heap(&self) -> u32 {
        self.heap_queries.set(self.heap_queries.get() + 1);
        self.free
    }

    fn min_free_heap(&self) -> u32 {
        self.min_free
    }

    fn restart(&mut self) {
        self.restarts += 1;
        self.restarted_at = Some(self.clock.now_ms());
    }
}
