//! Cooperative control loop
//!
//! A [`Device`] owns every driver and every piece of state. One call to
//! [`Device::tick`] runs, in order:
//!
//! 1. feed the watchdog
//! 2. guardian due-checks (network, time sync, memory)
//! 3. read the sensor and fetch the local time
//! 4. commit the status snapshot and render
//! 5. serve pending HTTP requests
//! 6. sleep the tick quantum
//!
//! A sensor fault skips the commit but never the other steps. When the
//! network guardian escalates, the final message is left on the display,
//! the platform is restarted and the device stays halted.

use hygrochron_protocol::Request;
use log::{info, warn};

use crate::config::{ConfigError, DeviceConfig};
use crate::guardian::network::apply_static;
use crate::guardian::{
    LivenessFeeder, MemoryGuardian, NetworkCheck, NetworkGuardian, NetworkHealth,
    ReconnectOutcome, SyncOutcome, TimeGuardian,
};
use crate::presentation::Screen;
use crate::reading::ReadingSource;
use crate::retry::RetryOutcome;
use crate::status::{Route, Router, StatusBoard, StatusServer};
use crate::traits::{
    ClimateSensor, DisplayDriver, HttpServer, NetworkDriver, Platform, TimeSource, Watchdog,
};

/// How long the sensor warm-up notice is held at boot
pub const SENSOR_WARMUP_MS: u32 = 500;

/// How long the sensor failure notice is held at boot
pub const SENSOR_ERROR_HOLD_MS: u32 = 2_000;

/// Drivers handed to the device at construction
pub struct Peripherals<S, D, N, T, H, W, P> {
    pub sensor: S,
    pub display: D,
    pub network: N,
    pub time: T,
    pub http: H,
    pub watchdog: W,
    pub platform: P,
}

/// What happened during boot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootReport {
    pub sensor_ready: bool,
    pub wifi: RetryOutcome,
    /// `None` when no static configuration is set
    pub static_ip_applied: Option<bool>,
    pub time_sync: RetryOutcome,
    pub routes: usize,
}

/// What happened during one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    /// The device is halted (restart requested); nothing else ran
    pub halted: bool,
    pub reconnect: Option<ReconnectOutcome>,
    pub time_sync: SyncOutcome,
    pub low_memory: bool,
    pub reading_valid: bool,
    /// The status snapshot was replaced
    pub committed: bool,
    pub requests_served: u8,
}

impl TickReport {
    fn halted() -> Self {
        Self {
            halted: true,
            reconnect: None,
            time_sync: SyncOutcome::NotDue,
            low_memory: false,
            reading_valid: false,
            committed: false,
            requests_served: 0,
        }
    }
}

/// The whole device: drivers, guardians and shared status
pub struct Device<S, D, N, T, H, W, P> {
    config: DeviceConfig,
    reading: ReadingSource<S>,
    display: D,
    network: N,
    time_source: T,
    http: H,
    liveness: LivenessFeeder<W>,
    platform: P,
    network_guard: NetworkGuardian,
    time_guard: TimeGuardian,
    memory_guard: MemoryGuardian,
    board: StatusBoard,
    server: StatusServer,
    ticks: u32,
}

impl<S, D, N, T, H, W, P> Device<S, D, N, T, H, W, P>
where
    S: ClimateSensor,
    D: DisplayDriver,
    N: NetworkDriver,
    T: TimeSource,
    H: HttpServer,
    W: Watchdog,
    P: Platform,
{
    /// Validate the configuration and take ownership of the drivers
    pub fn new(
        config: DeviceConfig,
        peripherals: Peripherals<S, D, N, T, H, W, P>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let now = peripherals.platform.now_ms();
        Ok(Self {
            reading: ReadingSource::new(peripherals.sensor),
            display: peripherals.display,
            network: peripherals.network,
            time_source: peripherals.time,
            http: peripherals.http,
            liveness: LivenessFeeder::new(peripherals.watchdog, &config.watchdog),
            platform: peripherals.platform,
            network_guard: NetworkGuardian::new(config.network, now),
            time_guard: TimeGuardian::new(config.time.clone(), config.time_sync, now),
            memory_guard: MemoryGuardian::new(config.memory, now),
            board: StatusBoard::new(),
            server: StatusServer::new(Router::new(), &config.http, config.stale_after_ms),
            ticks: 0,
            config,
        })
    }

    /// Bring the device up
    ///
    /// Every wait is bounded; a missing sensor, an unreachable access point
    /// or a silent time server are reported and the device still enters
    /// the loop.
    pub fn boot(&mut self) -> BootReport {
        info!("Booting");

        let sensor_ready = match self.reading.init() {
            Ok(()) => {
                info!("Sensor initialized, warming up");
                self.show(&Screen::sensor_warming());
                self.platform.delay_ms(SENSOR_WARMUP_MS);
                true
            }
            Err(e) => {
                warn!("Sensor initialization failed: {:?}", e);
                self.show(&Screen::sensor_missing());
                self.platform.delay_ms(SENSOR_ERROR_HOLD_MS);
                false
            }
        };

        self.liveness.arm();

        self.show(&Screen::connecting_wifi());
        let liveness = &mut self.liveness;
        let wifi = self.network_guard.initial_connect(
            &mut self.network,
            &mut self.platform,
            &self.config.wifi,
            || liveness.feed(),
        );
        if wifi.is_success() {
            self.show(&Screen::wifi_connected(self.network.local_ip()));
            self.platform.delay_ms(self.config.network.ip_notice_ms);
        }

        let static_ip_applied = self
            .config
            .static_ip
            .as_ref()
            .map(|config| apply_static(&mut self.network, config));

        self.show(&Screen::syncing_ntp());
        let liveness = &mut self.liveness;
        let time_sync =
            self.time_guard
                .initial_sync(&mut self.time_source, &mut self.platform, || {
                    liveness.feed()
                });

        let routes = self.register_routes();

        self.show(&Screen::syncing_time());
        info!("System ready, watchdog running");

        BootReport {
            sensor_ready,
            wifi,
            static_ip_applied,
            time_sync,
            routes,
        }
    }

    /// Run one tick
    pub fn tick(&mut self) -> TickReport {
        if self.network_guard.state().is_terminal() {
            return TickReport::halted();
        }

        // Must come before anything that can stall
        self.liveness.feed();

        let mut reconnect = None;
        let now = self.platform.now_ms();
        match self.network_guard.check(now, &mut self.network) {
            NetworkCheck::Lost { attempt } => {
                self.show(&Screen::wifi_lost(attempt));
                let outcome = self.network_guard.reconnect(
                    &mut self.network,
                    &mut self.platform,
                    &self.config.wifi,
                    self.config.static_ip.as_ref(),
                );
                if let ReconnectOutcome::Escalate { failures } = outcome {
                    self.escalate(failures);
                    return TickReport {
                        reconnect: Some(outcome),
                        ..TickReport::halted()
                    };
                }
                reconnect = Some(outcome);
            }
            NetworkCheck::Halted => return TickReport::halted(),
            NetworkCheck::NotDue | NetworkCheck::Healthy => {}
        }

        let now = self.platform.now_ms();
        let time_sync = self.time_guard.poll(now, &mut self.time_source);
        self.memory_guard.poll(self.platform.now_ms(), &self.platform);

        let reading = self.reading.read();
        let clock = self.time_guard.current_time(&mut self.time_source);

        let now = self.platform.now_ms();
        let mut committed = false;
        let screen = match clock {
            _ if !reading.valid => Screen::sensor_error(),
            None => Screen::syncing_time(),
            Some(clock) => {
                // A fallback time is only good for the display
                if clock.is_fetched() {
                    committed = self.board.commit(&reading, &clock.time(), now);
                }
                Screen::main(&self.display, &reading, &clock.time())
            }
        };

        // Last render wins
        let low_memory = self.memory_guard.is_low();
        let screen = match self.memory_guard.last_sample() {
            Some(sample) if low_memory => Screen::low_memory(sample.free_bytes),
            _ => screen,
        };
        self.show(&screen);

        let requests_served = self.serve_pending();

        self.platform.delay_ms(self.config.tick_interval_ms);
        self.ticks = self.ticks.wrapping_add(1);

        TickReport {
            halted: false,
            reconnect,
            time_sync,
            low_memory,
            reading_valid: reading.valid,
            committed,
            requests_served,
        }
    }

    /// Tick until the device halts
    pub fn run(&mut self) {
        while !self.tick().halted {}
        warn!("Control loop halted after {} ticks", self.ticks);
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn board(&self) -> &StatusBoard {
        &self.board
    }

    pub fn network_health(&self) -> &NetworkHealth {
        self.network_guard.health()
    }

    pub fn liveness(&self) -> &LivenessFeeder<W> {
        &self.liveness
    }

    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    pub fn network_mut(&mut self) -> &mut N {
        &mut self.network
    }

    pub fn sensor_mut(&mut self) -> &mut S {
        self.reading.sensor_mut()
    }

    pub fn time_source_mut(&mut self) -> &mut T {
        &mut self.time_source
    }

    pub fn http(&self) -> &H {
        &self.http
    }

    pub fn http_mut(&mut self) -> &mut H {
        &mut self.http
    }

    fn register_routes(&mut self) -> usize {
        let mut router = Router::new();
        let mut routes: heapless::Vec<(&'static str, Route), 4> = heapless::Vec::new();
        let _ = routes.push(("/", Route::Page));
        let _ = routes.push(("/temperature", Route::Temperature));
        if self.reading.supports_humidity() {
            let _ = routes.push(("/humidity", Route::Humidity));
        }
        let _ = routes.push(("/json", Route::Json));

        for (path, route) in routes {
            if router.register(path, route).is_err() {
                warn!("Route table full, {} not registered", path);
            }
        }
        let count = router.len();
        self.server = StatusServer::new(router, &self.config.http, self.config.stale_after_ms);
        info!("Status server ready, {} routes", count);
        count
    }

    fn serve_pending(&mut self) -> u8 {
        let server = &self.server;
        let board = &self.board;
        let now = self.platform.now_ms();
        let mut handler = |request: &Request<'_>| server.respond(request, board, now);

        let mut served = 0;
        while served < self.config.http.max_requests_per_tick {
            match self.http.serve_one_pending(&mut handler) {
                Ok(true) => served += 1,
                Ok(false) => break,
                Err(e) => {
                    warn!("HTTP transport error: {:?}", e);
                    break;
                }
            }
        }
        served
    }

    fn escalate(&mut self, failures: u8) {
        warn!("Network lost after {} reconnects, restarting", failures);
        self.show(&Screen::wifi_failed());
        self.platform.delay_ms(self.config.network.restart_notice_ms);
        self.platform.restart();
    }

    fn show(&mut self, screen: &Screen) {
        if let Err(e) = screen.render(&mut self.display) {
            warn!("Display error: {:?}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::LocalTime;
    use crate::state::LinkState;
    use crate::testing::{
        FakeDisplay, FakeHttp, FakeNetwork, FakePlatform, FakeSensor, FakeTime, FakeWatchdog,
    };
    use crate::traits::Clock;
    use hygrochron_protocol::StatusCode;
    use proptest::prelude::*;

    type TestDevice = Device<
        FakeSensor,
        FakeDisplay,
        FakeNetwork,
        FakeTime,
        FakeHttp,
        FakeWatchdog,
        FakePlatform,
    >;

    fn config() -> DeviceConfig {
        let mut config = DeviceConfig::default();
        config.wifi.ssid.push_str("greenhouse").unwrap();
        config.static_ip = Some(Default::default());
        config
    }

    fn afternoon() -> LocalTime {
        LocalTime::from_ymd_hms(2025, 7, 4, 14, 30, 0)
    }

    fn peripherals() -> Peripherals<
        FakeSensor,
        FakeDisplay,
        FakeNetwork,
        FakeTime,
        FakeHttp,
        FakeWatchdog,
        FakePlatform,
    > {
        let platform = FakePlatform::new(120_000);
        Peripherals {
            sensor: FakeSensor::steady(25.0, Some(60.0)),
            display: FakeDisplay::stamped(platform.clock.clone()),
            network: FakeNetwork::up(),
            time: FakeTime::answering(afternoon()),
            http: FakeHttp::new(),
            watchdog: FakeWatchdog::default(),
            platform,
        }
    }

    fn booted() -> TestDevice {
        let mut device = Device::new(config(), peripherals()).unwrap();
        device.boot();
        device
    }

    #[test]
    fn test_rejects_invalid_config() {
        let result = Device::new(DeviceConfig::default(), peripherals());
        assert!(matches!(result, Err(ConfigError::MissingSsid)));
    }

    #[test]
    fn test_boot_sequence() {
        let mut device = Device::new(config(), peripherals()).unwrap();
        let report = device.boot();

        assert!(report.sensor_ready);
        assert!(report.wifi.is_success());
        assert_eq!(report.static_ip_applied, Some(true));
        assert!(report.time_sync.is_success());
        assert_eq!(report.routes, 4);

        let display = device.display();
        let firsts: std::vec::Vec<&str> = display
            .frames
            .iter()
            .map(|frame| frame[0].text.as_str())
            .collect();
        assert_eq!(
            firsts,
            [
                "Sensor Warming...",
                "Connecting WiFi...",
                "WiFi Connected!",
                "Syncing NTP...",
                "Syncing Time...",
            ]
        );
        assert_eq!(device.liveness().watchdog().armed_with, Some(30_000));
        assert_eq!(device.network_health().state, LinkState::Connected);
        // warm-up + IP notice
        assert_eq!(device.platform().now_ms(), 1_500);
    }

    #[test]
    fn test_boot_degrades_without_sensor_network_or_time() {
        let mut p = peripherals();
        p.sensor.init_result = Err(crate::traits::SensorError::NotPresent);
        p.sensor.humidity_supported = false;
        p.network.outage();
        p.time = FakeTime::silent(afternoon());

        let mut device = Device::new(config(), p).unwrap();
        let report = device.boot();

        assert!(!report.sensor_ready);
        assert_eq!(report.wifi, RetryOutcome::Exhausted { attempts: 60 });
        assert!(!report.time_sync.is_success());
        assert_eq!(report.routes, 3);
        assert!(device.display().ever_showed("Check sensor"));
        assert!(!device.display().ever_showed("WiFi Connected!"));
        assert_eq!(device.network_health().state, LinkState::Disconnected);
        // one feed per connect poll and per sync probe
        assert_eq!(device.liveness().feeds(), 60 + 10);
    }

    #[test]
    fn test_tick_commits_and_renders_main() {
        let mut device = booted();
        let report = device.tick();

        assert!(!report.halted);
        assert!(report.reading_valid);
        assert!(report.committed);
        assert_eq!(
            device.display().last_texts(),
            ["2025-07-04", "14:30:00", "25.0", "°", "C  60.0%"]
        );
        assert_eq!(device.board().snapshot().time_of_day.as_str(), "14:30:00");
    }

    #[test]
    fn test_json_over_http_end_to_end() {
        let mut device = booted();
        device.http_mut().queue_get("/json");
        let report = device.tick();

        assert_eq!(report.requests_served, 1);
        let response = &device.http().responses[0];
        assert_eq!(response.status, StatusCode::Ok);
        assert_eq!(
            response.body.as_str(),
            r#"{"temperature":25.0,"humidity":60.0,"time":"14:30:00","date":"2025-07-04","status":"ok"}"#
        );
    }

    #[test]
    fn test_sensor_fault_skips_commit_but_not_maintenance() {
        let mut device = booted();
        device.tick();
        let before = device.board().snapshot().clone();
        let feeds = device.liveness().feeds();

        device.sensor_mut().always_fail = Some(crate::traits::SensorError::Timeout);
        device.http_mut().queue_get("/temperature");
        let report = device.tick();

        assert!(!report.reading_valid);
        assert!(!report.committed);
        assert_eq!(device.board().snapshot(), &before);
        assert_eq!(device.liveness().feeds(), feeds + 1);
        assert_eq!(report.requests_served, 1);
        assert_eq!(device.http().responses[0].body.as_str(), "25.0°C");
        assert_eq!(device.display().last_texts(), ["Sensor Error!"]);
    }

    #[test]
    fn test_unknown_path_gets_not_found_and_bad_request_gets_400() {
        let mut device = booted();
        device.http_mut().queue_get("/nope?x=1");
        device.http_mut().queue("garbage\r\n\r\n");
        device.tick();

        let responses = &device.http().responses;
        assert_eq!(responses[0].status, StatusCode::NotFound);
        assert!(responses[0].body.contains(" x: 1\n"));
        assert_eq!(responses[1].status, StatusCode::BadRequest);
    }

    #[test]
    fn test_http_drain_is_bounded_per_tick() {
        let mut device = booted();
        for _ in 0..10 {
            device.http_mut().queue_get("/json");
        }
        assert_eq!(device.tick().requests_served, 8);
        assert_eq!(device.http().pending.len(), 2);
        assert_eq!(device.tick().requests_served, 2);
    }

    #[test]
    fn test_no_time_shows_syncing_until_resync() {
        let mut p = peripherals();
        p.time = FakeTime::silent(afternoon());
        let mut device = Device::new(config(), p).unwrap();
        device.boot();

        let report = device.tick();
        assert!(report.reading_valid);
        assert!(!report.committed);
        assert_eq!(device.display().last_texts(), ["Syncing Time..."]);

        device.time_source_mut().server_answers = true;
        device.platform_mut().clock.advance(600_000);
        let report = device.tick();
        assert_eq!(report.time_sync, SyncOutcome::Synced);
        assert!(report.committed);
    }

    #[test]
    fn test_low_memory_screen_wins_but_status_commits() {
        let mut p = peripherals();
        p.platform = FakePlatform::new(20_000);
        let mut device = Device::new(config(), p).unwrap();
        device.boot();

        let report = device.tick();
        assert!(report.low_memory);
        assert!(report.committed);
        assert_eq!(device.display().last_texts(), ["Low Memory!", "Free: 19KB"]);
    }

    #[test]
    fn test_display_failure_is_not_fatal() {
        let mut device = booted();
        let mut display_fails = FakeDisplay::new();
        display_fails.fail_flush = true;
        device.display = display_fails;

        let report = device.tick();
        assert!(report.committed);
        assert!(!report.halted);
    }

    #[test]
    fn test_reconnect_reapplies_static_config() {
        let mut device = booted();
        let applied = device.network_mut().static_applied;
        device.network_mut().linked = false;

        let mut reconnects = 0;
        for _ in 0..40 {
            if let Some(outcome) = device.tick().reconnect {
                assert_eq!(outcome, ReconnectOutcome::Reconnected);
                reconnects += 1;
            }
        }
        assert_eq!(reconnects, 1);
        assert!(device.display().ever_showed("Retry: 1"));
        assert_eq!(device.network_mut().static_applied, applied + 1);
        assert_eq!(device.network_health().consecutive_failures, 0);
    }

    #[test]
    fn test_restart_exactly_once_on_fifth_failure() {
        let mut device = booted();
        device.network_mut().outage();

        let mut failures_seen = 0;
        let mut halted_at = None;
        for tick in 0..1_000 {
            let report = device.tick();
            match report.reconnect {
                Some(ReconnectOutcome::Failed { failures }) => {
                    failures_seen += 1;
                    assert_eq!(failures, failures_seen);
                    assert_eq!(device.platform().restarts, 0);
                }
                Some(ReconnectOutcome::Escalate { failures }) => {
                    assert_eq!(failures, 5);
                    assert!(report.halted);
                    halted_at = Some(tick);
                    break;
                }
                Some(ReconnectOutcome::Reconnected) => panic!("network is down"),
                None => assert!(!report.halted),
            }
        }

        assert!(halted_at.is_some());
        assert_eq!(failures_seen, 4);
        assert_eq!(device.platform().restarts, 1);
        assert_eq!(device.display().last_texts(), ["WiFi Failed!", "Restarting..."]);
        assert!(device.display().ever_showed("Retry: 5"));

        // Halted: further ticks do nothing, no second restart
        let feeds = device.liveness().feeds();
        for _ in 0..5 {
            assert!(device.tick().halted);
        }
        assert_eq!(device.platform().restarts, 1);
        assert_eq!(device.liveness().feeds(), feeds);
    }

    #[test]
    fn test_restart_notice_held_before_restart() {
        let mut device = booted();
        device.network_mut().outage();
        device.run();

        let shown_at = device.display().first_shown("WiFi Failed!").unwrap();
        let restarted_at = device.platform().restarted_at.unwrap();
        assert_eq!(
            restarted_at - shown_at,
            device.config().network.restart_notice_ms
        );
        assert_eq!(device.platform().restarts, 1);
    }

    #[test]
    fn test_fallback_time_is_rendered_but_not_committed() {
        let mut device = booted();
        assert!(device.tick().committed);
        let before = device.board().snapshot().clone();

        device.time_source_mut().local_fails = true;
        device.sensor_mut().sample.temperature_c = 31.0;
        device.http_mut().queue_get("/json");
        let report = device.tick();

        assert!(report.reading_valid);
        assert!(!report.committed);
        assert_eq!(device.board().snapshot(), &before);
        assert_eq!(
            device.display().last_texts(),
            ["2025-07-04", "14:30:00", "31.0", "°", "C  60.0%"]
        );
        let body = device.http().responses[0].body.as_str();
        assert!(body.contains(r#""temperature":25.0"#));
        assert!(!body.contains("31.0"));

        // Status goes stale while the clock stays unavailable
        device.platform_mut().clock.advance(30_000);
        device.http_mut().queue_get("/json");
        device.tick();
        let body = device.http().responses[1].body.as_str();
        assert!(body.ends_with(r#""status":"stale"}"#));

        device.time_source_mut().local_fails = false;
        assert!(device.tick().committed);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn faults_never_overwrite_status(
            steps in proptest::collection::vec((any::<bool>(), -40.0f32..85.0), 1..20)
        ) {
            let mut device = booted();
            let mut expected = device.board().snapshot().clone();

            for (valid, temperature) in steps {
                device.sensor_mut().sample.temperature_c = temperature;
                device.sensor_mut().always_fail =
                    (!valid).then_some(crate::traits::SensorError::Communication);

                let report = device.tick();
                prop_assert_eq!(report.committed, valid);
                if valid {
                    prop_assert_eq!(device.board().snapshot().reading.temperature, temperature);
                    expected = device.board().snapshot().clone();
                } else {
                    prop_assert_eq!(device.board().snapshot(), &expected);
                }
            }
        }
    }
}
