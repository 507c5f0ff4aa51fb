//! Configuration type definitions
//!
//! Every struct deserializes with `#[serde(default)]`, so a configuration
//! file only needs the keys it changes. Timing defaults are the values the
//! device has always shipped with.

use core::fmt;

use heapless::String;
use serde::Deserialize;

use crate::retry::RetryPolicy;

/// Maximum SSID length (802.11)
pub const MAX_SSID_LEN: usize = 32;

/// Maximum WPA passphrase length
pub const MAX_PASSWORD_LEN: usize = 64;

/// Maximum NTP server host name length
pub const MAX_HOST_LEN: usize = 64;

/// IPv4 address as four octets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(transparent)]
pub struct Ipv4(pub [u8; 4]);

impl Ipv4 {
    pub const fn new(a: u8, b: u8, c: u8, d: u8) -> Self {
        Self([a, b, c, d])
    }
}

impl fmt::Display for Ipv4 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d] = self.0;
        write!(f, "{}.{}.{}.{}", a, b, c, d)
    }
}

/// WiFi station credentials
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct WifiConfig {
    pub ssid: String<MAX_SSID_LEN>,
    pub password: String<MAX_PASSWORD_LEN>,
}

/// Static address configuration
///
/// Applied at connect time and re-applied after every reconnect, since
/// some network stacks drop it when the association is rebuilt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(default)]
pub struct StaticIpConfig {
    pub address: Ipv4,
    pub gateway: Ipv4,
    pub subnet: Ipv4,
    pub primary_dns: Ipv4,
    pub secondary_dns: Ipv4,
}

impl Default for StaticIpConfig {
    fn default() -> Self {
        Self {
            address: Ipv4::new(192, 168, 1, 200),
            gateway: Ipv4::new(192, 168, 1, 1),
            subnet: Ipv4::new(255, 255, 255, 0),
            primary_dns: Ipv4::new(192, 168, 1, 1),
            secondary_dns: Ipv4::new(8, 8, 8, 8),
        }
    }
}

/// Wall-clock synchronization inputs, re-applied at every resync
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TimeConfig {
    /// NTP server host name
    pub ntp_server: String<MAX_HOST_LEN>,
    /// Offset from UTC in seconds
    pub gmt_offset_s: i32,
    /// Additional daylight-saving offset in seconds
    pub dst_offset_s: i32,
}

impl Default for TimeConfig {
    fn default() -> Self {
        let mut ntp_server = String::new();
        let _ = ntp_server.push_str("cn.pool.ntp.org");
        Self {
            ntp_server,
            gmt_offset_s: 8 * 3600,
            dst_offset_s: 0,
        }
    }
}

/// Network guardian timing and escalation policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(default)]
pub struct NetworkPolicy {
    /// Minimum time between link status queries
    pub check_interval_ms: u32,
    /// Status polling after re-issuing a connect
    pub reconnect: RetryPolicy,
    /// Consecutive failed reconnects before the device restarts
    pub max_failures: u8,
    /// Status polling for the first connect at boot
    pub initial_connect: RetryPolicy,
    /// How long the assigned address stays on screen after boot connect
    pub ip_notice_ms: u32,
    /// How long the restart notice stays on screen before the reset
    pub restart_notice_ms: u32,
}

impl Default for NetworkPolicy {
    fn default() -> Self {
        Self {
            check_interval_ms: 30_000,
            reconnect: RetryPolicy::new(10, 1_000),
            max_failures: 5,
            initial_connect: RetryPolicy::new(60, 500),
            ip_notice_ms: 1_000,
            restart_notice_ms: 2_000,
        }
    }
}

/// Time guardian policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(default)]
pub struct TimeSyncPolicy {
    /// Re-sync interval, independent of the previous outcome
    pub resync_interval_ms: u32,
    /// Polling for the first sync at boot
    pub initial_sync: RetryPolicy,
}

impl Default for TimeSyncPolicy {
    fn default() -> Self {
        Self {
            resync_interval_ms: 600_000,
            initial_sync: RetryPolicy::new(10, 500),
        }
    }
}

/// Memory guardian policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(default)]
pub struct MemoryPolicy {
    /// Free heap strictly below this is reported as low
    pub low_water_bytes: u32,
    /// Minimum time between heap samples (0 = every tick)
    pub check_interval_ms: u32,
}

impl Default for MemoryPolicy {
    fn default() -> Self {
        Self {
            low_water_bytes: 30_000,
            check_interval_ms: 1_000,
        }
    }
}

/// Platform watchdog policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(default)]
pub struct WatchdogPolicy {
    /// Hardware reset after this long without a feed
    pub timeout_ms: u32,
    /// Headroom a worst-case tick must leave below the timeout
    pub safety_margin_ms: u32,
}

impl Default for WatchdogPolicy {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            safety_margin_ms: 5_000,
        }
    }
}

/// Status server policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(default)]
pub struct HttpPolicy {
    /// Listening port
    pub port: u16,
    /// Status page auto-refresh period
    pub refresh_secs: u8,
    /// Upper bound on requests answered per tick
    pub max_requests_per_tick: u8,
}

impl Default for HttpPolicy {
    fn default() -> Self {
        Self {
            port: 80,
            refresh_secs: 3,
            max_requests_per_tick: 8,
        }
    }
}

/// Complete device configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub wifi: WifiConfig,
    /// Static addressing; DHCP when absent
    pub static_ip: Option<StaticIpConfig>,
    pub time: TimeConfig,
    pub network: NetworkPolicy,
    pub time_sync: TimeSyncPolicy,
    pub memory: MemoryPolicy,
    pub watchdog: WatchdogPolicy,
    pub http: HttpPolicy,
    /// Fixed sleep at the end of every tick
    pub tick_interval_ms: u32,
    /// Age after which the shared status is reported as stale
    pub stale_after_ms: u32,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            wifi: WifiConfig::default(),
            static_ip: None,
            time: TimeConfig::default(),
            network: NetworkPolicy::default(),
            time_sync: TimeSyncPolicy::default(),
            memory: MemoryPolicy::default(),
            watchdog: WatchdogPolicy::default(),
            http: HttpPolicy::default(),
            tick_interval_ms: 1_000,
            stale_after_ms: 30_000,
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// No SSID configured
    MissingSsid,
    /// A retry policy allows zero attempts
    EmptyRetryPolicy,
    /// Escalation threshold of zero
    ZeroMaxFailures,
    /// Low-water mark of zero never fires
    ZeroLowWaterMark,
    /// Tick interval of zero
    ZeroTickInterval,
    /// Safety margin swallows the whole watchdog timeout
    MarginExceedsTimeout,
    /// A single retry delay outlasts the watchdog budget
    RetryDelayExceedsWatchdog,
    /// Worst-case tick outlasts the watchdog budget
    TickExceedsWatchdog,
    /// The boot IP notice is held longer than the watchdog budget
    NoticeExceedsWatchdog,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            ConfigError::MissingSsid => "wifi.ssid is empty",
            ConfigError::EmptyRetryPolicy => "retry policy needs at least one attempt",
            ConfigError::ZeroMaxFailures => "network.max_failures must be at least 1",
            ConfigError::ZeroLowWaterMark => "memory.low_water_bytes must be non-zero",
            ConfigError::ZeroTickInterval => "tick_interval_ms must be non-zero",
            ConfigError::MarginExceedsTimeout => {
                "watchdog.safety_margin_ms must be below watchdog.timeout_ms"
            }
            ConfigError::RetryDelayExceedsWatchdog => {
                "a retry delay exceeds the watchdog budget"
            }
            ConfigError::TickExceedsWatchdog => "worst-case tick exceeds the watchdog budget",
            ConfigError::NoticeExceedsWatchdog => {
                "network.ip_notice_ms exceeds the watchdog budget"
            }
        };
        f.write_str(msg)
    }
}

impl DeviceConfig {
    /// Time a tick may take before the watchdog margin is eaten
    pub fn watchdog_budget_ms(&self) -> u32 {
        self.watchdog
            .timeout_ms
            .saturating_sub(self.watchdog.safety_margin_ms)
    }

    /// Longest a single tick can block
    ///
    /// A reconnect window, the restart notice and the inter-tick sleep.
    pub fn worst_case_tick_ms(&self) -> u32 {
        self.network
            .reconnect
            .window_ms()
            .saturating_add(self.network.restart_notice_ms)
            .saturating_add(self.tick_interval_ms)
    }

    /// Check the configuration for values the control loop cannot honor
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.wifi.ssid.is_empty() {
            return Err(ConfigError::MissingSsid);
        }

        let policies = [
            self.network.reconnect,
            self.network.initial_connect,
            self.time_sync.initial_sync,
        ];
        if policies.iter().any(|p| p.attempts == 0) {
            return Err(ConfigError::EmptyRetryPolicy);
        }

        if self.network.max_failures == 0 {
            return Err(ConfigError::ZeroMaxFailures);
        }
        if self.memory.low_water_bytes == 0 {
            return Err(ConfigError::ZeroLowWaterMark);
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::ZeroTickInterval);
        }
        if self.watchdog.safety_margin_ms >= self.watchdog.timeout_ms {
            return Err(ConfigError::MarginExceedsTimeout);
        }

        let budget = self.watchdog_budget_ms();
        if policies.iter().any(|p| p.delay_ms >= budget) {
            return Err(ConfigError::RetryDelayExceedsWatchdog);
        }
        // Held at boot between the last connect feed and the first sync feed
        if self.network.ip_notice_ms >= budget {
            return Err(ConfigError::NoticeExceedsWatchdog);
        }
        if self.worst_case_tick_ms() >= budget {
            return Err(ConfigError::TickExceedsWatchdog);
        }

        Ok(())
    }
}
