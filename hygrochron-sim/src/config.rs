//! Configuration loading
//!
//! The simulator reads one TOML file holding the device configuration
//! (`[device]`, the same tables the firmware uses) and the simulation
//! knobs (`[simulation]`). Without a path the embedded `device.toml` is
//! used.

use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use hygrochron_core::config::DeviceConfig;
use log::{info, warn};
use serde::Deserialize;

/// Embedded default configuration (compiled into the binary)
pub const EMBEDDED_CONFIG: &str = include_str!("../device.toml");

/// Simulated environment
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Stop after this many ticks; 0 runs until halted
    pub ticks: u32,
    /// Status server bind address; empty binds loopback on `device.http.port`
    pub listen: String,
    /// Every Nth sensor read fails; 0 never
    pub sensor_fault_every: u32,
    pub humidity: bool,
    /// Uptime at which the access point goes away; 0 never
    pub outage_at_ms: u32,
    /// Outage length; 0 forever
    pub outage_ms: u32,
    /// Time-sync requests left unanswered before the server replies
    pub ntp_failures: u32,
    pub free_heap_bytes: u32,
    /// Heap lost per query
    pub heap_leak_bytes: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            ticks: 0,
            listen: String::new(),
            sensor_fault_every: 0,
            humidity: true,
            outage_at_ms: 0,
            outage_ms: 0,
            ntp_failures: 0,
            free_heap_bytes: 180_000,
            heap_leak_bytes: 0,
        }
    }
}

/// Whole configuration file
#[derive(Debug, Clone, Deserialize)]
pub struct SimFile {
    pub device: DeviceConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

impl SimFile {
    /// Address the status server binds
    pub fn listen_address(&self) -> String {
        if self.simulation.listen.is_empty() {
            format!("127.0.0.1:{}", self.device.http.port)
        } else {
            self.simulation.listen.clone()
        }
    }
}

/// Load from `path`, or the embedded configuration
///
/// An unreadable file falls back to the embedded configuration; a file
/// that reads but does not parse is an error.
pub fn load(path: Option<&Path>) -> Result<SimFile> {
    let Some(path) = path else {
        info!("Using embedded configuration");
        return parse(EMBEDDED_CONFIG);
    };
    match fs::read_to_string(path) {
        Ok(text) => {
            info!("Loaded configuration from {}", path.display());
            parse(&text).with_context(|| format!("in {}", path.display()))
        }
        Err(e) => {
            warn!(
                "Cannot read {} ({}), using embedded configuration",
                path.display(),
                e
            );
            parse(EMBEDDED_CONFIG)
        }
    }
}

/// Parse and validate a configuration file
pub fn parse(text: &str) -> Result<SimFile> {
    let file: SimFile = toml::from_str(text).context("invalid configuration file")?;
    file.device
        .validate()
        .map_err(|e| anyhow!("invalid device configuration: {}", e))?;
    Ok(file)
}
