//! Hygrochron host simulator
//!
//! Runs the device control loop against simulated drivers: a synthetic
//! sensor, a terminal display, a WiFi station with scripted outages, the
//! host clock for NTP and a real TCP status server.
//!
//! Usage: `hygrochron-sim [config.toml]`. The path may also be given in
//! `HYGROCHRON_CONFIG`; without either the embedded `device.toml` is used.

mod config;
mod drivers;

use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use env_logger::Env;
use hygrochron_core::{Device, Peripherals};
use log::{info, warn};

use drivers::{
    Outage, SimNetwork, SimPlatform, SimSensor, SimTime, TcpHttp, TerminalDisplay,
    ThreadWatchdog, Uptime,
};

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let path = env::args_os()
        .nth(1)
        .or_else(|| env::var_os("HYGROCHRON_CONFIG"))
        .map(PathBuf::from);
    let file = config::load(path.as_deref())?;
    let listen = file.listen_address();
    let sim = file.simulation;

    let uptime = Uptime::start();
    let outage = Outage::from_settings(sim.outage_at_ms, sim.outage_ms);
    if let Some(outage) = outage {
        info!("Access point outage scheduled: {:?}", outage);
    }

    let peripherals = Peripherals {
        sensor: SimSensor::new(uptime, sim.sensor_fault_every, sim.humidity),
        display: TerminalDisplay::new(),
        network: SimNetwork::new(uptime, outage),
        time: SimTime::new(sim.ntp_failures),
        http: TcpHttp::bind(listen.as_str())
            .with_context(|| format!("binding status server to {}", listen))?,
        watchdog: ThreadWatchdog::new(),
        platform: SimPlatform::new(uptime, sim.free_heap_bytes, sim.heap_leak_bytes),
    };

    let mut device = Device::new(file.device, peripherals).map_err(|e| anyhow!("{}", e))?;

    let boot = device.boot();
    info!("Boot complete: {:?}", boot);
    if !boot.sensor_ready {
        warn!("Running without a working sensor");
    }

    if sim.ticks == 0 {
        device.run();
    } else {
        for _ in 0..sim.ticks {
            if device.tick().halted {
                break;
            }
        }
    }

    info!(
        "Stopped after {} ticks, link {:?}",
        device.ticks(),
        device.network_health().state
    );
    Ok(())
}
