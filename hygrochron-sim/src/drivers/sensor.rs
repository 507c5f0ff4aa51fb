//! Synthetic climate sensor

use hygrochron_core::traits::{ClimateSensor, RawSample, SensorError};
use log::debug;

use super::Uptime;

/// Sensor producing slow sinusoidal drifts, with periodic faults
pub struct SimSensor {
    uptime: Uptime,
    fault_every: u32,
    humidity: bool,
    reads: u32,
}

impl SimSensor {
    pub fn new(uptime: Uptime, fault_every: u32, humidity: bool) -> Self {
        Self {
            uptime,
            fault_every,
            humidity,
            reads: 0,
        }
    }
}

/// Sample at `t` seconds since start
///
/// Temperature drifts within about 20-26 °C, humidity within 40-60 %.
pub fn sample_at(t: f64) -> (f32, f32) {
    let temperature = 23.0 + 3.0 * (t / 120.0).sin() + 0.5 * (t / 37.0).cos();
    let humidity = 50.0 + 10.0 * (t / 180.0).sin() + 2.0 * (t / 23.0).cos();
    (temperature as f32, humidity as f32)
}

impl ClimateSensor for SimSensor {
    fn read(&mut self) -> Result<RawSample, SensorError> {
        self.reads = self.reads.wrapping_add(1);
        if self.fault_every > 0 && self.reads % self.fault_every == 0 {
            debug!("Simulated sensor timeout on read {}", self.reads);
            return Err(SensorError::Timeout);
        }

        let (temperature_c, humidity) = sample_at(self.uptime.secs_f64());
        Ok(RawSample {
            temperature_c,
            humidity_pct: self.humidity.then_some(humidity),
        })
    }

    fn supports_humidity(&self) -> bool {
        self.humidity
    }
}
